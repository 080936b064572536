//! # pico-clockwork
//! The input/sound engine of a Raspberry Pi Pico alarm clock: a
//! debounce/repeat automaton for the three front buttons and a piezo
//! sequencer that produces key clicks, confirmation beeps, an alarm
//! preview and the alarm itself.
//!
//! Both state machines are advanced by two periodic hooks: `semitick`
//! (1 kHz, drives input sampling and per-note progression) and `tick`
//! (1 Hz, drives the on/off toggling of beep-style alarm playback). The
//! hooks own all mutation; a foreground consumer reads button presses
//! through [`buttons::ButtonInput::process`] and requests sounds through
//! the [`pizo::PizoSequencer`] entry points.
//!
//! The machines talk to hardware only through the capability traits in
//! [`hal`], so everything in this half of the crate runs (and is tested)
//! on the host. The `rp2040` feature adds the embassy-rp implementations
//! of those traits, the scheduler tasks and the firmware binary.
#![cfg_attr(not(test), no_std)]

pub mod buttons;
pub mod hal;
pub mod pizo;
pub mod system;

#[cfg(feature = "rp2040")]
pub mod hardware;
#[cfg(feature = "rp2040")]
pub mod task;
