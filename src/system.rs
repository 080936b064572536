//! # System flags
//! The two single-bit pieces of state the engine shares with the rest of
//! the clock: whether the system is in low-power sleep (consumed by the
//! piezo sequencer's volume/frequency math) and whether the alarm is
//! audibly sounding right now (produced by the sequencer, consumed by
//! unrelated subsystems such as a blinking indicator).

use portable_atomic::{AtomicBool, Ordering};

/// Shared system flags, safe to read from any context.
///
/// Single-bit values only; anything wider shared between the periodic
/// handlers and foreground code lives behind the engine's critical
/// section instead.
pub struct SystemFlags {
    /// The system runs from battery on the slow clock
    sleep: AtomicBool,
    /// The alarm tone is currently audible
    alarm_sounding: AtomicBool,
}

impl SystemFlags {
    /// Create a new flag set: awake, alarm silent.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sleep: AtomicBool::new(false),
            alarm_sounding: AtomicBool::new(false),
        }
    }

    /// Is the system in low-power sleep mode?
    pub fn sleeping(&self) -> bool {
        self.sleep.load(Ordering::Relaxed)
    }

    /// Record a power-state transition.
    pub fn set_sleeping(&self, sleeping: bool) {
        self.sleep.store(sleeping, Ordering::Relaxed);
    }

    /// Is the alarm audibly sounding right now?
    pub fn alarm_sounding(&self) -> bool {
        self.alarm_sounding.load(Ordering::Relaxed)
    }

    /// Mirror the audible on/off state of the alarm.
    pub fn set_alarm_sounding(&self, sounding: bool) {
        self.alarm_sounding.store(sounding, Ordering::Relaxed);
    }
}

impl Default for SystemFlags {
    fn default() -> Self {
        Self::new()
    }
}
