//! # Engine scheduling
//! The shared engine objects and the two periodic tasks that advance
//! them. The periodic tasks are the sole writers of the engine state;
//! the foreground reads presses and requests sounds through the
//! accessors here. Every access runs inside a critical section, so a
//! semitick can never observe a half-updated engine and the sleep/wake
//! frequency rewrites are indivisible.

use core::cell::RefCell;

use defmt::info;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Ticker};

use crate::buttons::ButtonInput;
use crate::hardware::buttons::RpButtonPins;
use crate::hardware::buzzer::RpBuzzer;
use crate::pizo::PizoSequencer;
use crate::system::SystemFlags;

/// The button automaton on the real sense lines
pub type Buttons = ButtonInput<RpButtonPins>;
/// The piezo sequencer on the real buzzer drive
pub type Pizo = PizoSequencer<'static, RpBuzzer>;

/// A shared engine object, guarded by a critical section
type Shared<T> = Mutex<CriticalSectionRawMutex, RefCell<Option<T>>>;

/// The sleep / alarm-sounding bits shared with the rest of the clock
static SYSTEM_FLAGS: SystemFlags = SystemFlags::new();

/// The button automaton, once installed
static BUTTONS: Shared<Buttons> = Mutex::new(RefCell::new(None));
/// The piezo sequencer, once installed
static PIZO: Shared<Pizo> = Mutex::new(RefCell::new(None));

/// The shared system flags.
pub fn flags() -> &'static SystemFlags {
    &SYSTEM_FLAGS
}

/// Hand the constructed engine objects to the scheduler.
pub fn install(buttons: Buttons, pizo: Pizo) {
    BUTTONS.lock(|cell| cell.replace(Some(buttons)));
    PIZO.lock(|cell| cell.replace(Some(pizo)));
}

/// Run `f` on the button automaton inside a critical section. `None`
/// before [`install`] has run.
pub fn with_buttons<R>(f: impl FnOnce(&mut Buttons) -> R) -> Option<R> {
    BUTTONS.lock(|cell| cell.borrow_mut().as_mut().map(f))
}

/// Run `f` on the piezo sequencer inside a critical section. `None`
/// before [`install`] has run.
pub fn with_pizo<R>(f: impl FnOnce(&mut Pizo) -> R) -> Option<R> {
    PIZO.lock(|cell| cell.borrow_mut().as_mut().map(f))
}

/// Consume a debounced press, if one is pending. The click feedback
/// fires inside the same critical section as the consumption.
pub fn process_buttons() -> u8 {
    BUTTONS.lock(|buttons| {
        PIZO.lock(|pizo| {
            let mut buttons = buttons.borrow_mut();
            let mut pizo = pizo.borrow_mut();
            match (buttons.as_mut(), pizo.as_mut()) {
                (Some(buttons), Some(pizo)) => buttons.process(pizo),
                _ => 0,
            }
        })
    })
}

/// Take the whole engine into low-power mode in one indivisible step.
/// No periodic advance may interleave with the frequency compensation,
/// or the buzzer would briefly run at a corrupted pitch.
pub fn enter_sleep() {
    BUTTONS.lock(|buttons| {
        PIZO.lock(|pizo| {
            SYSTEM_FLAGS.set_sleeping(true);
            if let Some(pizo) = pizo.borrow_mut().as_mut() {
                pizo.sleep();
            }
            if let Some(buttons) = buttons.borrow_mut().as_mut() {
                buttons.sleep();
            }
        });
    });
}

/// Bring the whole engine back to full power, atomically as above.
pub fn leave_sleep() {
    BUTTONS.lock(|buttons| {
        PIZO.lock(|pizo| {
            SYSTEM_FLAGS.set_sleeping(false);
            if let Some(pizo) = pizo.borrow_mut().as_mut() {
                pizo.wake();
            }
            if let Some(buttons) = buttons.borrow_mut().as_mut() {
                buttons.wake();
            }
        });
    });
}

/// The fine scheduling step: samples the buttons and advances the piezo
/// at 1 kHz.
#[embassy_executor::task]
pub async fn semitick_engine() {
    info!("semitick engine task started");
    let mut ticker = Ticker::every(Duration::from_millis(1));
    loop {
        ticker.next().await;
        with_buttons(|buttons| buttons.semitick());
        with_pizo(|pizo| pizo.semitick());
    }
}

/// The coarse scheduling step: toggles beep-style alarm playback once
/// per second.
#[embassy_executor::task]
pub async fn tick_engine() {
    info!("tick engine task started");
    let mut ticker = Ticker::every(Duration::from_secs(1));
    loop {
        ticker.next().await;
        with_pizo(|pizo| pizo.tick());
    }
}
