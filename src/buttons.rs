//! # Button input
//! Debounce, press-and-hold and auto-repeat handling for the three front
//! buttons. The raw sense lines are sampled once per semitick; a change
//! is committed only after the new reading has held steady for the
//! debounce window. The foreground consumes committed presses through
//! [`ButtonInput::process`], which is edge-triggered and re-arms itself
//! at the repeat rate while a button stays held.

use crate::hal::{ButtonPins, BuzzerHal};
use crate::pizo::PizoSequencer;

/// The menu button (button one)
pub const BUTTON_MENU: u8 = 0x01;
/// The set button (button two)
pub const BUTTON_SET: u8 = 0x02;
/// The plus button (button three)
pub const BUTTON_PLUS: u8 = 0x04;

/// Consecutive identical samples required before a change is committed
pub const DEBOUNCE_SEMITICKS: u8 = 40;
/// Hold duration after which a press starts auto-repeating
pub const REPEAT_AFTER_SEMITICKS: u16 = 500;
/// Interval between repeats once auto-repeat has started
pub const REPEAT_RATE_SEMITICKS: u16 = 150;

/// The debounce/repeat automaton. Written only by [`ButtonInput::semitick`];
/// read and cleared only by [`ButtonInput::process`].
pub struct ButtonInput<P: ButtonPins> {
    /// The sense lines
    pins: P,
    /// Committed (debounced) bitmask of pressed buttons
    pressed: u8,
    /// Most recent raw sample, held pending debounce confirmation
    candidate: u8,
    /// The current press has been consumed by the foreground
    processed: bool,
    /// The current press has been held past the repeat threshold
    repeating: bool,
    /// Consecutive semiticks the candidate has matched the raw sample
    debounce: u8,
    /// Semiticks the committed press has been held
    held: u16,
}

impl<P: ButtonPins> ButtonInput<P> {
    /// Create the automaton: nothing pressed, nothing to consume.
    pub const fn new(pins: P) -> Self {
        Self {
            pins,
            pressed: 0,
            candidate: 0,
            processed: true,
            repeating: false,
            debounce: 0,
            held: 0,
        }
    }

    /// Release the sense-line pull-ups for sleep. Logical state is
    /// untouched.
    pub fn sleep(&mut self) {
        self.pins.set_pullups(false);
    }

    /// Re-enable the sense-line pull-ups on wake.
    pub fn wake(&mut self) {
        self.pins.set_pullups(true);
    }

    /// Sample, debounce and track hold duration. Called at 1 kHz.
    pub fn semitick(&mut self) {
        let sensed = self.pins.sense();

        // commit only after the same changed reading has been seen for
        // the whole debounce window; any flicker restarts the count
        if self.pressed != sensed && self.candidate == sensed {
            self.debounce += 1;
            if self.debounce >= DEBOUNCE_SEMITICKS {
                self.pressed = sensed;
                self.processed = false;
                self.repeating = false;
                self.held = 0;
            }
        } else {
            self.candidate = sensed;
            self.debounce = 0;
        }

        // while anything is held, periodically clear the processed flag
        // so process() yields again: press-and-hold auto-repeat
        if self.pressed != 0 {
            self.held += 1;

            if self.repeating {
                if self.held >= REPEAT_RATE_SEMITICKS {
                    self.processed = false;
                    self.held = 0;
                }
            } else if self.held >= REPEAT_AFTER_SEMITICKS {
                self.repeating = true;
            }
        }
    }

    /// Consume the current press, if there is an unconsumed one.
    ///
    /// Returns the committed bitmask exactly once per press edge (and
    /// once per repeat interval while held), zero otherwise. A consumed
    /// press clicks the piezo as feedback.
    pub fn process<H: BuzzerHal>(&mut self, pizo: &mut PizoSequencer<'_, H>) -> u8 {
        if self.processed || self.pressed == 0 {
            return 0;
        }

        self.processed = true;

        // a nice, satisfying click for the processed press
        pizo.click();

        self.pressed
    }

    /// Access to the underlying sense lines.
    pub fn pins_mut(&mut self) -> &mut P {
        &mut self.pins
    }
}
