//! The three button sense lines on the RP2040.

use embassy_rp::gpio::{Flex, Pull};

use crate::buttons::{BUTTON_MENU, BUTTON_PLUS, BUTTON_SET};
use crate::hal::ButtonPins;
use crate::task::resources::ButtonResources;

/// The front buttons: active low, closed to ground, held high by the
/// internal pull-ups while awake. `Flex` pins because sleep/wake needs
/// to reconfigure the pulls at runtime.
pub struct RpButtonPins {
    /// The menu button sense line
    menu: Flex<'static>,
    /// The set button sense line
    set: Flex<'static>,
    /// The plus button sense line
    plus: Flex<'static>,
}

impl RpButtonPins {
    /// Claim the sense pins as inputs. Pull-ups start disabled, like
    /// everything else in the sleep configuration; the automaton's
    /// `wake` enables them.
    pub fn new(r: ButtonResources) -> Self {
        let mut menu = Flex::new(r.menu_pin);
        let mut set = Flex::new(r.set_pin);
        let mut plus = Flex::new(r.plus_pin);
        menu.set_as_input();
        set.set_as_input();
        plus.set_as_input();
        Self { menu, set, plus }
    }
}

impl ButtonPins for RpButtonPins {
    fn sense(&mut self) -> u8 {
        let mut sensed = 0;

        // check the menu button (button one)
        if self.menu.is_low() {
            sensed |= BUTTON_MENU;
        }

        // check the set button (button two)
        if self.set.is_low() {
            sensed |= BUTTON_SET;
        }

        // check the plus button (button three)
        if self.plus.is_low() {
            sensed |= BUTTON_PLUS;
        }

        sensed
    }

    fn set_pullups(&mut self, enabled: bool) {
        let pull = if enabled { Pull::Up } else { Pull::None };
        self.menu.set_pull(pull);
        self.set.set_pull(pull);
        self.plus.set_pull(pull);
    }
}
