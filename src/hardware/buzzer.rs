//! The piezo drive on the RP2040: one PWM slice with both outputs on
//! the element's two terminals.
//!
//! The slice counts at 8 MHz (system clock through a fixed divider) so
//! the sequencer's note period table applies directly. Channel B runs
//! the complementary duty inverted, which swings the two terminals in
//! antiphase and doubles the effective voltage across the piezo. The
//! PWM block on this chip is not power-gated, which the drive relies
//! on: the slice stays clocked even while silent.

use embassy_rp::pwm::{Config, Pwm};
use fixed::traits::ToFixed;

use crate::hal::BuzzerHal;
use crate::pizo::TIMER_HZ;
use crate::task::resources::BuzzerResources;

/// Takes the 125 MHz system clock down to the 8 MHz counting rate the
/// note periods assume (divider 15.625).
const PWM_DIVIDER: f64 = 125_000_000.0 / TIMER_HZ as f64;

/// Counter top while the outputs only carry DC levels; any value works,
/// the comparators are pinned past or before it.
const LEVEL_TOP: u16 = 0xFFFE;

/// The buzzer pins and their PWM slice, plus a shadow of the registers
/// last programmed (the sequencer reads them back for the sleep/wake
/// compensation).
pub struct RpBuzzer {
    /// The PWM slice driving both terminals
    pwm: Pwm<'static>,
    /// Tone generation currently running
    active: bool,
    /// Last programmed counter top
    period: u16,
    /// Last programmed first-terminal duty
    compare: u16,
}

impl RpBuzzer {
    /// Claim the slice and both pins, resting the terminals at ground.
    pub fn new(r: BuzzerResources) -> Self {
        let pwm = Pwm::new_output_ab(
            r.slice,
            r.first_pin,
            r.second_pin,
            Self::level_config(false, false),
        );
        Self {
            pwm,
            active: false,
            period: 0,
            compare: 0,
        }
    }

    /// A config with the engine's clocking applied.
    fn base_config() -> Config {
        let mut config = Config::default();
        config.divider = PWM_DIVIDER.to_fixed();
        config
    }

    /// A config that holds both terminals at fixed levels: comparators
    /// pinned fully past or fully before the counter.
    fn level_config(first: bool, second: bool) -> Config {
        let mut config = Self::base_config();
        config.top = LEVEL_TOP;
        config.compare_a = if first { u16::MAX } else { 0 };
        config.compare_b = if second { u16::MAX } else { 0 };
        config
    }

    /// A config generating the push-pull tone: top = `period`, channel A
    /// at `compare`, channel B at the complement, inverted.
    fn tone_config(period: u16, compare: u16) -> Config {
        let mut config = Self::base_config();
        config.top = period;
        config.compare_a = compare;
        config.compare_b = period - compare;
        config.invert_b = true;
        config
    }
}

impl BuzzerHal for RpBuzzer {
    fn pwm_on(&mut self, period: u16, compare: u16) {
        self.pwm.set_config(&Self::tone_config(period, compare));
        self.active = true;
        self.period = period;
        self.compare = compare;
    }

    fn pwm_update(&mut self, period: u16, compare: u16) {
        self.pwm.set_config(&Self::tone_config(period, compare));
        self.period = period;
        self.compare = compare;
    }

    fn pwm_off(&mut self) {
        self.pwm.set_config(&Self::level_config(false, false));
        self.active = false;
    }

    fn pwm_active(&self) -> bool {
        self.active
    }

    fn pwm_period(&self) -> u16 {
        self.period
    }

    fn pwm_compare(&self) -> u16 {
        self.compare
    }

    fn set_levels(&mut self, first: bool, second: bool) {
        self.pwm.set_config(&Self::level_config(first, second));
        self.active = false;
    }
}
