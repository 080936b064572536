//! Firmware entry point: claim the peripherals, build the engine, hand
//! it to the scheduler tasks and run a minimal foreground loop over the
//! debounced button presses.

// we are in an environment with constrained resources, so we do not use
// the standard library and we define a different entry point.
#![no_std]
#![no_main]

use defmt::info;
use embassy_executor::Spawner;
use embassy_time::{Duration, Ticker};
use pico_clockwork::buttons::{BUTTON_MENU, BUTTON_PLUS, BUTTON_SET, ButtonInput};
use pico_clockwork::hardware::buttons::RpButtonPins;
use pico_clockwork::hardware::buzzer::RpBuzzer;
use pico_clockwork::hardware::store::FlashSoundStore;
use pico_clockwork::pizo::{PizoSequencer, PizoState};
use pico_clockwork::split_resources;
use pico_clockwork::task::resources::*;
use pico_clockwork::task::{engine, power};
use {defmt_rtt as _, panic_probe as _};

/// Volume level used until a settings menu exists to restore the
/// configured one
const STARTUP_VOLUME: u8 = 5;

/// Confirmation beep length in semiticks
const CONFIRM_BEEP_SEMITICKS: u16 = 128;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Program start");

    // Initialize the peripherals for the RP2040
    let p = embassy_rp::init(Default::default());
    let r = split_resources!(p);

    // buttons, starting awake: pull-ups enabled
    info!("init buttons");
    let mut buttons = ButtonInput::new(RpButtonPins::new(r.buttons));
    buttons.wake();

    // the piezo sequencer picks up its persisted sound selection
    info!("init piezo");
    let mut store = FlashSoundStore::new(r.flash);
    let mut pizo = PizoSequencer::new(RpBuzzer::new(r.buzzer), engine::flags());
    pizo.init(&mut store);
    pizo.set_volume(STARTUP_VOLUME, 0);

    engine::install(buttons, pizo);

    spawner.spawn(engine::semitick_engine()).unwrap();
    spawner.spawn(engine::tick_engine()).unwrap();
    spawner.spawn(power::power_monitor(r.power)).unwrap();

    // Minimal foreground consumer until the full menu tree lands: menu
    // raises/stops the alarm, set previews the alarm sound, plus cycles
    // the stored sound selection.
    let mut ticker = Ticker::every(Duration::from_millis(10));
    loop {
        ticker.next().await;

        let pressed = engine::process_buttons();
        if pressed == 0 {
            continue;
        }

        if pressed & BUTTON_MENU != 0 {
            engine::with_pizo(|pizo| match pizo.state() {
                PizoState::AlarmBeeps | PizoState::AlarmMusic => {
                    info!("alarm stopped");
                    pizo.alarm_stop();
                }
                _ => {
                    info!("alarm started");
                    pizo.alarm_start();
                }
            });
        }

        if pressed & BUTTON_SET != 0 {
            engine::with_pizo(|pizo| match pizo.state() {
                PizoState::TryalarmBeeps | PizoState::TryalarmMusic => {
                    info!("alarm preview stopped");
                    pizo.tryalarm_stop();
                }
                _ => {
                    info!("alarm preview started");
                    pizo.tryalarm_start();
                }
            });
        }

        if pressed & BUTTON_PLUS != 0 {
            engine::with_pizo(|pizo| {
                pizo.next_sound();
                pizo.save_sound(&mut store);
                info!("alarm sound changed: {}", pizo.sound());
                pizo.beep(CONFIRM_BEEP_SEMITICKS);
            });
        }
    }
}
