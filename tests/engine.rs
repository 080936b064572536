//! Whole-engine tests: both state machines advanced together the way
//! the firmware scheduler drives them, with foreground calls
//! interleaved between semiticks.

use pico_clockwork::buttons::{BUTTON_MENU, BUTTON_SET, ButtonInput, DEBOUNCE_SEMITICKS};
use pico_clockwork::hal::mock::{MockButtons, MockBuzzer, MockStore};
use pico_clockwork::pizo::{AlarmSound, PizoSequencer, PizoState};
use pico_clockwork::system::SystemFlags;

/// A host-side stand-in for the firmware: the two engine objects plus
/// the shared flags, advanced in the scheduler's order.
struct Engine {
    buttons: ButtonInput<MockButtons>,
    pizo: PizoSequencer<'static, MockBuzzer>,
}

impl Engine {
    fn new() -> Self {
        let flags: &'static SystemFlags = Box::leak(Box::new(SystemFlags::new()));
        let mut buttons = ButtonInput::new(MockButtons::default());
        buttons.wake();
        Self {
            buttons,
            pizo: PizoSequencer::new(MockBuzzer::default(), flags),
        }
    }

    /// One fine scheduling step, in the firmware's order.
    fn semitick(&mut self) {
        self.buttons.semitick();
        self.pizo.semitick();
    }

    fn run(&mut self, semiticks: u32) {
        for _ in 0..semiticks {
            self.semitick();
        }
    }

    /// A raw change on the sense lines followed by enough semiticks to
    /// commit it.
    fn settle(&mut self, sensed: u8) {
        self.buttons.pins_mut().sensed = sensed;
        self.run(u32::from(DEBOUNCE_SEMITICKS) + 1);
    }
}

#[test]
fn consumed_press_clicks_and_the_click_expires() {
    let mut engine = Engine::new();

    engine.settle(BUTTON_MENU);
    let pressed = engine.buttons.process(&mut engine.pizo);
    assert_eq!(pressed, BUTTON_MENU);
    assert_eq!(engine.pizo.state(), PizoState::Click);

    // a second consumption attempt yields nothing and must not restart
    // the click
    assert_eq!(engine.buttons.process(&mut engine.pizo), 0);

    // the click runs out under the scheduler and the engine goes idle
    engine.run(64);
    assert_eq!(engine.pizo.state(), PizoState::Inactive);
    assert!(!engine.pizo.hw().active);
}

#[test]
fn preview_survives_button_traffic_but_yields_to_the_alarm() {
    let mut engine = Engine::new();
    engine.pizo.set_volume(8, 0);
    engine.pizo.next_sound();
    assert_eq!(engine.pizo.sound(), AlarmSound::MerryXmas);

    engine.pizo.tryalarm_start();
    assert_eq!(engine.pizo.state(), PizoState::TryalarmMusic);

    // a press during the preview is consumed but its click is rejected
    // by priority, silently
    engine.settle(BUTTON_SET);
    assert_eq!(engine.buttons.process(&mut engine.pizo), BUTTON_SET);
    assert_eq!(engine.pizo.state(), PizoState::TryalarmMusic);

    // several notes play
    engine.run(4 * 512);
    assert!(engine.pizo.hw().on_count >= 2);

    // the real alarm overrides the preview outright
    engine.pizo.alarm_start();
    assert_eq!(engine.pizo.state(), PizoState::AlarmMusic);
}

#[test]
fn beeping_alarm_mirrors_the_sounding_flag_across_ticks() {
    let mut engine = Engine::new();
    engine.pizo.set_volume(10, 0);

    engine.pizo.alarm_start();
    assert_eq!(engine.pizo.state(), PizoState::AlarmBeeps);

    for _ in 0..3 {
        engine.pizo.tick();
        assert!(engine.pizo.flags().alarm_sounding());
        assert!(engine.pizo.hw().active);
        engine.run(1000);

        engine.pizo.tick();
        assert!(!engine.pizo.flags().alarm_sounding());
        assert!(!engine.pizo.hw().active);
        engine.run(1000);
    }

    engine.pizo.alarm_stop();
    assert_eq!(engine.pizo.state(), PizoState::Inactive);
    assert!(!engine.pizo.flags().alarm_sounding());
}

#[test]
fn supply_loss_and_return_keep_the_alarm_tone_consistent() {
    let mut engine = Engine::new();
    engine.pizo.set_volume(10, 0);

    // the alarm is beeping at full power
    engine.pizo.alarm_start();
    engine.pizo.tick();
    assert_eq!(engine.pizo.hw().period, 2048);
    let compare = engine.pizo.hw().compare;

    // supply lost: flag first, then the compensation, as one step
    engine.pizo.flags().set_sleeping(true);
    engine.pizo.sleep();
    engine.buttons.sleep();
    assert_eq!(engine.pizo.hw().period, 2048 >> 2);
    assert!(!engine.buttons.pins_mut().pullups);

    // tones started during sleep are generated for the slow clock
    engine.pizo.tick();
    engine.pizo.tick();
    assert_eq!(engine.pizo.hw().period, 2048 >> 2);
    assert_eq!(engine.pizo.hw().compare, compare >> 2);

    // supply back: the inverse compensation restores the tone
    engine.pizo.flags().set_sleeping(false);
    engine.pizo.wake();
    engine.buttons.wake();
    assert_eq!(engine.pizo.hw().period, 2048);
    assert_eq!(engine.pizo.hw().compare, compare);
    assert!(engine.buttons.pins_mut().pullups);
}

#[test]
fn sleeping_demotes_music_and_the_alarm_restarts_as_beeps() {
    let mut engine = Engine::new();
    engine.pizo.set_volume(6, 0);
    engine.pizo.next_sound();

    engine.pizo.alarm_start();
    assert_eq!(engine.pizo.state(), PizoState::AlarmMusic);
    engine.run(700);

    engine.pizo.flags().set_sleeping(true);
    engine.pizo.sleep();
    assert_eq!(engine.pizo.state(), PizoState::AlarmBeeps);
    assert!(!engine.pizo.hw().active);

    // a fresh alarm while asleep also beeps, despite the melody
    // selection
    engine.pizo.stop();
    engine.pizo.alarm_start();
    assert_eq!(engine.pizo.state(), PizoState::AlarmBeeps);
}

#[test]
fn selection_persists_and_restores_across_a_restart() {
    let mut store = MockStore::default();

    {
        let mut engine = Engine::new();
        engine.pizo.load_sound(&mut store);
        engine.pizo.next_sound();
        engine.pizo.save_sound(&mut store);
        assert_eq!(store.saved, Some(1));
    }

    // "power cycle": a fresh engine picks the selection back up
    let mut engine = Engine::new();
    engine.pizo.init(&mut store);
    assert_eq!(engine.pizo.sound(), AlarmSound::MerryXmas);

    engine.pizo.tryalarm_start();
    assert_eq!(engine.pizo.state(), PizoState::TryalarmMusic);
}

#[test]
fn volume_changes_land_mid_note() {
    let mut engine = Engine::new();
    engine.pizo.set_volume(0, 0);
    engine.pizo.next_sound();

    engine.pizo.tryalarm_start();
    engine.run(100);
    let period = engine.pizo.hw().period;
    assert_eq!(engine.pizo.hw().compare, (period >> 8) * 2);

    // foreground volume change between semiticks reprograms the duty
    // of the running note immediately
    engine.pizo.set_volume(10, 0);
    assert_eq!(engine.pizo.hw().period, period);
    assert_eq!(engine.pizo.hw().compare, (period >> 8) * 128);

    engine.run(100);
    assert_eq!(engine.pizo.state(), PizoState::TryalarmMusic);
}
