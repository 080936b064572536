//! # Piezo sequencer
//! Tone generation and the click/beep/tryalarm/alarm state machine for
//! the piezo element. The two buzzer terminals hang off one 16-bit timer
//! in fast-PWM mode and are driven in antiphase (push-pull) to double
//! the effective voltage swing across the element.
//!
//! The sequencer is advanced by [`PizoSequencer::semitick`] (per-note and
//! per-beep progression) and [`PizoSequencer::tick`] (the once-per-second
//! on/off toggling of beep-style alarm playback). Requests arrive through
//! the public entry points; an active alarm outranks everything and can
//! only be ended by an explicit stop.

use crate::hal::{BuzzerHal, SoundStore};
use crate::system::SystemFlags;

/// The timer clock the note periods are computed for. In full-power mode
/// the counter runs at this rate; in sleep mode the clock is four times
/// slower and [`PizoSequencer::buzzer_on`] compensates.
pub const TIMER_HZ: u32 = 8_000_000;

/// Counter top values for the third octave; higher octaves are reached
/// by halving (right-shifting) per octave.
const THIRD_OCTAVE: [u16; 12] = [
    (TIMER_HZ as f64 / 130.81) as u16, // C
    (TIMER_HZ as f64 / 138.59) as u16, // C#, Db
    (TIMER_HZ as f64 / 146.83) as u16, // D
    (TIMER_HZ as f64 / 155.56) as u16, // D#, Eb
    (TIMER_HZ as f64 / 164.81) as u16, // E
    (TIMER_HZ as f64 / 174.61) as u16, // F
    (TIMER_HZ as f64 / 185.00) as u16, // F#, Gb
    (TIMER_HZ as f64 / 196.00) as u16, // G
    (TIMER_HZ as f64 / 207.65) as u16, // G#, Ab
    (TIMER_HZ as f64 / 220.00) as u16, // A
    (TIMER_HZ as f64 / 233.08) as u16, // A#, Bb
    (TIMER_HZ as f64 / 246.94) as u16, // B
];

/// Volume level (0 to 10) to compare-match factor. The values were
/// derived by ear; with the exception of the first two, perceived volume
/// is roughly proportional to the log of the entries.
const VOL_TO_CM: [u8; 11] = [2, 7, 11, 15, 21, 28, 38, 51, 69, 93, 128];

/// A note is packed into one byte: note index in the lower nibble,
/// octave in the upper. Octaves start at three, so any value below
/// `0x30` is free for the special tones.
const NOTE_MASK: u8 = 0x0F;
/// Upper-nibble octave of a packed note
const OCTAVE_MASK: u8 = 0xF0;
/// Lowest octave a packed note can express
const BASE_OCTAVE: u8 = 3;

/// Silence instead of a note
pub const PAUSE: u8 = 0;
/// The generic beep tone
pub const BEEP: u8 = 1;

/// Counter top for the generic beep tone
const BEEP_PERIOD: u16 = 2048;
/// Click duration in semiticks; the drive polarity flips at the midpoint
const CLICK_SEMITICKS: u16 = 32;
/// Full on/off cycle of the tryalarm beep pattern, in semiticks
const TRYALARM_CYCLE_SEMITICKS: u16 = 2020;
/// Semiticks of silence at the tail of each note, keeping consecutive
/// notes distinct
const NOTE_GAP_SEMITICKS: u16 = 32;

/// Note indexes within an octave, for the melody table
const CN: u8 = 0;
/// D
const DN: u8 = 2;
/// E
const EN: u8 = 4;
/// F sharp
const FS: u8 = 6;
/// G
const GN: u8 = 7;
/// A
const AN: u8 = 9;
/// B
const BN: u8 = 11;

/// Pack a note and an octave into one byte.
const fn n(note: u8, octave: u8) -> u8 {
    (octave << 4) | note
}

/// The notes of "We Wish You a Merry Christmas"; zero terminates.
const MERRY_XMAS_NOTES: &[u8] = &[
    n(DN, 6),
    n(GN, 6), n(GN, 6), n(AN, 6), n(GN, 6), n(FS, 6),
    n(EN, 6), n(EN, 6), n(EN, 6),
    n(AN, 6), n(AN, 6), n(BN, 6), n(AN, 6), n(GN, 6),
    n(FS, 6), n(DN, 6), n(DN, 6),
    n(BN, 6), n(BN, 6), n(CN, 7), n(BN, 6), n(AN, 6),
    n(GN, 6), n(EN, 6), n(EN, 6), n(EN, 6),
    n(EN, 6), n(AN, 6), n(FS, 6),
    n(GN, 6),
    //
    n(DN, 6),
    n(GN, 6), n(GN, 6), n(GN, 6),
    n(FS, 6), n(FS, 6),
    n(GN, 6), n(FS, 6), n(EN, 6),
    n(DN, 6), n(BN, 6),
    n(CN, 7), n(BN, 6), n(AN, 6),
    n(DN, 7), n(DN, 6), n(DN, 6), n(DN, 6),
    n(DN, 6), n(AN, 6), n(FS, 6),
    n(GN, 6), PAUSE,
    0,
];

/// The timing of "We Wish You a Merry Christmas", in 256-semitick units;
/// zero terminates.
const MERRY_XMAS_TIMES: &[u8] = &[
    2,
    2, 1, 1, 1, 1,
    2, 2, 2,
    2, 1, 1, 1, 1,
    2, 2, 2,
    2, 1, 1, 1, 1,
    2, 2, 1, 1,
    2, 2, 2,
    4,
    //
    2,
    2, 2, 2,
    4, 2,
    2, 2, 2,
    4, 2,
    2, 2, 2,
    2, 2, 1, 1,
    2, 2, 2,
    4, 2,
    0,
];

/// The selectable alarm sounds; one byte of this survives power loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmSound {
    /// Plain on/off beeping
    Beeps,
    /// The carol, played note by note
    MerryXmas,
}

impl AlarmSound {
    /// The persisted encoding of this selection.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::Beeps => 0,
            Self::MerryXmas => 1,
        }
    }

    /// Decode a persisted byte; unknown values yield `None` and the
    /// caller falls back to the default selection.
    #[must_use]
    pub const fn from_byte(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Beeps),
            1 => Some(Self::MerryXmas),
            _ => None,
        }
    }
}

/// What the sequencer is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PizoState {
    /// Nothing in progress
    Inactive,
    /// Key-press click in progress
    Click,
    /// Timed confirmation beep in progress
    Beep,
    /// Alarm preview, beep pattern
    TryalarmBeeps,
    /// Alarm preview, melody
    TryalarmMusic,
    /// The real alarm, beep pattern
    AlarmBeeps,
    /// The real alarm, melody
    AlarmMusic,
}

impl PizoState {
    /// Is this one of the real alarm states?
    const fn is_alarm(self) -> bool {
        matches!(self, Self::AlarmBeeps | Self::AlarmMusic)
    }

    /// Is this one of the preview states?
    const fn is_tryalarm(self) -> bool {
        matches!(self, Self::TryalarmBeeps | Self::TryalarmMusic)
    }
}

/// The piezo state machine. Mutated only by the periodic hooks and the
/// entry points; the foreground observes progress through the shared
/// alarm-sounding flag.
pub struct PizoSequencer<'a, H: BuzzerHal> {
    /// The buzzer drive
    hw: H,
    /// Shared sleep / alarm-sounding bits
    flags: &'a SystemFlags,
    /// Current operational state
    state: PizoState,
    /// Countdown whose unit and meaning depend on `state`
    timer: u16,
    /// Index into the bound note/duration tables
    pos: u8,
    /// Current compare-match factor (duty numerator) from the volume
    cm_factor: u8,
    /// Selected alarm sound
    sound: AlarmSound,
    /// Notes of the bound tune
    notes: &'static [u8],
    /// Durations of the bound tune
    times: &'static [u8],
}

impl<'a, H: BuzzerHal> PizoSequencer<'a, H> {
    /// Create the sequencer: inactive, default sound, volume at the
    /// bottom of the scale until the mode controller restores it.
    pub const fn new(hw: H, flags: &'a SystemFlags) -> Self {
        Self {
            hw,
            flags,
            state: PizoState::Inactive,
            timer: 0,
            pos: 0,
            cm_factor: 0,
            sound: AlarmSound::Beeps,
            notes: MERRY_XMAS_NOTES,
            times: MERRY_XMAS_TIMES,
        }
    }

    /// Rest both buzzer terminals and load the persisted sound
    /// selection.
    pub fn init(&mut self, store: &mut impl SoundStore) {
        self.hw.set_levels(false, false);
        self.load_sound(store);
    }

    /// Load the alarm sound selection from the persistent store. An
    /// unrecognized (or missing) byte silently becomes the default and
    /// is made durable again on the next explicit save.
    pub fn load_sound(&mut self, store: &mut impl SoundStore) {
        self.sound = store
            .load()
            .and_then(AlarmSound::from_byte)
            .unwrap_or(AlarmSound::Beeps);
        self.configure_sound();
    }

    /// Persist the current alarm sound selection.
    pub fn save_sound(&mut self, store: &mut impl SoundStore) {
        store.save(self.sound.to_byte());
    }

    /// Bind the note/duration tables for the current selection.
    fn configure_sound(&mut self) {
        match self.sound {
            AlarmSound::MerryXmas => {
                self.notes = MERRY_XMAS_NOTES;
                self.times = MERRY_XMAS_TIMES;
            }
            // TODO: give Beeps its own short-beep table; it currently
            // shares the carol and differs only in which alarm state
            // alarm_start and tryalarm_start choose.
            AlarmSound::Beeps => {
                self.notes = MERRY_XMAS_NOTES;
                self.times = MERRY_XMAS_TIMES;
            }
        }
    }

    /// Cycle to the next alarm sound selection, wrapping around.
    pub fn next_sound(&mut self) {
        self.sound = match self.sound {
            AlarmSound::Beeps => AlarmSound::MerryXmas,
            AlarmSound::MerryXmas => AlarmSound::Beeps,
        };
        self.configure_sound();
    }

    /// Set the volume to `vol` (0 to 10), interpolating toward the next
    /// level by `interp`/256. Takes effect immediately if a tone is
    /// currently being generated.
    pub fn set_volume(&mut self, vol: u8, interp: u8) {
        debug_assert!(vol <= 10, "volume level out of range");

        let mut cm_factor = u16::from(VOL_TO_CM[usize::from(vol)]);

        if vol < 10 && interp > 0 {
            let cm_slope = u16::from(VOL_TO_CM[usize::from(vol) + 1]) - cm_factor;
            cm_factor += (cm_slope * u16::from(interp)) >> 8;
        }

        self.cm_factor = cm_factor as u8;

        // if the buzzer is active, adjust the volume immediately
        if self.hw.pwm_active() {
            let period = self.hw.pwm_period();
            self.hw
                .pwm_update(period, (period >> 8) * u16::from(self.cm_factor));
        }
    }

    /// Configure for full-power mode: the timer clock just became four
    /// times faster, so a tone playing through the beeping alarm must
    /// have its period and duty stretched to match.
    pub fn wake(&mut self) {
        if self.state == PizoState::AlarmBeeps && self.hw.pwm_active() {
            let period = self.hw.pwm_period() << 2;
            let compare = self.hw.pwm_compare() << 2;
            self.hw.pwm_update(period, compare);
        }
    }

    /// Configure for low-power mode: music is demoted to beeps to reduce
    /// power draw, an active beep tone is compensated for the four times
    /// slower clock, and any non-alarm noise is silenced outright.
    pub fn sleep(&mut self) {
        match self.state {
            PizoState::AlarmMusic => {
                self.state = PizoState::AlarmBeeps;
                self.timer = 0;
                self.pos = 0;
                self.buzzer_off();
            }
            PizoState::AlarmBeeps => {
                if self.hw.pwm_active() {
                    let period = self.hw.pwm_period() >> 2;
                    let compare = self.hw.pwm_compare() >> 2;
                    self.hw.pwm_update(period, compare);
                }
            }
            PizoState::Inactive => {}
            _ => self.stop(),
        }
    }

    /// Coarse advance: toggles the buzzer once per call during the
    /// beeping alarm and mirrors the on/off state into the shared
    /// alarm-sounding flag.
    pub fn tick(&mut self) {
        if self.state == PizoState::AlarmBeeps {
            self.timer = self.timer.wrapping_add(1);

            if self.timer & 0x0001 != 0 {
                self.buzzer_on(BEEP);
                self.flags.set_alarm_sounding(true);
            } else {
                self.buzzer_off();
                self.flags.set_alarm_sounding(false);
            }
        }
    }

    /// Fine advance: walks the active state toward completion.
    pub fn semitick(&mut self) {
        match self.state {
            PizoState::Beep => {
                // stop the buzzer once the beep has timed out
                if self.timer == 0 {
                    self.stop();
                }
                self.timer = self.timer.wrapping_sub(1);
            }

            PizoState::Click => {
                if self.timer == CLICK_SEMITICKS / 2 {
                    // flip the drive polarity across the element
                    self.hw.set_levels(true, false);
                }
                if self.timer == 0 {
                    self.stop();
                }
                self.timer = self.timer.wrapping_sub(1);
            }

            PizoState::TryalarmBeeps => {
                if self.timer == 0 {
                    self.buzzer_on(BEEP);
                    self.timer = TRYALARM_CYCLE_SEMITICKS;
                }
                if self.timer == TRYALARM_CYCLE_SEMITICKS / 2 {
                    self.buzzer_off();
                }
                self.timer -= 1;
            }

            PizoState::TryalarmMusic | PizoState::AlarmMusic => {
                // when the countdown expires, play the next note or pause
                if self.timer == 0 {
                    self.timer = u16::from(self.times[usize::from(self.pos)]);

                    if self.timer == 0 {
                        // zero marks end-of-tune; repeat from the start
                        self.pos = 0;
                        self.timer = u16::from(self.times[0]);
                    }

                    self.timer <<= 8; // 256 semiticks per time unit

                    self.buzzer_on(self.notes[usize::from(self.pos)]);

                    self.pos += 1;
                }

                // brief silence keeps consecutive notes distinct
                if self.timer == NOTE_GAP_SEMITICKS {
                    self.buzzer_off();
                }

                self.timer -= 1;
            }

            _ => {} // Inactive and AlarmBeeps advance on tick only
        }
    }

    /// Start generating the given tone: [`PAUSE`], [`BEEP`] or a packed
    /// note+octave byte. Applies the sleep-mode clock compensation and
    /// the current volume.
    pub fn buzzer_on(&mut self, tone: u8) {
        debug_assert!(
            tone == PAUSE || tone == BEEP || tone >= (BASE_OCTAVE << 4),
            "not a playable tone"
        );

        let (top, shift) = if tone == PAUSE {
            self.buzzer_off();
            return;
        } else if tone == BEEP {
            (BEEP_PERIOD, 0)
        } else {
            // the counter top for the note in the third octave, shifted
            // up to the requested octave
            (
                THIRD_OCTAVE[usize::from(tone & NOTE_MASK)],
                ((tone & OCTAVE_MASK) >> 4) - BASE_OCTAVE,
            )
        };

        let mut period = top >> shift;

        if self.flags.sleeping() {
            // compensate frequency for the four times slower clock
            period >>= 2;
        }

        let compare = (period >> 8) * u16::from(self.cm_factor);

        self.hw.pwm_on(period, compare);
    }

    /// Stop tone generation and rest both terminals.
    pub fn buzzer_off(&mut self) {
        self.hw.pwm_off();
    }

    /// Make a clicking sound, if nothing else is in progress. The DC
    /// bias applied here is flipped halfway through the click by
    /// [`PizoSequencer::semitick`], producing the audible tick.
    pub fn click(&mut self) {
        if self.state == PizoState::Inactive {
            self.state = PizoState::Click;
            self.timer = CLICK_SEMITICKS;

            self.hw.set_levels(false, true);
        }
    }

    /// Beep for `duration` semiticks. A beep overrides any current
    /// noise except alarm and tryalarm sounds, which silently win.
    pub fn beep(&mut self, duration: u16) {
        if self.state.is_alarm() || self.state.is_tryalarm() {
            return;
        }

        // override any existing noise
        self.buzzer_off();

        self.state = PizoState::Beep;
        self.timer = duration;

        self.buzzer_on(BEEP);
    }

    /// Start the alarm sounding. Already-sounding alarms are left
    /// untouched; anything else is overridden. Beeps are used instead of
    /// music when selected, and always during sleep.
    pub fn alarm_start(&mut self) {
        if self.state.is_alarm() {
            return;
        }

        // override any existing noise
        self.buzzer_off();

        self.state = if self.sound == AlarmSound::Beeps || self.flags.sleeping() {
            PizoState::AlarmBeeps
        } else {
            PizoState::AlarmMusic
        };

        self.pos = 0;
        self.timer = 0;
    }

    /// Stop the alarm, if it is sounding.
    pub fn alarm_stop(&mut self) {
        if self.state.is_alarm() {
            self.stop();
        }
    }

    /// Start the alarm preview. Rejected while the real alarm is
    /// sounding; overrides anything else.
    pub fn tryalarm_start(&mut self) {
        if self.state.is_alarm() {
            return;
        }

        // override any existing noise
        self.buzzer_off();

        self.state = if self.sound == AlarmSound::Beeps {
            PizoState::TryalarmBeeps
        } else {
            PizoState::TryalarmMusic
        };

        self.pos = 0;
        self.timer = 0;
    }

    /// Stop the alarm preview, if it is running.
    pub fn tryalarm_stop(&mut self) {
        if self.state.is_tryalarm() {
            self.stop();
        }
    }

    /// Unconditionally silence the piezo, return to inactive and clear
    /// the shared alarm-sounding flag.
    pub fn stop(&mut self) {
        self.buzzer_off();
        self.state = PizoState::Inactive;
        self.flags.set_alarm_sounding(false);
    }

    /// The current operational state.
    #[must_use]
    pub const fn state(&self) -> PizoState {
        self.state
    }

    /// The current alarm sound selection.
    #[must_use]
    pub const fn sound(&self) -> AlarmSound {
        self.sound
    }

    /// The current compare-match factor derived from the volume.
    #[must_use]
    pub const fn cm_factor(&self) -> u8 {
        self.cm_factor
    }

    /// The shared system flags this sequencer reads and writes.
    #[must_use]
    pub const fn flags(&self) -> &'a SystemFlags {
        self.flags
    }

    /// Access to the buzzer drive.
    pub const fn hw(&self) -> &H {
        &self.hw
    }
}
