//! # Persisted sound selection
//! The one byte of engine state that survives power loss, stored as a
//! key/value pair in the last flash sectors. Read and write failures
//! are reported and otherwise swallowed: the sequencer falls back to
//! its default sound and the clock keeps running.

use core::ops::Range;

use defmt::{Debug2Format, info, warn};
use embassy_futures::block_on;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::FLASH;
use sequential_storage::cache::NoCache;
use sequential_storage::map::{fetch_item, store_item};

use crate::hal::SoundStore;
use crate::task::resources::FlashResources;

/// The size of the flash memory in bytes.
const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Map key of the sound selection byte
const SOUND_KEY: u8 = 0;

/// The sound selection byte in flash.
pub struct FlashSoundStore {
    /// The flash peripheral used to read and write the selection.
    flash: Flash<'static, FLASH, Async, { FLASH_SIZE }>,
    /// The range of the flash memory used to store the selection.
    flash_range: Range<u32>,
    /// A buffer used for reading and writing data to the flash memory.
    data_buffer: [u8; 128],
}

impl FlashSoundStore {
    /// Claim the flash peripheral and bind the storage range.
    pub fn new(r: FlashResources) -> Self {
        Self {
            flash: Flash::new(r.flash, r.dma_ch),
            flash_range: 0x1F_C000..0x1F_E000,
            data_buffer: [0; 128],
        }
    }
}

impl SoundStore for FlashSoundStore {
    fn load(&mut self) -> Option<u8> {
        match block_on(fetch_item::<u8, u8, _>(
            &mut self.flash,
            self.flash_range.clone(),
            &mut NoCache::new(),
            &mut self.data_buffer,
            &SOUND_KEY,
        )) {
            Ok(Some(value)) => {
                info!("sound selection read from flash: {}", value);
                Some(value)
            }
            Ok(None) => {
                info!("no sound selection stored yet");
                None
            }
            Err(e) => {
                warn!(
                    "failed to read the sound selection: {:?}",
                    Debug2Format(&e)
                );
                None
            }
        }
    }

    fn save(&mut self, raw: u8) {
        match block_on(store_item::<u8, u8, _>(
            &mut self.flash,
            self.flash_range.clone(),
            &mut NoCache::new(),
            &mut self.data_buffer,
            &SOUND_KEY,
            &raw,
        )) {
            Ok(()) => {
                info!("sound selection {} stored", raw);
            }
            Err(e) => {
                warn!(
                    "failed to store the sound selection: {:?}",
                    Debug2Format(&e)
                );
            }
        }
    }
}
