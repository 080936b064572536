//! Peripheral assignment for the clock engine.

use assign_resources::assign_resources;
use embassy_rp::peripherals;

// group the peripherals into resources, to be used in the tasks
// the resources are assigned to the tasks in main.rs
assign_resources! {
    buttons: ButtonResources {
        menu_pin: PIN_18,
        set_pin: PIN_19,
        plus_pin: PIN_20,
    },
    buzzer: BuzzerResources {
        slice: PWM_SLICE0,
        first_pin: PIN_16,
        second_pin: PIN_17,
    },
    flash: FlashResources {
        flash: FLASH,
        dma_ch: DMA_CH0,
    },
    power: PowerResources {
        vbus_pin: PIN_24,
    },
}
