//! # Power
//! Watch the external-supply sense line and drive the engine's
//! sleep/wake transitions. On battery the system clock runs four times
//! slower, so losing the supply must also release the button pull-ups
//! and recompute any active alarm tone.

use defmt::info;
use embassy_rp::gpio::{Input, Pull};

use crate::task::engine;
use crate::task::resources::PowerResources;

/// Determine the power source of the system: the external supply is
/// present while the sense pin reads high. Each edge flips the whole
/// engine between full-power and low-power operation.
#[embassy_executor::task]
pub async fn power_monitor(r: PowerResources) {
    info!("power monitor task started");
    let mut vbus_in = Input::new(r.vbus_pin, Pull::None);
    loop {
        if vbus_in.is_high() {
            info!("external power present, engine at full power");
            engine::leave_sleep();
        } else {
            info!("external power lost, engine entering sleep");
            engine::enter_sleep();
        }
        vbus_in.wait_for_any_edge().await;
    }
}
