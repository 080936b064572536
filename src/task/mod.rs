//! Firmware tasks: the periodic engine drivers, power monitoring and
//! the peripheral split.

pub mod engine;
pub mod power;
pub mod resources;
