// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! SCD41 driver implementing the SCD41 I2C CO2 sensor command set
//! and a continuous measurement controller on top of it.
//!
//! Operations taken from the SCD4x datasheet: sensor variant, self-test,
//! data-ready status, read measurement, single shot, periodic measurement
//! start/stop and forced recalibration. Every response word is validated
//! with its CRC-8 before it is used.
//!
//! ## Basic Example
//!
//! Reading one measurement once the sensor reports data ready
//!
//!```no_run
//!use scd41_i2c::scd41::{Scd41, SCD41_ADDRESS};
//!
//!fn main() {
//!    // Open the I2C device
//!    let mut scd = Scd41::open("/dev/i2c-3", SCD41_ADDRESS).unwrap();
//!    scd.start_periodic_measurement().unwrap();
//!
//!    match scd.wait_data_ready().and_then(|_| scd.read_measurement(0x1000)) {
//!        Ok(m) => println!(
//!            "Co2: {} ppm Temp: {} C RH: {} %",
//!            m.co2_ppm, m.temperature_celsius, m.humidity_percent
//!        ),
//!        Err(e) => println!("Error obtaining measurements. More details: {}", e),
//!    }
//!
//!    scd.stop_periodic_measurement().unwrap();
//!}
//!```
//!

pub mod command;
pub mod controller;
pub mod crc;
pub mod db;
pub mod decode;
pub mod error;
pub mod measurement;
pub mod poll;
/// Driver implementing SCD41 device related operations
pub mod scd41;
pub mod schedule;
pub mod session;
pub mod transport;

pub use controller::{ContinuousMeasurement, MeasurementStore, SessionConfig, SessionError};
pub use error::Scd41Error;
pub use measurement::Measurement;
pub use scd41::Scd41;
pub use session::SessionState;
