// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use chrono::Local;
use i2cdev::linux::{LinuxI2CDevice, LinuxI2CError};
use log::debug;

use crate::command::{forced_recalibration_frame, Command, Frame};
use crate::decode::{
    decode_frc, decode_measurement, decode_self_test, decode_status, decode_variant,
    SensorVariant,
};
use crate::error::Scd41Error;
use crate::measurement::Measurement;
use crate::poll::{PollState, ReadyPoll, DATA_READY_INTERVAL};
use crate::transport::{Delay, ThreadDelay, Transport};

/// Standard SCD41 bus address.
pub const SCD41_ADDRESS: u16 = 0x62;

/// SCD41 Struct, wraps a transport and a delay
/// and has implemented related SCD41 operations.
///
/// Every method is one complete bus transaction: write the frame, wait the
/// command execution time, then read and validate the response if any.
///
pub struct Scd41<T, D> {
    pub transport: T,
    delay: D,
}

impl Scd41<LinuxI2CDevice, ThreadDelay> {
    /// Opens the i2c-dev device at `path` and selects `address`.
    /// If fails, return an LinuxI2CError from i2cdev
    ///
    pub fn open(path: &str, address: u16) -> Result<Self, LinuxI2CError> {
        let device = LinuxI2CDevice::new(path, address)?;
        Ok(Scd41::new(device, ThreadDelay))
    }
}

/// Implementation of SCD41 related
/// operations
///
impl<T: Transport, D: Delay> Scd41<T, D> {
    pub fn new(transport: T, delay: D) -> Self {
        Scd41 { transport, delay }
    }

    pub fn release(self) -> (T, D) {
        (self.transport, self.delay)
    }

    fn send(&mut self, command: Command, frame: Frame) -> Result<(), Scd41Error> {
        let bytes = frame.as_bytes();
        let written = self
            .transport
            .write(bytes)
            .map_err(|e| Scd41Error::Io(Box::new(e)))?;
        if written != bytes.len() {
            return Err(Scd41Error::ShortWrite {
                expected: bytes.len(),
                written,
            });
        }
        self.delay.delay(command.execution_time());
        Ok(())
    }

    fn receive<const N: usize>(&mut self) -> Result<[u8; N], Scd41Error> {
        let mut data = [0u8; N];
        let read = self
            .transport
            .read(&mut data)
            .map_err(|e| Scd41Error::Io(Box::new(e)))?;
        if read != N {
            return Err(Scd41Error::ShortRead { expected: N, read });
        }
        Ok(data)
    }

    fn exchange<const N: usize>(&mut self, command: Command) -> Result<[u8; N], Scd41Error> {
        debug_assert_eq!(N, command.response_len());
        self.send(command, command.frame())?;
        self.receive()
    }

    /// Reads the sensor variant, checksum validated.
    pub fn get_sensor_variant(&mut self) -> Result<SensorVariant, Scd41Error> {
        let data = self.exchange::<3>(Command::GetSensorVariant)?;
        decode_variant(&data)
    }

    /// Runs the on-chip self-test, about 10 seconds.
    /// A non-zero answer is returned as `SelfTestFailed` with the raw code.
    pub fn perform_self_test(&mut self) -> Result<(), Scd41Error> {
        let data = self.exchange::<3>(Command::PerformSelfTest)?;
        decode_self_test(&data)
    }

    /// Gets if the device is ready for reading
    /// a measurement. If not, returns false.
    pub fn get_data_ready_status(&mut self) -> Result<bool, Scd41Error> {
        let data = self.exchange::<3>(Command::GetDataReadyStatus)?;
        decode_status(&data)
    }

    /// Polls the data-ready status until set, at most 11 queries one second apart.
    pub fn wait_data_ready(&mut self) -> Result<(), Scd41Error> {
        let mut poll = ReadyPoll::default();
        loop {
            let ready = self.get_data_ready_status()?;
            match poll.observe(ready) {
                PollState::Ready => return Ok(()),
                PollState::Failed => {
                    return Err(Scd41Error::Timeout {
                        attempts: poll.attempts(),
                    })
                }
                PollState::Polling => {
                    debug!("data not ready, attempt {}", poll.attempts());
                    self.delay.delay(DATA_READY_INTERVAL);
                }
            }
        }
    }

    /// Reads the buffered measurement and stamps it with `device` and the current time.
    pub fn read_measurement(&mut self, device: i32) -> Result<Measurement, Scd41Error> {
        let data = self.exchange::<9>(Command::ReadMeasurement)?;
        let reading = decode_measurement(&data)?;
        Ok(Measurement::new(device, Local::now(), reading))
    }

    /// Triggers one measurement and waits for it to complete.
    pub fn measure_single_shot(&mut self) -> Result<(), Scd41Error> {
        self.send(Command::MeasureSingleShot, Command::MeasureSingleShot.frame())
    }

    pub fn start_periodic_measurement(&mut self) -> Result<(), Scd41Error> {
        self.send(
            Command::StartPeriodicMeasurement,
            Command::StartPeriodicMeasurement.frame(),
        )
    }

    pub fn stop_periodic_measurement(&mut self) -> Result<(), Scd41Error> {
        self.send(
            Command::StopPeriodicMeasurement,
            Command::StopPeriodicMeasurement.frame(),
        )
    }

    /// Forced recalibration against a known reference concentration.
    /// Periodic measurement must be stopped beforehand.
    /// Returns the applied correction in ppm.
    pub fn perform_forced_recalibration(&mut self, target_ppm: u16) -> Result<i32, Scd41Error> {
        let frame = forced_recalibration_frame(target_ppm);
        debug!("perform_forced_recalibration write {:02x?}", frame.as_bytes());
        self.send(Command::PerformForcedRecalibration, frame)?;
        debug_assert_eq!(3, Command::PerformForcedRecalibration.response_len());
        let data = self.receive::<3>()?;
        debug!("perform_forced_recalibration read {:02x?}", data);
        decode_frc(&data)
    }
}
