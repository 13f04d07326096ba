// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::time::Duration;

use crate::crc::crc8;

/// Commands understood by the SCD41 used by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    GetSensorVariant,
    PerformSelfTest,
    GetDataReadyStatus,
    ReadMeasurement,
    MeasureSingleShot,
    StartPeriodicMeasurement,
    StopPeriodicMeasurement,
    PerformForcedRecalibration,
}

impl Command {
    /// 2 byte opcode, sent big endian.
    pub fn opcode(&self) -> [u8; 2] {
        match self {
            Command::GetSensorVariant => [0x20, 0x2F],
            Command::PerformSelfTest => [0x36, 0x39],
            Command::GetDataReadyStatus => [0xE4, 0xB8],
            Command::ReadMeasurement => [0xEC, 0x05],
            Command::MeasureSingleShot => [0x21, 0x9D],
            Command::StartPeriodicMeasurement => [0x21, 0xB1],
            Command::StopPeriodicMeasurement => [0x3F, 0x86],
            Command::PerformForcedRecalibration => [0x36, 0x2F],
        }
    }

    /// Number of bytes the sensor answers with, 0 for write-only commands.
    pub fn response_len(&self) -> usize {
        match self {
            Command::GetSensorVariant
            | Command::PerformSelfTest
            | Command::GetDataReadyStatus
            | Command::PerformForcedRecalibration => 3,
            Command::ReadMeasurement => 9,
            Command::MeasureSingleShot
            | Command::StartPeriodicMeasurement
            | Command::StopPeriodicMeasurement => 0,
        }
    }

    /// Time to wait after the write before the sensor can be read or addressed again.
    pub fn execution_time(&self) -> Duration {
        match self {
            Command::GetSensorVariant => Duration::from_millis(100),
            Command::PerformSelfTest => Duration::from_millis(10_000),
            Command::GetDataReadyStatus => Duration::from_millis(1),
            Command::ReadMeasurement => Duration::from_millis(1),
            Command::MeasureSingleShot => Duration::from_millis(5_000),
            Command::StartPeriodicMeasurement => Duration::ZERO,
            Command::StopPeriodicMeasurement => Duration::from_millis(500),
            Command::PerformForcedRecalibration => Duration::from_millis(400),
        }
    }

    /// Frame for a command without write data.
    pub fn frame(&self) -> Frame {
        let [hi, lo] = self.opcode();
        Frame {
            bytes: [hi, lo, 0, 0, 0],
            len: 2,
        }
    }
}

/// Outgoing bytes for one command: opcode, and for write commands the
/// data word followed by its checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    bytes: [u8; 5],
    len: usize,
}

impl Frame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

/// Builds the 5 byte forced recalibration frame.
///
/// The checksum covers the target word only, not the opcode.
pub fn forced_recalibration_frame(target_ppm: u16) -> Frame {
    let [hi, lo] = Command::PerformForcedRecalibration.opcode();
    let target = target_ppm.to_be_bytes();
    Frame {
        bytes: [hi, lo, target[0], target[1], crc8(&target)],
        len: 5,
    }
}
