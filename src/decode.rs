// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Response decoding. Every function validates the checksum of each
//! 3 byte group before any value is derived from it.

use crate::crc::crc8;
use crate::error::Scd41Error;
use crate::measurement::Reading;

/// Low 11 bits of the data-ready word; non-zero means a measurement is waiting.
pub const DATA_READY_MASK: u16 = 0x07FF;

/// Offset subtracted from the forced recalibration response.
pub const FRC_CORRECTION_OFFSET: i32 = 0x8000;

/// SCD4x family member reported by get_sensor_variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorVariant {
    Scd40,
    Scd41,
    Scd43,
    Unknown(u16),
}

/// Validates one group and returns its big endian data word.
fn checked_word(group: &[u8]) -> Result<u16, Scd41Error> {
    let computed = crc8(&group[..2]);
    if computed != group[2] {
        return Err(Scd41Error::ChecksumError {
            computed,
            received: group[2],
        });
    }
    Ok(u16::from_be_bytes([group[0], group[1]]))
}

/// Data-ready status, true once a measurement can be read.
pub fn decode_status(data: &[u8; 3]) -> Result<bool, Scd41Error> {
    let status = checked_word(data)?;
    Ok(status & DATA_READY_MASK != 0)
}

/// CO2, temperature and humidity from the 9 byte read_measurement response.
/// All three groups must pass their checksum.
pub fn decode_measurement(data: &[u8; 9]) -> Result<Reading, Scd41Error> {
    let co2 = checked_word(&data[0..3])?;
    let temperature = checked_word(&data[3..6])?;
    let humidity = checked_word(&data[6..9])?;

    Ok(Reading {
        co2_ppm: co2,
        temperature_celsius: convert_temperature(temperature),
        humidity_percent: convert_humidity(humidity),
    })
}

/// T = -45 + 175 * word / (2^16 - 1)
pub fn convert_temperature(word: u16) -> f32 {
    (-45.0 + 175.0 * (word as f64 / 65535.0)) as f32
}

/// RH = 100 * word / (2^16 - 1)
pub fn convert_humidity(word: u16) -> f32 {
    (100.0 * (word as f64 / 65535.0)) as f32
}

/// Variant word, bits 15..12 select the family member.
pub fn decode_variant(data: &[u8; 3]) -> Result<SensorVariant, Scd41Error> {
    let word = checked_word(data)?;
    Ok(match word >> 12 {
        0b0000 => SensorVariant::Scd40,
        0b0001 => SensorVariant::Scd41,
        0b0101 => SensorVariant::Scd43,
        _ => SensorVariant::Unknown(word),
    })
}

/// Ok when the self-test word is zero, otherwise the raw failure code.
pub fn decode_self_test(data: &[u8; 3]) -> Result<(), Scd41Error> {
    match checked_word(data)? {
        0 => Ok(()),
        code => Err(Scd41Error::SelfTestFailed(code)),
    }
}

/// FRC correction in ppm. `0xFFFF` is the failure sentinel and wins over the checksum.
pub fn decode_frc(data: &[u8; 3]) -> Result<i32, Scd41Error> {
    if data[0] == 0xFF && data[1] == 0xFF {
        return Err(Scd41Error::RecalibrationFailed);
    }
    let word = checked_word(data)?;
    Ok(word as i32 - FRC_CORRECTION_OFFSET)
}
