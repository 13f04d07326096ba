// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;

use chrono::{DateTime, Local, Timelike};

/// Physical values decoded from one checksummed measurement response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub co2_ppm: u16,
    pub temperature_celsius: f32,
    pub humidity_percent: f32,
}

/// One SCD41 reading as handed to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Device and measurement condition identifier
    pub device: i32,

    /// Read completion time, whole seconds
    pub measured_at: DateTime<Local>,

    pub co2_ppm: u16,

    pub temperature_celsius: f32,

    pub humidity_percent: f32,

    pub status: i32,
}

impl Measurement {
    pub fn new(device: i32, measured_at: DateTime<Local>, reading: Reading) -> Self {
        Measurement {
            device,
            measured_at: measured_at.with_nanosecond(0).unwrap_or(measured_at),
            co2_ppm: reading.co2_ppm,
            temperature_celsius: reading.temperature_celsius,
            humidity_percent: reading.humidity_percent,
            status: 0,
        }
    }

    /// Text line appended when the store rejects the measurement.
    pub fn fallback_record(&self) -> FallbackRecord<'_> {
        FallbackRecord(self)
    }
}

/// `device,"timestamp",co2,temperature,humidity,status` followed by a newline.
pub struct FallbackRecord<'a>(&'a Measurement);

impl fmt::Display for FallbackRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.0;
        writeln!(
            f,
            "{},\"{}\",{},{:.4},{:.4},{}",
            m.device,
            m.measured_at.format("%Y-%m-%d %H:%M:%S"),
            m.co2_ppm,
            m.temperature_celsius,
            m.humidity_percent,
            m.status
        )
    }
}
