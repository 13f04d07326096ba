// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::error::Error;
use std::time::Duration;
use std::thread;

use i2cdev::core::*;
use i2cdev::linux::{LinuxI2CDevice, LinuxI2CError};

/// Duplex byte channel to a sensor already opened at its bus address.
pub trait Transport {
    type Error: Error + Send + Sync + 'static;

    /// Writes the whole frame, returning the number of bytes accepted.
    fn write(&mut self, bytes: &[u8]) -> Result<usize, Self::Error>;

    /// Fills `buffer`, returning the number of bytes received.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Linux i2c-dev character device, the transfer is all or nothing.
impl Transport for LinuxI2CDevice {
    type Error = LinuxI2CError;

    fn write(&mut self, bytes: &[u8]) -> Result<usize, LinuxI2CError> {
        I2CDevice::write(self, bytes)?;
        Ok(bytes.len())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, LinuxI2CError> {
        I2CDevice::read(self, buffer)?;
        Ok(buffer.len())
    }
}

/// Blocking pause between a command and its response.
pub trait Delay {
    fn delay(&mut self, duration: Duration);
}

/// Sleeps the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay(&mut self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::VecDeque;
    use std::fmt;
    use std::time::Duration;

    use super::{Delay, Transport};

    #[derive(Debug)]
    pub(crate) struct MockError(pub &'static str);

    impl fmt::Display for MockError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl std::error::Error for MockError {}

    /// Scripted bus: records every written frame and replays queued responses.
    #[derive(Debug, Default)]
    pub(crate) struct MockBus {
        pub writes: Vec<Vec<u8>>,
        pub responses: VecDeque<Vec<u8>>,
        /// Writes starting with this opcode fail.
        pub fail_opcode: Option<[u8; 2]>,
        /// Writes starting with this opcode report one byte written.
        pub short_opcode: Option<[u8; 2]>,
    }

    impl MockBus {
        pub(crate) fn respond(&mut self, bytes: &[u8]) -> &mut Self {
            self.responses.push_back(bytes.to_vec());
            self
        }

        pub(crate) fn count(&self, opcode: [u8; 2]) -> usize {
            self.writes.iter().filter(|w| w[..2] == opcode).count()
        }
    }

    impl Transport for MockBus {
        type Error = MockError;

        fn write(&mut self, bytes: &[u8]) -> Result<usize, MockError> {
            self.writes.push(bytes.to_vec());
            if self.fail_opcode.is_some_and(|op| bytes[..2] == op) {
                return Err(MockError("nack"));
            }
            if self.short_opcode.is_some_and(|op| bytes[..2] == op) {
                return Ok(1);
            }
            Ok(bytes.len())
        }

        fn read(&mut self, buffer: &mut [u8]) -> Result<usize, MockError> {
            let response = self
                .responses
                .pop_front()
                .ok_or(MockError("no response queued"))?;
            let n = response.len().min(buffer.len());
            buffer[..n].copy_from_slice(&response[..n]);
            Ok(n)
        }
    }

    /// Records pauses instead of sleeping.
    #[derive(Debug, Default)]
    pub(crate) struct NoDelay {
        pub pauses: Vec<Duration>,
    }

    impl Delay for NoDelay {
        fn delay(&mut self, duration: Duration) {
            self.pauses.push(duration);
        }
    }
}
