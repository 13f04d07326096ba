// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::error::Error;
use std::fmt;

///
///SCD41 error enum. Io wraps whatever the transport
///reports, ShortWrite and ShortRead when the byte count
///does not match the frame, ChecksumError when a crc 8
///checksum does not correspond with the calculated one,
///the sensor-reported failures and the data-ready timeout.
///
#[derive(Debug)]
pub enum Scd41Error {
    /// Error raised by the underlying transport
    Io(Box<dyn Error + Send + Sync>),
    /// Fewer bytes were written than the command frame holds
    ShortWrite { expected: usize, written: usize },
    /// Fewer bytes were read than the response frame holds
    ShortRead { expected: usize, read: usize },
    /// ChecksumError when the checksum does not correspond to calculated checksum using crc
    /// algorithm
    ChecksumError { computed: u8, received: u8 },
    /// Self-test reported a non-zero, manufacturer-defined code
    SelfTestFailed(u16),
    /// Forced recalibration answered with the 0xFFFF failure sentinel
    RecalibrationFailed,
    /// Data-ready never came up within the retry budget
    Timeout { attempts: u32 },
}

///Implementation of display for Scd41Error
impl fmt::Display for Scd41Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Scd41Error::Io(ref e) => fmt::Display::fmt(e, f),
            Scd41Error::ShortWrite { expected, written } => {
                write!(f, "write() returned {written}, expected {expected}")
            }
            Scd41Error::ShortRead { expected, read } => {
                write!(f, "read() returned {read}, expected {expected}")
            }
            Scd41Error::ChecksumError { computed, received } => write!(
                f,
                "Checksum Error found: computed 0x{computed:02x}, received 0x{received:02x}"
            ),
            Scd41Error::SelfTestFailed(code) => write!(f, "self-test failed with 0x{code:04x}"),
            Scd41Error::RecalibrationFailed => {
                fmt::Display::fmt("sensor reported forced recalibration failure", f)
            }
            Scd41Error::Timeout { attempts } => {
                write!(f, "SCD41 not ready after {attempts} attempts")
            }
        }
    }
}

///Implementation for Error to SCD41
impl Error for Scd41Error {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Scd41Error::Io(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn display_names_counts() {
        let e = Scd41Error::ShortRead {
            expected: 9,
            read: 3,
        };
        assert_eq!(e.to_string(), "read() returned 3, expected 9");
    }

    #[test]
    fn io_error_is_source() {
        let e = Scd41Error::Io(Box::new(io::Error::new(io::ErrorKind::Other, "nack")));
        assert_eq!(e.to_string(), "nack");
        assert!(e.source().is_some());
        assert!(Scd41Error::RecalibrationFailed.source().is_none());
    }
}
