// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

/// Generator polynomial, x^8 + x^5 + x^4 + 1.
pub const CRC8_POLYNOMIAL: u8 = 0x31;
/// Initial accumulator value.
pub const CRC8_INIT: u8 = 0xFF;

/// Checksum function for every 2-byte word exchanged with the sensor.
///
/// CRC-8 with polynomial 0x31 and seed 0xFF, no reflection and no final XOR.
/// More info regarding the [algorithm](https://en.wikipedia.org/wiki/Computation_of_cyclic_redundancy_checks)
///
pub fn crc8(message: &[u8]) -> u8 {
    let mut rem = CRC8_INIT;
    for byte in message {
        rem ^= byte;
        for _ in 0..8 {
            if (rem & 0x80) != 0 {
                rem = (rem << 1) ^ CRC8_POLYNOMIAL;
            } else {
                rem <<= 1;
            }
        }
    }
    rem
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datasheet_vector() {
        assert_eq!(crc8(&[0xBE, 0xEF]), 0x92);
    }

    #[test]
    fn empty_message_is_seed() {
        assert_eq!(crc8(&[]), CRC8_INIT);
    }

    #[test]
    fn known_vectors() {
        assert_eq!(crc8(&[0x42]), 0xF3);
        assert_eq!(crc8(&[0xBE, 0xEF, 0x42]), 0x04);
        assert_eq!(crc8(&[0x00, 0x00]), 0x81);
    }

    #[test]
    fn no_state_between_calls() {
        let first = crc8(&[0x12, 0x34]);
        crc8(&[0xFF, 0xFF, 0xFF]);
        assert_eq!(crc8(&[0x12, 0x34]), first);
    }
}
