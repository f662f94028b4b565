//! CRC16-CCITT checksum used by EMV-QR payloads.
//!
//! The variant is CCITT-FALSE: polynomial `0x1021`, initial register
//! `0xFFFF`, bits fed most-significant first, no reflection and no final XOR.

/// Generator polynomial.
pub const POLYNOMIAL: u16 = 0x1021;

/// Initial register value.
pub const INITIAL: u16 = 0xFFFF;

/// Compute the CRC16-CCITT of `input`.
///
/// Each character contributes only the low 8 bits of its code point, so a
/// stray non-ASCII character cannot push wider values through the bit loop.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn crc16(input: &str) -> u16 {
    input
        .chars()
        .map(|c| (u32::from(c) & 0xFF) as u8)
        .fold(INITIAL, update)
}

/// Feed one byte into the register.
fn update(mut crc: u16, byte: u8) -> u16 {
    for j in 0..8 {
        let bit = (byte >> (7 - j)) & 1 == 1;
        let c15 = (crc >> 15) & 1 == 1;
        crc <<= 1;
        if c15 != bit {
            crc ^= POLYNOMIAL;
        }
    }
    crc
}

/// Compute the CRC16-CCITT of `input` as four uppercase hex digits.
#[must_use]
pub fn crc16_hex(input: &str) -> String {
    format!("{:04X}", crc16(input))
}
