//! CRC-16/MCRF4XX checksum for frame integrity.
//!
//! MAVLink calls this the X.25 checksum. It detects wire corruption only; it
//! gives no authenticity.
//!
//! # Parameters (CRC-16/MCRF4XX)
//!
//! | Parameter | Value |
//! |-----------|-------|
//! | Polynomial | 0x1021 (0x8408 reflected) |
//! | Init | 0xFFFF |
//! | RefIn | true |
//! | RefOut | true |
//! | XorOut | 0x0000 |
//!
//! # Test Vector
//!
//! ```
//! use mavpack_frame::crc::crc16_mcrf4xx;
//!
//! assert_eq!(crc16_mcrf4xx(b"123456789"), 0x6F91);
//! ```

/// Initial value for CRC calculation.
pub const INIT: u16 = 0xFFFF;

/// Fold one byte into a running checksum.
#[inline]
#[must_use]
pub fn accumulate(byte: u8, crc: u16) -> u16 {
    let mut t = byte ^ (crc & 0xFF) as u8;
    t ^= t << 4;
    let t = u16::from(t);
    (crc >> 8) ^ (t << 8) ^ (t << 3) ^ (t >> 4)
}

/// Calculate CRC-16/MCRF4XX over `data`.
#[inline]
#[must_use]
pub fn crc16_mcrf4xx(data: &[u8]) -> u16 {
    crc16_mcrf4xx_update(INIT, data)
}

/// Update an existing CRC with more data.
#[inline]
#[must_use]
pub fn crc16_mcrf4xx_update(crc: u16, data: &[u8]) -> u16 {
    data.iter().fold(crc, |crc, &byte| accumulate(byte, crc))
}
