//! The additive checksum that trails every telegram.
//!
//! The checksum is the sum of every preceding byte modulo 65536, sent high byte first.

use crate::error::FrameError;

/// Number of checksum bytes at the end of a telegram.
pub const CHECKSUM_LEN: usize = 2;

/// Sum `bytes` modulo 65536.
pub fn checksum(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |sum, &byte| sum.wrapping_add(byte as u16))
}

/// Split a checksum into its wire order.
#[inline]
pub const fn split(sum: u16) -> [u8; CHECKSUM_LEN] {
    sum.to_be_bytes()
}

/// Check the trailing two bytes of `frame` against the sum of everything before them.
pub fn verify(frame: &[u8]) -> Result<(), FrameError> {
    if frame.len() < CHECKSUM_LEN {
        return Err(FrameError::TooShort(frame.len()));
    }
    let (body, trailer) = frame.split_at(frame.len() - CHECKSUM_LEN);
    let expected = checksum(body);
    let received = u16::from_be_bytes([trailer[0], trailer[1]]);
    if expected != received {
        return Err(FrameError::ChecksumMismatch { expected, received });
    }
    Ok(())
}
