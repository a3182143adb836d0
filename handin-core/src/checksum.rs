//! Frame checksum algorithm
//!
//! 16-bit one's-complement sum, the same family as the Internet checksum:
//! 1. Sum the bytes as unsigned 16-bit little-endian words
//! 2. A trailing odd byte is added on its own
//! 3. Fold the carries back into the low 16 bits
//! 4. Take ones-complement: ~sum
//!
//! This detects any single-byte corruption but is not a cryptographic
//! integrity check.

use byteorder::{ByteOrder, LittleEndian};
use tracing::trace;

use crate::constants::layout;
use crate::error::{Error, Result};

/// Calculate the checksum of `data`
///
/// # Algorithm
///
/// ```text
/// 1. sum = Σ u16::from_le_bytes([data[i], data[i + 1]])  (i even)
/// 2. if len is odd: sum += data[len - 1]
/// 3. while sum > 0xFFFF: sum = (sum >> 16) + (sum & 0xFFFF)
/// 4. return !sum as u16
/// ```
///
/// # Examples
///
/// ```
/// use handin_core::checksum;
///
/// assert_eq!(checksum::checksum16(&[]), 0xFFFF);
/// assert_eq!(checksum::checksum16(&[0x01, 0x02]), !0x0201);
/// ```
pub fn checksum16(data: &[u8]) -> u16 {
    // Wide accumulator so long inputs never overflow before folding
    let mut sum: u64 = 0;

    for chunk in data.chunks(2) {
        let word = if chunk.len() == 2 {
            LittleEndian::read_u16(chunk) as u64
        } else {
            // Odd byte - added as a standalone value
            chunk[0] as u64
        };

        sum += word;
    }

    while sum > 0xFFFF {
        sum = (sum >> 16) + (sum & 0xFFFF);
    }

    let checksum = !(sum as u16);

    trace!(
        len = data.len(),
        checksum = format!("0x{:04X}", checksum),
        "Calculated checksum"
    );

    checksum
}

/// Read the checksum stored in a frame
///
/// Caller guarantees the frame covers the checksum slot.
pub fn stored(frame: &[u8]) -> u16 {
    LittleEndian::read_u16(&frame[layout::CHECKSUM.range()])
}

/// Recompute the checksum of a frame as if its checksum slot were zero
///
/// Works on a copy, so the frame is left untouched.
pub fn calculate_frame(frame: &[u8]) -> u16 {
    let mut scratch = frame.to_vec();
    scratch[layout::CHECKSUM.range()].fill(0);
    checksum16(&scratch)
}

/// Verify the checksum of one complete frame
///
/// Only `frame` is covered; callers scanning a larger buffer must pass
/// the slice of a single frame.
pub fn verify_frame(frame: &[u8]) -> Result<()> {
    if frame.len() < layout::HEADER_LEN {
        return Err(Error::FrameTooShort {
            expected: layout::HEADER_LEN,
            actual: frame.len(),
        });
    }

    let received = stored(frame);
    let expected = calculate_frame(frame);

    if expected != received {
        return Err(Error::ChecksumMismatch { expected, received });
    }

    Ok(())
}
