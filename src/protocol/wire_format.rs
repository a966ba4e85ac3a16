//! HID frame wire format.
//!
//! Every transport unit is 64 bytes. The first frame of a message carries
//! the total message length; continuation frames do not:
//! ```text
//! first:  ┌─────────┬─────┬──────────┬──────────┬──────────────┐
//!         │ Channel │ Tag │ Sequence │ Length   │ Data (57)    │
//!         │ u16 BE  │ u8  │ u16 BE   │ u16 BE   │              │
//!         └─────────┴─────┴──────────┴──────────┴──────────────┘
//! next:   ┌─────────┬─────┬──────────┬─────────────────────────┐
//!         │ Channel │ Tag │ Sequence │ Data (59)               │
//!         └─────────┴─────┴──────────┴─────────────────────────┘
//! ```
//!
//! All multi-byte integers are Big Endian.

use crate::codec::{Cursor, OutOfBounds};
use crate::error::FramingError;

/// Transport unit size in bytes.
pub const PACKET_SIZE: usize = 64;

/// Channel id carried by every frame.
pub const CHANNEL: u16 = 0x0101;

/// Tag byte carried by every frame.
pub const TAG: u8 = 0x05;

/// Header size of a continuation frame (channel + tag + sequence).
pub const HEADER_SIZE: usize = 5;

/// Header size of the first frame (continuation header + length).
pub const FIRST_HEADER_SIZE: usize = HEADER_SIZE + 2;

/// Usable payload of the first frame.
pub const FIRST_DATA_SIZE: usize = PACKET_SIZE - FIRST_HEADER_SIZE;

/// Usable payload of a continuation frame.
pub const CONTINUATION_DATA_SIZE: usize = PACKET_SIZE - HEADER_SIZE;

/// Report id prepended to every unit written to the device.
pub const REPORT_ID: u8 = 0x00;

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub channel: u16,
    pub tag: u8,
    pub sequence: u16,
}

impl FrameHeader {
    /// Header for frame `sequence` of a message.
    pub fn new(sequence: u16) -> Self {
        Self {
            channel: CHANNEL,
            tag: TAG,
            sequence,
        }
    }

    /// Encode into the first `HEADER_SIZE` bytes of `buf`.
    ///
    /// # Panics
    ///
    /// Panics if buffer is smaller than `HEADER_SIZE` (5 bytes).
    pub fn encode_into(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= HEADER_SIZE);
        buf[0..2].copy_from_slice(&self.channel.to_be_bytes());
        buf[2] = self.tag;
        buf[3..5].copy_from_slice(&self.sequence.to_be_bytes());
    }

    /// Read a header from the cursor without validating it.
    pub fn decode(cursor: &mut Cursor) -> Result<Self, OutOfBounds> {
        Ok(Self {
            channel: cursor.read_u16()?,
            tag: cursor.read_u8()?,
            sequence: cursor.read_u16()?,
        })
    }

    /// Check the constant fields and the expected sequence number.
    pub fn validate(&self, expected_sequence: u16) -> Result<(), FramingError> {
        if self.channel != CHANNEL {
            return Err(FramingError::ChannelMismatch {
                expected: CHANNEL,
                found: self.channel,
            });
        }
        if self.tag != TAG {
            return Err(FramingError::TagMismatch {
                expected: TAG,
                found: self.tag,
            });
        }
        if self.sequence != expected_sequence {
            return Err(FramingError::SequenceMismatch {
                expected: expected_sequence,
                found: self.sequence,
            });
        }
        Ok(())
    }
}

/// Raw bytes needed to carry a message of `length` bytes, last frame unpadded.
pub fn framed_len(length: usize) -> usize {
    if length <= FIRST_DATA_SIZE {
        return FIRST_HEADER_SIZE + length;
    }
    let rest = length - FIRST_DATA_SIZE;
    let continuations = rest.div_ceil(CONTINUATION_DATA_SIZE);
    FIRST_HEADER_SIZE + length + continuations * HEADER_SIZE
}
