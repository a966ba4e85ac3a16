//! Response reassembly.
//!
//! [`unpack`] reassembles one message from raw frames. It is a pure function
//! of its input: called on a growing buffer it keeps answering
//! [`Unpacked::Incomplete`] until every frame the declared length requires
//! is present, then returns the message.
//!
//! [`FrameBuffer`] accumulates reads from the device and re-runs `unpack`
//! over the whole accumulated buffer after every append.
//!
//! # Example
//!
//! ```
//! use ledger_ssh_agent::protocol::{pack_to_bytes, FrameBuffer, Unpacked};
//!
//! let raw = pack_to_bytes(b"hello").unwrap();
//! let mut buffer = FrameBuffer::new();
//!
//! assert_eq!(buffer.push(&raw[..3]).unwrap(), Unpacked::Incomplete);
//! match buffer.push(&raw[3..]).unwrap() {
//!     Unpacked::Complete(message) => assert_eq!(&message[..], b"hello"),
//!     Unpacked::Incomplete => unreachable!(),
//! }
//! ```

use bytes::{Bytes, BytesMut};

use super::wire_format::{
    framed_len, FrameHeader, CONTINUATION_DATA_SIZE, FIRST_DATA_SIZE, FIRST_HEADER_SIZE,
    PACKET_SIZE,
};
use crate::codec::Cursor;
use crate::error::FramingError;

/// Outcome of a reassembly attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unpacked {
    /// More bytes are needed. Not an error.
    Incomplete,
    /// The whole message.
    Complete(Bytes),
}

/// Reassemble one message from `raw`.
///
/// Validates channel, tag and sequence of every frame it reads. Bytes past
/// the declared length (padding, trailing frames) are never read.
pub fn unpack(raw: &[u8]) -> Result<Unpacked, FramingError> {
    if raw.len() < FIRST_HEADER_SIZE {
        return Ok(Unpacked::Incomplete);
    }

    let mut cursor = Cursor::new(Bytes::copy_from_slice(raw));

    let mut sequence = 0u16;
    FrameHeader::decode(&mut cursor)?.validate(sequence)?;
    let length = cursor.read_u16()? as usize;

    if raw.len() < framed_len(length) {
        return Ok(Unpacked::Incomplete);
    }

    let mut message = BytesMut::with_capacity(length);
    let block = length.min(FIRST_DATA_SIZE);
    message.extend_from_slice(&cursor.read_bytes(block)?);

    // A message that continues fills the first frame, so no padding to skip.
    while message.len() < length {
        sequence = sequence.wrapping_add(1);
        FrameHeader::decode(&mut cursor)?.validate(sequence)?;

        let block = (length - message.len()).min(CONTINUATION_DATA_SIZE);
        message.extend_from_slice(&cursor.read_bytes(block)?);
    }

    Ok(Unpacked::Complete(message.freeze()))
}

/// Accumulates device reads until a whole message can be reassembled.
#[derive(Debug)]
pub struct FrameBuffer {
    /// Accumulated bytes from device reads.
    buffer: BytesMut,
}

impl FrameBuffer {
    /// Create an empty buffer sized for a few transport units.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4 * PACKET_SIZE),
        }
    }

    /// Append `data` and try to reassemble the whole buffer.
    pub fn push(&mut self, data: &[u8]) -> Result<Unpacked, FramingError> {
        self.buffer.extend_from_slice(data);
        unpack(&self.buffer)
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop all buffered bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
