//! Frame type and message fragmentation.
//!
//! A message (an encoded command, or a device response) is split into
//! sequence-numbered 64-byte frames. Every frame is zero-padded to the full
//! transport unit.
//!
//! # Example
//!
//! ```
//! use ledger_ssh_agent::protocol::{pack, PACKET_SIZE};
//!
//! let frames = pack(&[0xAB; 100]).unwrap();
//! assert_eq!(frames.len(), 2);
//! assert_eq!(frames[1].as_bytes().len(), PACKET_SIZE);
//! ```

use bytes::{Bytes, BytesMut};

use super::wire_format::{
    FrameHeader, CONTINUATION_DATA_SIZE, FIRST_DATA_SIZE, FIRST_HEADER_SIZE, HEADER_SIZE,
    PACKET_SIZE, REPORT_ID,
};
use crate::error::FramingError;

/// One transport unit.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: [u8; PACKET_SIZE],
}

impl Frame {
    fn empty() -> Self {
        Self {
            bytes: [0u8; PACKET_SIZE],
        }
    }

    /// The 64 protocol bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Sequence number from the header.
    #[inline]
    pub fn sequence(&self) -> u16 {
        u16::from_be_bytes([self.bytes[3], self.bytes[4]])
    }

    /// The unit as written to the device: report id followed by the frame.
    pub fn to_report(&self) -> [u8; PACKET_SIZE + 1] {
        let mut report = [0u8; PACKET_SIZE + 1];
        report[0] = REPORT_ID;
        report[1..].copy_from_slice(&self.bytes);
        report
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("sequence", &self.sequence())
            .finish_non_exhaustive()
    }
}

/// Split `message` into frames.
///
/// The first frame carries the total length; continuation frames carry
/// only channel, tag and sequence.
pub fn pack(message: &[u8]) -> Result<Vec<Frame>, FramingError> {
    let total = u16::try_from(message.len()).map_err(|_| FramingError::TooLarge(message.len()))?;

    let mut frames = Vec::with_capacity(1 + message.len() / CONTINUATION_DATA_SIZE);

    let mut first = Frame::empty();
    FrameHeader::new(0).encode_into(&mut first.bytes);
    first.bytes[HEADER_SIZE..FIRST_HEADER_SIZE].copy_from_slice(&total.to_be_bytes());
    let n = message.len().min(FIRST_DATA_SIZE);
    first.bytes[FIRST_HEADER_SIZE..FIRST_HEADER_SIZE + n].copy_from_slice(&message[..n]);
    frames.push(first);

    // At most 65535 bytes, so the sequence number always fits.
    for (i, chunk) in message[n..].chunks(CONTINUATION_DATA_SIZE).enumerate() {
        let mut frame = Frame::empty();
        FrameHeader::new((i + 1) as u16).encode_into(&mut frame.bytes);
        frame.bytes[HEADER_SIZE..HEADER_SIZE + chunk.len()].copy_from_slice(chunk);
        frames.push(frame);
    }

    Ok(frames)
}

/// Pack `message` and concatenate the frames into one buffer.
///
/// The result is always a multiple of `PACKET_SIZE`.
pub fn pack_to_bytes(message: &[u8]) -> Result<Bytes, FramingError> {
    let frames = pack(message)?;
    let mut buf = BytesMut::with_capacity(frames.len() * PACKET_SIZE);
    for frame in &frames {
        buf.extend_from_slice(frame.as_bytes());
    }
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{CHANNEL, TAG};

    #[test]
    fn test_single_frame_layout() {
        let frames = pack(b"\x80\x02\x00\x01\x00").unwrap();
        assert_eq!(frames.len(), 1);

        let bytes = frames[0].as_bytes();
        assert_eq!(&bytes[0..2], &CHANNEL.to_be_bytes());
        assert_eq!(bytes[2], TAG);
        assert_eq!(&bytes[3..5], &[0, 0]);
        assert_eq!(&bytes[5..7], &[0, 5]);
        assert_eq!(&bytes[7..12], b"\x80\x02\x00\x01\x00");
        assert!(bytes[12..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_empty_message_still_has_header_frame() {
        let frames = pack(&[]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0].as_bytes()[5..7], &[0, 0]);
    }

    #[test]
    fn test_exact_first_frame_fit() {
        let frames = pack(&[0x11; FIRST_DATA_SIZE]).unwrap();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].as_bytes()[FIRST_HEADER_SIZE..]
            .iter()
            .all(|&b| b == 0x11));
    }

    #[test]
    fn test_continuation_frames_increment_sequence() {
        let message: Vec<u8> = (0..200u16).map(|i| i as u8).collect();
        let frames = pack(&message).unwrap();

        // 57 + 59 + 59 + 25
        assert_eq!(frames.len(), 4);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.sequence(), i as u16);
        }

        let second = frames[1].as_bytes();
        assert_eq!(&second[0..5], &[0x01, 0x01, 0x05, 0x00, 0x01]);
        assert_eq!(&second[5..], &message[57..116]);

        let last = frames[3].as_bytes();
        assert_eq!(&last[5..30], &message[175..200]);
        assert!(last[30..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_too_large_message_rejected() {
        let message = vec![0u8; 70_000];
        assert_eq!(pack(&message).unwrap_err(), FramingError::TooLarge(70_000));
    }

    #[test]
    fn test_report_prefix() {
        let frames = pack(b"x").unwrap();
        let report = frames[0].to_report();
        assert_eq!(report.len(), 65);
        assert_eq!(report[0], REPORT_ID);
        assert_eq!(&report[1..], frames[0].as_bytes());
    }

    #[test]
    fn test_pack_to_bytes_is_unit_aligned() {
        for len in [0, 1, 57, 58, 300] {
            let bytes = pack_to_bytes(&vec![7u8; len]).unwrap();
            assert_eq!(bytes.len() % PACKET_SIZE, 0);
        }
    }
}
