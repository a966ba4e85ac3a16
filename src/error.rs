//! Error types for ledger-ssh-agent.
//!
//! One enum per failure category. Everything that can go wrong in an
//! exchange is returned as a tagged error, never as an empty buffer.

use std::time::Duration;

use thiserror::Error;

use crate::protocol::StatusWord;

/// HID framing violations found while reassembling a response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FramingError {
    /// Channel id of a frame did not match the protocol constant.
    #[error("invalid channel 0x{found:04x} (expected 0x{expected:04x})")]
    ChannelMismatch { expected: u16, found: u16 },

    /// Tag byte of a frame did not match the protocol constant.
    #[error("invalid tag 0x{found:02x} (expected 0x{expected:02x})")]
    TagMismatch { expected: u8, found: u8 },

    /// Frame arrived out of order.
    #[error("invalid sequence {found} (expected {expected})")]
    SequenceMismatch { expected: u16, found: u16 },

    /// Input ended inside a continuation frame.
    #[error("frame truncated: needed {needed} more bytes, {remaining} available")]
    Truncated { needed: usize, remaining: usize },

    /// Command does not fit the 16-bit length field of the first frame.
    #[error("message of {0} bytes exceeds the 16-bit frame length field")]
    TooLarge(usize),

    /// Reassembled response is too short to carry a status word.
    #[error("response of {0} bytes has no status word")]
    MissingStatus(usize),
}

/// Failures of the underlying device transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A report could not be written to the device.
    #[error("write to device failed: {0}")]
    WriteFailed(#[source] std::io::Error),

    /// Reading from the device failed outright.
    #[error("read from device failed: {0}")]
    ReadFailed(#[source] std::io::Error),

    /// No complete response within the deadline (usually: not confirmed on device).
    #[error("no response from device within {0:?}")]
    Timeout(Duration),
}

/// Device answered with a non-success status word.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("device returned status {status}: {}", status.cause())]
pub struct StatusError {
    pub status: StatusWord,
}

/// Malformed inbound agent messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Message ended before a field could be read.
    #[error("unexpected end of message: needed {needed} bytes, {remaining} available")]
    UnexpectedEof { needed: usize, remaining: usize },

    /// Operation selector length was zero.
    #[error("empty agent message")]
    EmptyMessage,

    /// Opcode is not handled by this agent.
    #[error("unsupported agent opcode {0}")]
    UnknownOpcode(u8),

    /// Declared length exceeds the agent message limit.
    #[error("agent message of {0} bytes exceeds limit")]
    TooLarge(usize),
}

/// Malformed device payloads and invalid curve data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Compressed point is not on the curve or has a bad prefix.
    #[error("invalid compressed curve point")]
    InvalidPoint,

    /// Public key response shorter than `len ‖ 0x04 ‖ X ‖ Y`.
    #[error("public key response of {0} bytes is malformed")]
    MalformedPublicKey(usize),

    /// Signature response does not hold the R/S fields it declares.
    #[error("signature response is malformed: needed {needed} bytes, {remaining} available")]
    MalformedSignature { needed: usize, remaining: usize },

    /// Command payload larger than a single APDU allows.
    #[error("command payload of {0} bytes exceeds 255")]
    PayloadTooLarge(usize),
}

/// Identity strings that do not parse.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identity has no host: {0:?}")]
    MissingHost(String),

    #[error("invalid port in identity {0:?}")]
    InvalidPort(String),

    #[error("no identity at index {0}")]
    NoSuchIdentity(usize),
}

/// Main error type for all agent operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Framing(#[from] FramingError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Status(#[from] StatusError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// I/O error on the agent socket or config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True when the device simply was not confirmed in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Transport(TransportError::Timeout(_)))
    }
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
