//! Device commands.
//!
//! ```text
//! ┌─────┬─────┬────┬────┬─────┬──────────────┐
//! │ CLA │ INS │ P1 │ P2 │ Lc  │ Data (≤ 255) │
//! └─────┴─────┴────┴────┴─────┴──────────────┘
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::CodecError;

/// Largest payload a single command can carry.
pub const MAX_PAYLOAD: usize = 0xFF;

/// Instruction class of the SSH/PGP agent application.
pub const CLA: u8 = 0x80;

/// Instruction codes.
pub mod ins {
    /// Return the public key for a derivation path.
    pub const GET_PUBLIC_KEY: u8 = 0x02;
    /// Sign a (possibly chunked) challenge.
    pub const SIGN: u8 = 0x04;
}

/// P2 flag marking the challenge as an SSH authentication request.
pub const P2_SSH: u8 = 0x80;

/// An immutable device command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    cla: u8,
    ins: u8,
    p1: u8,
    p2: u8,
    payload: Bytes,
}

impl Command {
    /// Create a command, rejecting payloads that do not fit the length byte.
    pub fn new(
        cla: u8,
        ins: u8,
        p1: u8,
        p2: u8,
        payload: impl Into<Bytes>,
    ) -> Result<Self, CodecError> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD {
            return Err(CodecError::PayloadTooLarge(payload.len()));
        }
        Ok(Self {
            cla,
            ins,
            p1,
            p2,
            payload,
        })
    }

    #[inline]
    pub fn ins(&self) -> u8 {
        self.ins
    }

    #[inline]
    pub fn p2(&self) -> u8 {
        self.p2
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Encode as `cla ‖ ins ‖ p1 ‖ p2 ‖ len ‖ payload`.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(5 + self.payload.len());
        buf.put_u8(self.cla);
        buf.put_u8(self.ins);
        buf.put_u8(self.p1);
        buf.put_u8(self.p2);
        buf.put_u8(self.payload.len() as u8);
        buf.put_slice(&self.payload);
        buf.freeze()
    }
}
