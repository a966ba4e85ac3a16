//! Agent message codec.
//!
//! Messages arrive with their 4-byte length prefix still attached:
//! ```text
//! ┌────────────┬────────┬──────────────────────────────┐
//! │ Length     │ Opcode │ Fields (length-prefixed)     │
//! │ uint32 BE  │ uint8  │                              │
//! └────────────┴────────┴──────────────────────────────┘
//! ```
//! Only the first byte after the length is taken as the opcode, whatever
//! the declared length. Replies are built here and carry the same prefix.

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::{put_string, wrap_length, Cursor, PublicKeyBlob, SignatureBlob};
use crate::error::DecodeError;

/// Agent protocol opcodes.
pub mod opcode {
    pub const FAILURE: u8 = 5;
    pub const REQUEST_IDENTITIES: u8 = 11;
    pub const IDENTITIES_ANSWER: u8 = 12;
    pub const SIGN_REQUEST: u8 = 13;
    pub const SIGN_RESPONSE: u8 = 14;
}

/// Largest agent message accepted from a client, prefix included.
pub const MAX_MESSAGE_SIZE: usize = 8192;

/// Decoded agent request.
#[derive(Debug, Clone)]
pub enum Request {
    RequestIdentities,
    Sign(SignRequest),
}

/// Sign request whose challenge is read only once the key is known.
#[derive(Debug, Clone)]
pub struct SignRequest {
    key: Bytes,
    body: Cursor,
}

impl SignRequest {
    /// Public key blob the client wants a signature from.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Read the challenge that follows the key.
    pub fn challenge(&mut self) -> Result<Bytes, DecodeError> {
        Ok(self.body.read_string()?)
    }
}

impl Request {
    /// Decode a prefixed agent message.
    pub fn decode(message: &[u8]) -> Result<Self, DecodeError> {
        let mut cursor = Cursor::new(Bytes::copy_from_slice(message));

        let declared = cursor.read_u32()? as usize;
        if declared == 0 {
            return Err(DecodeError::EmptyMessage);
        }
        let selector = cursor.read_bytes(declared.min(1))?;

        match selector[0] {
            opcode::REQUEST_IDENTITIES => Ok(Request::RequestIdentities),
            opcode::SIGN_REQUEST => {
                let key = cursor.read_string()?;
                Ok(Request::Sign(SignRequest { key, body: cursor }))
            }
            other => Err(DecodeError::UnknownOpcode(other)),
        }
    }
}

/// `[12] ‖ u32 count ‖ (string(key) ‖ string(comment))*`, prefixed.
pub fn identities_answer<'a, I>(keys: I) -> Bytes
where
    I: IntoIterator<Item = (&'a PublicKeyBlob, String)>,
{
    let mut entries = BytesMut::new();
    let mut count: u32 = 0;
    for (key, comment) in keys {
        put_string(&mut entries, key.as_bytes());
        put_string(&mut entries, comment.as_bytes());
        count += 1;
    }

    let mut body = BytesMut::with_capacity(5 + entries.len());
    body.put_u8(opcode::IDENTITIES_ANSWER);
    body.put_u32(count);
    body.put_slice(&entries);
    wrap_length(&body)
}

/// `[14] ‖ string(signature)`, prefixed.
pub fn sign_response(signature: &SignatureBlob) -> Bytes {
    let mut body = BytesMut::with_capacity(5 + signature.as_bytes().len());
    body.put_u8(opcode::SIGN_RESPONSE);
    put_string(&mut body, signature.as_bytes());
    wrap_length(&body)
}

/// `[5]`, prefixed.
pub fn failure() -> Bytes {
    wrap_length(&[opcode::FAILURE])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_request_identities() {
        let request = Request::decode(&[0, 0, 0, 1, 11]).unwrap();
        assert!(matches!(request, Request::RequestIdentities));
    }

    #[test]
    fn test_selector_length_clamped_to_one() {
        // Declared length covers more than the opcode; only one byte is read.
        let request = Request::decode(&[0, 0, 0, 9, 11, 0xFF, 0xFF]).unwrap();
        assert!(matches!(request, Request::RequestIdentities));
    }

    #[test]
    fn test_decode_sign_request() {
        let mut message = vec![0, 0, 0, 0x20, 13];
        message.extend_from_slice(&[0, 0, 0, 3, 0xA, 0xB, 0xC]);
        message.extend_from_slice(&[0, 0, 0, 2, 0x1, 0x2]);
        message.extend_from_slice(&[0, 0, 0, 0]);

        let Request::Sign(mut sign) = Request::decode(&message).unwrap() else {
            panic!("expected a sign request");
        };
        assert_eq!(sign.key(), &[0xA, 0xB, 0xC]);
        assert_eq!(&sign.challenge().unwrap()[..], &[0x1, 0x2]);
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(
            Request::decode(&[0, 0, 0, 0, 11]).unwrap_err(),
            DecodeError::EmptyMessage
        );
        assert_eq!(
            Request::decode(&[0, 0, 0, 1, 99]).unwrap_err(),
            DecodeError::UnknownOpcode(99)
        );
        assert!(matches!(
            Request::decode(&[0, 0]),
            Err(DecodeError::UnexpectedEof { needed: 4, .. })
        ));
        assert!(matches!(
            Request::decode(&[0, 0, 0, 1, 13, 0, 0, 0, 9, 1]),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_empty_identities_answer() {
        let answer = identities_answer(std::iter::empty());
        assert_eq!(&answer[..], &[0, 0, 0, 5, 12, 0, 0, 0, 0]);
    }

    #[test]
    fn test_identities_answer_entries() {
        let key = PublicKeyBlob::from_bytes(vec![0xAA, 0xBB]);
        let answer = identities_answer([(&key, "ssh://h".to_string())]);
        assert_eq!(
            &answer[..],
            &[
                0, 0, 0, 22, // length
                12, 0, 0, 0, 1, // opcode, count
                0, 0, 0, 2, 0xAA, 0xBB, // key
                0, 0, 0, 7, b's', b's', b'h', b':', b'/', b'/', b'h', // comment
            ]
        );
    }

    #[test]
    fn test_failure_envelope() {
        assert_eq!(&failure()[..], &[0, 0, 0, 1, 5]);
    }
}
