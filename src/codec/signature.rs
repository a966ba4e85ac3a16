//! Signature codec.
//!
//! The device answers a sign command with a DER-style signature:
//! ```text
//! ┌──────┬─────┬──────┬──────┬───────┬──────┬──────┬───────┐
//! │ 0x30 │ len │ 0x02 │ rlen │ R     │ 0x02 │ slen │ S     │
//! └──────┴─────┴──────┴──────┴───────┴──────┴──────┴───────┘
//! ```
//!
//! R is copied as-is, including a leading sign-padding zero. S has a
//! leading zero removed. Agents that verify against this encoding depend
//! on that exact asymmetry, so it is kept.

use bytes::{Bytes, BytesMut};

use super::wire::{put_string, Cursor};
use crate::error::CodecError;

/// Offset of the R length byte.
const R_LENGTH_OFFSET: usize = 3;

/// Build `string(key_type) ‖ string(string(r) ‖ string(s))`.
pub fn encode_ssh_signature(
    key_type_name: &str,
    payload: &[u8],
) -> Result<SignatureBlob, CodecError> {
    let mut cursor = Cursor::new(Bytes::copy_from_slice(payload));
    cursor.skip(R_LENGTH_OFFSET)?;

    let r_len = cursor.read_u8()? as usize;
    let r = cursor.read_bytes(r_len)?;

    // integer tag of S
    cursor.skip(1)?;
    let s_len = cursor.read_u8()? as usize;
    let mut s = cursor.read_bytes(s_len)?;
    if s.first() == Some(&0) {
        s = s.slice(1..);
    }

    let mut inner = BytesMut::with_capacity(8 + r.len() + s.len());
    put_string(&mut inner, &r);
    put_string(&mut inner, &s);

    let mut blob = BytesMut::with_capacity(8 + key_type_name.len() + inner.len());
    put_string(&mut blob, key_type_name.as_bytes());
    put_string(&mut blob, &inner);

    Ok(SignatureBlob(blob.freeze()))
}

/// SSH wire-format signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureBlob(Bytes);

impl SignatureBlob {
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_TYPE: &str = "ecdsa-sha2-nistp256";

    fn der(r: &[u8], s: &[u8]) -> Vec<u8> {
        let mut out = vec![0x30, (4 + r.len() + s.len()) as u8, 0x02, r.len() as u8];
        out.extend_from_slice(r);
        out.push(0x02);
        out.push(s.len() as u8);
        out.extend_from_slice(s);
        out
    }

    fn fields(blob: &SignatureBlob) -> (String, Bytes, Bytes) {
        let mut outer = Cursor::new(Bytes::copy_from_slice(blob.as_bytes()));
        let name = outer.read_string().unwrap();
        let mut inner = Cursor::new(outer.read_string().unwrap());
        assert!(outer.is_empty());
        let r = inner.read_string().unwrap();
        let s = inner.read_string().unwrap();
        assert!(inner.is_empty());
        (String::from_utf8(name.to_vec()).unwrap(), r, s)
    }

    #[test]
    fn test_r_padding_kept_s_padding_stripped() {
        let mut r = vec![0x00];
        r.extend_from_slice(&[0x81; 32]);
        let mut s = vec![0x00];
        s.extend_from_slice(&[0x92; 32]);

        let blob = encode_ssh_signature(KEY_TYPE, &der(&r, &s)).unwrap();
        let (name, got_r, got_s) = fields(&blob);

        assert_eq!(name, KEY_TYPE);
        assert_eq!(got_r.len(), 33);
        assert_eq!(got_r[0], 0x00);
        assert_eq!(&got_r[..], &r[..]);
        assert_eq!(got_s.len(), 32);
        assert_eq!(&got_s[..], &s[1..]);
    }

    #[test]
    fn test_unpadded_integers_verbatim() {
        let r = [0x11u8; 32];
        let s = [0x22u8; 31];
        let blob = encode_ssh_signature(KEY_TYPE, &der(&r, &s)).unwrap();
        let (_, got_r, got_s) = fields(&blob);
        assert_eq!(&got_r[..], &r[..]);
        assert_eq!(&got_s[..], &s[..]);
    }

    #[test]
    fn test_exact_blob_bytes() {
        let blob = encode_ssh_signature("k", &der(&[0x01], &[0x00, 0x02])).unwrap();
        assert_eq!(
            blob.as_bytes(),
            &[
                0, 0, 0, 1, b'k', // key type
                0, 0, 0, 10, // inner
                0, 0, 0, 1, 0x01, // r
                0, 0, 0, 1, 0x02, // s
            ]
        );
    }

    #[test]
    fn test_truncated_payload() {
        let mut payload = der(&[0x11; 32], &[0x22; 32]);
        payload.truncate(50);
        assert!(matches!(
            encode_ssh_signature(KEY_TYPE, &payload),
            Err(CodecError::MalformedSignature { .. })
        ));
        assert!(encode_ssh_signature(KEY_TYPE, &[0x30, 0x00]).is_err());
    }
}
