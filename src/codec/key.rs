//! Public key codec.
//!
//! The device reports an uncompressed point; the SSH blob is rebuilt from
//! its compressed form so that every key passes through the curve check.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::{Bytes, BytesMut};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::PublicKey;

use super::wire::put_string;
use crate::error::CodecError;

/// Field width of a P-256 coordinate.
pub const COORDINATE_SIZE: usize = 32;

/// Marker byte of an uncompressed SEC1 point.
pub const UNCOMPRESSED_MARKER: u8 = 0x04;

/// Reconstruct `(x, y)` from a parity-prefixed X coordinate.
///
/// Both coordinates are returned big-endian and left-padded to the field
/// width.
pub fn decompress(compressed: &[u8]) -> Result<([u8; 32], [u8; 32]), CodecError> {
    if compressed.len() != 1 + COORDINATE_SIZE || !matches!(compressed[0], 0x02 | 0x03) {
        return Err(CodecError::InvalidPoint);
    }

    let key = PublicKey::from_sec1_bytes(compressed).map_err(|_| CodecError::InvalidPoint)?;
    let point = key.to_encoded_point(false);

    let (Some(x), Some(y)) = (point.x(), point.y()) else {
        return Err(CodecError::InvalidPoint);
    };

    let mut out_x = [0u8; COORDINATE_SIZE];
    let mut out_y = [0u8; COORDINATE_SIZE];
    out_x.copy_from_slice(x);
    out_y.copy_from_slice(y);
    Ok((out_x, out_y))
}

/// Compressed point from a get-public-key response.
///
/// The response is `len ‖ 0x04 ‖ X ‖ Y`; the parity comes from the last
/// byte of Y.
pub fn compressed_point_from_response(payload: &[u8]) -> Result<[u8; 33], CodecError> {
    const X_START: usize = 2;
    const END: usize = X_START + 2 * COORDINATE_SIZE;

    if payload.len() < END {
        return Err(CodecError::MalformedPublicKey(payload.len()));
    }

    let mut compressed = [0u8; 1 + COORDINATE_SIZE];
    compressed[0] = if payload[END - 1] & 1 != 0 { 0x03 } else { 0x02 };
    compressed[1..].copy_from_slice(&payload[X_START..X_START + COORDINATE_SIZE]);
    Ok(compressed)
}

/// Build `string(key_type) ‖ string(curve) ‖ string(0x04 ‖ X ‖ Y)`.
pub fn build_ssh_public_key_blob(
    key_type_name: &str,
    curve_name: &str,
    x: &[u8],
    y: &[u8],
) -> PublicKeyBlob {
    let mut point = Vec::with_capacity(1 + x.len() + y.len());
    point.push(UNCOMPRESSED_MARKER);
    point.extend_from_slice(x);
    point.extend_from_slice(y);

    let mut buf = BytesMut::with_capacity(
        12 + key_type_name.len() + curve_name.len() + point.len(),
    );
    put_string(&mut buf, key_type_name.as_bytes());
    put_string(&mut buf, curve_name.as_bytes());
    put_string(&mut buf, &point);
    PublicKeyBlob(buf.freeze())
}

/// SSH wire-format public key. Compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PublicKeyBlob(Bytes);

impl PublicKeyBlob {
    /// Wrap bytes already in SSH wire format.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `authorized_keys` line: `<key type> <base64 blob> <comment>`.
    ///
    /// The key type is read back from the blob itself.
    pub fn to_openssh_line(&self, comment: &str) -> String {
        let key_type = super::wire::Cursor::new(self.0.clone())
            .read_string()
            .ok()
            .and_then(|name| String::from_utf8(name.to_vec()).ok())
            .unwrap_or_default();
        format!("{} {} {}", key_type, STANDARD.encode(&self.0), comment)
    }
}

impl AsRef<[u8]> for PublicKeyBlob {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
