//! Hash-addressed derivation paths.
//!
//! ```text
//! digest = sha256(u32_le(index) ‖ canonical identity)
//! path   = [0x80000000 | purpose, c0, c1, c2, c3]
//! ci     = u32_le(digest[4i..4i+4]) | 0x80000000
//! wire   = count ‖ u32_be(path[0]) ‖ ... ‖ u32_be(path[4])
//! ```
//!
//! Only index 0 is used.

use bytes::{BufMut, Bytes, BytesMut};
use sha2::{Digest, Sha256};

use super::Identity;

/// Hardened bit of a path component.
pub const HARDENED: u32 = 0x8000_0000;

/// Purpose component of signing keys.
pub const SIGNING_PURPOSE: u32 = 13;

/// Purpose component of key-agreement keys.
pub const ECDH_PURPOSE: u32 = 17;

/// Number of components taken from the digest.
const DIGEST_COMPONENTS: usize = 4;

/// Hardened derivation path of an identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivedPath {
    components: Vec<u32>,
}

impl DerivedPath {
    /// Derive the path of `identity`.
    pub fn derive(identity: &Identity, for_ecdh: bool) -> Self {
        Self::from_canonical(&identity.to_string(), for_ecdh)
    }

    /// Derive from an already canonical identity string.
    pub fn from_canonical(canonical: &str, for_ecdh: bool) -> Self {
        let index: u32 = 0;

        let mut hasher = Sha256::new();
        hasher.update(index.to_le_bytes());
        hasher.update(canonical.as_bytes());
        let digest = hasher.finalize();

        let purpose = if for_ecdh { ECDH_PURPOSE } else { SIGNING_PURPOSE };
        let mut components = Vec::with_capacity(1 + DIGEST_COMPONENTS);
        components.push(HARDENED | purpose);
        components.extend(
            digest
                .chunks_exact(4)
                .take(DIGEST_COMPONENTS)
                .map(|b| HARDENED | u32::from_le_bytes([b[0], b[1], b[2], b[3]])),
        );

        Self { components }
    }

    pub fn components(&self) -> &[u32] {
        &self.components
    }

    /// Wire form: component count followed by big-endian components.
    pub fn to_bytes(&self) -> Bytes {
        let byte_len = self.components.len() * 4;
        let mut buf = BytesMut::with_capacity(1 + byte_len);
        buf.put_u8(((byte_len + 1) / 4) as u8);
        for component in &self.components {
            buf.put_u32(*component);
        }
        buf.freeze()
    }
}
