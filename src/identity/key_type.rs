//! Key algorithm descriptor.

use serde::{Deserialize, Serialize};

use crate::protocol::P2_SSH;

/// Curve/algorithm of an identity's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum KeyType {
    #[default]
    #[serde(rename = "nistp256")]
    NistP256,
}

impl KeyType {
    /// Curve name as carried inside the SSH key blob.
    pub fn curve_name(self) -> &'static str {
        match self {
            KeyType::NistP256 => "nistp256",
        }
    }

    /// SSH key type name, e.g. `ecdsa-sha2-nistp256`.
    pub fn ssh_name(self) -> &'static str {
        match self {
            KeyType::NistP256 => "ecdsa-sha2-nistp256",
        }
    }

    /// P2 of the get-public-key command.
    pub fn p2(self) -> u8 {
        match self {
            KeyType::NistP256 => 0x01,
        }
    }

    /// P2 of the sign command for SSH challenges.
    pub fn sign_p2(self) -> u8 {
        self.p2() | P2_SSH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nistp256_parameters() {
        let key_type = KeyType::default();
        assert_eq!(key_type.ssh_name(), "ecdsa-sha2-nistp256");
        assert_eq!(key_type.curve_name(), "nistp256");
        assert_eq!(key_type.p2(), 0x01);
        assert_eq!(key_type.sign_p2(), 0x81);
    }

    #[test]
    fn test_serde_name() {
        assert_eq!(serde_json::to_string(&KeyType::NistP256).unwrap(), "\"nistp256\"");
        let parsed: KeyType = serde_json::from_str("\"nistp256\"").unwrap();
        assert_eq!(parsed, KeyType::NistP256);
    }
}
