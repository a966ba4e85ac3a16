//! Identity module - logical SSH targets and their device keys.
//!
//! An [`Identity`] is a `protocol://user@host:port/path` descriptor. Its
//! canonical string form is the input of the path derivation and the
//! comment shown to SSH clients. The only mutable state is the cached public
//! key, filled in from the device and never persisted.
//!
//! # Example
//!
//! ```
//! use ledger_ssh_agent::identity::Identity;
//!
//! let identity: Identity = "git@github.com".parse().unwrap();
//! assert_eq!(identity.to_string(), "ssh://git@github.com");
//! assert_eq!(identity.derive_path(false).to_bytes()[0], 5);
//! ```

mod key_type;
mod path;

pub use key_type::KeyType;
pub use path::{DerivedPath, ECDH_PURPOSE, HARDENED, SIGNING_PURPOSE};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec::PublicKeyBlob;
use crate::error::IdentityError;

/// Protocol assumed when none is given.
pub const DEFAULT_PROTOCOL: &str = "ssh";

/// A logical SSH session target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Display name; empty means "use the canonical string".
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub user: String,
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub key_type: KeyType,
    #[serde(skip)]
    cached_public_key: Option<PublicKeyBlob>,
}

impl Identity {
    /// Identity for `host` with every other field empty.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            protocol: String::new(),
            user: String::new(),
            host: host.into(),
            port: None,
            path: String::new(),
            key_type: KeyType::default(),
            cached_public_key: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Name shown to the user.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            self.to_string()
        } else {
            self.name.clone()
        }
    }

    /// Derivation path of this identity's key.
    pub fn derive_path(&self, for_ecdh: bool) -> DerivedPath {
        DerivedPath::derive(self, for_ecdh)
    }

    pub fn cached_public_key(&self) -> Option<&PublicKeyBlob> {
        self.cached_public_key.as_ref()
    }

    pub fn has_public_key(&self) -> bool {
        self.cached_public_key.is_some()
    }

    pub fn set_cached_public_key(&mut self, key: PublicKeyBlob) -> &PublicKeyBlob {
        self.cached_public_key.insert(key)
    }

    pub fn clear_cached_public_key(&mut self) {
        self.cached_public_key = None;
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let protocol = if self.protocol.is_empty() {
            DEFAULT_PROTOCOL
        } else {
            &self.protocol
        };
        write!(f, "{}://", protocol)?;
        if !self.user.is_empty() {
            write!(f, "{}@", self.user)?;
        }
        f.write_str(&self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        if !self.path.is_empty() {
            write!(f, "/{}", self.path)?;
        }
        Ok(())
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    /// Parse `[protocol://][user@]host[:port][/path]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rest = s;

        let mut protocol = "";
        if let Some(idx) = rest.find("://") {
            let candidate = &rest[..idx];
            if !candidate.is_empty()
                && candidate.chars().all(|c| c.is_alphanumeric() || c == '_')
            {
                protocol = candidate;
                rest = &rest[idx + 3..];
            }
        }

        // Only an '@' before the first '/' ends a user, so "host/path@x" is
        // host "host" with path "path@x", not user "host/path".
        let mut user = "";
        let authority_end = rest.find('/').unwrap_or(rest.len());
        if let Some(idx) = rest[..authority_end].find('@') {
            user = &rest[..idx];
            rest = &rest[idx + 1..];
        }

        let host_end = rest.find([':', '/']).unwrap_or(rest.len());
        let host = &rest[..host_end];
        if host.is_empty() {
            return Err(IdentityError::MissingHost(s.to_string()));
        }
        rest = &rest[host_end..];

        let mut port = None;
        if let Some(after) = rest.strip_prefix(':') {
            let digits_end = after.find('/').unwrap_or(after.len());
            let digits = &after[..digits_end];
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(IdentityError::InvalidPort(s.to_string()));
            }
            let value: u16 = digits
                .parse()
                .map_err(|_| IdentityError::InvalidPort(s.to_string()))?;
            // Port 0 means "unset".
            port = (value != 0).then_some(value);
            rest = &after[digits_end..];
        }

        let path = rest.strip_prefix('/').unwrap_or("");

        let mut identity = Identity::new(host);
        identity.protocol = protocol.to_string();
        identity.user = user.to_string();
        identity.port = port;
        identity.path = path.to_string();
        Ok(identity)
    }
}
