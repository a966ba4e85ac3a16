//! Agent configuration.
//!
//! Loaded from JSON; every field is optional:
//! ```json
//! {
//!   "read_timeout_secs": 15,
//!   "poll_interval_ms": 10,
//!   "socket_path": "/run/user/1000/ledger-agent.sock",
//!   "identities": [
//!     { "name": "github", "user": "git", "host": "github.com" }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::exchange::{ExchangeConfig, DEFAULT_POLL_INTERVAL, DEFAULT_READ_TIMEOUT};
use crate::identity::Identity;

fn default_read_timeout_secs() -> u64 {
    DEFAULT_READ_TIMEOUT.as_secs()
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

/// Agent settings and the exported identity list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<PathBuf>,
    #[serde(default)]
    pub identities: Vec<Identity>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            read_timeout_secs: default_read_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            socket_path: None,
            identities: Vec::new(),
        }
    }
}

impl AgentConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&text)?;
        tracing::debug!(
            "Loaded config from {} ({} identities)",
            path.as_ref().display(),
            config.identities.len()
        );
        Ok(config)
    }

    /// Timing for [`Exchange`](crate::exchange::Exchange).
    pub fn exchange_config(&self) -> ExchangeConfig {
        ExchangeConfig {
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}
