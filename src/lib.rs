//! # ledger-ssh-agent
//!
//! SSH agent bridge for USB signing devices that speak the Ledger HID APDU
//! protocol.
//!
//! The host never sees a private key. It sends a derivation path and a
//! challenge to the device and repackages the public key or signature that
//! comes back into SSH wire format.
//!
//! ## Architecture
//!
//! - **Framing** ([`protocol`]): 64-byte HID frames, commands, status words
//! - **Exchange** ([`exchange`]): one request/response cycle with timeout
//! - **Identities** ([`identity`]): `ssh://user@host` targets and their
//!   hash-derived key paths
//! - **Codecs** ([`codec`]): device points and signatures to SSH blobs
//! - **Agent** ([`handler`]): identities and sign requests
//! - **Socket** (`server`, unix only): serialized access for SSH clients
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tokio::sync::Mutex;
//! use ledger_ssh_agent::{AgentConfig, AgentContext, AgentHandler, Exchange, LedgerSsh};
//! use ledger_ssh_agent::server::AgentListener;
//!
//! #[tokio::main]
//! async fn main() -> ledger_ssh_agent::Result<()> {
//!     let config = AgentConfig::from_json_file("agent.json")?;
//!     let exchange = Exchange::builder(open_hid_device()?)
//!         .config(config.exchange_config())
//!         .build();
//!
//!     let mut context = AgentContext::new(LedgerSsh::new(exchange), config.identities);
//!     context.load_public_keys();
//!
//!     let listener = AgentListener::bind("/tmp/ledger-agent.sock").await?;
//!     listener.serve(Arc::new(Mutex::new(AgentHandler::new(context)))).await
//! }
//! ```

pub mod codec;
pub mod config;
pub mod device;
pub mod error;
pub mod exchange;
pub mod handler;
pub mod identity;
pub mod protocol;
#[cfg(unix)]
pub mod server;
pub mod transport;

pub use config::AgentConfig;
pub use device::LedgerSsh;
pub use error::{Error, Result};
pub use exchange::{Exchange, ExchangeBuilder, ExchangeConfig, ExchangeResult};
pub use handler::{AgentContext, AgentHandler};
pub use identity::{DerivedPath, Identity, KeyType};
pub use transport::{SimulatedTransport, Transport};
