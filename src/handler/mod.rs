//! Handler module - SSH agent request handling.
//!
//! Provides:
//! - [`AgentContext`] - the device and the known identities
//! - [`AgentHandler`] - answers identities and sign requests
//! - [`message`] - agent message decoding and reply encoding
//!
//! # Example
//!
//! ```
//! use ledger_ssh_agent::device::LedgerSsh;
//! use ledger_ssh_agent::exchange::Exchange;
//! use ledger_ssh_agent::handler::{AgentContext, AgentHandler};
//! use ledger_ssh_agent::transport::SimulatedTransport;
//!
//! let device = LedgerSsh::new(Exchange::new(SimulatedTransport::new()));
//! let mut handler = AgentHandler::new(AgentContext::new(device, Vec::new()));
//!
//! let reply = handler.handle(&[0, 0, 0, 1, 11]).unwrap();
//! assert_eq!(&reply[..], &[0, 0, 0, 5, 12, 0, 0, 0, 0]);
//! ```

mod context;
mod dispatch;
pub mod message;

pub use context::AgentContext;
pub use dispatch::AgentHandler;
pub use message::{Request, SignRequest, MAX_MESSAGE_SIZE};
