//! SSH operations of the signing device.
//!
//! [`LedgerSsh`] turns identities into device commands and device payloads
//! into SSH blobs. A challenge longer than one command is streamed in
//! chunks; only the first chunk carries the derivation path:
//! ```text
//! chunk 0:  ┌────────────────┬──────────────────────────┐
//!           │ derived path   │ challenge[..255 - path]  │
//!           └────────────────┴──────────────────────────┘
//! chunk n:  ┌───────────────────────────────────────────┐
//!           │ next ≤ 255 challenge bytes                │
//!           └───────────────────────────────────────────┘
//! ```
//! The device returns the signature with the last chunk's response.

use crate::codec::{
    build_ssh_public_key_blob, compressed_point_from_response, decompress, encode_ssh_signature,
    PublicKeyBlob, SignatureBlob,
};
use crate::error::{Result, StatusError};
use crate::exchange::{Exchange, ExchangeResult};
use crate::identity::Identity;
use crate::protocol::{ins, Command, StatusWord, CLA, MAX_PAYLOAD};
use crate::transport::Transport;

/// SSH agent application on the device.
pub struct LedgerSsh<T> {
    exchange: Exchange<T>,
}

impl<T: Transport> LedgerSsh<T> {
    pub fn new(exchange: Exchange<T>) -> Self {
        Self { exchange }
    }

    pub fn exchange(&self) -> &Exchange<T> {
        &self.exchange
    }

    pub fn exchange_mut(&mut self) -> &mut Exchange<T> {
        &mut self.exchange
    }

    pub fn into_exchange(self) -> Exchange<T> {
        self.exchange
    }

    /// Fetch the public key of `identity` as an SSH blob.
    ///
    /// Success and "more data" statuses are accepted; anything else is
    /// logged with its cause and returned as [`StatusError`].
    pub fn public_key(&mut self, identity: &Identity) -> Result<PublicKeyBlob> {
        let key_type = identity.key_type;
        let path = identity.derive_path(false);
        let command = Command::new(CLA, ins::GET_PUBLIC_KEY, 0x00, key_type.p2(), path.to_bytes())?;

        let ExchangeResult { payload, status } = self.exchange.exchange(&command)?;
        if !status.is_success() && !status.is_more_data() {
            return Err(rejected(status).into());
        }

        let compressed = compressed_point_from_response(&payload)?;
        let (x, y) = decompress(&compressed)?;
        Ok(build_ssh_public_key_blob(
            key_type.ssh_name(),
            key_type.curve_name(),
            &x,
            &y,
        ))
    }

    /// Sign `challenge` with the key of `identity`.
    ///
    /// Stops at the first chunk whose status is not success.
    pub fn sign(&mut self, identity: &Identity, challenge: &[u8]) -> Result<SignatureBlob> {
        let key_type = identity.key_type;
        let path = identity.derive_path(false).to_bytes();

        let mut offset = 0;
        let mut last = None;
        while last.is_none() || offset < challenge.len() {
            let mut data = Vec::with_capacity(MAX_PAYLOAD);
            if offset == 0 {
                data.extend_from_slice(&path);
            }
            let take = (challenge.len() - offset).min(MAX_PAYLOAD - data.len());
            data.extend_from_slice(&challenge[offset..offset + take]);
            offset += take;

            let command = Command::new(CLA, ins::SIGN, 0x00, key_type.sign_p2(), data)?;
            let result = self.exchange.exchange(&command)?;
            if !result.status.is_success() {
                return Err(rejected(result.status).into());
            }
            last = Some(result.payload);
        }

        let signature = last.unwrap_or_default();
        Ok(encode_ssh_signature(key_type.ssh_name(), &signature)?)
    }
}

fn rejected(status: StatusWord) -> StatusError {
    if status == StatusWord::USER_REJECTED {
        tracing::warn!("Device request denied: {}", status.cause());
    } else {
        tracing::error!("Exchange status error {}: {}", status, status.cause());
    }
    StatusError { status }
}
