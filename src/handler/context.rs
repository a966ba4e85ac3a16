//! Application context shared by agent requests.
//!
//! Owns the device and the identity list handed over by the identity store.
//! The only identity state written here is the cached public key.

use crate::codec::PublicKeyBlob;
use crate::device::LedgerSsh;
use crate::error::{IdentityError, Result};
use crate::identity::Identity;
use crate::transport::Transport;

/// Device plus known identities.
pub struct AgentContext<T> {
    device: LedgerSsh<T>,
    identities: Vec<Identity>,
}

impl<T: Transport> AgentContext<T> {
    pub fn new(device: LedgerSsh<T>, identities: Vec<Identity>) -> Self {
        tracing::debug!("Loaded {} identities", identities.len());
        Self { device, identities }
    }

    pub fn device(&self) -> &LedgerSsh<T> {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut LedgerSsh<T> {
        &mut self.device
    }

    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    /// Append an identity, returning its index.
    pub fn add_identity(&mut self, identity: Identity) -> usize {
        self.identities.push(identity);
        self.identities.len() - 1
    }

    pub fn remove_identity(&mut self, index: usize) -> Option<Identity> {
        (index < self.identities.len()).then(|| self.identities.remove(index))
    }

    /// Fetch and cache the public key of the identity at `index`.
    pub fn load_public_key(&mut self, index: usize) -> Result<&PublicKeyBlob> {
        let identity = self
            .identities
            .get_mut(index)
            .ok_or(IdentityError::NoSuchIdentity(index))?;

        let key = self.device.public_key(identity)?;
        tracing::debug!("Loaded public key for {}", identity);
        Ok(identity.set_cached_public_key(key))
    }

    /// Load every identity's key, returning how many are now cached.
    ///
    /// A failing identity is logged and skipped.
    pub fn load_public_keys(&mut self) -> usize {
        for index in 0..self.identities.len() {
            if let Err(e) = self.load_public_key(index).map(|_| ()) {
                tracing::warn!(
                    "Could not load key for {}: {}",
                    self.identities[index].display_name(),
                    e
                );
            }
        }
        self.keyed_count()
    }

    /// Number of identities with a cached key.
    pub fn keyed_count(&self) -> usize {
        self.identities.iter().filter(|i| i.has_public_key()).count()
    }

    /// Identities with a cached key, in list order.
    pub fn keyed(&self) -> impl Iterator<Item = (&Identity, &PublicKeyBlob)> {
        self.identities
            .iter()
            .filter_map(|i| i.cached_public_key().map(|key| (i, key)))
    }

    /// First identity whose cached key equals `key`.
    pub fn find_by_public_key(&self, key: &[u8]) -> Option<&Identity> {
        self.keyed()
            .find(|(_, cached)| cached.as_bytes() == key)
            .map(|(identity, _)| identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::error::Error;
    use crate::exchange::Exchange;
    use crate::protocol::StatusWord;
    use crate::transport::SimulatedTransport;

    const GX: &str = "6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296";
    const GY: &str = "4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5";

    fn context(transport: SimulatedTransport, identities: &[&str]) -> AgentContext<SimulatedTransport> {
        let exchange = Exchange::builder(transport)
            .read_timeout(Duration::from_millis(50))
            .poll_interval(Duration::from_millis(1))
            .build();
        let identities = identities.iter().map(|s| s.parse().unwrap()).collect();
        AgentContext::new(LedgerSsh::new(exchange), identities)
    }

    fn pubkey_response() -> Vec<u8> {
        let mut payload = vec![65, 0x04];
        payload.extend(hex::decode(GX).unwrap());
        payload.extend(hex::decode(GY).unwrap());
        payload
    }

    #[test]
    fn test_load_public_key_caches_blob() {
        let mut transport = SimulatedTransport::new();
        transport.queue_response(&pubkey_response(), StatusWord::SUCCESS);
        let mut ctx = context(transport, &["a@host", "b@host"]);

        assert_eq!(ctx.keyed_count(), 0);
        let key = ctx.load_public_key(1).unwrap().clone();
        assert_eq!(ctx.keyed_count(), 1);
        assert!(!ctx.identities()[0].has_public_key());

        let found = ctx.find_by_public_key(key.as_bytes()).unwrap();
        assert_eq!(found.user, "b");
        assert!(ctx.find_by_public_key(b"other").is_none());
    }

    #[test]
    fn test_load_public_key_bad_index() {
        let mut ctx = context(SimulatedTransport::new(), &["host"]);
        assert!(matches!(
            ctx.load_public_key(3),
            Err(Error::Identity(IdentityError::NoSuchIdentity(3)))
        ));
    }

    #[test]
    fn test_load_public_keys_skips_failures() {
        let mut transport = SimulatedTransport::new();
        transport
            .queue_response(&[], StatusWord::USER_REJECTED)
            .queue_response(&pubkey_response(), StatusWord::SUCCESS);
        let mut ctx = context(transport, &["a@host", "b@host"]);

        assert_eq!(ctx.load_public_keys(), 1);
        assert!(ctx.identities()[1].has_public_key());
    }

    #[test]
    fn test_add_and_remove_identity() {
        let mut ctx = context(SimulatedTransport::new(), &[]);
        let index = ctx.add_identity(Identity::new("host"));
        assert_eq!(index, 0);
        assert_eq!(ctx.remove_identity(0).unwrap().host, "host");
        assert!(ctx.remove_identity(0).is_none());
    }
}
