//! Agent request dispatch.

use bytes::Bytes;

use super::message::{self, Request, SignRequest};
use super::AgentContext;
use crate::error::Result;
use crate::transport::Transport;

/// Answers agent messages against an [`AgentContext`].
pub struct AgentHandler<T> {
    context: AgentContext<T>,
}

impl<T: Transport> AgentHandler<T> {
    pub fn new(context: AgentContext<T>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &AgentContext<T> {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut AgentContext<T> {
        &mut self.context
    }

    pub fn into_context(self) -> AgentContext<T> {
        self.context
    }

    /// Handle one prefixed agent message and return the prefixed reply.
    ///
    /// An `Err` means "no reply": malformed input, or a device failure in
    /// the middle of signing.
    pub fn handle(&mut self, message: &[u8]) -> Result<Bytes> {
        let request = Request::decode(message).map_err(|e| {
            tracing::debug!("Unhandled agent message: {}", e);
            e
        })?;

        match request {
            Request::RequestIdentities => Ok(self.identities()),
            Request::Sign(sign) => self.sign(sign),
        }
    }

    fn identities(&self) -> Bytes {
        let count = self.context.keyed_count();
        if count == 0 {
            tracing::warn!("No identities have keys loaded");
        }
        message::identities_answer(
            self.context
                .keyed()
                .map(|(identity, key)| (key, identity.to_string())),
        )
    }

    fn sign(&mut self, mut request: SignRequest) -> Result<Bytes> {
        let Some(identity) = self.context.find_by_public_key(request.key()).cloned() else {
            tracing::error!("Accepted key not found");
            return Ok(message::failure());
        };
        tracing::debug!("Identity {} was accepted", identity.display_name());

        let challenge = request.challenge()?;
        let signature = self.context.device_mut().sign(&identity, &challenge)?;
        Ok(message::sign_response(&signature))
    }
}
