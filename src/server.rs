//! Unix socket front end.
//!
//! Accepts SSH agent clients and feeds each length-prefixed message to a
//! shared [`AgentHandler`]. Requests from all connections are serialized
//! through one mutex, so at most one device exchange is in flight.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tokio::sync::Mutex;
//! use ledger_ssh_agent::server::AgentListener;
//!
//! let listener = AgentListener::bind("/tmp/ledger-agent.sock").await?;
//! listener.serve(Arc::new(Mutex::new(handler))).await?;
//! ```

use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;

use crate::error::{DecodeError, Result};
use crate::handler::{message, AgentHandler, MAX_MESSAGE_SIZE};
use crate::transport::Transport;

/// Agent socket listener. Removes the socket file on drop.
pub struct AgentListener {
    listener: UnixListener,
    path: PathBuf,
}

impl AgentListener {
    /// Bind to `path`, replacing a stale socket, readable by the owner only.
    pub async fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if path.exists() {
            std::fs::remove_file(&path)?;
        }

        let listener = UnixListener::bind(&path)?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
        tracing::debug!("Agent listening on {}", path.display());

        Ok(Self { listener, path })
    }

    /// Get the socket path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accept a single client.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self.listener.accept().await?;
        Ok(stream)
    }

    /// Serve clients until accepting fails.
    pub async fn serve<T>(self, handler: Arc<Mutex<AgentHandler<T>>>) -> Result<()>
    where
        T: Transport + Send + 'static,
    {
        loop {
            let stream = self.accept().await?;
            let handler = handler.clone();
            tokio::spawn(async move {
                if let Err(e) = serve_connection(stream, handler).await {
                    tracing::error!("Agent connection error: {}", e);
                }
            });
        }
    }
}

impl Drop for AgentListener {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Answer messages on one connection until the client hangs up.
pub async fn serve_connection<T>(
    mut stream: UnixStream,
    handler: Arc<Mutex<AgentHandler<T>>>,
) -> Result<()>
where
    T: Transport + Send + 'static,
{
    loop {
        let mut prefix = [0u8; 4];
        match stream.read_exact(&mut prefix).await {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        let len = u32::from_be_bytes(prefix) as usize;
        if len > MAX_MESSAGE_SIZE - 4 {
            tracing::warn!("Agent message of {} bytes exceeds limit", len);
            return Err(DecodeError::TooLarge(len).into());
        }

        let mut request = vec![0u8; 4 + len];
        request[..4].copy_from_slice(&prefix);
        stream.read_exact(&mut request[4..]).await?;

        let handler = handler.clone();
        let outcome = tokio::task::spawn_blocking(move || handler.blocking_lock().handle(&request))
            .await
            .map_err(io::Error::other)?;

        let reply: Bytes = match outcome {
            Ok(reply) => reply,
            // The handler gives no reply here (device denial, malformed
            // input). The socket still answers so the client is not left
            // waiting; in-process callers of `handle` see the `Err`.
            Err(e) => {
                tracing::warn!("Agent request failed: {}", e);
                message::failure()
            }
        };
        stream.write_all(&reply).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::device::LedgerSsh;
    use crate::exchange::Exchange;
    use crate::handler::AgentContext;
    use crate::transport::SimulatedTransport;

    fn shared_handler() -> Arc<Mutex<AgentHandler<SimulatedTransport>>> {
        let exchange = Exchange::builder(SimulatedTransport::new())
            .read_timeout(Duration::from_millis(20))
            .poll_interval(Duration::from_millis(1))
            .build();
        let context = AgentContext::new(LedgerSsh::new(exchange), Vec::new());
        Arc::new(Mutex::new(AgentHandler::new(context)))
    }

    async fn round_trip(stream: &mut UnixStream, request: &[u8]) -> Vec<u8> {
        stream.write_all(request).await.unwrap();
        let mut prefix = [0u8; 4];
        stream.read_exact(&mut prefix).await.unwrap();
        let mut body = vec![0u8; u32::from_be_bytes(prefix) as usize];
        stream.read_exact(&mut body).await.unwrap();
        [prefix.to_vec(), body].concat()
    }

    #[tokio::test]
    async fn test_serves_requests_over_socket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.sock");

        let listener = AgentListener::bind(&path).await.unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        tokio::spawn(listener.serve(shared_handler()));

        let mut stream = UnixStream::connect(&path).await.unwrap();
        assert_eq!(
            round_trip(&mut stream, &[0, 0, 0, 1, 11]).await,
            vec![0, 0, 0, 5, 12, 0, 0, 0, 0]
        );

        // Unsupported opcode: generic failure, connection stays usable.
        assert_eq!(round_trip(&mut stream, &[0, 0, 0, 1, 99]).await, vec![0, 0, 0, 1, 5]);
        assert_eq!(
            round_trip(&mut stream, &[0, 0, 0, 1, 11]).await,
            vec![0, 0, 0, 5, 12, 0, 0, 0, 0]
        );
    }

    #[tokio::test]
    async fn test_denied_sign_answers_failure() {
        let key = crate::codec::PublicKeyBlob::from_bytes(vec![0xAB; 8]);
        let mut device = SimulatedTransport::new();
        device.queue_response(&[], crate::protocol::StatusWord::USER_REJECTED);
        let exchange = Exchange::builder(device)
            .read_timeout(Duration::from_millis(20))
            .poll_interval(Duration::from_millis(1))
            .build();

        let mut identity: crate::identity::Identity = "host".parse().unwrap();
        identity.set_cached_public_key(key.clone());
        let context = AgentContext::new(LedgerSsh::new(exchange), vec![identity]);
        let handler = Arc::new(Mutex::new(AgentHandler::new(context)));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.sock");
        let listener = AgentListener::bind(&path).await.unwrap();
        tokio::spawn(listener.serve(handler.clone()));

        let mut body = bytes::BytesMut::new();
        bytes::BufMut::put_u8(&mut body, message::opcode::SIGN_REQUEST);
        crate::codec::put_string(&mut body, key.as_bytes());
        crate::codec::put_string(&mut body, b"challenge");
        bytes::BufMut::put_u32(&mut body, 0);
        let request = crate::codec::wrap_length(&body);

        let mut stream = UnixStream::connect(&path).await.unwrap();
        assert_eq!(round_trip(&mut stream, &request).await, vec![0, 0, 0, 1, 5]);

        // The handler itself reports the denial.
        let mut handler = handler.lock().await;
        handler
            .context_mut()
            .device_mut()
            .exchange_mut()
            .transport_mut()
            .queue_response(&[], crate::protocol::StatusWord::USER_REJECTED);
        assert!(handler.handle(&request).is_err());
    }

    #[tokio::test]
    async fn test_stale_socket_replaced_and_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.sock");
        std::fs::write(&path, b"stale").unwrap();

        let listener = AgentListener::bind(&path).await.unwrap();
        assert_eq!(listener.path(), path.as_path());
        drop(listener);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_oversized_message_closes_connection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.sock");
        let listener = AgentListener::bind(&path).await.unwrap();

        let client = tokio::spawn({
            let path = path.clone();
            async move {
                let mut stream = UnixStream::connect(&path).await.unwrap();
                stream.write_all(&[0, 0, 0x40, 0]).await.unwrap();
                let mut buf = Vec::new();
                stream.read_to_end(&mut buf).await.unwrap();
                buf
            }
        });

        let stream = listener.accept().await.unwrap();
        let err = serve_connection(stream, shared_handler()).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Decode(DecodeError::TooLarge(0x4000))
        ));
        assert!(client.await.unwrap().is_empty());
    }
}
