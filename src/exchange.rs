//! Request/response exchange with the device.
//!
//! One [`Exchange::exchange`] call runs a full cycle:
//! 1. Pack the command into frames and write each as a report
//! 2. Block for the first read (bounded by `read_timeout`)
//! 3. Poll with non-blocking reads, re-validating the whole accumulated
//!    buffer after every append, until a response reassembles
//! 4. Split the trailing status word off the payload
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use ledger_ssh_agent::exchange::Exchange;
//! use ledger_ssh_agent::protocol::{ins, Command, StatusWord, CLA};
//! use ledger_ssh_agent::transport::SimulatedTransport;
//!
//! let mut device = SimulatedTransport::new();
//! device.queue_response(&[0xAA], StatusWord::SUCCESS);
//!
//! let mut exchange = Exchange::builder(device)
//!     .read_timeout(Duration::from_secs(1))
//!     .build();
//!
//! let command = Command::new(CLA, ins::GET_PUBLIC_KEY, 0, 1, vec![]).unwrap();
//! let result = exchange.exchange(&command).unwrap();
//! assert!(result.status.is_success());
//! assert_eq!(&result.payload[..], &[0xAA]);
//! ```

use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::error::{FramingError, Result, TransportError};
use crate::protocol::{pack, Command, FrameBuffer, StatusWord, Unpacked};
use crate::transport::Transport;

/// Default time to wait for the user to confirm on the device.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(15);

/// Default sleep between non-blocking reads.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Exchange timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// Overall deadline for a complete response.
    pub read_timeout: Duration,
    /// Sleep between polls once the first read came back incomplete.
    pub poll_interval: Duration,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Payload and status word of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeResult {
    pub payload: Bytes,
    pub status: StatusWord,
}

/// Builder for [`Exchange`].
pub struct ExchangeBuilder<T> {
    transport: T,
    config: ExchangeConfig,
}

impl<T: Transport> ExchangeBuilder<T> {
    /// Set the overall response deadline.
    ///
    /// Default: 15 seconds
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Set the sleep between non-blocking polls.
    ///
    /// Default: 10 milliseconds
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Replace the whole timing configuration.
    pub fn config(mut self, config: ExchangeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Exchange<T> {
        Exchange {
            transport: self.transport,
            config: self.config,
        }
    }
}

/// Exclusive owner of a device transport.
///
/// `&mut self` on [`exchange`](Self::exchange) keeps one exchange in flight
/// at a time.
pub struct Exchange<T> {
    transport: T,
    config: ExchangeConfig,
}

impl<T: Transport> Exchange<T> {
    /// Exchange with default timing.
    pub fn new(transport: T) -> Self {
        Self::builder(transport).build()
    }

    pub fn builder(transport: T) -> ExchangeBuilder<T> {
        ExchangeBuilder {
            transport,
            config: ExchangeConfig::default(),
        }
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Send `command` and wait for its response.
    ///
    /// The status word is returned uninterpreted.
    pub fn exchange(&mut self, command: &Command) -> Result<ExchangeResult> {
        self.send(command)?;
        let response = self.receive()?;

        if response.len() < 2 {
            tracing::error!("Response of {} bytes carries no status word", response.len());
            return Err(FramingError::MissingStatus(response.len()).into());
        }

        let split = response.len() - 2;
        let status = StatusWord(u16::from_be_bytes([response[split], response[split + 1]]));
        tracing::debug!(ins = command.ins(), %status, len = split, "exchange complete");

        Ok(ExchangeResult {
            payload: response.slice(..split),
            status,
        })
    }

    fn send(&mut self, command: &Command) -> Result<()> {
        let frames = pack(&command.to_bytes())?;

        for frame in &frames {
            let report = frame.to_report();
            match self.transport.write(&report) {
                Ok(n) if n == report.len() => {}
                Ok(n) => {
                    tracing::error!("Short write to device: {} of {} bytes", n, report.len());
                    return Err(TransportError::WriteFailed(std::io::Error::new(
                        std::io::ErrorKind::WriteZero,
                        format!("short write: {} of {} bytes", n, report.len()),
                    ))
                    .into());
                }
                Err(e) => {
                    tracing::error!("Write to device failed: {}", e);
                    return Err(TransportError::WriteFailed(e).into());
                }
            }
        }
        Ok(())
    }

    fn receive(&mut self) -> Result<Bytes> {
        let started = Instant::now();
        let mut buffer = FrameBuffer::new();
        let mut wait = self.config.read_timeout;

        loop {
            let chunk = self.transport.read(wait).map_err(|e| {
                tracing::error!("Read from device failed: {}", e);
                TransportError::ReadFailed(e)
            })?;
            wait = Duration::ZERO;

            let received = match chunk {
                Some(chunk) if !chunk.is_empty() => {
                    match buffer.push(&chunk) {
                        Ok(Unpacked::Complete(message)) => return Ok(message),
                        Ok(Unpacked::Incomplete) => true,
                        Err(e) => {
                            tracing::error!("Invalid response frame: {}", e);
                            return Err(e.into());
                        }
                    }
                }
                _ => false,
            };

            // The deadline covers the whole response, however it trickles in.
            if started.elapsed() >= self.config.read_timeout {
                tracing::warn!(
                    buffered = buffer.len(),
                    "read timeout (forgot to confirm on device?)"
                );
                return Err(TransportError::Timeout(self.config.read_timeout).into());
            }
            if !received {
                thread::sleep(self.config.poll_interval);
            }
        }
    }
}
