//! Scripted in-process device.
//!
//! Reassembles the reports it is sent with the same framing code the host
//! uses, records every complete command, and answers each one with the next
//! scripted reply.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use ledger_ssh_agent::protocol::{pack, StatusWord};
//! use ledger_ssh_agent::transport::{SimulatedTransport, Transport};
//!
//! let mut device = SimulatedTransport::new();
//! device.queue_response(b"ok", StatusWord::SUCCESS);
//!
//! for frame in pack(&[0x80, 0x02, 0x00, 0x01, 0x00]).unwrap() {
//!     device.write(&frame.to_report()).unwrap();
//! }
//! assert_eq!(device.commands().len(), 1);
//! assert!(device.read(Duration::ZERO).unwrap().is_some());
//! ```

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};

use super::Transport;
use crate::protocol::{pack_to_bytes, FrameBuffer, StatusWord, Unpacked, PACKET_SIZE, REPORT_ID};

#[derive(Debug)]
enum Reply {
    /// Raw bytes handed out by subsequent reads.
    Raw(Bytes),
    /// Never answer (user did not confirm).
    Silence,
}

/// Scripted device implementing [`Transport`].
#[derive(Debug)]
pub struct SimulatedTransport {
    script: VecDeque<Reply>,
    incoming: FrameBuffer,
    pending: VecDeque<Bytes>,
    commands: Vec<Bytes>,
    chunk_size: usize,
    fail_writes: bool,
}

impl SimulatedTransport {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            incoming: FrameBuffer::new(),
            pending: VecDeque::new(),
            commands: Vec::new(),
            chunk_size: PACKET_SIZE,
            fail_writes: false,
        }
    }

    /// Answer the next command with `payload ‖ status`.
    pub fn queue_response(&mut self, payload: &[u8], status: StatusWord) -> &mut Self {
        let mut message = BytesMut::with_capacity(payload.len() + 2);
        message.put_slice(payload);
        message.put_u16(status.0);
        match pack_to_bytes(&message) {
            Ok(raw) => self.script.push_back(Reply::Raw(raw)),
            Err(e) => tracing::debug!(error = %e, "scripted response not packable, dropping it"),
        }
        self
    }

    /// Answer the next command with arbitrary bytes, e.g. corrupt frames.
    pub fn queue_raw(&mut self, raw: impl Into<Bytes>) -> &mut Self {
        self.script.push_back(Reply::Raw(raw.into()));
        self
    }

    /// Leave the next command unanswered.
    pub fn queue_silence(&mut self) -> &mut Self {
        self.script.push_back(Reply::Silence);
        self
    }

    /// Size of each read handed back to the host (default: one frame).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Make every write fail, as an unplugged device would.
    pub fn with_failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Every complete command received so far, in order.
    pub fn commands(&self) -> &[Bytes] {
        &self.commands
    }

    /// Scripted replies not yet consumed.
    pub fn remaining_replies(&self) -> usize {
        self.script.len()
    }

    fn answer(&mut self) {
        match self.script.pop_front() {
            Some(Reply::Raw(raw)) => {
                for chunk in raw.chunks(self.chunk_size) {
                    self.pending.push_back(raw.slice_ref(chunk));
                }
            }
            Some(Reply::Silence) => {}
            None => tracing::debug!("no scripted reply left, staying silent"),
        }
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SimulatedTransport {
    fn write(&mut self, report: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        if report.len() != PACKET_SIZE + 1 || report[0] != REPORT_ID {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("malformed report of {} bytes", report.len()),
            ));
        }

        let unpacked = self
            .incoming
            .push(&report[1..])
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if let Unpacked::Complete(command) = unpacked {
            // Output the host never read belongs to the previous command.
            self.incoming.clear();
            self.pending.clear();
            self.commands.push(command);
            self.answer();
        }

        Ok(report.len())
    }

    fn read(&mut self, _timeout: Duration) -> io::Result<Option<Bytes>> {
        Ok(self.pending.pop_front())
    }
}
