//! Transport module - raw access to the signing device.
//!
//! The exchange engine only needs two primitives, captured by [`Transport`]:
//! - write one report (report id + 64 protocol bytes)
//! - read whatever the device has produced, waiting at most `timeout`
//!
//! Device enumeration and the HID calls themselves live outside this crate.
//! [`SimulatedTransport`] is a scripted in-process device for tests and
//! dry runs.

mod simulated;

pub use simulated::SimulatedTransport;

use std::io;
use std::time::Duration;

use bytes::Bytes;

/// Blocking device I/O.
pub trait Transport {
    /// Write one report, returning the number of bytes accepted.
    fn write(&mut self, report: &[u8]) -> io::Result<usize>;

    /// Read available bytes.
    ///
    /// Waits up to `timeout` for data; `Duration::ZERO` is a non-blocking
    /// poll. `Ok(None)` means nothing arrived in time.
    fn read(&mut self, timeout: Duration) -> io::Result<Option<Bytes>>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, report: &[u8]) -> io::Result<usize> {
        (**self).write(report)
    }

    fn read(&mut self, timeout: Duration) -> io::Result<Option<Bytes>> {
        (**self).read(timeout)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, report: &[u8]) -> io::Result<usize> {
        (**self).write(report)
    }

    fn read(&mut self, timeout: Duration) -> io::Result<Option<Bytes>> {
        (**self).read(timeout)
    }
}
