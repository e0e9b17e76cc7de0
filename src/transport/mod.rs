//! Transport layer for I/O abstraction
//!
//! The DistoX protocol is half-duplex request/reply: the driver sends a
//! short request frame and reads back a fixed-size reply before issuing the
//! next exchange. The transport only moves raw bytes; framing and echo
//! validation live in [`crate::device::memory`].

use crate::error::Result;

pub mod mock;
mod serial;

pub use mock::MockDisto;
pub use serial::SerialTransport;

/// Byte transport to an already-connected DistoX
///
/// Implementations do not need to guarantee delivery; the memory layer
/// validates every reply and retries lost or garbled exchanges.
pub trait Transport: Send {
    /// Send a request frame, returns number of bytes written
    fn send(&mut self, data: &[u8]) -> Result<usize>;

    /// Receive up to `buf.len()` reply bytes, returns number of bytes read
    ///
    /// A short count means the reply timed out or was truncated; the caller
    /// treats that as a transport fault.
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize>;
}
