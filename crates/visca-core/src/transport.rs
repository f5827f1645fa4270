//! Transport trait for camera communication.
//!
//! The [`Transport`] trait abstracts over the physical link to a camera.
//! Implementations exist for serial ports, VISCA-over-IP UDP sockets, and
//! mock transports for testing.
//!
//! The session engine in `visca-camera` operates on a `Transport` rather
//! than directly on a serial port, enabling both real hardware control and
//! deterministic unit testing with `MockTransport` from the
//! `visca-test-harness` crate.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to a camera.
///
/// Implementations handle any link-level wrapping (such as the VISCA-over-IP
/// header) and buffering. Framing at `0xFF` terminators and reply
/// classification are handled by the session that consumes this trait.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the underlying channel.
    ///
    /// Calling `connect()` on an already-open transport is a no-op.
    async fn connect(&mut self) -> Result<()>;

    /// Send one complete VISCA frame to the camera.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the camera into the provided buffer.
    ///
    /// Returns the number of bytes actually read. Will wait up to `timeout`
    /// for data to arrive; returns [`Error::Timeout`](crate::error::Error::Timeout)
    /// if no data is received within the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the transport connection.
    ///
    /// Closing an already-closed transport succeeds. Afterwards `send()` and
    /// `receive()` return [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
