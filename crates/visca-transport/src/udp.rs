//! VISCA-over-IP transport.
//!
//! Network-attached cameras accept VISCA frames wrapped in an 8-byte UDP
//! header:
//!
//! ```text
//! 0x01 <type> <len_hi> <len_lo> <seq0> <seq1> <seq2> <seq3> <frame...>
//! ```
//!
//! - `type` is `0x10` when the wrapped frame is an inquiry (byte 1 is
//!   `0x09`), `0x00` otherwise.
//! - `len` is the big-endian length of the wrapped frame.
//! - `seq` is the low four bytes, little-endian, of a 64-bit counter that
//!   increments after every datagram sent.
//!
//! Replies carry the same header, which [`unwrap_datagram`] strips. The
//! counter is informational: replies are never matched against it.

use async_trait::async_trait;
use bytes::{BufMut, BytesMut};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use visca_core::error::{Error, Result};
use visca_core::transport::Transport;

/// Well-known VISCA-over-IP port.
pub const DEFAULT_PORT: u16 = 52381;

/// Length of the VISCA-over-IP header.
pub const HEADER_LEN: usize = 8;

const PAYLOAD_TYPE: u8 = 0x01;
const CONTROL_COMMAND: u8 = 0x00;
const CONTROL_INQUIRY: u8 = 0x10;
const INQUIRY_MARKER: u8 = 0x09;

/// Wrap a raw VISCA frame in the VISCA-over-IP header.
pub fn wrap_frame(frame: &[u8], sequence: u64) -> Vec<u8> {
    let control = if frame.get(1) == Some(&INQUIRY_MARKER) {
        CONTROL_INQUIRY
    } else {
        CONTROL_COMMAND
    };
    let seq = sequence.to_le_bytes();

    let mut buf = BytesMut::with_capacity(HEADER_LEN + frame.len());
    buf.put_u8(PAYLOAD_TYPE);
    buf.put_u8(control);
    buf.put_u16(frame.len() as u16);
    buf.put_slice(&seq[..4]);
    buf.put_slice(frame);
    buf.to_vec()
}

/// Strip the VISCA-over-IP header from a received datagram.
///
/// Datagrams shorter than the header yield an empty slice.
pub fn unwrap_datagram(datagram: &[u8]) -> &[u8] {
    datagram.get(HEADER_LEN..).unwrap_or(&[])
}

/// UDP transport speaking VISCA-over-IP to a single camera.
///
/// The socket is bound to an ephemeral local port and connected to the
/// camera on [`Transport::connect`], which filters out datagrams from any
/// other source.
#[derive(Debug)]
pub struct ViscaIpTransport {
    socket: Option<UdpSocket>,
    remote: SocketAddr,
    /// Number of datagrams sent so far.
    sequence: u64,
    /// Unwrapped reply bytes that did not fit the caller's buffer.
    pending: Vec<u8>,
}

impl ViscaIpTransport {
    /// Create a transport for the camera at `remote` without opening it.
    pub fn new(remote: SocketAddr) -> Self {
        Self {
            socket: None,
            remote,
            sequence: 0,
            pending: Vec::new(),
        }
    }

    /// Create and connect a transport for the camera at `remote`.
    pub async fn open(remote: SocketAddr) -> Result<Self> {
        let mut transport = Self::new(remote);
        transport.connect().await?;
        Ok(transport)
    }

    /// The camera's address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote
    }

    /// The local address, once connected.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    /// The sequence number that the next datagram will carry.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    fn drain_pending(&mut self, buf: &mut [u8]) -> usize {
        let n = self.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        n
    }
}

#[async_trait]
impl Transport for ViscaIpTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.socket.is_some() {
            return Ok(());
        }

        let bind_addr = if self.remote.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        tracing::debug!(remote = %self.remote, "Binding VISCA-over-IP socket");

        let socket = UdpSocket::bind(bind_addr).await.map_err(|e| {
            tracing::error!(addr = %bind_addr, error = %e, "Failed to bind UDP socket");
            Error::Io(e)
        })?;
        socket.connect(self.remote).await.map_err(|e| {
            tracing::error!(remote = %self.remote, error = %e, "Failed to connect UDP socket");
            Error::Transport(format!("Failed to connect to {}: {}", self.remote, e))
        })?;

        tracing::info!(
            local = ?socket.local_addr().ok(),
            remote = %self.remote,
            "VISCA-over-IP socket connected"
        );
        self.socket = Some(socket);
        self.pending.clear();
        Ok(())
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let socket = self.socket.as_ref().ok_or(Error::NotConnected)?;
        let datagram = wrap_frame(data, self.sequence);

        tracing::trace!(
            remote = %self.remote,
            sequence = self.sequence,
            bytes = datagram.len(),
            data = ?datagram,
            "Sending datagram"
        );

        socket.send(&datagram).await.map_err(|e| {
            tracing::error!(remote = %self.remote, error = %e, "Failed to send datagram");
            Error::Io(e)
        })?;
        self.sequence = self.sequence.wrapping_add(1);
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        if self.socket.is_none() {
            return Err(Error::NotConnected);
        }
        if !self.pending.is_empty() {
            return Ok(self.drain_pending(buf));
        }

        let socket = self.socket.as_ref().ok_or(Error::NotConnected)?;
        let mut datagram = [0u8; 1024];
        let n = match tokio::time::timeout(timeout, socket.recv(&mut datagram)).await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                tracing::error!(remote = %self.remote, error = %e, "Failed to receive datagram");
                return Err(Error::Io(e));
            }
            Err(_) => {
                tracing::trace!(
                    remote = %self.remote,
                    timeout_ms = timeout.as_millis(),
                    "Timeout waiting for datagram"
                );
                return Err(Error::Timeout);
            }
        };

        if n < HEADER_LEN {
            tracing::warn!(remote = %self.remote, bytes = n, "Datagram shorter than header");
        }
        let payload = unwrap_datagram(&datagram[..n]);
        tracing::trace!(
            remote = %self.remote,
            bytes = payload.len(),
            data = ?payload,
            "Received datagram"
        );

        self.pending.extend_from_slice(payload);
        Ok(self.drain_pending(buf))
    }

    async fn close(&mut self) -> Result<()> {
        if self.socket.take().is_some() {
            tracing::info!(remote = %self.remote, "VISCA-over-IP socket closed");
        }
        self.pending.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.socket.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_command_frame() {
        let frame = [0x81, 0x01, 0x04, 0x07, 0x00, 0xFF];
        let datagram = wrap_frame(&frame, 0);
        assert_eq!(
            datagram,
            vec![0x01, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 0x00, 0x81, 0x01, 0x04, 0x07, 0x00, 0xFF]
        );
    }

    #[test]
    fn wrap_inquiry_frame_sets_control_byte() {
        let frame = [0x81, 0x09, 0x04, 0x47, 0xFF];
        let datagram = wrap_frame(&frame, 0x0102_0304_0506_0708);
        assert_eq!(&datagram[..4], &[0x01, 0x10, 0x00, 0x05]);
        // Low four bytes of the counter, least significant first.
        assert_eq!(&datagram[4..8], &[0x08, 0x07, 0x06, 0x05]);
        assert_eq!(&datagram[8..], &frame);
    }

    #[test]
    fn unwrap_strips_header() {
        let datagram = [0x01, 0x11, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x90, 0x41, 0xFF];
        assert_eq!(unwrap_datagram(&datagram), &[0x90, 0x41, 0xFF]);
        assert!(unwrap_datagram(&[0x01, 0x11]).is_empty());
    }

    #[tokio::test]
    async fn send_before_connect_fails() {
        let mut transport = ViscaIpTransport::new("127.0.0.1:52381".parse().unwrap());
        assert!(!transport.is_connected());
        let result = transport.send(&[0x81, 0x09, 0x06, 0x12, 0xFF]).await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn loopback_exchange() {
        let camera = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut transport = ViscaIpTransport::open(camera.local_addr().unwrap())
            .await
            .unwrap();

        transport.send(&[0x81, 0x09, 0x04, 0x47, 0xFF]).await.unwrap();
        transport.send(&[0x81, 0x01, 0x04, 0x07, 0x00, 0xFF]).await.unwrap();
        assert_eq!(transport.sequence(), 2);

        let mut buf = [0u8; 64];
        let (n, from) = camera.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &wrap_frame(&[0x81, 0x09, 0x04, 0x47, 0xFF], 0)[..]);
        let (n, _) = camera.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[4..8], &[0x01, 0x00, 0x00, 0x00]);
        assert_eq!(n, HEADER_LEN + 6);

        let reply = wrap_frame(&[0x90, 0x50, 0x00, 0x01, 0x02, 0x03, 0xFF], 0);
        camera.send_to(&reply, from).await.unwrap();

        let n = transport
            .receive(&mut buf, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(&buf[..n], &[0x90, 0x50, 0x00, 0x01, 0x02, 0x03, 0xFF]);
    }

    #[tokio::test]
    async fn small_buffer_keeps_remainder() {
        let camera = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut transport = ViscaIpTransport::open(camera.local_addr().unwrap())
            .await
            .unwrap();
        let local = transport.local_addr().unwrap();

        let reply = wrap_frame(&[0x90, 0x41, 0xFF, 0x90, 0x51, 0xFF], 0);
        camera.send_to(&reply, local).await.unwrap();

        let mut buf = [0u8; 4];
        let n = transport.receive(&mut buf, Duration::from_secs(2)).await.unwrap();
        assert_eq!(&buf[..n], &[0x90, 0x41, 0xFF, 0x90]);
        let n = transport.receive(&mut buf, Duration::from_secs(2)).await.unwrap();
        assert_eq!(&buf[..n], &[0x51, 0xFF]);
    }

    #[tokio::test]
    async fn receive_timeout() {
        let camera = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut transport = ViscaIpTransport::open(camera.local_addr().unwrap())
            .await
            .unwrap();

        let mut buf = [0u8; 16];
        let result = transport.receive(&mut buf, Duration::from_millis(50)).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let camera = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut transport = ViscaIpTransport::open(camera.local_addr().unwrap())
            .await
            .unwrap();
        transport.connect().await.unwrap();
        assert!(transport.is_connected());

        transport.close().await.unwrap();
        transport.close().await.unwrap();
        assert!(!transport.is_connected());
    }
}
