//! Request/reply session with one VISCA camera.
//!
//! A [`Session`] owns the transport and drives every exchange: the address
//! handshake, single commands, and the inquiry policies. Exchanges never
//! overlap. Each method takes `&mut self`, so a session shared between
//! tasks must be wrapped in a lock by the caller.
//!
//! ```text
//! AwaitingHandshake --connect()--> Connected(addr)
//!        ^                            |
//!        +-------disconnect()---------+
//! ```

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use visca_core::error::{Error, Result};
use visca_core::transport::Transport;

use crate::commands::{
    self, Command, MAX_SPEED_REPLY_LEN, PAN_TILT_POSITION_REPLY_LEN, ZOOM_POSITION_REPLY_LEN,
};
use crate::frame::{CameraAddress, Outcome, Reply, TERMINATOR, classify};

/// Receive buffer size for a single transport read.
const READ_CHUNK: usize = 64;

/// Unterminated input beyond this is discarded as line noise.
const MAX_RX_BUF: usize = 1024;

/// Session timing and handshake configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long to wait for a reply terminator.
    pub reply_timeout: Duration,
    /// Run the address-set handshake on connect. When disabled the camera
    /// is assumed to sit at address 1.
    pub handshake: bool,
    /// Overall bound on the ACK loop of the handshake.
    pub handshake_deadline: Duration,
    /// Overall bound on re-issuing a zoom inquiry that keeps returning
    /// malformed replies.
    pub inquiry_deadline: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            reply_timeout: Duration::from_millis(2000),
            handshake: true,
            handshake_deadline: Duration::from_secs(5),
            inquiry_deadline: Duration::from_secs(5),
        }
    }
}

/// Connection state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingHandshake,
    Connected(CameraAddress),
}

/// A serialized command/reply channel to one camera.
pub struct Session {
    transport: Box<dyn Transport>,
    config: SessionConfig,
    state: SessionState,
    /// Received bytes not yet consumed by a reply.
    rx_buf: Vec<u8>,
}

impl Session {
    pub fn new(transport: Box<dyn Transport>, config: SessionConfig) -> Self {
        Session {
            transport,
            config,
            state: SessionState::AwaitingHandshake,
            rx_buf: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The camera address, once connected.
    pub fn address(&self) -> Option<CameraAddress> {
        match self.state {
            SessionState::Connected(addr) => Some(addr),
            SessionState::AwaitingHandshake => None,
        }
    }

    /// Open the transport and establish the camera address.
    ///
    /// Re-running `connect()` on a connected session repeats the handshake.
    /// A failed handshake leaves the session in
    /// [`SessionState::AwaitingHandshake`].
    pub async fn connect(&mut self) -> Result<CameraAddress> {
        self.state = SessionState::AwaitingHandshake;
        self.rx_buf.clear();
        self.transport.connect().await?;

        let address = if self.config.handshake {
            self.handshake().await?
        } else {
            debug!("handshake disabled, using address 1");
            CameraAddress::default()
        };

        info!(address = %address, "camera connected");
        self.state = SessionState::Connected(address);
        Ok(address)
    }

    /// Send the broadcast address set and wait for the assignment.
    async fn handshake(&mut self) -> Result<CameraAddress> {
        let deadline = Instant::now() + self.config.handshake_deadline;
        self.send(&Command::Connect, CameraAddress::default()).await?;

        let mut reply = self.read_reply().await?;
        while reply.is_ack() {
            if Instant::now() >= deadline {
                warn!("handshake deadline passed while receiving ACKs");
                return Err(Error::Timeout);
            }
            reply = self.read_reply().await?;
        }

        match reply.outcome {
            Outcome::AddressAssignment(_) => {
                let address = commands::parse_address_assignment(&reply.payload)?;
                debug!(address = %address, "address assigned");
                Ok(address)
            }
            other => Err(Error::Protocol(format!(
                "expected address assignment reply, got {:?} (type byte {:02X?})",
                other,
                reply.payload.get(1)
            ))),
        }
    }

    /// Close the transport and return to [`SessionState::AwaitingHandshake`].
    pub async fn disconnect(&mut self) -> Result<()> {
        self.state = SessionState::AwaitingHandshake;
        self.rx_buf.clear();
        self.transport.close().await
    }

    /// Send `command` and read exactly one reply.
    ///
    /// An error reply becomes [`Error::Device`] with the raw type byte. Any
    /// other outcome, including [`Outcome::Timeout`], is returned to the
    /// caller.
    pub async fn execute(&mut self, command: &Command) -> Result<Reply> {
        let address = self.address().ok_or(Error::NotConnected)?;
        self.send(command, address).await?;

        let reply = self.read_reply().await?;
        if let Outcome::Error(code) = reply.outcome {
            warn!(
                command = %command,
                code = format_args!("0x{:02X}", code),
                "camera returned error"
            );
            return Err(Error::Device(code));
        }
        debug!(command = %command, outcome = ?reply.outcome, "reply");
        Ok(reply)
    }

    /// Query the pan/tilt position as `(pan, tilt)` encoder counts.
    ///
    /// The reply must be exactly 11 bytes; it is not retried.
    pub async fn inquire_pan_tilt(&mut self) -> Result<(i16, i16)> {
        let reply = self.execute(&Command::PanTiltPositionInquiry).await?;
        if reply.outcome == Outcome::Timeout {
            return Err(Error::Timeout);
        }
        if reply.payload.len() != PAN_TILT_POSITION_REPLY_LEN {
            warn!(bytes = reply.payload.len(), "unexpected pan/tilt reply length");
        }
        commands::parse_pan_tilt_position(&reply.payload)
    }

    /// Query the zoom encoder count.
    ///
    /// Replies of the wrong length (stale completions) and unterminated
    /// replies are discarded and the inquiry is re-issued until a terminated
    /// 7-byte reply arrives or the inquiry deadline passes.
    pub async fn inquire_zoom(&mut self) -> Result<i16> {
        let deadline = Instant::now() + self.config.inquiry_deadline;
        loop {
            let reply = self.execute(&Command::ZoomPositionInquiry).await?;
            if reply.outcome != Outcome::Timeout
                && reply.payload.len() == ZOOM_POSITION_REPLY_LEN
            {
                return commands::parse_zoom_position(&reply.payload);
            }
            debug!(
                bytes = reply.payload.len(),
                outcome = ?reply.outcome,
                "zoom reply has wrong length, re-issuing inquiry"
            );
            if Instant::now() >= deadline {
                warn!("zoom inquiry deadline passed");
                return Err(Error::Timeout);
            }
        }
    }

    /// Query the maximum pan and tilt speeds.
    pub async fn inquire_max_speed(&mut self) -> Result<(u8, u8)> {
        let reply = self.execute(&Command::PanTiltMaxSpeedInquiry).await?;
        if reply.outcome == Outcome::Timeout {
            return Err(Error::Timeout);
        }
        if reply.payload.len() != MAX_SPEED_REPLY_LEN {
            warn!(bytes = reply.payload.len(), "unexpected max speed reply length");
        }
        commands::parse_max_speed(&reply.payload)
    }

    async fn send(&mut self, command: &Command, address: CameraAddress) -> Result<()> {
        let bytes = command.encode(address);
        debug!(command = %command, address = %address, "sending");
        trace!(data = ?bytes, "tx");
        self.transport.send(&bytes).await
    }

    /// Read the next reply, up to and including its terminator.
    ///
    /// Bytes after the terminator stay buffered for the next reply. If the
    /// reply timeout passes first, whatever arrived is classified as
    /// unterminated.
    pub async fn read_reply(&mut self) -> Result<Reply> {
        if let Some(reply) = self.take_buffered_reply() {
            return Ok(reply);
        }

        let deadline = Instant::now() + self.config.reply_timeout;
        let mut buf = [0u8; READ_CHUNK];
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let remaining = deadline - now;

            match self.transport.receive(&mut buf, remaining).await {
                Ok(n) => {
                    trace!(data = ?&buf[..n], "rx");
                    self.rx_buf.extend_from_slice(&buf[..n]);
                    if let Some(reply) = self.take_buffered_reply() {
                        return Ok(reply);
                    }
                    if self.rx_buf.len() > MAX_RX_BUF {
                        warn!(bytes = self.rx_buf.len(), "discarding unterminated input");
                        self.rx_buf.clear();
                    }
                }
                Err(Error::Timeout) => break,
                Err(e) => return Err(e),
            }
        }

        let partial = std::mem::take(&mut self.rx_buf);
        debug!(bytes = partial.len(), "no reply terminator before timeout");
        Ok(classify(&partial, false))
    }

    fn take_buffered_reply(&mut self) -> Option<Reply> {
        let end = self.rx_buf.iter().position(|&b| b == TERMINATOR)?;
        let frame: Vec<u8> = self.rx_buf.drain(..=end).collect();
        Some(classify(&frame, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visca_test_harness::MockTransport;

    const CONNECT: [u8; 4] = [0x88, 0x30, 0x01, 0xFF];
    const ZOOM_INQ: [u8; 5] = [0x81, 0x09, 0x04, 0x47, 0xFF];
    const PT_INQ: [u8; 5] = [0x81, 0x09, 0x06, 0x12, 0xFF];
    const PT_STOP: [u8; 9] = [0x81, 0x01, 0x06, 0x01, 0x00, 0x00, 0x03, 0x03, 0xFF];

    fn session(mock: MockTransport) -> Session {
        Session::new(Box::new(mock), SessionConfig::default())
    }

    fn no_handshake() -> SessionConfig {
        SessionConfig {
            handshake: false,
            ..Default::default()
        }
    }

    async fn connected(mock: MockTransport) -> Session {
        let mut s = Session::new(Box::new(mock), no_handshake());
        s.connect().await.unwrap();
        s
    }

    // ---------------------------------------------------------------
    // Handshake
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn handshake_skips_acks() {
        let mut mock = MockTransport::disconnected();
        mock.expect(
            &CONNECT,
            &[0x90, 0x41, 0xFF, 0x90, 0x41, 0xFF, 0x88, 0x30, 0x03, 0xFF],
        );
        let mut s = session(mock);
        assert_eq!(s.state(), SessionState::AwaitingHandshake);

        let addr = s.connect().await.unwrap();
        assert_eq!(addr.value(), 2);
        assert_eq!(s.state(), SessionState::Connected(addr));
    }

    #[tokio::test]
    async fn handshake_rejects_other_reply() {
        let mut mock = MockTransport::new();
        mock.expect(&CONNECT, &[0x90, 0x51, 0xFF]);
        let mut s = session(mock);

        let err = s.connect().await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)), "{err}");
        assert_eq!(s.state(), SessionState::AwaitingHandshake);
    }

    #[tokio::test]
    async fn handshake_silent_camera_fails() {
        let mut mock = MockTransport::new();
        mock.expect(&CONNECT, &[]);
        let mut s = session(mock);
        assert!(matches!(s.connect().await, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn handshake_ack_loop_is_bounded() {
        let mut mock = MockTransport::new();
        mock.expect(&CONNECT, &[0x90, 0x41, 0xFF, 0x90, 0x41, 0xFF]);
        let config = SessionConfig {
            handshake_deadline: Duration::ZERO,
            ..Default::default()
        };
        let mut s = Session::new(Box::new(mock), config);
        assert!(matches!(s.connect().await, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn handshake_disabled_sends_nothing() {
        let mut mock = MockTransport::disconnected();
        // If the connect frame were sent it would consume this expectation
        // and fail the match.
        mock.expect(&PT_STOP, &[0x90, 0x41, 0xFF]);
        let mut s = Session::new(Box::new(mock), no_handshake());

        let addr = s.connect().await.unwrap();
        assert_eq!(addr.value(), 1);
        let reply = s.execute(&Command::PanTiltStop).await.unwrap();
        assert_eq!(reply.outcome, Outcome::Ack);
    }

    #[tokio::test]
    async fn reconnect_repeats_handshake() {
        let mut mock = MockTransport::new();
        mock.expect(&CONNECT, &[0x88, 0x30, 0x02, 0xFF]);
        mock.expect(&CONNECT, &[0x88, 0x30, 0x03, 0xFF]);
        let mut s = session(mock);

        assert_eq!(s.connect().await.unwrap().value(), 1);
        s.disconnect().await.unwrap();
        assert_eq!(s.state(), SessionState::AwaitingHandshake);
        assert!(s.address().is_none());
        assert_eq!(s.connect().await.unwrap().value(), 2);
    }

    #[tokio::test]
    async fn failed_rehandshake_leaves_session_disconnected() {
        let mut mock = MockTransport::new();
        mock.expect(&CONNECT, &[0x88, 0x30, 0x03, 0xFF]);
        mock.expect(&CONNECT, &[0x90, 0x51, 0xFF]);
        let mut s = session(mock);

        assert_eq!(s.connect().await.unwrap().value(), 2);
        assert!(matches!(s.connect().await, Err(Error::Protocol(_))));
        assert_eq!(s.state(), SessionState::AwaitingHandshake);
        assert!(s.address().is_none());
        assert!(matches!(
            s.execute(&Command::PanTiltStop).await,
            Err(Error::NotConnected)
        ));
    }

    // ---------------------------------------------------------------
    // Execute
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn execute_requires_connection() {
        let mut s = session(MockTransport::new());
        let result = s.execute(&Command::PanTiltStop).await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn execute_returns_first_reply_and_keeps_rest() {
        let mut mock = MockTransport::new();
        mock.expect(&PT_STOP, &[0x90, 0x41, 0xFF, 0x90, 0x51, 0xFF]);
        let mut s = connected(mock).await;

        let reply = s.execute(&Command::PanTiltStop).await.unwrap();
        assert_eq!(reply.outcome, Outcome::Ack);
        assert_eq!(reply.payload, vec![0x90, 0x41, 0xFF]);

        let next = s.read_reply().await.unwrap();
        assert_eq!(next.outcome, Outcome::Completed);
    }

    #[tokio::test]
    async fn execute_error_reply_is_device_error() {
        let mut mock = MockTransport::new();
        mock.expect(&PT_STOP, &[0x90, 0x61, 0x41, 0xFF]);
        let mut s = connected(mock).await;

        let err = s.execute(&Command::PanTiltStop).await.unwrap_err();
        assert!(matches!(err, Error::Device(0x61)));
    }

    #[tokio::test]
    async fn execute_silent_camera_is_short_error() {
        let mut mock = MockTransport::new();
        mock.expect(&PT_STOP, &[]);
        let mut s = connected(mock).await;

        let err = s.execute(&Command::PanTiltStop).await.unwrap_err();
        assert!(matches!(err, Error::Device(0x60)));
    }

    #[tokio::test]
    async fn execute_partial_reply_times_out() {
        let mut mock = MockTransport::new();
        mock.expect(&PT_STOP, &[0x90, 0x41, 0x00]);
        let mut s = connected(mock).await;

        let reply = s.execute(&Command::PanTiltStop).await.unwrap();
        assert_eq!(reply.outcome, Outcome::Timeout);
    }

    #[tokio::test]
    async fn reply_reassembled_across_reads() {
        let mut mock = MockTransport::new();
        mock.set_chunk_size(1);
        mock.expect(&ZOOM_INQ, &[0x90, 0x50, 0x01, 0x02, 0x03, 0x04, 0xFF]);
        let mut s = connected(mock).await;

        assert_eq!(s.inquire_zoom().await.unwrap(), 0x1234);
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x00], &[]);
        let mut s = connected(mock).await;
        // Mismatched send surfaces as the transport's own error.
        assert!(matches!(
            s.execute(&Command::PanTiltStop).await,
            Err(Error::Protocol(_))
        ));
    }

    // ---------------------------------------------------------------
    // Inquiries
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn zoom_inquiry_retries_until_full_reply() {
        let mut mock = MockTransport::new();
        mock.expect(&ZOOM_INQ, &[0x90, 0x50, 0x01, 0x02, 0xFF]);
        mock.expect(&ZOOM_INQ, &[0x90, 0x50, 0x04, 0x00, 0x00, 0x00, 0xFF]);
        let mut s = connected(mock).await;

        assert_eq!(s.inquire_zoom().await.unwrap(), 16384);
    }

    #[tokio::test]
    async fn zoom_inquiry_skips_stale_completion() {
        let mut mock = MockTransport::new();
        // A completion left over from an earlier move arrives first.
        mock.expect(&ZOOM_INQ, &[0x90, 0x51, 0xFF, 0x90, 0x50, 0x00, 0x00, 0x00, 0x00, 0xFF]);
        mock.expect(&ZOOM_INQ, &[]);
        let mut s = connected(mock).await;

        // Second inquiry is answered from the buffered reply.
        assert_eq!(s.inquire_zoom().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn zoom_inquiry_reissues_after_unterminated_reply() {
        let mut mock = MockTransport::new();
        mock.expect(&ZOOM_INQ, &[0x90, 0x50, 0x01, 0x02, 0x03, 0x04, 0x00]);
        mock.expect(&ZOOM_INQ, &[0x90, 0x50, 0x04, 0x00, 0x00, 0x00, 0xFF]);
        let mut s = connected(mock).await;

        assert_eq!(s.inquire_zoom().await.unwrap(), 16384);
    }

    #[tokio::test]
    async fn zoom_inquiry_deadline() {
        let mut mock = MockTransport::new();
        mock.expect(&ZOOM_INQ, &[0x90, 0x50, 0xFF]);
        let config = SessionConfig {
            handshake: false,
            inquiry_deadline: Duration::ZERO,
            ..Default::default()
        };
        let mut s = Session::new(Box::new(mock), config);
        s.connect().await.unwrap();

        assert!(matches!(s.inquire_zoom().await, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn zoom_inquiry_error_is_not_retried() {
        let mut mock = MockTransport::new();
        mock.expect(&ZOOM_INQ, &[0x90, 0x60, 0x02, 0xFF]);
        let mut s = connected(mock).await;
        assert!(matches!(s.inquire_zoom().await, Err(Error::Device(0x60))));
    }

    #[tokio::test]
    async fn pan_tilt_inquiry() {
        let mut mock = MockTransport::new();
        mock.expect(
            &PT_INQ,
            &[0x90, 0x50, 0x00, 0x04, 0x0B, 0x00, 0x0F, 0x0F, 0x03, 0x08, 0xFF],
        );
        let mut s = connected(mock).await;
        assert_eq!(s.inquire_pan_tilt().await.unwrap(), (1200, -200));
    }

    #[tokio::test]
    async fn pan_tilt_inquiry_wrong_length_is_not_retried() {
        let mut mock = MockTransport::new();
        mock.expect(&PT_INQ, &[0x90, 0x51, 0xFF]);
        let mut s = connected(mock).await;
        assert!(matches!(s.inquire_pan_tilt().await, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn pan_tilt_inquiry_timeout() {
        let mut mock = MockTransport::new();
        mock.expect(&PT_INQ, &[0x90, 0x50, 0x00, 0x04]);
        let mut s = connected(mock).await;
        assert!(matches!(s.inquire_pan_tilt().await, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn max_speed_inquiry() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x81, 0x09, 0x06, 0x11, 0xFF], &[0x90, 0x50, 0x18, 0x14, 0xFF]);
        let mut s = connected(mock).await;
        assert_eq!(s.inquire_max_speed().await.unwrap(), (24, 20));
    }
}
