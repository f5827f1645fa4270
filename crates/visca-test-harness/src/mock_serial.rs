//! Mock transport for deterministic testing of the VISCA session engine.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/reply pairs. This lets you test frame encoding, reply
//! classification and inquiry decoding without a camera attached.
//!
//! # Example
//!
//! ```
//! use visca_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! // Pan/tilt stop to camera 1: ACK, then Completion.
//! mock.expect(&[0x81, 0x01, 0x06, 0x01, 0x00, 0x00, 0x03, 0x03, 0xFF],
//!             &[0x90, 0x41, 0xFF, 0x90, 0x51, 0xFF]);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

use visca_core::error::{Error, Result};
use visca_core::transport::Transport;

/// A pre-loaded request/reply pair for the mock transport.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be sent.
    request: Vec<u8>,
    /// The bytes to return when the matching request is received.
    response: Vec<u8>,
}

/// A mock [`Transport`] for testing without hardware.
///
/// Expectations are consumed in order. When `send()` is called, the sent
/// data is recorded and matched against the next expectation. The
/// corresponding reply bytes are then returned by subsequent `receive()`
/// calls. An empty reply makes the next `receive()` time out, which is how
/// a silent camera is simulated.
///
/// If no expectation matches or the queue is exhausted, an error is returned.
#[derive(Debug)]
pub struct MockTransport {
    expectations: VecDeque<Expectation>,
    /// The reply data pending for the next `receive()` call.
    pending_response: Option<Vec<u8>>,
    /// How many bytes of the pending reply have been read so far.
    response_cursor: usize,
    /// Largest number of bytes handed out per `receive()`.
    chunk_size: usize,
    connected: bool,
    connect_calls: usize,
    /// Log of all bytes sent through this transport.
    sent_log: Vec<Vec<u8>>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            expectations: VecDeque::new(),
            pending_response: None,
            response_cursor: 0,
            chunk_size: usize::MAX,
            connected: true,
            connect_calls: 0,
            sent_log: Vec::new(),
        }
    }

    /// Create a new mock transport that starts closed.
    ///
    /// `connect()` must be called before any exchange.
    pub fn disconnected() -> Self {
        MockTransport {
            connected: false,
            ..Self::new()
        }
    }

    /// Add an expected request/reply pair.
    ///
    /// When `send()` is called with data matching `request`, the subsequent
    /// `receive()` calls will return `response`. Several VISCA replies may be
    /// concatenated in one `response` (e.g. ACK followed by Completion).
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// Limit how many bytes each `receive()` returns.
    ///
    /// Useful for exercising reassembly of replies split across reads.
    pub fn set_chunk_size(&mut self, chunk_size: usize) {
        self.chunk_size = chunk_size.max(1);
    }

    /// Return a reference to all data that has been sent through this transport.
    ///
    /// Each element is the byte slice from one `send()` call.
    pub fn sent_data(&self) -> &[Vec<u8>] {
        &self.sent_log
    }

    /// Return the number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }

    /// Return how many times `connect()` has been called.
    pub fn connect_calls(&self) -> usize {
        self.connect_calls
    }

    /// Set the connected state of the mock transport.
    ///
    /// When set to `false`, subsequent `send()` and `receive()` calls will
    /// return [`Error::NotConnected`].
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&mut self) -> Result<()> {
        self.connect_calls += 1;
        self.connected = true;
        Ok(())
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        self.sent_log.push(data.to_vec());

        if let Some(expectation) = self.expectations.pop_front() {
            if data != expectation.request.as_slice() {
                return Err(Error::Protocol(format!(
                    "unexpected send data: expected {:02X?}, got {:02X?}",
                    expectation.request, data
                )));
            }
            self.pending_response = Some(expectation.response);
            self.response_cursor = 0;
            Ok(())
        } else {
            Err(Error::Protocol(
                "no more expectations in mock transport".into(),
            ))
        }
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        if let Some(ref response) = self.pending_response {
            let remaining = &response[self.response_cursor..];
            if remaining.is_empty() {
                self.pending_response = None;
                self.response_cursor = 0;
                return Err(Error::Timeout);
            }
            let n = remaining.len().min(buf.len()).min(self.chunk_size);
            buf[..n].copy_from_slice(&remaining[..n]);
            self.response_cursor += n;
            if self.response_cursor >= response.len() {
                self.pending_response = None;
                self.response_cursor = 0;
            }
            Ok(n)
        } else {
            Err(Error::Timeout)
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.pending_response = None;
        self.response_cursor = 0;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
