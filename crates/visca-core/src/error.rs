//! Error types for visca.
//!
//! All fallible operations across the workspace return [`Result<T>`], which
//! uses [`Error`] as the error type. Validation, protocol, device and
//! transport failures are all captured here.

/// The error type for all visca operations.
///
/// Variants separate the failure modes a caller reacts to differently:
/// parameters rejected before anything is sent, malformed or unexpected
/// replies, error replies from the camera itself, deadlines, and channel
/// failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (serial port, UDP socket).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error (unexpected handshake reply, wrong inquiry
    /// payload length, malformed nibble data).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The camera answered with an error reply.
    ///
    /// Carries the raw, unmasked type byte (byte 1 of the reply), e.g.
    /// `0x61` for a syntax error or `0x62` for a full command buffer.
    #[error("device returned error reply 0x{0:02X}")]
    Device(u8),

    /// Timed out waiting for a response from the camera.
    ///
    /// This typically indicates the camera is powered off, the baud rate is
    /// wrong, or a retry loop ran past its deadline.
    #[error("timeout waiting for response")]
    Timeout,

    /// An invalid parameter was passed to a camera command.
    ///
    /// Raised before any frame is built or sent.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No connection to the camera has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the camera was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
