//! VISCA frame primitives and reply classification.
//!
//! VISCA frames are short byte strings addressed to one camera on a daisy
//! chain (serial) or carried one per datagram (VISCA-over-IP). This module
//! holds the byte constants shared by every command, camera addressing,
//! nibble packing of 16-bit positions, and the classifier that turns a
//! received reply into an [`Outcome`].
//!
//! # Frame format
//!
//! ```text
//! <0x80 | addr> <0x01 | 0x09> <category> <command> [<data>...] 0xFF
//! ```
//!
//! - Header: `0x80` with the camera address in the low bits
//! - `0x01` marks a command, `0x09` an inquiry
//! - Terminator: `0xFF`
//!
//! Replies start with `(addr + 8) << 4` and carry their type in the high
//! nibble of byte 1:
//!
//! ```text
//! 0x90 0x41 0xFF          ACK (socket 1)
//! 0x90 0x51 0xFF          Completion (socket 1)
//! 0x90 0x50 ... 0xFF      Completion carrying inquiry data
//! 0x90 0x60 0x02 0xFF     Error (syntax)
//! 0x88 0x30 0x02 0xFF     Address assignment (broadcast)
//! ```

use visca_core::{Error, Result};

/// Header base; OR'd with the camera address.
pub const HEADER: u8 = 0x80;

/// Frame terminator byte.
pub const TERMINATOR: u8 = 0xFF;

/// Byte 1 of a command frame.
pub const COMMAND: u8 = 0x01;

/// Byte 1 of an inquiry frame.
pub const INQUIRY: u8 = 0x09;

/// Camera (lens) command category.
pub const CATEGORY_CAMERA: u8 = 0x04;

/// Pan-tilter command category.
pub const CATEGORY_PAN_TILTER: u8 = 0x06;

/// Reply type nibbles (high nibble of byte 1).
pub const REPLY_ADDRESS: u8 = 0x30;
pub const REPLY_ACK: u8 = 0x40;
pub const REPLY_COMPLETED: u8 = 0x50;
pub const REPLY_ERROR: u8 = 0x60;

/// Highest camera address on a VISCA chain.
pub const MAX_ADDRESS: u8 = 8;

/// Address of a camera on the VISCA chain.
///
/// Valid addresses are `0..=8`; construction rejects anything else, so a
/// `CameraAddress` can always be placed in a header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraAddress(u8);

impl CameraAddress {
    /// Validate and wrap a camera address.
    pub fn new(address: u8) -> Result<Self> {
        if address > MAX_ADDRESS {
            return Err(Error::InvalidParameter(format!(
                "camera address must be in 0..={}, got {}",
                MAX_ADDRESS, address
            )));
        }
        Ok(CameraAddress(address))
    }

    /// The raw address value.
    pub fn value(self) -> u8 {
        self.0
    }

    /// The first byte of a frame sent to this camera.
    pub fn header(self) -> u8 {
        HEADER | self.0
    }
}

impl Default for CameraAddress {
    fn default() -> Self {
        CameraAddress(1)
    }
}

impl std::fmt::Display for CameraAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Header byte used for the broadcast address-set frame.
pub fn broadcast_header() -> u8 {
    (HEADER | (1 << 3)) & 0xF8
}

/// Split a signed 16-bit value into four nibbles, most significant first.
///
/// Each output byte carries one nibble in its low four bits, as VISCA
/// position fields require.
///
/// # Example
///
/// ```
/// use visca_camera::frame::pack_nibbles;
///
/// assert_eq!(pack_nibbles(0x1234), [0x01, 0x02, 0x03, 0x04]);
/// assert_eq!(pack_nibbles(-1), [0x0F, 0x0F, 0x0F, 0x0F]);
/// ```
pub fn pack_nibbles(value: i16) -> [u8; 4] {
    let v = value as u16;
    [
        ((v >> 12) & 0x0F) as u8,
        ((v >> 8) & 0x0F) as u8,
        ((v >> 4) & 0x0F) as u8,
        (v & 0x0F) as u8,
    ]
}

/// Reassemble four nibble bytes into a signed 16-bit value.
///
/// Returns [`Error::Protocol`] if fewer than four bytes are supplied or a
/// byte has bits set above its low nibble.
pub fn unpack_nibbles(data: &[u8]) -> Result<i16> {
    if data.len() < 4 {
        return Err(Error::Protocol(format!(
            "expected 4 nibble bytes, got {}",
            data.len()
        )));
    }
    let mut value: u16 = 0;
    for &b in &data[..4] {
        if b > 0x0F {
            return Err(Error::Protocol(format!(
                "invalid nibble byte 0x{:02X}: high nibble must be zero",
                b
            )));
        }
        value = (value << 4) | b as u16;
    }
    Ok(value as i16)
}

/// Semantic classification of a camera reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Address-set reply; carries byte 2 (the next free address).
    AddressAssignment(u8),
    /// The command was accepted and is executing.
    Ack,
    /// The command finished, or an inquiry returned its data.
    Completed,
    /// The camera rejected the command; carries the raw type byte.
    Error(u8),
    /// No terminator arrived before the reply deadline.
    Timeout,
    /// A reply type this engine does not know; carries the raw type byte.
    Unknown(u8),
}

/// One classified reply from the camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub outcome: Outcome,
    /// The raw reply bytes, terminator included when one arrived.
    pub payload: Vec<u8>,
}

impl Reply {
    pub fn is_ack(&self) -> bool {
        self.outcome == Outcome::Ack
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }
}

/// Classify the bytes collected for one reply.
///
/// `terminated` is `false` when the read deadline expired before a
/// terminator was seen. Replies shorter than three bytes are classified as
/// errors whether or not they were terminated.
///
/// # Example
///
/// ```
/// use visca_camera::frame::{classify, Outcome};
///
/// let reply = classify(&[0x90, 0x41, 0xFF], true);
/// assert_eq!(reply.outcome, Outcome::Ack);
///
/// let reply = classify(&[0x90, 0x61, 0x41, 0xFF], true);
/// assert_eq!(reply.outcome, Outcome::Error(0x61));
/// ```
pub fn classify(bytes: &[u8], terminated: bool) -> Reply {
    let payload = bytes.to_vec();
    if bytes.len() < 3 {
        return Reply {
            outcome: Outcome::Error(REPLY_ERROR),
            payload,
        };
    }
    if !terminated {
        return Reply {
            outcome: Outcome::Timeout,
            payload,
        };
    }

    let kind = bytes[1];
    let outcome = match kind & 0xF0 {
        REPLY_ADDRESS => Outcome::AddressAssignment(bytes[2]),
        REPLY_ACK => Outcome::Ack,
        REPLY_COMPLETED => Outcome::Completed,
        REPLY_ERROR => Outcome::Error(kind),
        _ => Outcome::Unknown(kind),
    };
    Reply { outcome, payload }
}
