//! VISCA pan/tilt/zoom camera control.
//!
//! This crate implements the subset of the Sony VISCA protocol needed to
//! drive a PTZ camera over RS-232 or VISCA-over-IP. It provides:
//!
//! - **Frame codec** ([`frame`]) -- header/terminator constants, camera
//!   addressing, nibble packing, and reply classification.
//! - **Commands** ([`commands`]) -- validated jog, absolute, stop and
//!   inquiry commands and the parsers for their replies.
//! - **Value mapping** ([`position`]) -- encoder counts to degrees and zoom
//!   ratios through a calibration table.
//! - **Model limits** ([`limits`]) -- per-model speed ranges, travel and zoom
//!   calibration.
//! - **Session** ([`session`]) -- handshake, one-reply-per-command execution
//!   and inquiry retry policy over a [`Transport`](visca_core::Transport).
//! - **ViscaCamera** ([`camera`]) and **ViscaBuilder** ([`builder`]) -- the
//!   high-level facade.
//!
//! # Example
//!
//! ```
//! use visca_camera::commands::{Command, PanTiltJog};
//! use visca_camera::frame::{CameraAddress, Outcome, classify};
//! use visca_camera::limits::scopia_flex;
//!
//! let limits = scopia_flex();
//! let jog = PanTiltJog::from_degrees(0.0, 10, &limits).unwrap();
//! let bytes = Command::PanTiltJog(jog).encode(CameraAddress::default());
//! assert_eq!(bytes, vec![0x81, 0x01, 0x06, 0x01, 0x0A, 0x0A, 0x03, 0x01, 0xFF]);
//!
//! let reply = classify(&[0x90, 0x41, 0xFF], true);
//! assert_eq!(reply.outcome, Outcome::Ack);
//! ```

pub mod builder;
pub mod camera;
pub mod commands;
pub mod frame;
pub mod limits;
pub mod position;
pub mod session;

pub use builder::ViscaBuilder;
pub use camera::ViscaCamera;
pub use commands::ZoomDirection;
pub use frame::{CameraAddress, Outcome, Reply};
pub use session::{Session, SessionConfig, SessionState};
