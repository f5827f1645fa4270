//! Transport implementations for visca.
//!
//! This crate provides concrete implementations of the
//! [`Transport`](visca_core::Transport) trait from `visca-core`:
//!
//! - [`SerialTransport`]: RS-232 and USB-serial VISCA connections
//! - [`ViscaIpTransport`]: VISCA-over-IP (UDP, 8-byte header per datagram)
//!
//! # Example
//!
//! ```no_run
//! use visca_transport::ViscaIpTransport;
//! use visca_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> visca_core::Result<()> {
//! let addr = "192.168.0.100:52381".parse().unwrap();
//! let mut transport = ViscaIpTransport::open(addr).await?;
//!
//! transport.send(&[0x81, 0x09, 0x06, 0x12, 0xFF]).await?;
//!
//! let mut buf = [0u8; 64];
//! let n = transport.receive(&mut buf, Duration::from_secs(2)).await?;
//! # Ok(())
//! # }
//! ```

pub mod serial;
pub mod udp;

pub use serial::{DataBits, FlowControl, Parity, SerialConfig, SerialTransport, StopBits};
pub use udp::ViscaIpTransport;
