//! ViscaBuilder -- fluent builder for constructing [`ViscaCamera`] instances.
//!
//! Separates configuration from construction so that callers can choose a
//! serial port or a VISCA-over-IP endpoint and tune reply timeouts and the
//! handshake before the camera is connected.
//!
//! # Example
//!
//! ```no_run
//! use visca_camera::builder::ViscaBuilder;
//! use visca_camera::limits::scopia_flex;
//! use std::time::Duration;
//!
//! # async fn example() -> visca_core::Result<()> {
//! let mut camera = ViscaBuilder::new(scopia_flex())
//!     .serial_port("/dev/ttyUSB0")
//!     .reply_timeout(Duration::from_millis(1500))
//!     .build()?;
//! if camera.connect().await {
//!     camera.pan_tilt_stop().await?;
//! }
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use visca_core::error::{Error, Result};
use visca_core::transport::Transport;
use visca_transport::{SerialConfig, SerialTransport, ViscaIpTransport};

use crate::camera::ViscaCamera;
use crate::limits::CameraLimits;
use crate::session::{Session, SessionConfig};

/// Fluent builder for [`ViscaCamera`].
///
/// Defaults come from the [`CameraLimits`] and [`SessionConfig::default`],
/// so the simplest usage is:
///
/// ```ignore
/// let camera = ViscaBuilder::new(scopia_flex())
///     .serial_port("/dev/ttyUSB0")
///     .build()?;
/// ```
pub struct ViscaBuilder {
    limits: CameraLimits,
    serial_port: Option<String>,
    baud_rate: Option<u32>,
    serial_config: Option<SerialConfig>,
    udp: Option<SocketAddr>,
    session: SessionConfig,
    name: Option<String>,
}

impl ViscaBuilder {
    /// Create a new builder for the given camera model.
    pub fn new(limits: CameraLimits) -> Self {
        ViscaBuilder {
            limits,
            serial_port: None,
            baud_rate: None,
            serial_config: None,
            udp: None,
            session: SessionConfig::default(),
            name: None,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the model's default baud rate.
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = Some(baud);
        self
    }

    /// Replace the serial line settings (data bits, parity, stop bits, flow
    /// control). A [`baud_rate()`](Self::baud_rate) override still applies.
    pub fn serial_config(mut self, config: SerialConfig) -> Self {
        self.serial_config = Some(config);
        self
    }

    /// Talk VISCA-over-IP to `addr` instead of a serial port.
    pub fn udp(mut self, addr: SocketAddr) -> Self {
        self.udp = Some(addr);
        self
    }

    /// Set how long to wait for a reply terminator (default: 2s).
    pub fn reply_timeout(mut self, timeout: Duration) -> Self {
        self.session.reply_timeout = timeout;
        self
    }

    /// Enable or disable the address handshake on connect (default: true).
    pub fn handshake(mut self, enabled: bool) -> Self {
        self.session.handshake = enabled;
        self
    }

    pub fn handshake_deadline(mut self, deadline: Duration) -> Self {
        self.session.handshake_deadline = deadline;
        self
    }

    pub fn inquiry_deadline(mut self, deadline: Duration) -> Self {
        self.session.inquiry_deadline = deadline;
        self
    }

    /// Name used in log output; defaults to the model name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Build a [`ViscaCamera`] with a caller-provided transport.
    ///
    /// This is the entry point for testing (pass a `MockTransport` from
    /// `visca-test-harness`). The camera is not connected yet.
    pub fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<ViscaCamera> {
        if self.session.reply_timeout.is_zero() {
            return Err(Error::InvalidParameter(
                "reply_timeout must be greater than zero".into(),
            ));
        }
        let name = self.name.unwrap_or_else(|| self.limits.name.to_string());
        let session = Session::new(transport, self.session);
        Ok(ViscaCamera::new(session, self.limits, name))
    }

    /// Serial settings for [`build()`](Self::build): the configured line
    /// settings, else 8N1 at the model's default baud rate.
    fn line_settings(&self) -> SerialConfig {
        let mut config = self.serial_config.clone().unwrap_or_else(|| SerialConfig {
            baud_rate: self.limits.default_baud_rate,
            ..Default::default()
        });
        if let Some(baud) = self.baud_rate {
            config.baud_rate = baud;
        }
        config
    }

    /// Build a [`ViscaCamera`] over serial or UDP.
    ///
    /// Requires [`serial_port()`](Self::serial_port) or [`udp()`](Self::udp).
    /// The port is opened by [`ViscaCamera::connect`].
    pub fn build(self) -> Result<ViscaCamera> {
        let transport: Box<dyn Transport> = match (&self.serial_port, self.udp) {
            (Some(_), Some(_)) => {
                return Err(Error::InvalidParameter(
                    "serial_port and udp are mutually exclusive".into(),
                ));
            }
            (Some(port), None) => Box::new(SerialTransport::new(port, self.line_settings())),
            (None, Some(addr)) => Box::new(ViscaIpTransport::new(addr)),
            (None, None) => {
                return Err(Error::InvalidParameter(
                    "serial_port or udp address is required for build()".into(),
                ));
            }
        };
        self.build_with_transport(transport)
    }
}
