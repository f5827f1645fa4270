//! Serial port transport for camera communication.
//!
//! This module provides [`SerialTransport`], which implements the [`Transport`]
//! trait for RS-232 and USB-serial connections to VISCA cameras. VISCA
//! cameras almost universally run at 9600 baud, 8N1, without flow control,
//! which is what [`SerialConfig::default`] selects.
//!
//! # Example
//!
//! ```no_run
//! use visca_transport::SerialTransport;
//! use visca_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> visca_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 9600).await?;
//!
//! // Zoom position inquiry to camera 1
//! transport.send(&[0x81, 0x09, 0x04, 0x47, 0xFF]).await?;
//!
//! let mut buf = [0u8; 64];
//! let n = transport.receive(&mut buf, Duration::from_secs(2)).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use visca_core::error::{Error, Result};
use visca_core::transport::Transport;

/// Serial port configuration.
///
/// Defaults match the VISCA serial interface: 9600 baud, 8 data bits,
/// 1 stop bit, no parity, no flow control.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Baud rate (9600 or 38400 on most cameras)
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub flow_control: FlowControl,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            flow_control: FlowControl::None,
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    Seven,
    Eight,
}

impl From<DataBits> for tokio_serial::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Seven => tokio_serial::DataBits::Seven,
            DataBits::Eight => tokio_serial::DataBits::Eight,
        }
    }
}

/// Number of stop bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for tokio_serial::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => tokio_serial::StopBits::One,
            StopBits::Two => tokio_serial::StopBits::Two,
        }
    }
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for tokio_serial::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => tokio_serial::Parity::None,
            Parity::Odd => tokio_serial::Parity::Odd,
            Parity::Even => tokio_serial::Parity::Even,
        }
    }
}

/// Flow control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

impl From<FlowControl> for tokio_serial::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => tokio_serial::FlowControl::None,
            FlowControl::Software => tokio_serial::FlowControl::Software,
            FlowControl::Hardware => tokio_serial::FlowControl::Hardware,
        }
    }
}

/// Serial port transport for VISCA cameras.
///
/// The port is opened lazily by [`Transport::connect`], so a transport can
/// be created, closed and reopened by the same session.
pub struct SerialTransport {
    port: Option<SerialStream>,
    port_name: String,
    config: SerialConfig,
}

impl SerialTransport {
    /// Create a transport for `port` without opening it.
    pub fn new(port: &str, config: SerialConfig) -> Self {
        Self {
            port: None,
            port_name: port.to_string(),
            config,
        }
    }

    /// Open a serial port with the given baud rate and default settings.
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g., "/dev/ttyUSB0" on Linux, "COM3" on Windows)
    /// * `baud_rate` - Baud rate (usually 9600)
    pub async fn open(port: &str, baud_rate: u32) -> Result<Self> {
        let config = SerialConfig {
            baud_rate,
            ..Default::default()
        };
        Self::open_with_config(port, config).await
    }

    /// Open a serial port with full configuration control.
    pub async fn open_with_config(port: &str, config: SerialConfig) -> Result<Self> {
        let mut transport = Self::new(port, config);
        transport.connect().await?;
        Ok(transport)
    }

    /// Get the name of the serial port.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Get the configuration used when (re)opening the port.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }
}

fn map_io_error(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::BrokenPipe || e.kind() == std::io::ErrorKind::NotConnected
    {
        Error::ConnectionLost
    } else {
        Error::Io(e)
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.port.is_some() {
            return Ok(());
        }

        let config = &self.config;
        tracing::debug!(
            port = %self.port_name,
            baud_rate = config.baud_rate,
            data_bits = ?config.data_bits,
            stop_bits = ?config.stop_bits,
            parity = ?config.parity,
            flow_control = ?config.flow_control,
            "Opening serial port"
        );

        let serial_stream = tokio_serial::new(&self.port_name, config.baud_rate)
            .data_bits(config.data_bits.into())
            .stop_bits(config.stop_bits.into())
            .parity(config.parity.into())
            .flow_control(config.flow_control.into())
            .open_native_async()
            .map_err(|e| {
                tracing::error!(port = %self.port_name, error = %e, "Failed to open serial port");
                Error::Transport(format!(
                    "Failed to open serial port {}: {}",
                    self.port_name, e
                ))
            })?;

        tracing::info!(
            port = %self.port_name,
            baud_rate = config.baud_rate,
            "Serial port opened successfully"
        );
        self.port = Some(serial_stream);
        Ok(())
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(
            port = %self.port_name,
            bytes = data.len(),
            data = ?data,
            "Sending data"
        );

        port.write_all(data).await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Failed to send data");
            map_io_error(e)
        })?;

        port.flush().await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Failed to flush serial port");
            Error::Io(e)
        })?;

        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        match tokio::time::timeout(timeout, port.read(buf)).await {
            Ok(Ok(n)) => {
                tracing::trace!(
                    port = %self.port_name,
                    bytes = n,
                    data = ?&buf[..n],
                    "Received data"
                );
                Ok(n)
            }
            Ok(Err(e)) => {
                tracing::error!(port = %self.port_name, error = %e, "Failed to receive data");
                Err(map_io_error(e))
            }
            Err(_) => {
                tracing::trace!(
                    port = %self.port_name,
                    timeout_ms = timeout.as_millis(),
                    "Timeout waiting for data"
                );
                Err(Error::Timeout)
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            tracing::debug!(port = %self.port_name, "Closing serial port");

            if let Err(e) = port.flush().await {
                tracing::warn!(
                    port = %self.port_name,
                    error = %e,
                    "Failed to flush before closing (continuing anyway)"
                );
            }

            tracing::info!(port = %self.port_name, "Serial port closed");
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        if self.port.is_some() {
            tracing::debug!(port = %self.port_name, "SerialTransport dropped, closing port");
        }
    }
}
