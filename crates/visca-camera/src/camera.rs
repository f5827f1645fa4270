//! ViscaCamera -- high-level pan/tilt/zoom control of one camera.
//!
//! This module ties the command codec ([`commands`]) and the value mapper
//! ([`position`](crate::position)) to a [`Session`] so callers can work
//! in degrees and zoom ratios instead of raw frames.

use tracing::{debug, info, warn};

use visca_core::error::Result;

use crate::commands::{
    Command, PanTiltAbsolute, PanTiltJog, ZoomAbsolute, ZoomDirection, ZoomJog,
};
use crate::frame::{CameraAddress, Outcome};
use crate::limits::CameraLimits;
use crate::position::{AngularPosition, ZoomPosition};
use crate::session::{Session, SessionState};

/// Speed used by [`ViscaCamera::pan_tilt_absolute_encoder`] when none is given.
pub const DEFAULT_ABSOLUTE_SPEED: u8 = 10;

/// A VISCA pan/tilt/zoom camera.
///
/// Constructed via [`ViscaBuilder`](crate::builder::ViscaBuilder). Every
/// method performs one serialized exchange with the camera and returns the
/// outcome of its first reply.
pub struct ViscaCamera {
    session: Session,
    limits: CameraLimits,
    name: String,
}

impl ViscaCamera {
    pub(crate) fn new(session: Session, limits: CameraLimits, name: String) -> Self {
        ViscaCamera {
            session,
            limits,
            name,
        }
    }

    /// Display name for logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn limits(&self) -> &CameraLimits {
        &self.limits
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// The address assigned during the handshake, once connected.
    pub fn address(&self) -> Option<CameraAddress> {
        self.session.address()
    }

    pub fn is_connected(&self) -> bool {
        self.session.address().is_some()
    }

    /// Open the transport and run the handshake.
    ///
    /// Returns `false` when the transport cannot be opened or the camera
    /// does not complete the handshake; the cause is logged.
    pub async fn connect(&mut self) -> bool {
        match self.session.connect().await {
            Ok(address) => {
                info!(camera = %self.name, address = %address, "connected");
                true
            }
            Err(e) => {
                warn!(camera = %self.name, error = %e, "connect failed");
                false
            }
        }
    }

    pub async fn disconnect(&mut self) -> Result<()> {
        debug!(camera = %self.name, "disconnecting");
        self.session.disconnect().await
    }

    // ---------------------------------------------------------------
    // Pan/tilt
    // ---------------------------------------------------------------

    /// Jog along `direction_degrees` (`0` = pan positive, `90` = tilt
    /// positive). Uses the model's default speed when `speed` is `None`.
    pub async fn pan_tilt_jog(
        &mut self,
        direction_degrees: f64,
        speed: Option<u8>,
    ) -> Result<Outcome> {
        let speed = speed.unwrap_or(self.limits.default_pan_tilt_speed);
        let jog = PanTiltJog::from_degrees(direction_degrees, speed, &self.limits)?;
        self.run(Command::PanTiltJog(jog)).await
    }

    /// Jog with separate pan and tilt speed components.
    pub async fn pan_tilt_jog_components(&mut self, pan: i32, tilt: i32) -> Result<Outcome> {
        let jog = PanTiltJog::from_components(pan, tilt, &self.limits)?;
        self.run(Command::PanTiltJog(jog)).await
    }

    /// Move to an absolute position given in degrees.
    pub async fn pan_tilt_absolute(
        &mut self,
        pan_degrees: f64,
        tilt_degrees: f64,
        speed: u8,
    ) -> Result<Outcome> {
        let abs = PanTiltAbsolute::from_degrees(pan_degrees, tilt_degrees, speed, &self.limits)?;
        self.run(Command::PanTiltAbsolute(abs)).await
    }

    /// Move to an absolute position given in raw encoder counts.
    pub async fn pan_tilt_absolute_encoder(
        &mut self,
        pan: i32,
        tilt: i32,
        speed: Option<u8>,
    ) -> Result<Outcome> {
        let speed = speed.unwrap_or(DEFAULT_ABSOLUTE_SPEED);
        let abs = PanTiltAbsolute::from_encoder_counts(pan, tilt, speed, &self.limits)?;
        self.run(Command::PanTiltAbsolute(abs)).await
    }

    pub async fn pan_tilt_stop(&mut self) -> Result<Outcome> {
        self.run(Command::PanTiltStop).await
    }

    /// Current pan and tilt angles.
    pub async fn pan_tilt_position(&mut self) -> Result<(AngularPosition, AngularPosition)> {
        let (pan, tilt) = self.session.inquire_pan_tilt().await?;
        let pan = AngularPosition::new(pan as i32, self.limits.pan_degrees_per_count)?;
        let tilt = AngularPosition::new(tilt as i32, self.limits.tilt_degrees_per_count)?;
        debug!(pan = pan.degrees(), tilt = tilt.degrees(), "pan/tilt position");
        Ok((pan, tilt))
    }

    /// Maximum `(pan, tilt)` speeds reported by the camera.
    pub async fn pan_tilt_max_speed(&mut self) -> Result<(u8, u8)> {
        self.session.inquire_max_speed().await
    }

    // ---------------------------------------------------------------
    // Zoom
    // ---------------------------------------------------------------

    /// Start zooming. Uses the model's default zoom speed when `speed` is
    /// `None`.
    pub async fn zoom_jog(
        &mut self,
        direction: ZoomDirection,
        speed: Option<u8>,
    ) -> Result<Outcome> {
        let speed = speed.unwrap_or(self.limits.default_zoom_speed);
        let jog = ZoomJog::new(direction, speed, &self.limits)?;
        self.run(Command::ZoomJog(jog)).await
    }

    /// Move the lens to a zoom ratio (e.g. `4.0` for 4x).
    pub async fn zoom_absolute(&mut self, ratio: f64) -> Result<Outcome> {
        let abs = ZoomAbsolute::from_ratio(ratio, &self.limits)?;
        self.run(Command::ZoomAbsolute(abs)).await
    }

    pub async fn zoom_stop(&mut self) -> Result<Outcome> {
        self.run(Command::ZoomStop).await
    }

    /// Current zoom ratio.
    pub async fn zoom_ratio(&mut self) -> Result<f64> {
        Ok(self.zoom_position().await?.ratio())
    }

    /// Current zoom position, encoder count and ratio.
    pub async fn zoom_position(&mut self) -> Result<ZoomPosition> {
        let count = self.session.inquire_zoom().await?;
        ZoomPosition::new(count, self.limits.zoom_table.clone())
    }

    async fn run(&mut self, command: Command) -> Result<Outcome> {
        let reply = self.session.execute(&command).await?;
        Ok(reply.outcome)
    }
}
