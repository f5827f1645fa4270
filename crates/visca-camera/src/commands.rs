//! VISCA pan/tilt and zoom commands and inquiry reply parsers.
//!
//! [`Command`] is the closed set of frames this engine sends. Parameters
//! are validated against [`CameraLimits`] when a command is constructed,
//! so [`Command::encode`] cannot fail and never produces an out-of-range
//! byte.
//!
//! All functions are pure. The session sends the encoded bytes and feeds
//! reply payloads back into the `parse_*` functions.

use std::f64::consts::PI;
use std::fmt;

use bytes::{BufMut, BytesMut};
use visca_core::{Error, Result};

use crate::frame::{
    CATEGORY_CAMERA, CATEGORY_PAN_TILTER, COMMAND, CameraAddress, INQUIRY, TERMINATOR,
    broadcast_header, pack_nibbles, unpack_nibbles,
};
use crate::limits::CameraLimits;
use crate::position::{AngularPosition, ZoomPosition};

// ---------------------------------------------------------------
// Command bytes
// ---------------------------------------------------------------

/// Address set (broadcast). Data: `0x01` (first camera address).
const CMD_ADDRESS_SET: u8 = 0x30;

/// Pan/tilt drive (jog and stop).
const PT_DRIVE: u8 = 0x01;

/// Pan/tilt absolute position.
const PT_ABSOLUTE: u8 = 0x02;

/// Pan/tilt max speed inquiry.
const PT_MAX_SPEED_INQ: u8 = 0x11;

/// Pan/tilt position inquiry.
const PT_POSITION_INQ: u8 = 0x12;

/// Zoom drive (stop, tele, wide).
const ZOOM_DRIVE: u8 = 0x07;

/// Zoom direct position and zoom position inquiry.
const ZOOM_VALUE: u8 = 0x47;

const ZOOM_STOP: u8 = 0x00;
const ZOOM_TELE_SPEED: u8 = 0x20;
const ZOOM_WIDE_SPEED: u8 = 0x30;

// Drive direction flags.
const PT_HORIZ_LEFT: u8 = 0x01;
const PT_HORIZ_RIGHT: u8 = 0x02;
const PT_HORIZ_STOP: u8 = 0x03;
const PT_VERT_UP: u8 = 0x01;
const PT_VERT_DOWN: u8 = 0x02;
const PT_VERT_STOP: u8 = 0x03;

/// Pan/tilt position reply: header, 0x50, 4 + 4 nibbles, terminator.
pub const PAN_TILT_POSITION_REPLY_LEN: usize = 11;

/// Zoom position reply: header, 0x50, 4 nibbles, terminator.
pub const ZOOM_POSITION_REPLY_LEN: usize = 7;

/// Max speed reply: header, 0x50, pan speed, tilt speed, terminator.
pub const MAX_SPEED_REPLY_LEN: usize = 5;

const DIRECTION_EPSILON: f64 = 1e-6;

// ---------------------------------------------------------------
// Validated parameter types
// ---------------------------------------------------------------

fn check_pan_tilt_speed(speed: u8, limits: &CameraLimits) -> Result<()> {
    if speed < limits.min_pan_tilt_speed || speed > limits.max_pan_tilt_speed {
        return Err(Error::InvalidParameter(format!(
            "pan/tilt speed must be in {}..={}, got {}",
            limits.min_pan_tilt_speed, limits.max_pan_tilt_speed, speed
        )));
    }
    Ok(())
}

/// Continuous pan/tilt motion along a direction vector.
///
/// Direction is in radians, `0` pointing along the pan axis and `π/2`
/// along the tilt axis.
#[derive(Debug, Clone, Copy)]
pub struct PanTiltJog {
    direction: f64,
    speed: u8,
}

impl PanTiltJog {
    /// Create a jog from a direction in radians (`-π..=π`) and a speed.
    pub fn new(direction: f64, speed: u8, limits: &CameraLimits) -> Result<Self> {
        if !(-PI..=PI).contains(&direction) {
            return Err(Error::InvalidParameter(format!(
                "jog direction must be in -π..=π radians, got {}",
                direction
            )));
        }
        check_pan_tilt_speed(speed, limits)?;
        Ok(PanTiltJog { direction, speed })
    }

    /// Create a jog from a direction in degrees (`-180..=180`).
    pub fn from_degrees(degrees: f64, speed: u8, limits: &CameraLimits) -> Result<Self> {
        Self::new(degrees * (PI / 180.0), speed, limits)
    }

    /// Create a jog from separate pan and tilt speed components.
    ///
    /// The components are recombined into a direction and an overall
    /// speed, which is then validated like any other jog.
    pub fn from_components(pan: i32, tilt: i32, limits: &CameraLimits) -> Result<Self> {
        let direction = (tilt as f64).atan2(pan as f64);
        let speed = (pan as f64).hypot(tilt as f64).round();
        if speed > u8::MAX as f64 {
            return Err(Error::InvalidParameter(format!(
                "pan/tilt speed must be in {}..={}, got {}",
                limits.min_pan_tilt_speed, limits.max_pan_tilt_speed, speed
            )));
        }
        Self::new(direction, speed as u8, limits)
    }

    pub fn direction(&self) -> f64 {
        self.direction
    }

    pub fn direction_degrees(&self) -> f64 {
        self.direction * (180.0 / PI)
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    /// Signed pan component, `round(cos(direction) * speed)`.
    pub fn pan_speed(&self) -> i32 {
        (self.direction.cos() * self.speed as f64).round() as i32
    }

    /// Signed tilt component, `round(sin(direction) * speed)`.
    pub fn tilt_speed(&self) -> i32 {
        (self.direction.sin() * self.speed as f64).round() as i32
    }

    /// The four drive bytes: pan magnitude, tilt magnitude, horizontal
    /// flag, vertical flag.
    ///
    /// The horizontal flag follows the tilt component and the vertical
    /// flag follows the pan component. A zero component sends the overall
    /// speed as its magnitude.
    fn drive_bytes(&self) -> [u8; 4] {
        let pan = self.pan_speed();
        let tilt = self.tilt_speed();
        let overall = self.speed;

        let pan_mag = if pan != 0 { pan.unsigned_abs() as u8 } else { overall };
        let tilt_mag = if tilt != 0 { tilt.unsigned_abs() as u8 } else { overall };
        let horiz = match tilt {
            t if t > 0 => PT_HORIZ_RIGHT,
            t if t < 0 => PT_HORIZ_LEFT,
            _ => PT_HORIZ_STOP,
        };
        let vert = match pan {
            p if p > 0 => PT_VERT_UP,
            p if p < 0 => PT_VERT_DOWN,
            _ => PT_VERT_STOP,
        };
        [pan_mag, tilt_mag, horiz, vert]
    }
}

impl PartialEq for PanTiltJog {
    fn eq(&self, other: &Self) -> bool {
        self.speed == other.speed && (self.direction - other.direction).abs() < DIRECTION_EPSILON
    }
}

/// Move to an absolute pan/tilt position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanTiltAbsolute {
    speed: u8,
    pan: AngularPosition,
    tilt: AngularPosition,
}

impl PanTiltAbsolute {
    /// Validate speed and both angles against the camera's travel.
    pub fn new(
        pan: AngularPosition,
        tilt: AngularPosition,
        speed: u8,
        limits: &CameraLimits,
    ) -> Result<Self> {
        check_pan_tilt_speed(speed, limits)?;
        check_travel("pan", &pan, &limits.min_pan, &limits.max_pan)?;
        check_travel("tilt", &tilt, &limits.min_tilt, &limits.max_tilt)?;
        Ok(PanTiltAbsolute { speed, pan, tilt })
    }

    /// Build from angles in degrees using the camera's encoder scale.
    pub fn from_degrees(
        pan_degrees: f64,
        tilt_degrees: f64,
        speed: u8,
        limits: &CameraLimits,
    ) -> Result<Self> {
        let pan = AngularPosition::from_degrees(pan_degrees, limits.pan_degrees_per_count)?;
        let tilt = AngularPosition::from_degrees(tilt_degrees, limits.tilt_degrees_per_count)?;
        Self::new(pan, tilt, speed, limits)
    }

    /// Build from raw encoder counts.
    pub fn from_encoder_counts(
        pan: i32,
        tilt: i32,
        speed: u8,
        limits: &CameraLimits,
    ) -> Result<Self> {
        let pan = AngularPosition::new(pan, limits.pan_degrees_per_count)?;
        let tilt = AngularPosition::new(tilt, limits.tilt_degrees_per_count)?;
        Self::new(pan, tilt, speed, limits)
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn pan(&self) -> AngularPosition {
        self.pan
    }

    pub fn tilt(&self) -> AngularPosition {
        self.tilt
    }
}

fn check_travel(
    axis: &str,
    position: &AngularPosition,
    min: &AngularPosition,
    max: &AngularPosition,
) -> Result<()> {
    let count = position.encoder_count();
    if count < min.encoder_count() || count > max.encoder_count() {
        return Err(Error::InvalidParameter(format!(
            "{} encoder count {} outside {}..={}",
            axis,
            count,
            min.encoder_count(),
            max.encoder_count()
        )));
    }
    if i16::try_from(count).is_err() {
        return Err(Error::InvalidParameter(format!(
            "{} encoder count {} does not fit a 16-bit position field",
            axis, count
        )));
    }
    Ok(())
}

/// Zoom drive direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoomDirection {
    /// Toward telephoto.
    In,
    /// Toward wide angle.
    #[default]
    Out,
}

/// Continuous zoom at a variable speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomJog {
    direction: ZoomDirection,
    speed: u8,
}

impl ZoomJog {
    pub fn new(direction: ZoomDirection, speed: u8, limits: &CameraLimits) -> Result<Self> {
        if speed < limits.min_zoom_speed || speed > limits.max_zoom_speed {
            return Err(Error::InvalidParameter(format!(
                "zoom speed must be in {}..={}, got {}",
                limits.min_zoom_speed, limits.max_zoom_speed, speed
            )));
        }
        // The speed shares a byte with the direction nibble.
        if speed > 0x0F {
            return Err(Error::InvalidParameter(format!(
                "zoom speed {} does not fit a nibble",
                speed
            )));
        }
        Ok(ZoomJog { direction, speed })
    }

    pub fn direction(&self) -> ZoomDirection {
        self.direction
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }
}

/// Move the lens to an absolute zoom position.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomAbsolute {
    position: ZoomPosition,
}

impl ZoomAbsolute {
    /// Validate `position` against the commandable zoom range.
    ///
    /// The range is `min_zoom..max_zoom`, upper bound excluded.
    pub fn new(position: ZoomPosition, limits: &CameraLimits) -> Result<Self> {
        let count = position.encoder_count();
        if count < limits.min_zoom || count >= limits.max_zoom {
            return Err(Error::InvalidParameter(format!(
                "zoom encoder count {} outside {}..{}",
                count, limits.min_zoom, limits.max_zoom
            )));
        }
        Ok(ZoomAbsolute { position })
    }

    /// Build from a zoom ratio using the camera's calibration table.
    pub fn from_ratio(ratio: f64, limits: &CameraLimits) -> Result<Self> {
        let position = ZoomPosition::from_ratio(ratio, limits.zoom_table.clone())?;
        Self::new(position, limits)
    }

    pub fn position(&self) -> &ZoomPosition {
        &self.position
    }
}

// ---------------------------------------------------------------
// Command
// ---------------------------------------------------------------

/// Every frame this engine can send.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Broadcast address set; answered with an address assignment.
    Connect,
    PanTiltJog(PanTiltJog),
    PanTiltStop,
    PanTiltAbsolute(PanTiltAbsolute),
    PanTiltPositionInquiry,
    PanTiltMaxSpeedInquiry,
    ZoomJog(ZoomJog),
    ZoomStop,
    ZoomAbsolute(ZoomAbsolute),
    ZoomPositionInquiry,
}

impl Command {
    /// Encode the command for the camera at `address`.
    ///
    /// [`Command::Connect`] is always sent to the broadcast header and
    /// ignores `address`.
    ///
    /// # Example
    ///
    /// ```
    /// use visca_camera::commands::Command;
    /// use visca_camera::frame::CameraAddress;
    ///
    /// let addr = CameraAddress::new(1).unwrap();
    /// assert_eq!(
    ///     Command::ZoomPositionInquiry.encode(addr),
    ///     vec![0x81, 0x09, 0x04, 0x47, 0xFF]
    /// );
    /// ```
    pub fn encode(&self, address: CameraAddress) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(16);
        match self {
            Command::Connect => {
                buf.put_u8(broadcast_header());
                buf.put_u8(CMD_ADDRESS_SET);
                buf.put_u8(0x01);
            }
            Command::PanTiltJog(jog) => {
                put_prefix(&mut buf, address, COMMAND, CATEGORY_PAN_TILTER, PT_DRIVE);
                buf.put_slice(&jog.drive_bytes());
            }
            Command::PanTiltStop => {
                put_prefix(&mut buf, address, COMMAND, CATEGORY_PAN_TILTER, PT_DRIVE);
                buf.put_slice(&[0x00, 0x00, PT_HORIZ_STOP, PT_VERT_STOP]);
            }
            Command::PanTiltAbsolute(abs) => {
                put_prefix(&mut buf, address, COMMAND, CATEGORY_PAN_TILTER, PT_ABSOLUTE);
                buf.put_u8(abs.speed);
                buf.put_u8(abs.speed);
                buf.put_slice(&pack_nibbles(abs.pan.encoder_count() as i16));
                buf.put_slice(&pack_nibbles(abs.tilt.encoder_count() as i16));
            }
            Command::PanTiltPositionInquiry => {
                put_prefix(&mut buf, address, INQUIRY, CATEGORY_PAN_TILTER, PT_POSITION_INQ);
            }
            Command::PanTiltMaxSpeedInquiry => {
                put_prefix(&mut buf, address, INQUIRY, CATEGORY_PAN_TILTER, PT_MAX_SPEED_INQ);
            }
            Command::ZoomJog(jog) => {
                put_prefix(&mut buf, address, COMMAND, CATEGORY_CAMERA, ZOOM_DRIVE);
                let base = match jog.direction {
                    ZoomDirection::In => ZOOM_TELE_SPEED,
                    ZoomDirection::Out => ZOOM_WIDE_SPEED,
                };
                buf.put_u8(base | jog.speed);
            }
            Command::ZoomStop => {
                put_prefix(&mut buf, address, COMMAND, CATEGORY_CAMERA, ZOOM_DRIVE);
                buf.put_u8(ZOOM_STOP);
            }
            Command::ZoomAbsolute(abs) => {
                put_prefix(&mut buf, address, COMMAND, CATEGORY_CAMERA, ZOOM_VALUE);
                buf.put_slice(&pack_nibbles(abs.position.encoder_count()));
            }
            Command::ZoomPositionInquiry => {
                put_prefix(&mut buf, address, INQUIRY, CATEGORY_CAMERA, ZOOM_VALUE);
            }
        }
        buf.put_u8(TERMINATOR);
        buf.to_vec()
    }

    /// Whether the command is an inquiry (byte 1 is `0x09`).
    pub fn is_inquiry(&self) -> bool {
        matches!(
            self,
            Command::PanTiltPositionInquiry
                | Command::PanTiltMaxSpeedInquiry
                | Command::ZoomPositionInquiry
        )
    }
}

fn put_prefix(buf: &mut BytesMut, address: CameraAddress, kind: u8, category: u8, cmd: u8) {
    buf.put_u8(address.header());
    buf.put_u8(kind);
    buf.put_u8(category);
    buf.put_u8(cmd);
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Connect => write!(f, "connect"),
            Command::PanTiltJog(j) => write!(
                f,
                "pan/tilt jog {:.1}° speed {}",
                j.direction_degrees(),
                j.speed
            ),
            Command::PanTiltStop => write!(f, "pan/tilt stop"),
            Command::PanTiltAbsolute(a) => write!(
                f,
                "pan/tilt absolute pan {:.3}° tilt {:.3}° speed {}",
                a.pan.degrees(),
                a.tilt.degrees(),
                a.speed
            ),
            Command::PanTiltPositionInquiry => write!(f, "pan/tilt position inquiry"),
            Command::PanTiltMaxSpeedInquiry => write!(f, "pan/tilt max speed inquiry"),
            Command::ZoomJog(z) => write!(f, "zoom jog {:?} speed {}", z.direction, z.speed),
            Command::ZoomStop => write!(f, "zoom stop"),
            Command::ZoomAbsolute(z) => {
                write!(f, "zoom absolute {}", z.position.encoder_count())
            }
            Command::ZoomPositionInquiry => write!(f, "zoom position inquiry"),
        }
    }
}

// ---------------------------------------------------------------
// Reply parsers
// ---------------------------------------------------------------

/// Parse the assigned address from an address-set reply.
///
/// The reply carries the next free address in byte 2; the camera that
/// answered sits one below it.
pub fn parse_address_assignment(payload: &[u8]) -> Result<CameraAddress> {
    let next = *payload.get(2).ok_or_else(|| {
        Error::Protocol(format!(
            "expected at least 3 bytes for address assignment, got {}",
            payload.len()
        ))
    })?;
    let assigned = next.checked_sub(1).ok_or_else(|| {
        Error::Protocol("address assignment reply carries address 0".into())
    })?;
    CameraAddress::new(assigned)
        .map_err(|_| Error::Protocol(format!("assigned camera address {} out of range", assigned)))
}

/// Parse a pan/tilt position reply into `(pan, tilt)` encoder counts.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the reply is not exactly 11 bytes or
/// contains malformed nibbles.
pub fn parse_pan_tilt_position(payload: &[u8]) -> Result<(i16, i16)> {
    if payload.len() != PAN_TILT_POSITION_REPLY_LEN {
        return Err(Error::Protocol(format!(
            "expected {} bytes for pan/tilt position reply, got {}",
            PAN_TILT_POSITION_REPLY_LEN,
            payload.len()
        )));
    }
    let pan = unpack_nibbles(&payload[2..6])?;
    let tilt = unpack_nibbles(&payload[6..10])?;
    Ok((pan, tilt))
}

/// Parse a zoom position reply into an encoder count.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the reply is not exactly 7 bytes or
/// contains malformed nibbles.
pub fn parse_zoom_position(payload: &[u8]) -> Result<i16> {
    if payload.len() != ZOOM_POSITION_REPLY_LEN {
        return Err(Error::Protocol(format!(
            "expected {} bytes for zoom position reply, got {}",
            ZOOM_POSITION_REPLY_LEN,
            payload.len()
        )));
    }
    unpack_nibbles(&payload[2..6])
}

/// Parse a max speed reply into `(pan, tilt)` maximum speeds.
pub fn parse_max_speed(payload: &[u8]) -> Result<(u8, u8)> {
    if payload.len() != MAX_SPEED_REPLY_LEN {
        return Err(Error::Protocol(format!(
            "expected {} bytes for max speed reply, got {}",
            MAX_SPEED_REPLY_LEN,
            payload.len()
        )));
    }
    Ok((payload[2], payload[3]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::scopia_flex;

    fn addr(a: u8) -> CameraAddress {
        CameraAddress::new(a).unwrap()
    }

    // ---------------------------------------------------------------
    // Fixed frames
    // ---------------------------------------------------------------

    #[test]
    fn connect_is_broadcast() {
        assert_eq!(Command::Connect.encode(addr(3)), vec![0x88, 0x30, 0x01, 0xFF]);
    }

    #[test]
    fn pan_tilt_stop() {
        assert_eq!(
            Command::PanTiltStop.encode(addr(1)),
            vec![0x81, 0x01, 0x06, 0x01, 0x00, 0x00, 0x03, 0x03, 0xFF]
        );
    }

    #[test]
    fn inquiries() {
        assert_eq!(
            Command::PanTiltPositionInquiry.encode(addr(1)),
            vec![0x81, 0x09, 0x06, 0x12, 0xFF]
        );
        assert_eq!(
            Command::PanTiltMaxSpeedInquiry.encode(addr(2)),
            vec![0x82, 0x09, 0x06, 0x11, 0xFF]
        );
        assert_eq!(
            Command::ZoomPositionInquiry.encode(addr(0)),
            vec![0x80, 0x09, 0x04, 0x47, 0xFF]
        );
        assert!(Command::ZoomPositionInquiry.is_inquiry());
        assert!(!Command::ZoomStop.is_inquiry());
    }

    #[test]
    fn zoom_stop() {
        assert_eq!(
            Command::ZoomStop.encode(addr(1)),
            vec![0x81, 0x01, 0x04, 0x07, 0x00, 0xFF]
        );
    }

    #[test]
    fn every_frame_has_header_and_terminator() {
        let limits = scopia_flex();
        let commands = vec![
            Command::PanTiltStop,
            Command::PanTiltPositionInquiry,
            Command::PanTiltMaxSpeedInquiry,
            Command::ZoomStop,
            Command::ZoomPositionInquiry,
            Command::PanTiltJog(PanTiltJog::new(1.0, 5, &limits).unwrap()),
            Command::ZoomJog(ZoomJog::new(ZoomDirection::In, 3, &limits).unwrap()),
            Command::PanTiltAbsolute(
                PanTiltAbsolute::from_encoder_counts(100, -100, 10, &limits).unwrap(),
            ),
            Command::ZoomAbsolute(ZoomAbsolute::from_ratio(4.0, &limits).unwrap()),
        ];
        for a in 0..=8 {
            for cmd in &commands {
                let bytes = cmd.encode(addr(a));
                assert_eq!(bytes[0], 0x80 | a, "{cmd}");
                assert_eq!(bytes[0] & 0xF0, 0x80);
                assert_eq!(*bytes.last().unwrap(), 0xFF);
                assert_eq!(bytes[1], if cmd.is_inquiry() { 0x09 } else { 0x01 });
            }
        }
    }

    // ---------------------------------------------------------------
    // Pan/tilt jog
    // ---------------------------------------------------------------

    #[test]
    fn jog_along_pan_axis() {
        let limits = scopia_flex();
        let jog = PanTiltJog::new(0.0, 10, &limits).unwrap();
        assert_eq!(jog.pan_speed(), 10);
        assert_eq!(jog.tilt_speed(), 0);
        assert_eq!(
            Command::PanTiltJog(jog).encode(addr(1)),
            vec![0x81, 0x01, 0x06, 0x01, 0x0A, 0x0A, 0x03, 0x01, 0xFF]
        );
    }

    #[test]
    fn jog_along_tilt_axis() {
        let limits = scopia_flex();
        let jog = PanTiltJog::from_degrees(90.0, 10, &limits).unwrap();
        assert_eq!(jog.pan_speed(), 0);
        assert_eq!(jog.tilt_speed(), 10);
        // Positive tilt sets the horizontal flag to "right".
        assert_eq!(
            Command::PanTiltJog(jog).encode(addr(1)),
            vec![0x81, 0x01, 0x06, 0x01, 0x0A, 0x0A, 0x02, 0x03, 0xFF]
        );
    }

    #[test]
    fn jog_diagonal_negative() {
        let limits = scopia_flex();
        let jog = PanTiltJog::from_degrees(-135.0, 20, &limits).unwrap();
        // cos/sin(-135°) * 20 = -14.14 -> -14
        assert_eq!(jog.pan_speed(), -14);
        assert_eq!(jog.tilt_speed(), -14);
        assert_eq!(
            Command::PanTiltJog(jog).encode(addr(2)),
            vec![0x82, 0x01, 0x06, 0x01, 0x0E, 0x0E, 0x01, 0x02, 0xFF]
        );
    }

    #[test]
    fn jog_validation() {
        let limits = scopia_flex();
        assert!(PanTiltJog::new(PI + 0.01, 5, &limits).is_err());
        assert!(PanTiltJog::new(-PI - 0.01, 5, &limits).is_err());
        assert!(PanTiltJog::new(0.0, 0, &limits).is_err());
        assert!(PanTiltJog::new(0.0, 25, &limits).is_err());
        assert!(PanTiltJog::new(PI, 24, &limits).is_ok());
        assert!(PanTiltJog::new(-PI, 1, &limits).is_ok());
    }

    #[test]
    fn jog_from_components() {
        let limits = scopia_flex();
        let jog = PanTiltJog::from_components(3, 4, &limits).unwrap();
        assert_eq!(jog.speed(), 5);
        assert_eq!(jog.pan_speed(), 3);
        assert_eq!(jog.tilt_speed(), 4);
        assert!((jog.direction() - (4.0f64).atan2(3.0)).abs() < 1e-12);

        assert!(PanTiltJog::from_components(0, 0, &limits).is_err());
        assert!(PanTiltJog::from_components(30, 0, &limits).is_err());
        assert!(PanTiltJog::from_components(1000, 1000, &limits).is_err());
    }

    #[test]
    fn jog_equality_tolerates_rounding() {
        let limits = scopia_flex();
        let a = PanTiltJog::new(0.5, 5, &limits).unwrap();
        let b = PanTiltJog::new(0.5 + 1e-9, 5, &limits).unwrap();
        let c = PanTiltJog::new(0.5, 6, &limits).unwrap();
        assert_eq!(Command::PanTiltJog(a), Command::PanTiltJog(b));
        assert_ne!(Command::PanTiltJog(a), Command::PanTiltJog(c));
    }

    // ---------------------------------------------------------------
    // Pan/tilt absolute
    // ---------------------------------------------------------------

    #[test]
    fn absolute_by_degrees() {
        let limits = scopia_flex();
        // 90° pan = 1200 = 0x04B0, -15° tilt = -200 = 0xFF38
        let abs = PanTiltAbsolute::from_degrees(90.0, -15.0, 12, &limits).unwrap();
        assert_eq!(
            Command::PanTiltAbsolute(abs).encode(addr(1)),
            vec![
                0x81, 0x01, 0x06, 0x02, 0x0C, 0x0C, 0x00, 0x04, 0x0B, 0x00, 0x0F, 0x0F, 0x03,
                0x08, 0xFF
            ]
        );
    }

    #[test]
    fn absolute_travel_limits() {
        let limits = scopia_flex();
        assert!(PanTiltAbsolute::from_encoder_counts(8800, 2560, 10, &limits).is_ok());
        assert!(PanTiltAbsolute::from_encoder_counts(-8800, -2560, 10, &limits).is_ok());
        assert!(matches!(
            PanTiltAbsolute::from_encoder_counts(8801, 0, 10, &limits),
            Err(Error::InvalidParameter(_))
        ));
        assert!(PanTiltAbsolute::from_encoder_counts(0, -2561, 10, &limits).is_err());
        assert!(PanTiltAbsolute::from_encoder_counts(0, 0, 0, &limits).is_err());
        assert!(PanTiltAbsolute::from_degrees(661.0, 0.0, 10, &limits).is_err());
    }

    // ---------------------------------------------------------------
    // Zoom
    // ---------------------------------------------------------------

    #[test]
    fn zoom_jog_directions() {
        let limits = scopia_flex();
        let tele = ZoomJog::new(ZoomDirection::In, 7, &limits).unwrap();
        let wide = ZoomJog::new(ZoomDirection::Out, 0, &limits).unwrap();
        assert_eq!(
            Command::ZoomJog(tele).encode(addr(1)),
            vec![0x81, 0x01, 0x04, 0x07, 0x27, 0xFF]
        );
        assert_eq!(
            Command::ZoomJog(wide).encode(addr(1)),
            vec![0x81, 0x01, 0x04, 0x07, 0x30, 0xFF]
        );
        assert!(ZoomJog::new(ZoomDirection::In, 8, &limits).is_err());
        assert_eq!(ZoomDirection::default(), ZoomDirection::Out);
    }

    #[test]
    fn zoom_absolute_encodes_nibbles() {
        let limits = scopia_flex();
        // 2x = 5638 = 0x1606
        let abs = ZoomAbsolute::from_ratio(2.0, &limits).unwrap();
        assert_eq!(
            Command::ZoomAbsolute(abs).encode(addr(1)),
            vec![0x81, 0x01, 0x04, 0x47, 0x01, 0x06, 0x00, 0x06, 0xFF]
        );
    }

    #[test]
    fn zoom_absolute_range_is_half_open() {
        let limits = scopia_flex();
        assert!(ZoomAbsolute::from_ratio(1.0, &limits).is_ok());
        assert!(ZoomAbsolute::from_ratio(17.9, &limits).is_ok());
        // 18x is the exclusive upper bound; digital zoom is not commandable.
        assert!(matches!(
            ZoomAbsolute::from_ratio(18.0, &limits),
            Err(Error::InvalidParameter(_))
        ));
        assert!(ZoomAbsolute::from_ratio(36.0, &limits).is_err());
        assert!(ZoomAbsolute::from_ratio(0.5, &limits).is_err());
    }

    // ---------------------------------------------------------------
    // Parsers
    // ---------------------------------------------------------------

    #[test]
    fn parse_address() {
        let a = parse_address_assignment(&[0x88, 0x30, 0x03, 0xFF]).unwrap();
        assert_eq!(a.value(), 2);
        assert!(matches!(
            parse_address_assignment(&[0x88, 0x30, 0x00, 0xFF]),
            Err(Error::Protocol(_))
        ));
        assert!(parse_address_assignment(&[0x88, 0x30, 0x0A, 0xFF]).is_err());
        assert!(parse_address_assignment(&[0x88, 0x30]).is_err());
    }

    #[test]
    fn parse_pan_tilt() {
        let reply = [0x90, 0x50, 0x0D, 0x0D, 0x0A, 0x00, 0x00, 0x0A, 0x00, 0x00, 0xFF];
        assert_eq!(parse_pan_tilt_position(&reply).unwrap(), (-8800, 2560));
        assert!(matches!(
            parse_pan_tilt_position(&reply[..10]),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn parse_zoom() {
        let reply = [0x90, 0x50, 0x04, 0x00, 0x00, 0x00, 0xFF];
        assert_eq!(parse_zoom_position(&reply).unwrap(), 16384);
        assert!(parse_zoom_position(&[0x90, 0x50, 0x04, 0x00, 0xFF]).is_err());
        assert!(parse_zoom_position(&[0x90, 0x50, 0x40, 0x00, 0x00, 0x00, 0xFF]).is_err());
    }

    #[test]
    fn parse_speed() {
        assert_eq!(parse_max_speed(&[0x90, 0x50, 0x18, 0x14, 0xFF]).unwrap(), (0x18, 0x14));
        assert!(parse_max_speed(&[0x90, 0x50, 0xFF]).is_err());
    }

    #[test]
    fn display_names() {
        assert_eq!(Command::ZoomStop.to_string(), "zoom stop");
        assert_eq!(Command::Connect.to_string(), "connect");
    }
}
