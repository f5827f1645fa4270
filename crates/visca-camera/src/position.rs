//! Conversion between physical units and device encoder counts.
//!
//! Pan and tilt are linear in encoder counts ([`AngularPosition`]). Zoom
//! is not: the lens reports a 16-bit encoder value whose relation to the
//! optical magnification is given by a per-model calibration table
//! ([`ZoomTable`]) and interpolated linearly between breakpoints
//! ([`ZoomPosition`]).
//!
//! All values are immutable. Converting to a new position builds a new
//! value.

use std::f64::consts::PI;
use std::sync::Arc;

use visca_core::{Error, Result};

const EPSILON: f64 = 1e-6;

/// A pan or tilt angle held as a device encoder count.
#[derive(Debug, Clone, Copy)]
pub struct AngularPosition {
    encoder_count: i32,
    degrees_per_count: f64,
}

impl AngularPosition {
    /// Create a position from a raw encoder count.
    ///
    /// `degrees_per_count` must be positive and finite.
    pub fn new(encoder_count: i32, degrees_per_count: f64) -> Result<Self> {
        if !(degrees_per_count.is_finite() && degrees_per_count > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "degrees per encoder count must be positive, got {}",
                degrees_per_count
            )));
        }
        Ok(AngularPosition {
            encoder_count,
            degrees_per_count,
        })
    }

    /// Create a position from an angle in degrees.
    ///
    /// The encoder count is rounded half away from zero.
    pub fn from_degrees(degrees: f64, degrees_per_count: f64) -> Result<Self> {
        let scale = Self::new(0, degrees_per_count)?;
        let count = (degrees / scale.degrees_per_count).round();
        if !count.is_finite() || count < i32::MIN as f64 || count > i32::MAX as f64 {
            return Err(Error::InvalidParameter(format!(
                "angle {} degrees is not representable as an encoder count",
                degrees
            )));
        }
        Ok(AngularPosition {
            encoder_count: count as i32,
            ..scale
        })
    }

    /// Create a position from an angle in radians.
    pub fn from_radians(radians: f64, degrees_per_count: f64) -> Result<Self> {
        Self::from_degrees(radians * (180.0 / PI), degrees_per_count)
    }

    /// A new position at `degrees` with the same scale.
    pub fn with_degrees(&self, degrees: f64) -> Result<Self> {
        Self::from_degrees(degrees, self.degrees_per_count)
    }

    /// Build a position from constants known to be valid.
    pub(crate) const fn from_raw(encoder_count: i32, degrees_per_count: f64) -> Self {
        AngularPosition {
            encoder_count,
            degrees_per_count,
        }
    }

    /// A new position at `encoder_count` with the same scale.
    pub fn with_encoder_count(&self, encoder_count: i32) -> Self {
        AngularPosition {
            encoder_count,
            degrees_per_count: self.degrees_per_count,
        }
    }

    pub fn encoder_count(&self) -> i32 {
        self.encoder_count
    }

    pub fn degrees_per_count(&self) -> f64 {
        self.degrees_per_count
    }

    pub fn degrees(&self) -> f64 {
        self.encoder_count as f64 * self.degrees_per_count
    }

    pub fn radians(&self) -> f64 {
        self.degrees() * (PI / 180.0)
    }
}

impl PartialEq for AngularPosition {
    fn eq(&self, other: &Self) -> bool {
        self.encoder_count == other.encoder_count
            && (self.degrees_per_count - other.degrees_per_count).abs() < EPSILON
    }
}

/// One calibration point: a zoom ratio and the encoder count that
/// produces it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub ratio: f64,
    pub encoder_count: i16,
}

impl Breakpoint {
    pub const fn new(ratio: f64, encoder_count: i16) -> Self {
        Breakpoint {
            ratio,
            encoder_count,
        }
    }
}

/// Zoom calibration table.
///
/// Breakpoints are strictly ascending in both ratio and encoder count and
/// there are at least two of them. The first entry is the widest zoom.
/// Entries past the optical range describe digital zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomTable {
    points: Vec<Breakpoint>,
}

impl ZoomTable {
    /// Validate and build a table.
    pub fn new(points: Vec<Breakpoint>) -> Result<Self> {
        if points.len() < 2 {
            return Err(Error::InvalidParameter(format!(
                "zoom table needs at least 2 breakpoints, got {}",
                points.len()
            )));
        }
        for pair in points.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if !(lo.ratio.is_finite() && hi.ratio.is_finite()) {
                return Err(Error::InvalidParameter(
                    "zoom table ratios must be finite".into(),
                ));
            }
            if hi.ratio <= lo.ratio || hi.encoder_count <= lo.encoder_count {
                return Err(Error::InvalidParameter(format!(
                    "zoom table must be strictly ascending: ({}, {}) followed by ({}, {})",
                    lo.ratio, lo.encoder_count, hi.ratio, hi.encoder_count
                )));
            }
        }
        Ok(ZoomTable { points })
    }

    /// Build a table from a static calibration known to be ascending.
    pub(crate) fn from_calibration(pairs: &[(f64, i16)]) -> Self {
        ZoomTable {
            points: pairs.iter().map(|&(r, e)| Breakpoint::new(r, e)).collect(),
        }
    }

    /// Build a table from `(ratio, encoder_count)` pairs.
    pub fn from_pairs(pairs: &[(f64, i16)]) -> Result<Self> {
        Self::new(pairs.iter().map(|&(r, e)| Breakpoint::new(r, e)).collect())
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.points
    }

    /// The widest-zoom breakpoint.
    pub fn first(&self) -> Breakpoint {
        self.points[0]
    }

    /// The highest-zoom breakpoint.
    pub fn last(&self) -> Breakpoint {
        self.points[self.points.len() - 1]
    }

    /// Whether `encoder_count` lies within the table.
    pub fn contains(&self, encoder_count: i16) -> bool {
        encoder_count >= self.first().encoder_count && encoder_count <= self.last().encoder_count
    }

    /// Zoom ratio at `encoder_count`, interpolated between breakpoints.
    ///
    /// Counts outside the table yield `0.0`.
    pub fn ratio_at(&self, encoder_count: i16) -> f64 {
        for pair in self.points.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if encoder_count >= lo.encoder_count && encoder_count <= hi.encoder_count {
                let slope = (hi.ratio - lo.ratio)
                    / (hi.encoder_count as f64 - lo.encoder_count as f64);
                return lo.ratio + slope * (encoder_count as f64 - lo.encoder_count as f64);
            }
        }
        0.0
    }

    /// Encoder count for `ratio`.
    ///
    /// Ratios within `1e-6` of a breakpoint snap to that breakpoint's
    /// count. Ratios outside the table are rejected.
    pub fn encoder_at(&self, ratio: f64) -> Result<i16> {
        for pair in self.points.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if (ratio - lo.ratio).abs() < EPSILON {
                return Ok(lo.encoder_count);
            }
            if (ratio - hi.ratio).abs() < EPSILON {
                return Ok(hi.encoder_count);
            }
            if ratio > lo.ratio && ratio < hi.ratio {
                let slope = (hi.encoder_count as f64 - lo.encoder_count as f64)
                    / (hi.ratio - lo.ratio);
                let count = (lo.encoder_count as f64 + slope * (ratio - lo.ratio)).round();
                return Ok(count as i16);
            }
        }
        Err(Error::InvalidParameter(format!(
            "zoom ratio {} outside calibrated range {}..={}",
            ratio,
            self.first().ratio,
            self.last().ratio
        )))
    }
}

/// A zoom position held as a lens encoder count.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomPosition {
    encoder_count: i16,
    table: Arc<ZoomTable>,
}

impl ZoomPosition {
    /// Create a position from an encoder count within the table.
    pub fn new(encoder_count: i16, table: Arc<ZoomTable>) -> Result<Self> {
        if !table.contains(encoder_count) {
            return Err(Error::InvalidParameter(format!(
                "zoom encoder count {} outside {}..={}",
                encoder_count,
                table.first().encoder_count,
                table.last().encoder_count
            )));
        }
        Ok(ZoomPosition {
            encoder_count,
            table,
        })
    }

    /// Create a position from a zoom ratio.
    pub fn from_ratio(ratio: f64, table: Arc<ZoomTable>) -> Result<Self> {
        let encoder_count = table.encoder_at(ratio)?;
        Self::new(encoder_count, table)
    }

    pub fn encoder_count(&self) -> i16 {
        self.encoder_count
    }

    pub fn ratio(&self) -> f64 {
        self.table.ratio_at(self.encoder_count)
    }

    pub fn table(&self) -> &Arc<ZoomTable> {
        &self.table
    }
}
