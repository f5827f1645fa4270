//! Per-model camera limits and calibration.
//!
//! Each supported camera is described by a [`CameraLimits`] value that
//! captures its speed ranges, mechanical travel, encoder scale and zoom
//! calibration. Commands are validated against these limits before any
//! bytes are built.
//!
//! Models are defined as factory functions (e.g. [`scopia_flex()`]):
//!
//! | Model       | Pan travel    | Tilt travel   | Deg/count | PT speed | Zoom speed | Zoom    |
//! |-------------|---------------|---------------|-----------|----------|------------|---------|
//! | Scopia Flex | ±8800 (±660°) | ±2560 (±192°) | 0.075     | 1..=24   | 0..=7      | 1x..18x |
//!
//! The zoom column is the commandable range. The calibration table continues
//! into digital zoom (up to 216x) so inquiry replies there still map to a
//! ratio.

use std::sync::Arc;

use crate::position::{AngularPosition, ZoomTable};

/// Static limits for one camera model.
///
/// Shared between a camera and all the commands built for it; the zoom
/// table is reference-counted so cloning limits is cheap.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraLimits {
    /// Human-readable model name.
    pub name: &'static str,
    pub min_zoom_speed: u8,
    pub max_zoom_speed: u8,
    pub default_zoom_speed: u8,
    pub min_pan_tilt_speed: u8,
    pub max_pan_tilt_speed: u8,
    pub default_pan_tilt_speed: u8,
    pub min_pan: AngularPosition,
    pub max_pan: AngularPosition,
    pub min_tilt: AngularPosition,
    pub max_tilt: AngularPosition,
    pub pan_degrees_per_count: f64,
    pub tilt_degrees_per_count: f64,
    /// Full zoom calibration, digital range included.
    pub zoom_table: Arc<ZoomTable>,
    /// Lowest encoder count accepted by absolute zoom.
    pub min_zoom: i16,
    /// Absolute zoom accepts encoder counts strictly below this.
    pub max_zoom: i16,
    /// Serial baud rate the camera ships with.
    pub default_baud_rate: u32,
}

impl CameraLimits {
    /// Commandable zoom ratios, `min_zoom` included and `max_zoom` excluded.
    pub fn zoom_ratio_range(&self) -> (f64, f64) {
        (
            self.zoom_table.ratio_at(self.min_zoom),
            self.zoom_table.ratio_at(self.max_zoom),
        )
    }
}

const SCOPIA_FLEX_ZOOM: [(f64, i16); 29] = [
    (1.0, 0),
    (2.0, 5638),
    (3.0, 8529),
    (4.0, 10336),
    (5.0, 11445),
    (6.0, 12384),
    (7.0, 13011),
    (8.0, 13637),
    (9.0, 14119),
    (10.0, 14505),
    (11.0, 14914),
    (12.0, 15179),
    (13.0, 15493),
    (14.0, 15733),
    (15.0, 15950),
    (16.0, 16119),
    (17.0, 16288),
    (18.0, 16384),
    // Digital zoom.
    (36.0, 24576),
    (54.0, 27264),
    (72.0, 28672),
    (90.0, 29504),
    (108.0, 30016),
    (126.0, 30400),
    (144.0, 30720),
    (162.0, 30976),
    (180.0, 31104),
    (198.0, 31296),
    (216.0, 31424),
];

/// Scopia Flex pan/tilt/zoom camera.
pub fn scopia_flex() -> CameraLimits {
    const DEG_PER_COUNT: f64 = 0.075;
    CameraLimits {
        name: "Scopia Flex",
        min_zoom_speed: 0x00,
        max_zoom_speed: 0x07,
        default_zoom_speed: 0x00,
        min_pan_tilt_speed: 1,
        max_pan_tilt_speed: 24,
        default_pan_tilt_speed: 5,
        min_pan: AngularPosition::from_raw(-8800, DEG_PER_COUNT),
        max_pan: AngularPosition::from_raw(8800, DEG_PER_COUNT),
        min_tilt: AngularPosition::from_raw(-2560, DEG_PER_COUNT),
        max_tilt: AngularPosition::from_raw(2560, DEG_PER_COUNT),
        pan_degrees_per_count: DEG_PER_COUNT,
        tilt_degrees_per_count: DEG_PER_COUNT,
        zoom_table: Arc::new(ZoomTable::from_calibration(&SCOPIA_FLEX_ZOOM)),
        // Optical range only: 1x up to (not including) 18x.
        min_zoom: SCOPIA_FLEX_ZOOM[0].1,
        max_zoom: SCOPIA_FLEX_ZOOM[17].1,
        default_baud_rate: 9600,
    }
}

/// All camera models with built-in limits.
pub fn all_models() -> Vec<CameraLimits> {
    vec![scopia_flex()]
}

/// Look up a built-in model by name, ignoring case, spaces and dashes.
pub fn model_by_name(name: &str) -> Option<CameraLimits> {
    let key = normalize(name);
    all_models().into_iter().find(|m| normalize(m.name) == key)
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
