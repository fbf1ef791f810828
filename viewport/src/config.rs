//! Construction-time viewport configuration.
//!
//! Supplied once when the viewport is created and immutable afterwards. The
//! browser binding accepts it as JSON; every field is optional and falls back
//! to the policy constants in [`crate::consts`].

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use frames::CameraState;
use serde::Deserialize;

use crate::camera::CameraTuning;
use crate::consts::{DEFAULT_HEIGHT, DEFAULT_WIDTH, MAX_DIMENSION, ORBIT_SENSITIVITY, PUBLISH_INTERVAL_MS};
use crate::display::Resolution;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewportConfig {
    pub camera: CameraState,
    pub width: u32,
    pub height: u32,
    pub elevation_limit: f64,
    pub min_radius: f64,
    pub orbit_sensitivity: f64,
    pub pan_speed: f64,
    pub zoom_speed: f64,
    pub publish_interval_ms: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        let tuning = CameraTuning::default();
        Self {
            camera: CameraState { position: [0.0, 0.0, 10.0], focal_point: [0.0; 3], up_vector: [0.0, 1.0, 0.0] },
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            elevation_limit: tuning.elevation_limit,
            min_radius: tuning.min_radius,
            orbit_sensitivity: ORBIT_SENSITIVITY,
            pan_speed: tuning.pan_speed,
            zoom_speed: tuning.zoom_speed,
            publish_interval_ms: PUBLISH_INTERVAL_MS,
        }
    }
}

impl ViewportConfig {
    /// Parse a JSON object, filling missing fields from defaults.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed JSON or mistyped fields.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Configured resolution, each side capped at [`MAX_DIMENSION`].
    #[must_use]
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width.min(MAX_DIMENSION), self.height.min(MAX_DIMENSION))
    }

    #[must_use]
    pub fn tuning(&self) -> CameraTuning {
        CameraTuning {
            elevation_limit: self.elevation_limit.clamp(0.0, std::f64::consts::FRAC_PI_2 - 1e-3),
            min_radius: self.min_radius.max(f64::EPSILON),
            pan_speed: self.pan_speed,
            zoom_speed: self.zoom_speed,
        }
    }
}
