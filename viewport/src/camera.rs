//! Orbit camera model.
//!
//! [`CameraController`] is the only owner of the camera's mutable state. The
//! authoritative representation is the focal point plus a [`Spherical`]
//! offset; the Cartesian position is always derived from those two and is
//! never stored.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use frames::CameraState;

use crate::consts::{ELEVATION_LIMIT, MIN_RADIUS, PAN_SPEED, ZOOM_SPEED};
use crate::vec3::{Spherical, Vec3, cartesian_to_spherical, spherical_to_cartesian};

/// Limits and speeds applied by the camera operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTuning {
    /// Absolute elevation clamp in radians. Must stay below π/2.
    pub elevation_limit: f64,
    /// Smallest allowed distance between camera and focal point.
    pub min_radius: f64,
    /// Pan distance per unit delta, as a fraction of the current radius.
    pub pan_speed: f64,
    /// Fractional radius change per unit dolly delta.
    pub zoom_speed: f64,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            elevation_limit: ELEVATION_LIMIT,
            min_radius: MIN_RADIUS,
            pan_speed: PAN_SPEED,
            zoom_speed: ZOOM_SPEED,
        }
    }
}

/// Camera pose expressed relative to a focal point.
#[derive(Debug, Clone)]
pub struct CameraController {
    offset: Spherical,
    focal_point: Vec3,
    up: Vec3,
    tuning: CameraTuning,
}

impl CameraController {
    /// Build a controller from a Cartesian camera state.
    ///
    /// The offset is clamped into the valid range immediately, so a camera
    /// placed on the focal point or at a pole is nudged to the nearest legal
    /// pose.
    #[must_use]
    pub fn new(state: &CameraState, tuning: CameraTuning) -> Self {
        let focal_point = Vec3::from(state.focal_point);
        let offset = cartesian_to_spherical(Vec3::from(state.position) - focal_point);
        let mut camera = Self { offset, focal_point, up: Vec3::from(state.up_vector), tuning };
        camera.offset.radius = camera.offset.radius.max(tuning.min_radius);
        camera.offset.elevation = camera.clamp_elevation(camera.offset.elevation);
        camera
    }

    /// Rotate the camera around the focal point at constant distance.
    pub fn orbit(&mut self, delta_azimuth: f64, delta_elevation: f64) {
        self.offset.azimuth -= delta_azimuth;
        self.offset.elevation = self.clamp_elevation(self.offset.elevation - delta_elevation);
    }

    /// Translate the focal point (and with it the camera) in the view plane.
    ///
    /// Deltas are scaled by the current radius so the on-screen motion is the
    /// same at every zoom level.
    pub fn pan(&mut self, delta_horizontal: f64, delta_vertical: f64) {
        let direction = spherical_to_cartesian(self.offset);
        let horizontal = direction.cross(self.up).normalize();
        let vertical = direction.cross(horizontal).normalize();
        let shift = (horizontal * delta_horizontal + vertical * delta_vertical)
            * (self.offset.radius * self.tuning.pan_speed);
        self.focal_point = self.focal_point + shift;
    }

    /// Move the camera toward (positive delta) or away from the focal point.
    pub fn dolly(&mut self, delta: f64) {
        let radius = self.offset.radius * (1.0 - self.tuning.zoom_speed * delta);
        self.offset.radius = radius.max(self.tuning.min_radius);
    }

    /// Derived camera position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.focal_point + spherical_to_cartesian(self.offset)
    }

    #[must_use]
    pub fn focal_point(&self) -> Vec3 {
        self.focal_point
    }

    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.up
    }

    #[must_use]
    pub fn offset(&self) -> Spherical {
        self.offset
    }

    #[must_use]
    pub fn tuning(&self) -> CameraTuning {
        self.tuning
    }

    /// Snapshot for publishing to the remote renderer.
    #[must_use]
    pub fn state(&self) -> CameraState {
        CameraState {
            position: self.position().to_array(),
            focal_point: self.focal_point.to_array(),
            up_vector: self.up.to_array(),
        }
    }

    fn clamp_elevation(&self, elevation: f64) -> f64 {
        let limit = self.tuning.elevation_limit;
        elevation.clamp(-limit, limit)
    }
}
