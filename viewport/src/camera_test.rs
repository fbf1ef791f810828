#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

fn scene_state() -> CameraState {
    CameraState {
        position: [-19.0, 78.6, -351.7],
        focal_point: [-42.8, 20.6, -8.4],
        up_vector: [0.0, 1.0, 0.0],
    }
}

fn camera_at(radius: f64, azimuth: f64, elevation: f64) -> CameraController {
    let offset = spherical_to_cartesian(Spherical::new(radius, azimuth, elevation));
    let state = CameraState { position: offset.to_array(), focal_point: [0.0; 3], up_vector: [0.0, 1.0, 0.0] };
    CameraController::new(&state, CameraTuning::default())
}

// =============================================================
// Construction
// =============================================================

#[test]
fn new_preserves_initial_position() {
    let cam = CameraController::new(&scene_state(), CameraTuning::default());
    assert!(vec_approx_eq(cam.position(), Vec3::from(scene_state().position)));
    assert_eq!(cam.focal_point(), Vec3::from(scene_state().focal_point));
    assert_eq!(cam.up(), Vec3::Y);
}

#[test]
fn new_clamps_camera_on_focal_point_to_min_radius() {
    let state = CameraState { position: [1.0, 2.0, 3.0], focal_point: [1.0, 2.0, 3.0], up_vector: [0.0, 1.0, 0.0] };
    let cam = CameraController::new(&state, CameraTuning::default());
    assert_eq!(cam.offset().radius, MIN_RADIUS);
    assert!(cam.position().x.is_finite());
}

#[test]
fn new_clamps_camera_at_pole() {
    let state = CameraState { position: [0.0, 10.0, 0.0], focal_point: [0.0; 3], up_vector: [0.0, 1.0, 0.0] };
    let cam = CameraController::new(&state, CameraTuning::default());
    assert_eq!(cam.offset().elevation, ELEVATION_LIMIT);
}

#[test]
fn state_snapshot_matches_accessors() {
    let cam = CameraController::new(&scene_state(), CameraTuning::default());
    let state = cam.state();
    assert_eq!(state.position, cam.position().to_array());
    assert_eq!(state.focal_point, cam.focal_point().to_array());
    assert_eq!(state.up_vector, [0.0, 1.0, 0.0]);
}

// =============================================================
// Orbit
// =============================================================

#[test]
fn orbit_azimuth_rotates_in_xz_plane_only() {
    let mut cam = CameraController::new(&scene_state(), CameraTuning::default());
    let focal = cam.focal_point();
    let before = cam.position() - focal;

    cam.orbit(0.1, 0.0);
    let after = cam.position() - focal;

    assert!(approx_eq(after.y, before.y));
    let horizontal_before = before.x.hypot(before.z);
    let horizontal_after = after.x.hypot(after.z);
    assert!(approx_eq(horizontal_before, horizontal_after));

    let turned = after.x.atan2(after.z) - before.x.atan2(before.z);
    assert!(approx_eq(turned, -0.1), "turned by {turned}");
}

#[test]
fn orbit_keeps_distance() {
    let mut cam = camera_at(42.0, 0.3, 0.2);
    cam.orbit(0.7, -0.4);
    assert!(approx_eq((cam.position() - cam.focal_point()).norm(), 42.0));
}

#[test]
fn orbit_deltas_summing_to_zero_leave_offset_unchanged() {
    let mut cam = camera_at(10.0, 0.5, 0.25);
    let start = cam.offset();

    for (da, de) in [(0.2, 0.1), (-0.5, 0.3), (0.1, -0.2), (0.2, -0.2)] {
        cam.orbit(da, de);
    }

    let end = cam.offset();
    assert!(approx_eq(end.azimuth, start.azimuth));
    assert!(approx_eq(end.elevation, start.elevation));
    assert!(approx_eq(end.radius, start.radius));
}

#[test]
fn elevation_clamp_is_idempotent_at_limit() {
    let mut cam = camera_at(10.0, 0.0, 0.0);
    cam.orbit(0.0, -10.0);
    assert_eq!(cam.offset().elevation, ELEVATION_LIMIT);
    cam.orbit(0.0, -0.5);
    assert_eq!(cam.offset().elevation, ELEVATION_LIMIT);
}

#[test]
fn elevation_clamps_at_lower_limit() {
    let mut cam = camera_at(10.0, 0.0, 0.0);
    cam.orbit(0.0, 10.0);
    assert_eq!(cam.offset().elevation, -ELEVATION_LIMIT);
}

#[test]
fn azimuth_wraps_without_modulo() {
    let mut cam = camera_at(5.0, 0.0, 0.0);
    let before = cam.position();
    cam.orbit(2.0 * std::f64::consts::PI, 0.0);
    assert!(vec_approx_eq(cam.position(), before));
}

// =============================================================
// Pan
// =============================================================

#[test]
fn pan_moves_focal_point_and_camera_together() {
    let mut cam = camera_at(10.0, 0.4, 0.3);
    let offset_before = cam.position() - cam.focal_point();
    cam.pan(0.1, -0.05);
    let offset_after = cam.position() - cam.focal_point();
    assert!(vec_approx_eq(offset_before, offset_after));
}

#[test]
fn pan_horizontal_from_plus_z_moves_along_x() {
    let mut cam = camera_at(10.0, 0.0, 0.0);
    cam.pan(0.1, 0.0);
    // cross(+Z, +Y) = -X, scaled by radius.
    assert!(vec_approx_eq(cam.focal_point(), Vec3::new(-1.0, 0.0, 0.0)));
}

#[test]
fn pan_vertical_from_plus_z_moves_along_y() {
    let mut cam = camera_at(10.0, 0.0, 0.0);
    cam.pan(0.0, 0.1);
    // cross(+Z, -X) = -Y, scaled by radius.
    assert!(vec_approx_eq(cam.focal_point(), Vec3::new(0.0, -1.0, 0.0)));
}

#[test]
fn pan_scales_with_radius() {
    let mut near = camera_at(1.0, 0.2, 0.1);
    let mut far = camera_at(100.0, 0.2, 0.1);
    near.pan(0.3, 0.2);
    far.pan(0.3, 0.2);
    assert!(approx_eq(far.focal_point().norm(), near.focal_point().norm() * 100.0));
}

#[test]
fn pan_basis_is_orthogonal_to_view_direction() {
    let mut cam = camera_at(10.0, 1.1, -0.6);
    let direction = cam.position() - cam.focal_point();
    cam.pan(0.25, 0.15);
    assert!(approx_eq(cam.focal_point().dot(direction), 0.0));
}

// =============================================================
// Dolly
// =============================================================

#[test]
fn dolly_one_detent_on_radius_hundred() {
    let mut cam = camera_at(100.0, 0.0, 0.0);
    cam.dolly(1.0);
    assert!(approx_eq(cam.offset().radius, 95.0));
}

#[test]
fn dolly_zoom_in_strictly_shrinks_radius() {
    let mut cam = camera_at(3.0, 0.0, 0.0);
    let mut last = cam.offset().radius;
    for _ in 0..50 {
        cam.dolly(2.0);
        let r = cam.offset().radius;
        assert!(r < last || r == MIN_RADIUS);
        last = r;
    }
}

#[test]
fn dolly_stays_at_min_radius() {
    let mut cam = camera_at(1.0, 0.0, 0.0);
    cam.dolly(1000.0);
    assert_eq!(cam.offset().radius, MIN_RADIUS);
    cam.dolly(1.0);
    assert_eq!(cam.offset().radius, MIN_RADIUS);
}

#[test]
fn dolly_zoom_out_grows_radius() {
    let mut cam = camera_at(100.0, 0.0, 0.0);
    cam.dolly(-1.0);
    assert!(approx_eq(cam.offset().radius, 105.0));
}

#[test]
fn dolly_keeps_focal_point() {
    let mut cam = CameraController::new(&scene_state(), CameraTuning::default());
    let focal = cam.focal_point();
    cam.dolly(3.0);
    assert_eq!(cam.focal_point(), focal);
}

#[test]
fn custom_tuning_is_applied() {
    let tuning = CameraTuning { zoom_speed: 0.5, ..CameraTuning::default() };
    let state = CameraState { position: [0.0, 0.0, 8.0], focal_point: [0.0; 3], up_vector: [0.0, 1.0, 0.0] };
    let mut cam = CameraController::new(&state, tuning);
    cam.dolly(1.0);
    assert!(approx_eq(cam.offset().radius, 4.0));
}
