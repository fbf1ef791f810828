//! Shared numeric constants for the viewport crate.

// ── Camera ──────────────────────────────────────────────────────

/// Elevation clamp in radians, just short of π/2 so the up vector never flips.
pub const ELEVATION_LIMIT: f64 = 1.5175;

/// Smallest camera-to-focal-point distance.
pub const MIN_RADIUS: f64 = 1e-3;

/// Radians of orbit per unit of NDC pointer travel.
pub const ORBIT_SENSITIVITY: f64 = 4.0;

/// Focal-point travel per unit of NDC pointer travel, as a fraction of radius.
pub const PAN_SPEED: f64 = 1.0;

/// Fractional radius change per normalized wheel detent.
pub const ZOOM_SPEED: f64 = 0.05;

// ── Input ───────────────────────────────────────────────────────

/// Pixels reported per wheel detent in `DOM_DELTA_PIXEL` mode.
pub const WHEEL_PIXELS_PER_DETENT: f64 = 100.0;

/// Lines reported per wheel detent in `DOM_DELTA_LINE` mode.
pub const WHEEL_LINES_PER_DETENT: f64 = 3.0;

/// Largest wheel step applied from a single event, in detents.
pub const WHEEL_MAX_DETENTS: f64 = 5.0;

// ── Sync ────────────────────────────────────────────────────────

/// Minimum spacing between camera publications (20 Hz).
pub const PUBLISH_INTERVAL_MS: f64 = 50.0;

// ── Display ─────────────────────────────────────────────────────

/// Default surface resolution when none is configured.
pub const DEFAULT_WIDTH: u32 = 512;
pub const DEFAULT_HEIGHT: u32 = 512;

/// Largest configurable width or height.
pub const MAX_DIMENSION: u32 = 8192;
