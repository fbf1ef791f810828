//! Input model: pointer buttons, wheel deltas, surface geometry, and the
//! gesture state machine.
//!
//! Raw DOM values (numeric button codes, `deltaMode`) are mapped into the
//! types here once, at the boundary, so the engine's gesture dispatch can
//! match exhaustively instead of comparing integers.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::consts::{WHEEL_LINES_PER_DETENT, WHEEL_MAX_DETENTS, WHEEL_PIXELS_PER_DETENT};

/// A point in client (CSS pixel) space or normalized device space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pointer button identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button, pen contact, or single-finger touch.
    Primary,
    /// Middle or right mouse button.
    Auxiliary,
    /// Anything else (back/forward buttons, eraser, ...).
    Other,
}

impl Button {
    /// Map a DOM `MouseEvent.button` code.
    #[must_use]
    pub fn from_dom(code: i16) -> Self {
        match code {
            0 => Self::Primary,
            1 | 2 => Self::Auxiliary,
            _ => Self::Other,
        }
    }
}

/// Unit reported by a wheel event (`WheelEvent.deltaMode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WheelMode {
    #[default]
    Pixel,
    Line,
    Page,
}

impl WheelMode {
    /// Map a DOM `deltaMode` value. Unknown modes are treated as pixels.
    #[must_use]
    pub fn from_dom(mode: u32) -> Self {
        match mode {
            1 => Self::Line,
            2 => Self::Page,
            _ => Self::Pixel,
        }
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelDelta {
    /// Vertical scroll amount in `mode` units (positive = scroll down).
    pub dy: f64,
    pub mode: WheelMode,
}

impl WheelDelta {
    #[must_use]
    pub fn new(dy: f64, mode: WheelMode) -> Self {
        Self { dy, mode }
    }

    /// Delta in device-independent detents, clamped per event.
    ///
    /// Positive means scroll down, which is a zoom-out gesture.
    #[must_use]
    pub fn detents(self) -> f64 {
        let raw = match self.mode {
            WheelMode::Pixel => self.dy / WHEEL_PIXELS_PER_DETENT,
            WheelMode::Line => self.dy / WHEEL_LINES_PER_DETENT,
            WheelMode::Page => self.dy,
        };
        if raw.is_finite() { raw.clamp(-WHEEL_MAX_DETENTS, WHEEL_MAX_DETENTS) } else { 0.0 }
    }
}

/// Bounding rectangle of the display surface in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Convert client coordinates into NDC: `[0, 1]` across the surface with
    /// the top edge at `y = 1`.
    ///
    /// Returns `None` when the surface has no area. Points outside the
    /// surface (a captured drag leaving the canvas) map outside `[0, 1]`.
    #[must_use]
    pub fn to_ndc(&self, client: Point) -> Option<Point> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        Some(Point {
            x: (client.x - self.left) / self.width,
            y: 1.0 - (client.y - self.top) / self.height,
        })
    }
}

/// Which camera operation the active drag drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Orbit,
    Pan,
}

impl Gesture {
    /// Gesture started by pressing `button`, if any.
    #[must_use]
    pub fn for_button(button: Button) -> Option<Self> {
        match button {
            Button::Primary => Some(Self::Orbit),
            Button::Auxiliary => Some(Self::Pan),
            Button::Other => None,
        }
    }
}

/// Pointer tracking between events.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Active drag, if a button is held.
    pub gesture: Option<Gesture>,
    /// NDC position of the previous pointer-down or pointer-move.
    pub last_ndc: Option<Point>,
}

impl InputState {
    /// Record a new NDC sample and return the delta from the previous one.
    ///
    /// The stored position is replaced unconditionally so deltas are always
    /// one step.
    pub fn advance(&mut self, ndc: Point) -> Point {
        let delta = match self.last_ndc {
            Some(last) => Point::new(ndc.x - last.x, ndc.y - last.y),
            None => Point::new(0.0, 0.0),
        };
        self.last_ndc = Some(ndc);
        delta
    }
}
