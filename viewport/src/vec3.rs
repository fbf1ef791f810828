//! Minimal 3D vector math and the orbit (spherical) coordinate conversions.
//!
//! The spherical convention is Y-up with azimuth measured from +Z toward +X:
//!
//! ```text
//! x = r · sin(az) · cos(el)
//! y = r · sin(el)
//! z = r · cos(az) · cos(el)
//! ```

use std::ops::{Add, Mul, Neg, Sub};

#[cfg(test)]
#[path = "vec3_test.rs"]
mod vec3_test;

/// A point or direction in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };
    pub const Y: Self = Self { x: 0.0, y: 1.0, z: 0.0 };

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length.
    #[must_use]
    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Right-handed cross product.
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    #[must_use]
    pub fn scale(self, s: f64) -> Self {
        Self { x: self.x * s, y: self.y * s, z: self.z * s }
    }

    /// Unit vector in the same direction, or `None` for a zero-length vector.
    #[must_use]
    pub fn try_normalize(self) -> Option<Self> {
        let len = self.norm();
        if len > 0.0 && len.is_finite() { Some(self.scale(1.0 / len)) } else { None }
    }

    /// Unit vector in the same direction.
    ///
    /// A zero-length input is returned unchanged; callers are expected not to
    /// pass one.
    #[must_use]
    pub fn normalize(self) -> Self {
        self.try_normalize().unwrap_or(self)
    }

    #[must_use]
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Vec3> for [f64; 3] {
    fn from(v: Vec3) -> Self {
        v.to_array()
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y, z: self.z + rhs.z }
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y, z: self.z - rhs.z }
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self.scale(rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self {
        self.scale(-1.0)
    }
}

/// Camera offset from the focal point in orbit coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    /// Distance from the focal point.
    pub radius: f64,
    /// Rotation about +Y in radians, zero along +Z.
    pub azimuth: f64,
    /// Angle above the XZ plane in radians.
    pub elevation: f64,
}

impl Spherical {
    #[must_use]
    pub const fn new(radius: f64, azimuth: f64, elevation: f64) -> Self {
        Self { radius, azimuth, elevation }
    }
}

/// Convert a Cartesian offset into orbit coordinates.
///
/// A zero vector maps to a zero radius with both angles at zero.
#[must_use]
pub fn cartesian_to_spherical(v: Vec3) -> Spherical {
    let radius = v.norm();
    if radius <= 0.0 {
        return Spherical::new(0.0, 0.0, 0.0);
    }
    Spherical {
        radius,
        azimuth: v.x.atan2(v.z),
        elevation: (v.y / radius).clamp(-1.0, 1.0).asin(),
    }
}

/// Convert orbit coordinates back into a Cartesian offset.
#[must_use]
pub fn spherical_to_cartesian(s: Spherical) -> Vec3 {
    let (sin_az, cos_az) = s.azimuth.sin_cos();
    let (sin_el, cos_el) = s.elevation.sin_cos();
    Vec3 {
        x: s.radius * sin_az * cos_el,
        y: s.radius * sin_el,
        z: s.radius * cos_az * cos_el,
    }
}
