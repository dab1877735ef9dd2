//! World-Space 3D Vector
//!
//! GSI reports positions, forward vectors and velocities as
//! comma-separated strings (`"x, y, z"`). This module owns parsing
//! them and the little geometry the views need.

use std::fmt;
use std::ops::Sub;
use serde::{Serialize, Deserialize};

/// 3D vector in game world units.
#[derive(Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    /// Create a new vector.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Parse a GSI vector string (`"x, y, z"`).
    ///
    /// Exactly the first three comma-separated components are read; every
    /// one of them must be a valid number. Anything else yields `None`.
    pub fn parse_csv(s: &str) -> Option<Self> {
        let mut parts = s.split(',').map(|p| p.trim().parse::<f32>());
        let x = parts.next()?.ok()?;
        let y = parts.next()?.ok()?;
        let z = parts.next()?.ok()?;
        Some(Self { x, y, z })
    }

    /// Squared length.
    #[inline]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Euclidean length.
    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// True when every component is exactly zero.
    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    /// Horizontal (XY) part, used for yaw.
    #[inline]
    pub fn xy(self) -> [f32; 2] {
        [self.x, self.y]
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl fmt::Debug for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vec3({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gsi_position() {
        let v = Vec3::parse_csv("-1203.45, 880.00, 64.03").unwrap();
        assert_eq!(v, Vec3::new(-1203.45, 880.0, 64.03));
    }

    #[test]
    fn test_parse_without_spaces() {
        let v = Vec3::parse_csv("1,2,3").unwrap();
        assert_eq!(v, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_parse_ignores_extra_components() {
        let v = Vec3::parse_csv("1, 2, 3, 4").unwrap();
        assert_eq!(v, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Vec3::parse_csv("").is_none());
        assert!(Vec3::parse_csv("1, 2").is_none());
        assert!(Vec3::parse_csv("1, two, 3").is_none());
        assert!(Vec3::parse_csv("1, , 3").is_none());
    }

    #[test]
    fn test_distance() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 4.0, 0.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-6);
        assert_eq!(a.distance(a), 0.0);
    }

    #[test]
    fn test_zero_velocity() {
        assert!(Vec3::parse_csv("0.00, 0.00, 0.00").unwrap().is_zero());
        assert!(!Vec3::parse_csv("0.00, 0.01, 0.00").unwrap().is_zero());
    }
}
