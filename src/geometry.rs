//! Fundamental geometric types for planar truss modelling.

use std::ops::{Add, Sub};

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Position or direction in the plane measured in metres.
///
/// Equality is exact floating point equality. Node lookups built on it inherit
/// that limitation; see [`Model::find_node_within`](crate::Model::find_node_within)
/// for a tolerant alternative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2D {
    /// Component along the global X axis.
    pub x: f64,
    /// Component along the global Y axis.
    pub y: f64,
}

impl Vector2D {
    /// Create a [`Vector2D`] with explicit components.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length of the vector.
    #[must_use]
    pub fn magnitude(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Polar angle in radians, measured anticlockwise from the X axis.
    ///
    /// The zero vector reports an angle of zero.
    #[must_use]
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Cosine of the polar angle.
    ///
    /// Computed from the components directly so axis-aligned vectors give
    /// exact zeros rather than `cos(π/2)` round-off.
    #[must_use]
    pub fn cos(self) -> f64 {
        let magnitude = self.magnitude();
        if magnitude == 0.0 {
            1.0
        } else {
            self.x / magnitude
        }
    }

    /// Sine of the polar angle.
    #[must_use]
    pub fn sin(self) -> f64 {
        let magnitude = self.magnitude();
        if magnitude == 0.0 {
            0.0
        } else {
            self.y / magnitude
        }
    }

    /// Distance between two positions.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (other - self).magnitude()
    }

    /// Convert into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl Sub for Vector2D {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add for Vector2D {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl From<Vector2<f64>> for Vector2D {
    fn from(value: Vector2<f64>) -> Self {
        Self::new(value.x, value.y)
    }
}

impl From<Vector2D> for Vector2<f64> {
    fn from(value: Vector2D) -> Self {
        value.to_vector()
    }
}

impl From<(f64, f64)> for Vector2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Convenience helper for creating [`Vector2D`] instances.
///
/// # Examples
/// ```
/// use trussopt::vector;
///
/// let tip = vector(3.0, 4.0);
/// assert_eq!(tip.magnitude(), 5.0);
/// ```
#[must_use]
pub const fn vector(x: f64, y: f64) -> Vector2D {
    Vector2D::new(x, y)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_4;

    use super::*;

    #[test]
    fn subtraction_gives_relative_vector() {
        let delta = vector(4.0, 6.0) - vector(1.0, 2.0);
        assert_eq!(delta, vector(3.0, 4.0));
        assert_relative_eq!(delta.magnitude(), 5.0);
    }

    #[test]
    fn polar_angle_and_direction_cosines() {
        let diagonal = vector(1.0, 1.0);
        assert_relative_eq!(diagonal.angle(), FRAC_PI_4);
        assert_relative_eq!(diagonal.cos(), FRAC_PI_4.cos());
        assert_relative_eq!(diagonal.sin(), FRAC_PI_4.sin());

        let vertical = vector(0.0, -2.0);
        assert_eq!(vertical.cos(), 0.0);
        assert_eq!(vertical.sin(), -1.0);
    }

    #[test]
    fn zero_vector_has_zero_angle() {
        let zero = Vector2D::default();
        assert_eq!(zero.angle(), 0.0);
        assert_eq!(zero.cos(), 1.0);
        assert_eq!(zero.sin(), 0.0);
    }

    #[test]
    fn vector_conversion_roundtrip() {
        let position = vector(1.5, -2.0);
        let algebraic: Vector2<f64> = position.into();
        assert_eq!(algebraic, Vector2::new(1.5, -2.0));
        assert_eq!(Vector2D::from(algebraic), position);
    }
}
