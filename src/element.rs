//! Axial bar elements and their local stiffness.

use std::f64::consts::PI;

use nalgebra::{Matrix4, RowVector4, Vector4};
use serde::{Deserialize, Serialize};

use crate::errors::ElementPropertyError;
use crate::geometry::Vector2D;

/// Section and material data for a solid circular bar.
///
/// Defaults describe a 100 mm radius structural steel rod.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementProperties {
    /// Radius of the circular cross-section in metres.
    pub radius: f64,
    /// Young's modulus in pascals.
    pub youngs_modulus: f64,
    /// Yield stress in pascals.
    pub yield_stress: f64,
    /// Density in kilograms per cubic metre.
    pub density: f64,
}

impl Default for ElementProperties {
    fn default() -> Self {
        Self {
            radius: 0.1,
            youngs_modulus: 2.0e11,
            yield_stress: 2.5e8,
            density: 7_860.0,
        }
    }
}

impl ElementProperties {
    /// Copy of these properties with a different radius.
    #[must_use]
    pub fn with_radius(self, radius: f64) -> Self {
        Self { radius, ..self }
    }

    /// Cross-sectional area `π·r²` in square metres.
    #[must_use]
    pub fn area(&self) -> f64 {
        PI * self.radius * self.radius
    }

    /// Check that every scalar is strictly positive and finite.
    ///
    /// # Errors
    ///
    /// Returns the [`ElementPropertyError`] for the first offending field.
    pub fn validate(&self) -> Result<(), ElementPropertyError> {
        if !is_positive(self.radius) {
            return Err(ElementPropertyError::NonPositiveRadius {
                radius: self.radius,
            });
        }
        if !is_positive(self.youngs_modulus) {
            return Err(ElementPropertyError::NonPositiveYoungsModulus {
                youngs_modulus: self.youngs_modulus,
            });
        }
        if !is_positive(self.yield_stress) {
            return Err(ElementPropertyError::NonPositiveYieldStress {
                yield_stress: self.yield_stress,
            });
        }
        if !is_positive(self.density) {
            return Err(ElementPropertyError::NonPositiveDensity {
                density: self.density,
            });
        }
        Ok(())
    }
}

/// Finite and strictly positive.
fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// A pin-jointed bar carrying axial force only.
///
/// The element keeps the positions of its two end nodes; the order defines the
/// local axis, pointing from `start` to `end`.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    /// Position of the start node.
    start: Vector2D,
    /// Position of the end node.
    end: Vector2D,
    /// Section and material data.
    properties: ElementProperties,
}

impl Element {
    /// Create an element between two positions.
    ///
    /// # Errors
    ///
    /// Returns [`ElementPropertyError`] when any property is not strictly positive.
    ///
    /// # Examples
    /// ```
    /// use trussopt::{vector, Element, ElementProperties};
    ///
    /// let bar = Element::new(vector(0.0, 0.0), vector(3.0, 4.0), ElementProperties::default())
    ///     .expect("valid properties");
    /// assert_eq!(bar.length(), 5.0);
    /// ```
    pub fn new(
        start: Vector2D,
        end: Vector2D,
        properties: ElementProperties,
    ) -> Result<Self, ElementPropertyError> {
        properties.validate()?;
        Ok(Self {
            start,
            end,
            properties,
        })
    }

    /// Position of the start node.
    #[must_use]
    pub fn start(&self) -> Vector2D {
        self.start
    }

    /// Position of the end node.
    #[must_use]
    pub fn end(&self) -> Vector2D {
        self.end
    }

    /// Section and material data.
    #[must_use]
    pub fn properties(&self) -> ElementProperties {
        self.properties
    }

    /// Radius in metres.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.properties.radius
    }

    /// Young's modulus in pascals.
    #[must_use]
    pub fn youngs_modulus(&self) -> f64 {
        self.properties.youngs_modulus
    }

    /// Yield stress in pascals.
    #[must_use]
    pub fn yield_stress(&self) -> f64 {
        self.properties.yield_stress
    }

    /// Density in kilograms per cubic metre.
    #[must_use]
    pub fn density(&self) -> f64 {
        self.properties.density
    }

    /// Replace the radius.
    ///
    /// # Errors
    ///
    /// Returns [`ElementPropertyError::NonPositiveRadius`] and keeps the old
    /// radius when `radius` is not strictly positive.
    pub fn set_radius(&mut self, radius: f64) -> Result<(), ElementPropertyError> {
        if !is_positive(radius) {
            return Err(ElementPropertyError::NonPositiveRadius { radius });
        }
        self.properties.radius = radius;
        Ok(())
    }

    /// Vector from the start node to the end node.
    #[must_use]
    pub fn axis(&self) -> Vector2D {
        self.end - self.start
    }

    /// Length in metres.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.axis().magnitude()
    }

    /// Cross-sectional area in square metres.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.properties.area()
    }

    /// Polar angle of the element axis in radians.
    #[must_use]
    pub fn angle(&self) -> f64 {
        self.axis().angle()
    }

    /// Axial stiffness `A·E/L` in newtons per metre.
    #[must_use]
    pub fn axial_stiffness(&self) -> f64 {
        self.area() * self.youngs_modulus() / self.length()
    }

    /// Row `[c, s, -c, -s]` projecting the four end displacements
    /// (start-x, start-y, end-x, end-y) onto the shortening of the bar.
    #[must_use]
    pub fn transformation(&self) -> RowVector4<f64> {
        let axis = self.axis();
        let (c, s) = (axis.cos(), axis.sin());
        RowVector4::new(c, s, -c, -s)
    }

    /// Stiffness matrix in global axes, `k = (A·E/L)·Tᵗ·T`.
    ///
    /// # Examples
    /// ```
    /// use trussopt::{vector, Element, ElementProperties};
    ///
    /// let bar = Element::new(vector(0.0, 0.0), vector(2.0, 0.0), ElementProperties::default())
    ///     .expect("valid properties");
    /// let k = bar.stiffness();
    /// assert_eq!(k[(0, 0)], bar.axial_stiffness());
    /// assert_eq!(k[(0, 2)], -bar.axial_stiffness());
    /// assert_eq!(k[(1, 1)], 0.0);
    /// ```
    #[must_use]
    pub fn stiffness(&self) -> Matrix4<f64> {
        let transformation = self.transformation();
        self.axial_stiffness() * (transformation.transpose() * transformation)
    }

    /// Axial stress `(E/L)·(T·d)` for the end displacements `d`, positive in
    /// tension.
    ///
    /// `T·d` is the shortening of the bar, so the sign is flipped to report
    /// elongation as tension.
    #[must_use]
    pub fn stress(&self, displacements: &Vector4<f64>) -> f64 {
        let shortening = (self.transformation() * displacements)[(0, 0)];
        -self.youngs_modulus() / self.length() * shortening
    }

    /// Mass `ρ·A·L` in kilograms.
    #[must_use]
    pub fn mass(&self) -> f64 {
        self.density() * self.area() * self.length()
    }
}
