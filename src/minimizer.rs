//! Constrained minimisation interface.
//!
//! A [`ConstrainedProblem`] bundles an objective, inequality constraints in the
//! `g(x) ≤ 0` convention and box bounds. Any [`Minimizer`] can solve it; the crate
//! ships [`AugmentedLagrangian`](crate::AugmentedLagrangian).

use serde::{Deserialize, Serialize};

use crate::errors::{Error, OptimizationError};

/// Closed interval a design variable may move in.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Smallest admissible value.
    pub lower: f64,
    /// Largest admissible value.
    pub upper: f64,
}

impl Bounds {
    /// Create bounds without validating them.
    #[must_use]
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Whether `value` lies inside the interval.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    /// Nearest admissible value.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.lower).min(self.upper)
    }

    /// Length of the interval.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Finite and non-empty.
    fn is_valid(&self) -> bool {
        self.lower.is_finite() && self.upper.is_finite() && self.lower <= self.upper
    }
}

/// Scalar function of the design vector.
pub type Evaluation<'a> = Box<dyn Fn(&[f64]) -> Result<f64, Error> + 'a>;

/// Objective, inequality constraints and bounds of a minimisation.
pub struct ConstrainedProblem<'a> {
    /// Function to minimise.
    objective: Evaluation<'a>,
    /// Functions required to be `≤ 0`.
    constraints: Vec<Evaluation<'a>>,
    /// One interval per design variable.
    bounds: Vec<Bounds>,
}

impl<'a> ConstrainedProblem<'a> {
    /// Create an unconstrained problem over `bounds`.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizationError::InvalidBounds`] when an interval is empty or
    /// not finite.
    ///
    /// # Examples
    /// ```
    /// use trussopt::{Bounds, ConstrainedProblem};
    ///
    /// let problem = ConstrainedProblem::new(|x| Ok(x[0] * x[0]), vec![Bounds::new(-1.0, 1.0)])
    ///     .expect("valid bounds")
    ///     .with_constraint(|x| Ok(0.5 - x[0]));
    /// assert_eq!(problem.constraint_count(), 1);
    /// assert_eq!(problem.max_violation(&[0.0]).expect("evaluates"), 0.5);
    /// ```
    pub fn new<F>(objective: F, bounds: Vec<Bounds>) -> Result<Self, OptimizationError>
    where
        F: Fn(&[f64]) -> Result<f64, Error> + 'a,
    {
        if let Some((variable, invalid)) = bounds
            .iter()
            .enumerate()
            .find(|(_, bounds)| !bounds.is_valid())
        {
            return Err(OptimizationError::InvalidBounds {
                variable,
                lower: invalid.lower,
                upper: invalid.upper,
            });
        }
        Ok(Self {
            objective: Box::new(objective),
            constraints: Vec::new(),
            bounds,
        })
    }

    /// Add an inequality constraint `g(x) ≤ 0`.
    #[must_use]
    pub fn with_constraint<G>(mut self, constraint: G) -> Self
    where
        G: Fn(&[f64]) -> Result<f64, Error> + 'a,
    {
        self.constraints.push(Box::new(constraint));
        self
    }

    /// Number of design variables.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.bounds.len()
    }

    /// Number of inequality constraints.
    #[must_use]
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Bounds of every design variable.
    #[must_use]
    pub fn bounds(&self) -> &[Bounds] {
        &self.bounds
    }

    /// Evaluate the objective.
    ///
    /// # Errors
    ///
    /// Propagates the error of the objective function.
    pub fn objective(&self, x: &[f64]) -> Result<f64, Error> {
        (self.objective)(x)
    }

    /// Evaluate every constraint.
    ///
    /// # Errors
    ///
    /// Propagates the first error of a constraint function.
    pub fn constraints(&self, x: &[f64]) -> Result<Vec<f64>, Error> {
        self.constraints
            .iter()
            .map(|constraint| constraint(x))
            .collect()
    }

    /// Largest positive constraint value, zero when all are satisfied.
    ///
    /// # Errors
    ///
    /// Propagates the first error of a constraint function.
    pub fn max_violation(&self, x: &[f64]) -> Result<f64, Error> {
        Ok(max_violation(&self.constraints(x)?))
    }

    /// Clamp every component of `x` into its bounds.
    #[must_use]
    pub fn project(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(&self.bounds)
            .map(|(value, bounds)| bounds.clamp(*value))
            .collect()
    }

    /// Check that `x0` has the right length and lies within the bounds.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizationError::DimensionMismatch`] or
    /// [`OptimizationError::InitialPointOutOfBounds`].
    pub fn check_initial_point(&self, x0: &[f64]) -> Result<(), OptimizationError> {
        if x0.len() != self.dimension() {
            return Err(OptimizationError::DimensionMismatch {
                expected: self.dimension(),
                actual: x0.len(),
            });
        }
        match x0
            .iter()
            .zip(&self.bounds)
            .position(|(value, bounds)| !bounds.contains(*value))
        {
            Some(variable) => Err(OptimizationError::InitialPointOutOfBounds {
                variable,
                value: x0[variable],
            }),
            None => Ok(()),
        }
    }
}

/// Largest positive entry of `g`, zero when every entry is `≤ 0`.
#[must_use]
pub fn max_violation(g: &[f64]) -> f64 {
    g.iter().fold(0.0_f64, |worst, value| worst.max(*value))
}

/// How a minimisation ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinimizeStatus {
    /// The constraints are satisfied and the objective stopped improving.
    Converged,
    /// No point satisfying the constraints was found.
    Infeasible,
    /// The iteration budget ran out; the returned point is feasible but may not
    /// be optimal.
    IterationLimit,
}

/// Result of a minimisation.
#[derive(Clone, Debug, PartialEq)]
pub struct MinimizeOutcome {
    /// Best design vector found.
    pub x: Vec<f64>,
    /// Objective at `x`.
    pub objective: f64,
    /// Largest constraint violation at `x`.
    pub max_violation: f64,
    /// Termination status.
    pub status: MinimizeStatus,
    /// Human readable explanation of the status.
    pub message: String,
    /// Number of outer iterations performed.
    pub iterations: usize,
}

/// A constrained nonlinear minimiser.
pub trait Minimizer {
    /// Minimise `problem` starting from `x0`.
    ///
    /// Non-convergence is reported through [`MinimizeOutcome::status`]; errors
    /// are reserved for malformed input and failing evaluations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Optimization`] for an invalid `x0` or an internal
    /// failure, and propagates evaluation errors of the problem.
    fn minimize(
        &self,
        problem: &ConstrainedProblem<'_>,
        x0: &[f64],
    ) -> Result<MinimizeOutcome, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_bounds_are_rejected() {
        let error = ConstrainedProblem::new(
            |_| Ok(0.0),
            vec![Bounds::new(0.0, 1.0), Bounds::new(2.0, 1.0)],
        )
        .err()
        .expect("empty interval rejected");
        assert_eq!(
            error,
            OptimizationError::InvalidBounds {
                variable: 1,
                lower: 2.0,
                upper: 1.0
            }
        );

        let error = ConstrainedProblem::new(|_| Ok(0.0), vec![Bounds::new(f64::NAN, 1.0)])
            .err()
            .expect("NaN rejected");
        assert!(matches!(error, OptimizationError::InvalidBounds { .. }));
    }

    #[test]
    fn initial_point_is_checked() {
        let problem = ConstrainedProblem::new(|_| Ok(0.0), vec![Bounds::new(0.0, 1.0); 2])
            .expect("valid bounds");
        assert_eq!(
            problem.check_initial_point(&[0.5]),
            Err(OptimizationError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            problem.check_initial_point(&[0.5, 1.5]),
            Err(OptimizationError::InitialPointOutOfBounds {
                variable: 1,
                value: 1.5
            })
        );
        assert_eq!(problem.check_initial_point(&[0.0, 1.0]), Ok(()));
    }

    #[test]
    fn projection_clamps_into_bounds() {
        let problem = ConstrainedProblem::new(
            |_| Ok(0.0),
            vec![Bounds::new(0.0, 1.0), Bounds::new(-2.0, -1.0)],
        )
        .expect("valid bounds");
        assert_eq!(problem.project(&[1.5, 0.0]), vec![1.0, -1.0]);
    }

    #[test]
    fn violation_ignores_satisfied_constraints() {
        assert_eq!(max_violation(&[-3.0, -0.1]), 0.0);
        assert_eq!(max_violation(&[-3.0, 0.2, 0.1]), 0.2);
        assert_eq!(max_violation(&[]), 0.0);
    }
}
