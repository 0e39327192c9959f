//! Augmented Lagrangian minimiser with derivative-free inner solves.
//!
//! Each outer iteration minimises
//!
//! ```text
//! f(x) + Σ_k (μ/2)·max(0, λ_k/μ + g_k(x))²
//! ```
//!
//! over the box with `argmin`'s Nelder–Mead, then updates
//! `λ_k ← max(0, λ_k + μ·g_k)` and `μ ← min(μ_max, growth·μ)`.
//! Points outside the box are evaluated at their projection plus a quadratic
//! excursion penalty.

use argmin::core::{CostFunction, Executor, State};
use argmin::solver::neldermead::NelderMead;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, OptimizationError};
use crate::minimizer::{
    max_violation, ConstrainedProblem, MinimizeOutcome, MinimizeStatus, Minimizer,
};

/// Tuning of [`AugmentedLagrangian`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentedLagrangianSettings {
    /// Initial penalty parameter μ.
    pub penalty_init: f64,
    /// Multiplicative growth of μ per outer iteration.
    pub penalty_growth: f64,
    /// Upper limit on μ.
    pub penalty_max: f64,
    /// Maximum number of outer iterations.
    pub max_outer_iterations: usize,
    /// Maximum number of Nelder–Mead iterations per inner solve.
    pub max_inner_iterations: u64,
    /// A point is feasible when every constraint is below this value.
    pub constraint_tolerance: f64,
    /// Relative objective change below which a feasible iterate has converged.
    pub objective_tolerance: f64,
    /// Standard deviation of simplex costs ending an inner solve.
    pub simplex_tolerance: f64,
    /// Initial simplex edge as a fraction of each bound width.
    pub initial_step: f64,
    /// Weight of the squared distance outside the bounds.
    pub bound_penalty: f64,
}

impl Default for AugmentedLagrangianSettings {
    fn default() -> Self {
        Self {
            penalty_init: 10.0,
            penalty_growth: 5.0,
            penalty_max: 1.0e8,
            max_outer_iterations: 20,
            max_inner_iterations: 400,
            constraint_tolerance: 1.0e-4,
            objective_tolerance: 1.0e-6,
            simplex_tolerance: 1.0e-12,
            initial_step: 0.1,
            bound_penalty: 1.0e6,
        }
    }
}

/// Augmented Lagrangian method over `argmin` Nelder–Mead inner solves.
///
/// The returned point is the feasible iterate with the lowest objective,
/// including the initial point, so a feasible start never gets worse.
///
/// # Examples
/// ```
/// use trussopt::{AugmentedLagrangian, Bounds, ConstrainedProblem, Minimizer, MinimizeStatus};
///
/// // Minimise x + y subject to x·y ≥ 1.
/// let problem = ConstrainedProblem::new(|x| Ok(x[0] + x[1]), vec![Bounds::new(0.1, 4.0); 2])
///     .expect("valid bounds")
///     .with_constraint(|x| Ok(1.0 - x[0] * x[1]));
/// let outcome = AugmentedLagrangian::default()
///     .minimize(&problem, &[3.0, 3.0])
///     .expect("minimisation runs");
/// assert_ne!(outcome.status, MinimizeStatus::Infeasible);
/// assert!(outcome.objective < 6.0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AugmentedLagrangian {
    /// Penalty schedule and tolerances.
    settings: AugmentedLagrangianSettings,
}

/// Feasible point with its objective.
#[derive(Clone, Debug)]
struct Candidate {
    /// Design vector.
    x: Vec<f64>,
    /// Objective at `x`.
    objective: f64,
    /// Largest constraint violation at `x`.
    violation: f64,
}

impl AugmentedLagrangian {
    /// Create a minimiser with explicit settings.
    #[must_use]
    pub fn new(settings: AugmentedLagrangianSettings) -> Self {
        Self { settings }
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> &AugmentedLagrangianSettings {
        &self.settings
    }

    /// Keep `candidate` if it is feasible and better than the current best.
    fn consider(&self, best: &mut Option<Candidate>, candidate: Candidate) {
        if candidate.violation > self.settings.constraint_tolerance {
            return;
        }
        if best
            .as_ref()
            .map_or(true, |incumbent| candidate.objective < incumbent.objective)
        {
            *best = Some(candidate);
        }
    }

    /// Starting simplex around `x`, stepping inwards from the bounds.
    fn simplex(&self, problem: &ConstrainedProblem<'_>, x: &[f64], outer: usize) -> Vec<Vec<f64>> {
        let shrink = 1.0 / (1.0 + outer as f64);
        let mut vertices = vec![x.to_vec()];
        for (axis, bounds) in problem.bounds().iter().enumerate() {
            let width = bounds.width();
            let mut step = self.settings.initial_step * width * shrink;
            if step == 0.0 {
                step = self.settings.initial_step * shrink * x[axis].abs().max(1.0);
            }
            let mut vertex = x.to_vec();
            vertex[axis] = if x[axis] + step <= bounds.upper {
                x[axis] + step
            } else {
                x[axis] - step
            };
            vertices.push(vertex);
        }
        vertices
    }

    /// Minimise the penalised objective for fixed multipliers and penalty.
    fn inner_solve(
        &self,
        problem: &ConstrainedProblem<'_>,
        x: &[f64],
        multipliers: &[f64],
        penalty: f64,
        outer: usize,
    ) -> Result<Vec<f64>, Error> {
        let cost = PenalizedObjective {
            problem,
            multipliers,
            penalty,
            bound_penalty: self.settings.bound_penalty,
        };
        let solver = NelderMead::new(self.simplex(problem, x, outer))
            .with_sd_tolerance(self.settings.simplex_tolerance)
            .map_err(|err| OptimizationError::Minimizer(err.to_string()))?;

        let result = Executor::new(cost, solver)
            .configure(|state| state.max_iters(self.settings.max_inner_iterations))
            .run()
            .map_err(|err| match err.downcast::<Error>() {
                Ok(evaluation) => evaluation,
                Err(other) => OptimizationError::Minimizer(other.to_string()).into(),
            })?;

        let state = result.state();
        debug!(
            "inner solve {}: {} iterations, best cost {:.6e}",
            outer + 1,
            state.get_iter(),
            state.get_best_cost()
        );
        let best = state.get_best_param().ok_or_else(|| {
            OptimizationError::Minimizer("Nelder-Mead returned no best parameters".to_owned())
        })?;
        Ok(problem.project(best))
    }
}

impl Minimizer for AugmentedLagrangian {
    fn minimize(
        &self,
        problem: &ConstrainedProblem<'_>,
        x0: &[f64],
    ) -> Result<MinimizeOutcome, Error> {
        problem.check_initial_point(x0)?;
        let settings = &self.settings;

        let mut x = x0.to_vec();
        let mut objective = problem.objective(&x)?;
        let mut violation = problem.max_violation(&x)?;
        let mut best = None;
        self.consider(
            &mut best,
            Candidate {
                x: x.clone(),
                objective,
                violation,
            },
        );

        let mut multipliers = vec![0.0; problem.constraint_count()];
        let mut penalty = settings.penalty_init;
        let mut iterations = 0;
        let mut converged = false;

        for outer in 0..settings.max_outer_iterations {
            let previous = objective;
            x = self.inner_solve(problem, &x, &multipliers, penalty, outer)?;
            iterations += 1;

            objective = problem.objective(&x)?;
            let g = problem.constraints(&x)?;
            violation = max_violation(&g);
            info!(
                "outer {}: objective {:.6e}, max violation {:.3e}, penalty {:.1e}",
                outer + 1,
                objective,
                violation,
                penalty
            );
            self.consider(
                &mut best,
                Candidate {
                    x: x.clone(),
                    objective,
                    violation,
                },
            );

            let stalled = (objective - previous).abs()
                <= settings.objective_tolerance * (1.0 + objective.abs());
            if violation <= settings.constraint_tolerance && stalled {
                converged = true;
                break;
            }

            for (multiplier, value) in multipliers.iter_mut().zip(&g) {
                *multiplier = (*multiplier + penalty * value).max(0.0);
            }
            penalty = (penalty * settings.penalty_growth).min(settings.penalty_max);
        }

        Ok(match best {
            Some(candidate) => {
                let (status, message) = if converged {
                    (
                        MinimizeStatus::Converged,
                        format!("converged after {iterations} outer iterations"),
                    )
                } else {
                    (
                        MinimizeStatus::IterationLimit,
                        format!(
                            "stopped after {iterations} outer iterations; returning best feasible point"
                        ),
                    )
                };
                MinimizeOutcome {
                    x: candidate.x,
                    objective: candidate.objective,
                    max_violation: candidate.violation,
                    status,
                    message,
                    iterations,
                }
            }
            None => MinimizeOutcome {
                x,
                objective,
                max_violation: violation,
                status: MinimizeStatus::Infeasible,
                message: format!(
                    "no feasible point within tolerance {:.1e}; max violation {violation:.3e}",
                    settings.constraint_tolerance
                ),
                iterations,
            },
        })
    }
}

/// Penalised objective handed to Nelder–Mead.
struct PenalizedObjective<'p, 'a> {
    /// Problem being minimised.
    problem: &'p ConstrainedProblem<'a>,
    /// Multiplier estimate λ of each constraint.
    multipliers: &'p [f64],
    /// Penalty parameter μ.
    penalty: f64,
    /// Weight of the squared excursion outside the bounds.
    bound_penalty: f64,
}

impl CostFunction for PenalizedObjective<'_, '_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        let projected = self.problem.project(x);
        let excursion: f64 = x
            .iter()
            .zip(&projected)
            .map(|(raw, inside)| (raw - inside).powi(2))
            .sum();
        let objective = self
            .problem
            .objective(&projected)
            .map_err(argmin::core::Error::new)?;
        let g = self
            .problem
            .constraints(&projected)
            .map_err(argmin::core::Error::new)?;
        let augmented: f64 = g
            .iter()
            .zip(self.multipliers)
            .map(|(value, multiplier)| {
                let shifted = (multiplier / self.penalty + value).max(0.0);
                0.5 * self.penalty * shifted * shifted
            })
            .sum();
        Ok(objective + augmented + self.bound_penalty * excursion)
    }
}
