//! Mass minimisation of a truss over grouped element radii.

use std::cell::{Ref, RefCell};

use log::info;
use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::errors::{ConfigurationError, Error, OptimizationError};
use crate::minimizer::{Bounds, ConstrainedProblem, MinimizeStatus, Minimizer};
use crate::model::Model;

/// Elements sharing one radius design variable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DesignGroup {
    /// Indices of the controlled elements.
    pub elements: Vec<usize>,
    /// Admissible radius range in metres.
    pub bounds: Bounds,
}

impl DesignGroup {
    /// Create a group over element indices.
    #[must_use]
    pub fn new(elements: Vec<usize>, bounds: Bounds) -> Self {
        Self { elements, bounds }
    }
}

/// Upper limit on the displacement magnitude of one node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplacementLimit {
    /// Index of the monitored node.
    pub node: usize,
    /// Largest admissible displacement magnitude in metres.
    pub limit: f64,
}

/// Outcome of [`OptimizationDriver::optimize`].
#[derive(Clone, Debug, PartialEq)]
pub struct OptimizationReport {
    /// Radius of each design group at the returned point.
    pub x_optimal: Vec<f64>,
    /// Total mass in kilograms at `x_optimal`.
    pub objective_value: f64,
    /// Total mass in kilograms at the initial point.
    pub initial_objective: f64,
    /// Largest normalised constraint violation at `x_optimal`.
    pub max_violation: f64,
    /// Termination status of the minimiser.
    pub status: MinimizeStatus,
    /// Explanation from the minimiser.
    pub message: String,
    /// Outer iterations performed by the minimiser.
    pub iterations: usize,
}

/// Drives a [`Model`] through a constrained sizing problem.
///
/// Design variable `j` sets the radius of every element in group `j`. The
/// objective is the total mass; the constraints are the optional displacement
/// limit and one yield constraint per element. Every evaluation writes all group
/// radii into the model before reading from it, so evaluations are independent
/// of their order.
///
/// Values handed to the minimiser are normalised: the mass by the mass of the
/// model when the problem is built, the displacement constraint by its limit and
/// each over-loading by the element's yield stress. Signs are unchanged, so
/// `g ≤ 0` still means "satisfied".
#[derive(Debug)]
pub struct OptimizationDriver {
    /// Model shared between evaluation closures; each evaluation holds the
    /// borrow for its whole apply-then-read sequence.
    model: RefCell<Model>,
    /// Elements controlled by each design variable.
    groups: Vec<Vec<EdgeIndex>>,
    /// Radius range of each design variable.
    bounds: Vec<Bounds>,
    /// Optional displacement constraint.
    displacement_limit: Option<DisplacementLimit>,
}

impl OptimizationDriver {
    /// Create a driver over `model` with one design variable per group.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizationError::EmptyGroup`] for a group without elements,
    /// [`ConfigurationError::UnknownElement`] for an index outside the model and
    /// [`OptimizationError::InvalidBounds`] for bounds that are empty, not
    /// finite or admit non-positive radii.
    pub fn new(model: Model, groups: Vec<DesignGroup>) -> Result<Self, Error> {
        let mut members = Vec::with_capacity(groups.len());
        let mut bounds = Vec::with_capacity(groups.len());
        for (variable, group) in groups.into_iter().enumerate() {
            if group.elements.is_empty() {
                return Err(OptimizationError::EmptyGroup(variable).into());
            }
            let range = group.bounds;
            if !(range.lower > 0.0 && range.lower <= range.upper && range.upper.is_finite()) {
                return Err(OptimizationError::InvalidBounds {
                    variable,
                    lower: range.lower,
                    upper: range.upper,
                }
                .into());
            }
            let edges = group
                .elements
                .iter()
                .map(|index| {
                    let edge = EdgeIndex::new(*index);
                    model
                        .element(edge)
                        .map(|_| edge)
                        .ok_or(ConfigurationError::UnknownElement(edge))
                })
                .collect::<Result<Vec<_>, _>>()?;
            members.push(edges);
            bounds.push(range);
        }
        Ok(Self {
            model: RefCell::new(model),
            groups: members,
            bounds,
            displacement_limit: None,
        })
    }

    /// Constrain the displacement magnitude of `node` to at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownNode`] when `node` is not part of the
    /// model and [`ConfigurationError::InvalidDisplacementLimit`] when `limit` is
    /// not finite and strictly positive.
    pub fn with_displacement_limit(
        mut self,
        node: NodeIndex,
        limit: f64,
    ) -> Result<Self, ConfigurationError> {
        if self.model.borrow().node(node).is_none() {
            return Err(ConfigurationError::UnknownNode(node));
        }
        if !(limit.is_finite() && limit > 0.0) {
            return Err(ConfigurationError::InvalidDisplacementLimit { limit });
        }
        self.displacement_limit = Some(DisplacementLimit {
            node: node.index(),
            limit,
        });
        Ok(self)
    }

    /// Number of design variables.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.groups.len()
    }

    /// Radius bounds of every design variable.
    #[must_use]
    pub fn bounds(&self) -> &[Bounds] {
        &self.bounds
    }

    /// Borrow the model in its current state.
    #[must_use]
    pub fn model(&self) -> Ref<'_, Model> {
        self.model.borrow()
    }

    /// Release the model.
    #[must_use]
    pub fn into_model(self) -> Model {
        self.model.into_inner()
    }

    /// Write the radii `x` into the model.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizationError::DimensionMismatch`] when `x` has the wrong
    /// length and [`ConfigurationError`] for a non-positive radius.
    pub fn apply_radii(&self, x: &[f64]) -> Result<(), Error> {
        apply_radii(&mut self.model.borrow_mut(), &self.groups, x)
    }

    /// Build the normalised sizing problem for the model's current state.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizationError::InvalidBounds`] when the group bounds are
    /// invalid.
    pub fn problem(&self) -> Result<ConstrainedProblem<'_>, Error> {
        let mass_scale = self.model.borrow().total_mass().max(f64::MIN_POSITIVE);
        let model = &self.model;
        let groups = &self.groups;

        let mut problem = ConstrainedProblem::new(
            move |x: &[f64]| {
                let mut model = model.borrow_mut();
                apply_radii(&mut model, groups, x)?;
                Ok(model.total_mass() / mass_scale)
            },
            self.bounds.clone(),
        )?;

        if let Some(DisplacementLimit { node, limit }) = self.displacement_limit {
            problem = problem.with_constraint(move |x: &[f64]| {
                let mut model = model.borrow_mut();
                apply_radii(&mut model, groups, x)?;
                let magnitudes = model.node_displacement_magnitudes()?;
                Ok((magnitudes[node] - limit) / limit)
            });
        }

        let yields: Vec<f64> = self
            .model
            .borrow()
            .elements()
            .map(|(_, element)| element.yield_stress())
            .collect();
        for (index, yield_stress) in yields.into_iter().enumerate() {
            problem = problem.with_constraint(move |x: &[f64]| {
                let mut model = model.borrow_mut();
                apply_radii(&mut model, groups, x)?;
                let over_loading = model.over_loading()?;
                Ok(over_loading[index] / yield_stress)
            });
        }
        Ok(problem)
    }

    /// Minimise the mass from the radii `x0` with `minimizer`.
    ///
    /// On return the model holds the radii of
    /// [`OptimizationReport::x_optimal`].
    ///
    /// # Errors
    ///
    /// Returns the minimiser's error for malformed input or failing
    /// evaluations. Non-convergence is reported through
    /// [`OptimizationReport::status`].
    pub fn optimize(
        &self,
        x0: &[f64],
        minimizer: &dyn Minimizer,
    ) -> Result<OptimizationReport, Error> {
        self.apply_radii(x0)?;
        let initial_objective = self.model.borrow().total_mass();
        let outcome = {
            let problem = self.problem()?;
            minimizer.minimize(&problem, x0)?
        };
        self.apply_radii(&outcome.x)?;
        let objective_value = self.model.borrow().total_mass();
        info!(
            "sizing finished ({:?}): mass {:.6e} kg -> {:.6e} kg",
            outcome.status, initial_objective, objective_value
        );
        Ok(OptimizationReport {
            x_optimal: outcome.x,
            objective_value,
            initial_objective,
            max_violation: outcome.max_violation,
            status: outcome.status,
            message: outcome.message,
            iterations: outcome.iterations,
        })
    }
}

/// Overwrite the radius of every grouped element.
fn apply_radii(model: &mut Model, groups: &[Vec<EdgeIndex>], x: &[f64]) -> Result<(), Error> {
    if x.len() != groups.len() {
        return Err(OptimizationError::DimensionMismatch {
            expected: groups.len(),
            actual: x.len(),
        }
        .into());
    }
    for (edges, radius) in groups.iter().zip(x) {
        for edge in edges {
            model.set_element_radius(*edge, *radius)?;
        }
    }
    Ok(())
}
