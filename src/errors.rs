//! Error types produced while building, analysing or optimising trusses.

use petgraph::graph::{EdgeIndex, NodeIndex};
use thiserror::Error;

use crate::geometry::Vector2D;

/// Error returned when element properties are not physically meaningful.
///
/// The variants describe the reason the supplied value is rejected so callers can
/// present actionable feedback to users.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum ElementPropertyError {
    /// Returned when the radius is zero, negative or not finite.
    #[error("radius must be positive (received {radius})")]
    NonPositiveRadius {
        /// Rejected radius in metres.
        radius: f64,
    },
    /// Returned when Young's modulus is zero, negative or not finite.
    #[error("Young's modulus must be positive (received {youngs_modulus})")]
    NonPositiveYoungsModulus {
        /// Rejected modulus in pascals.
        youngs_modulus: f64,
    },
    /// Returned when the yield stress is zero, negative or not finite.
    #[error("yield stress must be positive (received {yield_stress})")]
    NonPositiveYieldStress {
        /// Rejected yield stress in pascals.
        yield_stress: f64,
    },
    /// Returned when the density is zero, negative or not finite.
    #[error("density must be positive (received {density})")]
    NonPositiveDensity {
        /// Rejected density in kilograms per cubic metre.
        density: f64,
    },
}

/// Error returned when a [`Model`](crate::Model) is edited with invalid input.
///
/// Every mutator validates before touching the model, so a returned error
/// leaves the model unchanged.
///
/// # Examples
///
/// ```
/// use trussopt::{vector, ConfigurationError, Model};
///
/// let mut model = Model::new();
/// model.add_node(vector(0.0, 0.0));
/// let error = model
///     .set_loads(&[0.0, 0.0, 1.0])
///     .expect_err("wrong length is rejected");
/// assert_eq!(
///     error,
///     ConfigurationError::LoadLengthMismatch { expected: 2, actual: 3 }
/// );
/// ```
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigurationError {
    /// Returned when the load vector does not hold two components per node.
    #[error("load vector has {actual} entries but the model needs {expected}")]
    LoadLengthMismatch {
        /// Twice the node count.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },
    /// Returned when a load component is NaN or infinite.
    #[error("load on axis {axis} is not finite ({value})")]
    NonFiniteLoad {
        /// Global axis index of the offending component.
        axis: usize,
        /// Rejected value.
        value: f64,
    },
    /// Returned when a node cannot be found in the model.
    #[error("node {0:?} does not exist in this model")]
    UnknownNode(NodeIndex),
    /// Returned when no node sits at the requested position.
    #[error("no node at position ({}, {})", .0.x, .0.y)]
    NoNodeAtPosition(Vector2D),
    /// Returned when an element cannot be found in the model.
    #[error("element {0:?} does not exist in this model")]
    UnknownElement(EdgeIndex),
    /// Returned when a displacement limit is not a finite positive length.
    #[error("displacement limit must be finite and positive (received {limit})")]
    InvalidDisplacementLimit {
        /// Rejected limit in metres.
        limit: f64,
    },
    /// Returned when a node position has a NaN or infinite coordinate.
    #[error("node {node:?} has non-finite position ({x}, {y})")]
    NonFinitePosition {
        /// Offending node.
        node: NodeIndex,
        /// X coordinate in metres.
        x: f64,
        /// Y coordinate in metres.
        y: f64,
    },
    /// Returned when both ends of an element are the same node.
    #[error("element from {start:?} to {end:?} has zero length")]
    ZeroLengthElement {
        /// Requested start node.
        start: NodeIndex,
        /// Requested end node.
        end: NodeIndex,
    },
    /// Returned when the supplied element properties are invalid.
    #[error("{0}")]
    InvalidElementProperties(#[from] ElementPropertyError),
}

/// Error returned when the linear system cannot be solved.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum NumericalError {
    /// Returned when a free node has no element attached to it.
    #[error("node {node} is neither fixed nor connected to any element")]
    FloatingNode {
        /// Index of the disconnected node.
        node: usize,
    },
    /// Returned when the reduced stiffness matrix is singular.
    #[error(
        "reduced stiffness matrix over {free_axes} free axes is singular; \
         the structure is under-constrained"
    )]
    UnderConstrained {
        /// Size of the reduced system.
        free_axes: usize,
    },
}

/// Error returned when an optimisation cannot be set up or run.
///
/// Failing to converge is not an error; it is reported through
/// [`MinimizeStatus`](crate::MinimizeStatus).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum OptimizationError {
    /// Returned when a lower bound exceeds its upper bound or either is not finite.
    #[error("variable {variable} has invalid bounds [{lower}, {upper}]")]
    InvalidBounds {
        /// Index of the design variable.
        variable: usize,
        /// Supplied lower bound.
        lower: f64,
        /// Supplied upper bound.
        upper: f64,
    },
    /// Returned when a design vector has the wrong number of entries.
    #[error("expected {expected} design variables but received {actual}")]
    DimensionMismatch {
        /// Number of design variables of the problem.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },
    /// Returned when the initial point lies outside its bounds.
    #[error("initial value {value} of variable {variable} lies outside its bounds")]
    InitialPointOutOfBounds {
        /// Index of the design variable.
        variable: usize,
        /// Rejected value.
        value: f64,
    },
    /// Returned when a design group does not control any element.
    #[error("design group {0} does not contain any element")]
    EmptyGroup(usize),
    /// Returned when the underlying minimiser fails internally.
    #[error("minimizer failed: {0}")]
    Minimizer(String),
}

/// Umbrella error for every fallible operation in the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The model or a definition is inconsistent.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    /// The stiffness system could not be solved.
    #[error("numerical error: {0}")]
    Numerical(#[from] NumericalError),
    /// The optimisation could not be set up or run.
    #[error("optimization error: {0}")]
    Optimization(#[from] OptimizationError),
    /// A JSON definition could not be parsed.
    #[error("definition error: {0}")]
    Definition(#[from] serde_json::Error),
    /// A definition file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ElementPropertyError> for Error {
    fn from(value: ElementPropertyError) -> Self {
        Self::Configuration(value.into())
    }
}
