#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_doc_code_examples)]
#![warn(clippy::missing_docs_in_private_items)]
#![doc = include_str!("../README.md")]

pub mod benchmark;
mod definition;
mod element;
mod errors;
mod geometry;
mod lagrangian;
mod minimizer;
mod model;
mod optimization;

pub use definition::{ElementDefinition, ModelDefinition, OptimizationDefinition, StudyDefinition};
pub use element::{Element, ElementProperties};
pub use errors::{
    ConfigurationError, ElementPropertyError, Error, NumericalError, OptimizationError,
};
pub use geometry::{vector, Vector2D};
pub use lagrangian::{AugmentedLagrangian, AugmentedLagrangianSettings};
pub use minimizer::{
    max_violation, Bounds, ConstrainedProblem, Evaluation, MinimizeOutcome, MinimizeStatus,
    Minimizer,
};
pub use model::{Model, Node, ReducedSystem, DOF};
pub use optimization::{DesignGroup, DisplacementLimit, OptimizationDriver, OptimizationReport};
pub use petgraph::graph::{EdgeIndex, NodeIndex};
