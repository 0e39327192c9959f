//! Serializable descriptions of models and sizing studies.
//!
//! A study is stored as JSON:
//!
//! ```json
//! {
//!   "model": {
//!     "nodes": [{ "x": 0.0, "y": 0.0 }, { "x": 1.0, "y": 0.0 }],
//!     "elements": [{ "start": 0, "end": 1, "properties": { "radius": 0.05 } }],
//!     "fixed_nodes": [0],
//!     "loads": [0.0, 0.0, 1.0e5, 0.0]
//!   },
//!   "optimization": {
//!     "groups": [{ "elements": [0], "bounds": { "lower": 0.001, "upper": 0.5 } }],
//!     "initial_radii": [0.05],
//!     "displacement_limit": { "node": 1, "limit": 0.02 }
//!   }
//! }
//! ```
//!
//! Omitted element properties take the values of [`ElementProperties::default`].

use std::fs;
use std::path::Path;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

use crate::element::ElementProperties;
use crate::errors::{ConfigurationError, Error};
use crate::geometry::Vector2D;
use crate::lagrangian::AugmentedLagrangianSettings;
use crate::model::Model;
use crate::optimization::{DesignGroup, DisplacementLimit, OptimizationDriver};

/// One element of a [`ModelDefinition`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementDefinition {
    /// Position of the start node in [`ModelDefinition::nodes`].
    pub start: usize,
    /// Position of the end node in [`ModelDefinition::nodes`].
    pub end: usize,
    /// Section and material data.
    #[serde(default)]
    pub properties: ElementProperties,
}

/// Geometry, supports and loads of a truss.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    /// Node positions in index order.
    pub nodes: Vec<Vector2D>,
    /// Elements referring to `nodes` by position in the list.
    pub elements: Vec<ElementDefinition>,
    /// Positions in `nodes` of the fixed nodes.
    #[serde(default)]
    pub fixed_nodes: Vec<usize>,
    /// Load vector `F`; empty means unloaded.
    #[serde(default)]
    pub loads: Vec<f64>,
}

impl ModelDefinition {
    /// Build the [`Model`].
    ///
    /// Repeated positions collapse onto one node, so `loads` must hold two
    /// entries per distinct node.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownNode`] for an out-of-range node
    /// reference and otherwise the first error of the model mutators.
    pub fn build(&self) -> Result<Model, ConfigurationError> {
        let mut model = Model::new();
        let handles: Vec<NodeIndex> = self
            .nodes
            .iter()
            .map(|position| model.add_node(*position))
            .collect();
        let lookup = |index: usize| {
            handles
                .get(index)
                .copied()
                .ok_or(ConfigurationError::UnknownNode(NodeIndex::new(index)))
        };
        for element in &self.elements {
            model.add_element(lookup(element.start)?, lookup(element.end)?, element.properties)?;
        }
        for fixed in &self.fixed_nodes {
            model.fix_node(lookup(*fixed)?)?;
        }
        if !self.loads.is_empty() {
            model.set_loads(&self.loads)?;
        }
        Ok(model)
    }
}

/// Design variables and constraints of a sizing run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizationDefinition {
    /// One design variable per group.
    pub groups: Vec<DesignGroup>,
    /// Starting radius of each group.
    pub initial_radii: Vec<f64>,
    /// Optional displacement constraint.
    #[serde(default)]
    pub displacement_limit: Option<DisplacementLimit>,
    /// Minimiser tuning.
    #[serde(default)]
    pub settings: AugmentedLagrangianSettings,
}

/// A model with an optional sizing run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StudyDefinition {
    /// The structure to analyse.
    pub model: ModelDefinition,
    /// Sizing run to perform after the analysis.
    #[serde(default)]
    pub optimization: Option<OptimizationDefinition>,
}

impl StudyDefinition {
    /// Parse a study from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Definition`] when the text is not a valid study.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a study from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read and
    /// [`Error::Definition`] when it is not a valid study.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Serialise the study as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Definition`] if serialisation fails.
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl OptimizationDefinition {
    /// Wrap `model` in a driver configured by this definition.
    ///
    /// # Errors
    ///
    /// As [`OptimizationDriver::new`] and
    /// [`OptimizationDriver::with_displacement_limit`].
    pub fn driver(&self, model: Model) -> Result<OptimizationDriver, Error> {
        let driver = OptimizationDriver::new(model, self.groups.clone())?;
        Ok(match self.displacement_limit {
            Some(limit) => driver.with_displacement_limit(NodeIndex::new(limit.node), limit.limit)?,
            None => driver,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STUDY: &str = r#"{
        "model": {
            "nodes": [{ "x": 0.0, "y": 0.0 }, { "x": 1.0, "y": 0.0 }],
            "elements": [{ "start": 0, "end": 1, "properties": { "radius": 0.05 } }],
            "fixed_nodes": [0],
            "loads": [0.0, 0.0, 1.0e5, 0.0]
        },
        "optimization": {
            "groups": [{ "elements": [0], "bounds": { "lower": 0.001, "upper": 0.5 } }],
            "initial_radii": [0.05],
            "displacement_limit": { "node": 1, "limit": 0.02 }
        }
    }"#;

    #[test]
    fn parses_and_builds_study() {
        let study = StudyDefinition::from_json(STUDY).expect("valid JSON");
        let model = study.model.build().expect("consistent model");
        assert_eq!(model.node_count(), 2);
        assert_eq!(model.element_count(), 1);
        assert_eq!(model.fixed_axes(), vec![0, 1]);

        let (_, element) = model.elements().next().expect("one element");
        assert_eq!(element.radius(), 0.05);
        assert_eq!(element.youngs_modulus(), ElementProperties::default().youngs_modulus);

        let optimization = study.optimization.expect("optimization present");
        assert_eq!(optimization.settings, AugmentedLagrangianSettings::default());
        let driver = optimization.driver(model).expect("valid driver");
        assert_eq!(driver.dimension(), 1);
    }

    #[test]
    fn json_roundtrip_preserves_study() {
        let study = StudyDefinition::from_json(STUDY).expect("valid JSON");
        let text = study.to_json().expect("serialises");
        assert_eq!(StudyDefinition::from_json(&text).expect("valid JSON"), study);
    }

    #[test]
    fn out_of_range_references_are_rejected() {
        let definition = ModelDefinition {
            nodes: vec![Vector2D::new(0.0, 0.0), Vector2D::new(1.0, 0.0)],
            elements: vec![ElementDefinition {
                start: 0,
                end: 2,
                properties: ElementProperties::default(),
            }],
            ..ModelDefinition::default()
        };
        assert_eq!(
            definition.build().expect_err("unknown node rejected"),
            ConfigurationError::UnknownNode(NodeIndex::new(2))
        );
    }

    #[test]
    fn load_length_is_checked_against_distinct_nodes() {
        let definition = ModelDefinition {
            nodes: vec![Vector2D::new(0.0, 0.0), Vector2D::new(0.0, 0.0)],
            loads: vec![0.0; 4],
            ..ModelDefinition::default()
        };
        assert_eq!(
            definition.build().expect_err("duplicate node collapsed"),
            ConfigurationError::LoadLengthMismatch {
                expected: 2,
                actual: 4
            }
        );
    }

    #[test]
    fn negative_displacement_limit_is_rejected() {
        let text = STUDY.replace("\"limit\": 0.02", "\"limit\": -1.0");
        let study = StudyDefinition::from_json(&text).expect("valid JSON");
        let model = study.model.build().expect("consistent model");
        let error = study
            .optimization
            .expect("optimization present")
            .driver(model)
            .expect_err("negative limit rejected");
        assert!(matches!(
            error,
            Error::Configuration(ConfigurationError::InvalidDisplacementLimit { .. })
        ));
    }

    #[test]
    fn malformed_json_is_a_definition_error() {
        let error = StudyDefinition::from_json("{ \"model\": 3 }").expect_err("invalid study");
        assert!(matches!(error, Error::Definition(_)));
    }
}
