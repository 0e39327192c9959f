//! The classic ten-bar planar truss.
//!
//! Six nodes on a 2 × 3 grid with 9.14 m bays; the two left-hand nodes are
//! pinned to the ground and the two lower free nodes carry 1e7 N loads along +Y.
//!
//! ```text
//!   4 ─────── 2 ─────── 0
//!      ╲   ╱  │  ╲   ╱  │
//!        ╳    │    ╳    │
//!      ╱   ╲  │  ╱   ╲  │
//!   5 ─────── 3 ─────── 1
//!             ↑         ↑
//! ```

use crate::definition::{ElementDefinition, ModelDefinition, OptimizationDefinition, StudyDefinition};
use crate::element::ElementProperties;
use crate::geometry::vector;
use crate::lagrangian::AugmentedLagrangianSettings;
use crate::minimizer::Bounds;
use crate::optimization::{DesignGroup, DisplacementLimit};

/// Bay width and height in metres.
pub const BAY: f64 = 9.14;

/// Y component of each applied load in newtons.
pub const LOAD: f64 = 1.0e7;

/// Start and end node of each element; the first six are chords and
/// verticals, the last four diagonals.
pub const CONNECTIVITY: [(usize, usize); 10] = [
    (2, 4),
    (0, 2),
    (3, 5),
    (1, 3),
    (2, 3),
    (0, 1),
    (3, 4),
    (2, 5),
    (1, 2),
    (0, 3),
];

/// Ten-bar truss with every element at `radius`.
#[must_use]
pub fn ten_bar(radius: f64) -> ModelDefinition {
    let nodes = vec![
        vector(2.0 * BAY, BAY),
        vector(2.0 * BAY, 0.0),
        vector(BAY, BAY),
        vector(BAY, 0.0),
        vector(0.0, BAY),
        vector(0.0, 0.0),
    ];
    let properties = ElementProperties::default().with_radius(radius);
    let elements = CONNECTIVITY
        .iter()
        .map(|&(start, end)| ElementDefinition {
            start,
            end,
            properties,
        })
        .collect();
    let mut loads = vec![0.0; 2 * nodes.len()];
    loads[3] = LOAD;
    loads[7] = LOAD;
    ModelDefinition {
        nodes,
        elements,
        fixed_nodes: vec![4, 5],
        loads,
    }
}

/// Two design groups (chords and verticals, diagonals) with radii in
/// `[0.001, 0.5]` m, starting from 0.5 m and limiting node 1 to 0.02 m of
/// displacement.
#[must_use]
pub fn ten_bar_study() -> StudyDefinition {
    let bounds = Bounds::new(0.001, 0.5);
    StudyDefinition {
        model: ten_bar(0.5),
        optimization: Some(OptimizationDefinition {
            groups: vec![
                DesignGroup::new((0..6).collect(), bounds),
                DesignGroup::new((6..10).collect(), bounds),
            ],
            initial_radii: vec![0.5, 0.5],
            displacement_limit: Some(DisplacementLimit {
                node: 1,
                limit: 0.02,
            }),
            settings: AugmentedLagrangianSettings::default(),
        }),
    }
}
