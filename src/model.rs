//! Planar truss model and its direct stiffness solution.

use log::{debug, warn};
use nalgebra::{DMatrix, DVector, Vector4};
use petgraph::graph::{EdgeIndex, Graph, NodeIndex};

use crate::element::{Element, ElementProperties};
use crate::errors::{ConfigurationError, NumericalError};
use crate::geometry::Vector2D;

/// Degrees of freedom per node.
pub const DOF: usize = 2;

/// Smallest ratio between the smallest and largest LU pivot accepted as non-singular.
const PIVOT_RATIO_TOLERANCE: f64 = 1.0e-12;

/// Relative residual above which a solve is reported as ill-conditioned.
const RESIDUAL_WARNING: f64 = 1.0e-6;

/// A point of the structure.
///
/// Identity is carried by the [`NodeIndex`] the model hands out; the position is
/// plain data.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// Position in metres.
    position: Vector2D,
    /// Whether both translations are held at zero.
    fixed: bool,
    /// External force in newtons along X and Y.
    load: [f64; DOF],
}

impl Node {
    /// Create a free, unloaded node.
    fn new(position: Vector2D) -> Self {
        Self {
            position,
            fixed: false,
            load: [0.0; DOF],
        }
    }

    /// Position in metres.
    #[must_use]
    pub fn position(&self) -> Vector2D {
        self.position
    }

    /// Whether both translations are held at zero.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Applied force in newtons.
    #[must_use]
    pub fn load(&self) -> Vector2D {
        Vector2D::new(self.load[0], self.load[1])
    }
}

/// Stiffness system with the fixed axes removed.
#[derive(Clone, Debug, PartialEq)]
pub struct ReducedSystem {
    /// `K_r`, the rows and columns of the free axes.
    pub stiffness: DMatrix<f64>,
    /// `F_r`, the loads on the free axes.
    pub loads: DVector<f64>,
    /// Global axis index of each reduced row.
    pub free_axes: Vec<usize>,
}

/// Container for a pin-jointed planar truss.
///
/// Nodes and elements keep their insertion order; node `i` owns the global axes
/// `2i` (X) and `2i + 1` (Y). Every query recomputes from the current state, so a
/// mutation is visible to the very next call.
///
/// # Examples
/// ```
/// use trussopt::{vector, ElementProperties, Model};
///
/// let mut model = Model::new();
/// let support = model.add_node(vector(0.0, 0.0));
/// let tip = model.add_node(vector(1.0, 0.0));
/// model
///     .add_element(support, tip, ElementProperties::default())
///     .expect("nodes exist");
/// model.fix_node(support).expect("node exists");
/// model.set_loads(&[0.0, 0.0, 1.0e5, 0.0]).expect("one pair per node");
///
/// let displacements = model.displacements().expect("structure is supported");
/// assert!(displacements[2] > 0.0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Model {
    /// Nodes as graph vertices and elements as directed edges from start to end.
    graph: Graph<Node, Element>,
}

impl Model {
    /// Create an empty model.
    ///
    /// # Examples
    /// ```
    /// use trussopt::Model;
    ///
    /// let model = Model::new();
    /// assert_eq!(model.node_count(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
        }
    }

    /// Return the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Return the number of global axes, `2·nodes`.
    #[must_use]
    pub fn axis_count(&self) -> usize {
        self.node_count() * DOF
    }

    /// Add a node, or return the existing node at exactly this position.
    pub fn add_node(&mut self, position: Vector2D) -> NodeIndex {
        if let Some(existing) = self.find_node(position) {
            return existing;
        }
        self.graph.add_node(Node::new(position))
    }

    /// Find the node at exactly `position`.
    #[must_use]
    pub fn find_node(&self, position: Vector2D) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|node| self.graph[*node].position == position)
    }

    /// Find the node closest to `position` among those within `tolerance`.
    ///
    /// # Examples
    /// ```
    /// use trussopt::{vector, Model};
    ///
    /// let mut model = Model::new();
    /// let node = model.add_node(vector(0.1 + 0.2, 0.0));
    /// assert_eq!(model.find_node(vector(0.3, 0.0)), None);
    /// assert_eq!(model.find_node_within(vector(0.3, 0.0), 1.0e-9), Some(node));
    /// ```
    #[must_use]
    pub fn find_node_within(&self, position: Vector2D, tolerance: f64) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .map(|node| (node, self.graph[node].position.distance_to(position)))
            .filter(|(_, distance)| *distance <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(node, _)| node)
    }

    /// Retrieve a node.
    #[must_use]
    pub fn node(&self, node: NodeIndex) -> Option<&Node> {
        self.graph.node_weight(node)
    }

    /// Iterate over the nodes in index order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &Node)> + '_ {
        self.graph
            .node_indices()
            .map(move |node| (node, &self.graph[node]))
    }

    /// Connect two existing nodes with a new element.
    ///
    /// Adding an element identical to an existing one (same ordered endpoints and
    /// properties) returns the existing element.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownNode`] when an endpoint is not part of
    /// this model, [`ConfigurationError::NonFinitePosition`] when an endpoint has
    /// a NaN or infinite coordinate, [`ConfigurationError::ZeroLengthElement`] when both endpoints
    /// are the same node and [`ConfigurationError::InvalidElementProperties`]
    /// when a property is not strictly positive.
    pub fn add_element(
        &mut self,
        start: NodeIndex,
        end: NodeIndex,
        properties: ElementProperties,
    ) -> Result<EdgeIndex, ConfigurationError> {
        let start_position = self.position_of(start)?;
        let end_position = self.position_of(end)?;
        for (node, position) in [(start, start_position), (end, end_position)] {
            if !(position.x.is_finite() && position.y.is_finite()) {
                return Err(ConfigurationError::NonFinitePosition {
                    node,
                    x: position.x,
                    y: position.y,
                });
            }
        }
        if start == end {
            return Err(ConfigurationError::ZeroLengthElement { start, end });
        }
        let element = Element::new(start_position, end_position, properties)?;
        let duplicate = self.graph.edge_indices().find(|edge| {
            self.graph.edge_endpoints(*edge) == Some((start, end))
                && self.graph[*edge].properties() == properties
        });
        if let Some(existing) = duplicate {
            return Ok(existing);
        }
        Ok(self.graph.add_edge(start, end, element))
    }

    /// Connect the nodes found at two positions.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::NoNodeAtPosition`] when either position has
    /// not been added with [`Model::add_node`], otherwise as [`Model::add_element`].
    pub fn add_element_between(
        &mut self,
        start: Vector2D,
        end: Vector2D,
        properties: ElementProperties,
    ) -> Result<EdgeIndex, ConfigurationError> {
        let start_node = self
            .find_node(start)
            .ok_or(ConfigurationError::NoNodeAtPosition(start))?;
        let end_node = self
            .find_node(end)
            .ok_or(ConfigurationError::NoNodeAtPosition(end))?;
        self.add_element(start_node, end_node, properties)
    }

    /// Retrieve an element.
    #[must_use]
    pub fn element(&self, element: EdgeIndex) -> Option<&Element> {
        self.graph.edge_weight(element)
    }

    /// Iterate over the elements in index order.
    pub fn elements(&self) -> impl Iterator<Item = (EdgeIndex, &Element)> + '_ {
        self.graph
            .edge_indices()
            .map(move |edge| (edge, &self.graph[edge]))
    }

    /// Change the radius of an element.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownElement`] when `element` is not part of
    /// this model and [`ConfigurationError::InvalidElementProperties`] when the
    /// radius is not strictly positive.
    pub fn set_element_radius(
        &mut self,
        element: EdgeIndex,
        radius: f64,
    ) -> Result<(), ConfigurationError> {
        let bar = self
            .graph
            .edge_weight_mut(element)
            .ok_or(ConfigurationError::UnknownElement(element))?;
        bar.set_radius(radius)?;
        Ok(())
    }

    /// Hold both translations of a node at zero.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownNode`] when `node` is not part of this
    /// model.
    pub fn fix_node(&mut self, node: NodeIndex) -> Result<(), ConfigurationError> {
        let weight = self
            .graph
            .node_weight_mut(node)
            .ok_or(ConfigurationError::UnknownNode(node))?;
        weight.fixed = true;
        Ok(())
    }

    /// Indices of the fixed nodes in ascending order.
    #[must_use]
    pub fn fixed_nodes(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|node| self.graph[*node].fixed)
            .collect()
    }

    /// Global axes belonging to fixed nodes in ascending order.
    #[must_use]
    pub fn fixed_axes(&self) -> Vec<usize> {
        self.fixed_nodes()
            .into_iter()
            .flat_map(|node| Self::axis_indices(node))
            .collect()
    }

    /// Replace the whole load vector `F`.
    ///
    /// Entry `2i` is the X force and `2i + 1` the Y force at node `i`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::LoadLengthMismatch`] when `loads` does not hold
    /// exactly two entries per node and [`ConfigurationError::NonFiniteLoad`] for
    /// NaN or infinite components. The model is unchanged on error.
    pub fn set_loads(&mut self, loads: &[f64]) -> Result<(), ConfigurationError> {
        let expected = self.axis_count();
        if loads.len() != expected {
            return Err(ConfigurationError::LoadLengthMismatch {
                expected,
                actual: loads.len(),
            });
        }
        if let Some((axis, value)) = loads
            .iter()
            .enumerate()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(ConfigurationError::NonFiniteLoad {
                axis,
                value: *value,
            });
        }
        for (weight, pair) in self
            .graph
            .node_weights_mut()
            .zip(loads.chunks_exact(DOF))
        {
            weight.load = [pair[0], pair[1]];
        }
        Ok(())
    }

    /// Apply a force to a single node, leaving the others untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownNode`] when `node` is not part of this
    /// model and [`ConfigurationError::NonFiniteLoad`] for NaN or infinite
    /// components.
    pub fn set_node_load(
        &mut self,
        node: NodeIndex,
        force: Vector2D,
    ) -> Result<(), ConfigurationError> {
        if self.graph.node_weight(node).is_none() {
            return Err(ConfigurationError::UnknownNode(node));
        }
        let [x_axis, y_axis] = Self::axis_indices(node);
        for (axis, value) in [(x_axis, force.x), (y_axis, force.y)] {
            if !value.is_finite() {
                return Err(ConfigurationError::NonFiniteLoad { axis, value });
            }
        }
        if let Some(weight) = self.graph.node_weight_mut(node) {
            weight.load = [force.x, force.y];
        }
        Ok(())
    }

    /// The load vector `F` of length `2·nodes`.
    #[must_use]
    pub fn loads(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.axis_count(),
            self.graph
                .node_indices()
                .flat_map(|node| self.graph[node].load),
        )
    }

    /// Global axis indices `[2i, 2i + 1]` of a node.
    #[must_use]
    pub fn axis_indices(node: NodeIndex) -> [usize; DOF] {
        let base = node.index() * DOF;
        [base, base + 1]
    }

    /// Start and end nodes of an element.
    #[must_use]
    pub fn node_indices_of_element(&self, element: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(element)
    }

    /// Global axes of an element ordered start-x, start-y, end-x, end-y.
    #[must_use]
    pub fn axis_indices_of_element(&self, element: EdgeIndex) -> Option<[usize; 4]> {
        let (start, end) = self.graph.edge_endpoints(element)?;
        let [start_x, start_y] = Self::axis_indices(start);
        let [end_x, end_y] = Self::axis_indices(end);
        Some([start_x, start_y, end_x, end_y])
    }

    /// Assemble the unconstrained global stiffness matrix `K`.
    #[must_use]
    pub fn stiffness_matrix(&self) -> DMatrix<f64> {
        let size = self.axis_count();
        let mut matrix = DMatrix::zeros(size, size);
        for (edge, element) in self.elements() {
            let Some(dof_map) = self.axis_indices_of_element(edge) else {
                continue;
            };
            let local = element.stiffness();
            for (row_local, global_row) in dof_map.iter().enumerate() {
                for (col_local, global_col) in dof_map.iter().enumerate() {
                    matrix[(*global_row, *global_col)] += local[(row_local, col_local)];
                }
            }
        }
        matrix
    }

    /// Remove the fixed axes from `K` and `F`.
    #[must_use]
    pub fn reduced_system(&self) -> ReducedSystem {
        let stiffness = self.stiffness_matrix();
        let loads = self.loads();
        let free_axes: Vec<usize> = self
            .graph
            .node_indices()
            .filter(|node| !self.graph[*node].fixed)
            .flat_map(Self::axis_indices)
            .collect();
        let free_len = free_axes.len();
        let mut k_ff = DMatrix::zeros(free_len, free_len);
        let mut f_f = DVector::zeros(free_len);
        for (row_idx, &row) in free_axes.iter().enumerate() {
            f_f[row_idx] = loads[row];
            for (col_idx, &col) in free_axes.iter().enumerate() {
                k_ff[(row_idx, col_idx)] = stiffness[(row, col)];
            }
        }
        ReducedSystem {
            stiffness: k_ff,
            loads: f_f,
            free_axes,
        }
    }

    /// Solve `K_r·Q = F_r` and return the full displacement vector, zero on
    /// every fixed axis.
    ///
    /// A free axis no element gives stiffness to (the transverse axis at the
    /// tip of a lone bar, for instance) has a zero row in `K_r`. When it is
    /// unloaded it stays at zero and is left out of the factorisation.
    ///
    /// # Errors
    ///
    /// Returns [`NumericalError::FloatingNode`] when a free node has no element
    /// and [`NumericalError::UnderConstrained`] when the reduced stiffness is
    /// singular or a load acts on an axis without stiffness.
    pub fn displacements(&self) -> Result<DVector<f64>, NumericalError> {
        self.check_connectivity()?;
        let system = self.reduced_system();
        let mut displacements = DVector::zeros(self.axis_count());
        let free_len = system.free_axes.len();
        let under_constrained = NumericalError::UnderConstrained {
            free_axes: free_len,
        };

        let mut active = Vec::with_capacity(free_len);
        for row in 0..free_len {
            if system.stiffness.row(row).iter().any(|value| *value != 0.0) {
                active.push(row);
            } else if system.loads[row] != 0.0 {
                return Err(under_constrained);
            }
        }
        if active.is_empty() {
            return Ok(displacements);
        }
        let stiffness = system.stiffness.select_rows(&active).select_columns(&active);
        let loads = system.loads.select_rows(&active);

        let lu = stiffness.clone().lu();
        let pivots = lu.u().diagonal().abs();
        let (largest, smallest) = (pivots.max(), pivots.min());
        if !(smallest > largest * PIVOT_RATIO_TOLERANCE) {
            return Err(under_constrained);
        }
        let solution = lu.solve(&loads).ok_or(under_constrained)?;

        let residual = (&stiffness * &solution - &loads).norm();
        let scale = loads.norm();
        if scale > 0.0 && residual > RESIDUAL_WARNING * scale {
            warn!(
                "ill-conditioned stiffness: relative residual {:.3e} over {} free axes",
                residual / scale,
                active.len()
            );
        }
        debug!(
            "solved {} of {} free axes, pivot ratio {:.3e}",
            active.len(),
            free_len,
            smallest / largest
        );

        for (value, &row) in solution.iter().zip(&active) {
            displacements[system.free_axes[row]] = *value;
        }
        Ok(displacements)
    }

    /// Displacement of each node as a vector.
    ///
    /// # Errors
    ///
    /// As [`Model::displacements`].
    pub fn node_displacements(&self) -> Result<Vec<Vector2D>, NumericalError> {
        let displacements = self.displacements()?;
        Ok(displacements
            .as_slice()
            .chunks_exact(DOF)
            .map(|pair| Vector2D::new(pair[0], pair[1]))
            .collect())
    }

    /// Displacement magnitude `sqrt(dx² + dy²)` of each node.
    ///
    /// # Errors
    ///
    /// As [`Model::displacements`].
    pub fn node_displacement_magnitudes(&self) -> Result<DVector<f64>, NumericalError> {
        let displacements = self.node_displacements()?;
        Ok(DVector::from_iterator(
            displacements.len(),
            displacements.iter().map(|delta| delta.magnitude()),
        ))
    }

    /// Axial stress of each element, positive in tension.
    ///
    /// # Errors
    ///
    /// As [`Model::displacements`].
    pub fn element_stresses(&self) -> Result<DVector<f64>, NumericalError> {
        let displacements = self.displacements()?;
        Ok(self.stresses_for(&displacements))
    }

    /// Axial force of each element in newtons, positive in tension.
    ///
    /// # Errors
    ///
    /// As [`Model::displacements`].
    pub fn element_forces(&self) -> Result<DVector<f64>, NumericalError> {
        let stresses = self.element_stresses()?;
        Ok(DVector::from_iterator(
            stresses.len(),
            self.elements()
                .zip(stresses.iter())
                .map(|((_, element), stress)| stress * element.area()),
        ))
    }

    /// `|stress| − yield stress` for each element; positive means the element
    /// has yielded.
    ///
    /// # Errors
    ///
    /// As [`Model::displacements`].
    pub fn over_loading(&self) -> Result<DVector<f64>, NumericalError> {
        let stresses = self.element_stresses()?;
        Ok(DVector::from_iterator(
            stresses.len(),
            self.elements()
                .zip(stresses.iter())
                .map(|((_, element), stress)| stress.abs() - element.yield_stress()),
        ))
    }

    /// Factor of safety against yielding, `yield / |stress|`, for each element.
    ///
    /// Unstressed elements report infinity.
    ///
    /// # Errors
    ///
    /// As [`Model::displacements`].
    pub fn factors_of_safety(&self) -> Result<DVector<f64>, NumericalError> {
        let stresses = self.element_stresses()?;
        Ok(DVector::from_iterator(
            stresses.len(),
            self.elements()
                .zip(stresses.iter())
                .map(|((_, element), stress)| {
                    if *stress == 0.0 {
                        f64::INFINITY
                    } else {
                        element.yield_stress() / stress.abs()
                    }
                }),
        ))
    }

    /// Nodal residual forces `K·d − F`; non-zero only at fixed axes.
    ///
    /// # Errors
    ///
    /// As [`Model::displacements`].
    pub fn reactions(&self) -> Result<DVector<f64>, NumericalError> {
        let displacements = self.displacements()?;
        let mut reactions = self.stiffness_matrix() * displacements - self.loads();
        for (node, weight) in self.nodes() {
            if !weight.fixed {
                for axis in Self::axis_indices(node) {
                    reactions[axis] = 0.0;
                }
            }
        }
        Ok(reactions)
    }

    /// Total mass `Σ ρ·A·L` in kilograms.
    #[must_use]
    pub fn total_mass(&self) -> f64 {
        self.elements().map(|(_, element)| element.mass()).sum()
    }

    /// Position of a node, or an error naming it.
    fn position_of(&self, node: NodeIndex) -> Result<Vector2D, ConfigurationError> {
        self.graph
            .node_weight(node)
            .map(Node::position)
            .ok_or(ConfigurationError::UnknownNode(node))
    }

    /// Reject free nodes with no element attached.
    fn check_connectivity(&self) -> Result<(), NumericalError> {
        match self.graph.node_indices().find(|node| {
            !self.graph[*node].fixed && self.graph.neighbors_undirected(*node).next().is_none()
        }) {
            Some(node) => Err(NumericalError::FloatingNode { node: node.index() }),
            None => Ok(()),
        }
    }

    /// Stress of every element for a known displacement vector.
    fn stresses_for(&self, displacements: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(
            self.element_count(),
            self.elements().map(|(edge, element)| {
                self.axis_indices_of_element(edge)
                    .map_or(0.0, |[a, b, c, d]| {
                        element.stress(&Vector4::new(
                            displacements[a],
                            displacements[b],
                            displacements[c],
                            displacements[d],
                        ))
                    })
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::vector;

    fn two_node_bar() -> (Model, NodeIndex, NodeIndex, EdgeIndex) {
        let mut model = Model::new();
        let support = model.add_node(vector(0.0, 0.0));
        let tip = model.add_node(vector(1.0, 0.0));
        let bar = model
            .add_element(support, tip, ElementProperties::default())
            .expect("valid element");
        model.fix_node(support).expect("node exists");
        (model, support, tip, bar)
    }

    fn triangle() -> Model {
        let mut model = Model::new();
        let a = model.add_node(vector(0.0, 0.0));
        let b = model.add_node(vector(4.0, 0.0));
        let c = model.add_node(vector(2.0, 3.0));
        for (start, end) in [(a, b), (b, c), (a, c)] {
            model
                .add_element(start, end, ElementProperties::default())
                .expect("valid element");
        }
        model.fix_node(a).expect("node exists");
        model.fix_node(b).expect("node exists");
        model
            .set_node_load(c, vector(1.0e5, -2.0e5))
            .expect("node exists");
        model
    }

    #[test]
    fn add_node_ignores_duplicate_positions() {
        let mut model = Model::new();
        let first = model.add_node(vector(1.0, 2.0));
        let second = model.add_node(vector(1.0, 2.0));
        assert_eq!(first, second);
        assert_eq!(model.node_count(), 1);
        assert_eq!(first.index(), 0);
    }

    #[test]
    fn add_element_is_idempotent() {
        let (mut model, support, tip, bar) = two_node_bar();
        let again = model
            .add_element(support, tip, ElementProperties::default())
            .expect("valid element");
        assert_eq!(again, bar);
        assert_eq!(model.element_count(), 1);

        let reversed = model
            .add_element(tip, support, ElementProperties::default())
            .expect("valid element");
        assert_ne!(reversed, bar);
        assert_eq!(model.element_count(), 2);
    }

    #[test]
    fn elements_must_reference_model_nodes() {
        let (mut model, support, _, _) = two_node_bar();
        let stranger = NodeIndex::new(7);
        let error = model
            .add_element(support, stranger, ElementProperties::default())
            .expect_err("unknown node rejected");
        assert_eq!(error, ConfigurationError::UnknownNode(stranger));

        let error = model
            .add_element_between(vector(0.0, 0.0), vector(5.0, 5.0), ElementProperties::default())
            .expect_err("unknown position rejected");
        assert_eq!(
            error,
            ConfigurationError::NoNodeAtPosition(vector(5.0, 5.0))
        );

        let error = model
            .add_element(support, support, ElementProperties::default())
            .expect_err("zero length rejected");
        assert!(matches!(error, ConfigurationError::ZeroLengthElement { .. }));
        assert_eq!(model.element_count(), 1);
    }

    #[test]
    fn non_finite_positions_cannot_carry_elements() {
        let (mut model, support, _, _) = two_node_bar();
        let lost = model.add_node(vector(f64::NAN, 1.0));
        let error = model
            .add_element(support, lost, ElementProperties::default())
            .expect_err("NaN coordinate rejected");
        assert!(matches!(
            error,
            ConfigurationError::NonFinitePosition { node, .. } if node == lost
        ));
        assert_eq!(model.element_count(), 1);
        assert!(model.total_mass().is_finite());

        let far = model.add_node(vector(f64::INFINITY, 0.0));
        assert!(model
            .add_element(far, support, ElementProperties::default())
            .is_err());
    }

    #[test]
    fn fixing_unknown_node_fails() {
        let (mut model, _, _, _) = two_node_bar();
        let error = model
            .fix_node(NodeIndex::new(2))
            .expect_err("out of range rejected");
        assert_eq!(error, ConfigurationError::UnknownNode(NodeIndex::new(2)));
    }

    #[test]
    fn wrong_load_length_is_rejected_without_change() {
        let (mut model, _, _, _) = two_node_bar();
        model
            .set_loads(&[0.0, 0.0, 5.0, 0.0])
            .expect("matching length accepted");
        for bad in [vec![0.0; 3], vec![0.0; 5], Vec::new()] {
            let error = model.set_loads(&bad).expect_err("wrong length rejected");
            assert_eq!(
                error,
                ConfigurationError::LoadLengthMismatch {
                    expected: 4,
                    actual: bad.len()
                }
            );
        }
        assert_eq!(model.loads().as_slice(), &[0.0, 0.0, 5.0, 0.0]);
    }

    #[test]
    fn axis_bookkeeping_follows_insertion_order() {
        let model = triangle();
        let edges: Vec<EdgeIndex> = model.elements().map(|(edge, _)| edge).collect();
        assert_eq!(model.axis_indices_of_element(edges[0]), Some([0, 1, 2, 3]));
        assert_eq!(model.axis_indices_of_element(edges[1]), Some([2, 3, 4, 5]));
        assert_eq!(model.axis_indices_of_element(edges[2]), Some([0, 1, 4, 5]));
        assert_eq!(model.fixed_axes(), vec![0, 1, 2, 3]);
        assert_eq!(model.loads().as_slice(), &[0.0, 0.0, 0.0, 0.0, 1.0e5, -2.0e5]);
    }

    #[test]
    fn global_stiffness_is_symmetric_and_semidefinite() {
        let stiffness = triangle().stiffness_matrix();
        assert_eq!(stiffness, stiffness.transpose());
        let scale = stiffness.amax();
        let eigenvalues = stiffness.symmetric_eigen().eigenvalues;
        assert!(eigenvalues.iter().all(|value| *value > -1.0e-9 * scale));
        let rigid_modes = eigenvalues
            .iter()
            .filter(|value| value.abs() < 1.0e-9 * scale)
            .count();
        assert_eq!(rigid_modes, 3);
    }

    #[test]
    fn reduced_stiffness_is_positive_definite() {
        let system = triangle().reduced_system();
        assert_eq!(system.free_axes, vec![4, 5]);
        assert!(system.stiffness.clone().cholesky().is_some());
    }

    #[test]
    fn two_node_bar_matches_closed_form() {
        let (mut model, _, _, _) = two_node_bar();
        model
            .set_loads(&[0.0, 0.0, 1.0e5, 0.0])
            .expect("matching length accepted");
        let area = PI * 0.01;
        let displacements = model.displacements().expect("supported structure");
        assert_eq!(displacements[0], 0.0);
        assert_eq!(displacements[1], 0.0);
        assert_relative_eq!(displacements[2], 1.0e5 / (area * 2.0e11), max_relative = 1.0e-10);

        let stresses = model.element_stresses().expect("supported structure");
        assert_relative_eq!(stresses[0], 1.0e5 / area, max_relative = 1.0e-10);
        let forces = model.element_forces().expect("supported structure");
        assert_relative_eq!(forces[0], 1.0e5, max_relative = 1.0e-10);
        let reactions = model.reactions().expect("supported structure");
        assert_relative_eq!(reactions[0], -1.0e5, max_relative = 1.0e-10);
    }

    #[test]
    fn displacement_magnitudes_combine_both_axes() {
        let model = triangle();
        let displacements = model.displacements().expect("supported structure");
        assert!(displacements[4] != 0.0 && displacements[5] != 0.0);

        let magnitudes = model
            .node_displacement_magnitudes()
            .expect("supported structure");
        assert_eq!(magnitudes.len(), 3);
        assert_eq!(magnitudes[0], 0.0);
        assert_eq!(magnitudes[1], 0.0);
        assert_relative_eq!(
            magnitudes[2],
            displacements[4].hypot(displacements[5]),
            max_relative = 1.0e-12
        );
        assert!(magnitudes[2] > displacements[4].abs().max(displacements[5].abs()));
    }

    #[test]
    fn triangle_is_in_equilibrium() {
        let model = triangle();
        let reactions = model.reactions().expect("supported structure");
        let loads = model.loads();
        let total_x = reactions[0] + reactions[2] + loads[4];
        let total_y = reactions[1] + reactions[3] + loads[5];
        assert_relative_eq!(total_x, 0.0, epsilon = 1.0e-6);
        assert_relative_eq!(total_y, 0.0, epsilon = 1.0e-6);
    }

    #[test]
    fn unsupported_structure_is_under_constrained() {
        let mut model = Model::new();
        let a = model.add_node(vector(0.0, 0.0));
        let b = model.add_node(vector(1.0, 0.0));
        model
            .add_element(a, b, ElementProperties::default())
            .expect("valid element");
        model.set_loads(&[0.0, 0.0, 1.0, 0.0]).expect("matching length");
        let error = model.displacements().expect_err("rigid body modes remain");
        assert_eq!(error, NumericalError::UnderConstrained { free_axes: 4 });
    }

    #[test]
    fn collinear_mechanism_is_under_constrained() {
        let mut model = Model::new();
        let a = model.add_node(vector(0.0, 0.0));
        let b = model.add_node(vector(1.0, 0.0));
        let c = model.add_node(vector(2.0, 0.0));
        for (start, end) in [(a, b), (b, c)] {
            model
                .add_element(start, end, ElementProperties::default())
                .expect("valid element");
        }
        model.fix_node(a).expect("node exists");
        model.fix_node(c).expect("node exists");
        model
            .set_node_load(b, vector(0.0, -1.0e3))
            .expect("node exists");
        let error = model.displacements().expect_err("middle node can swing");
        assert_eq!(error, NumericalError::UnderConstrained { free_axes: 2 });
    }

    #[test]
    fn disconnected_node_is_reported() {
        let (mut model, _, _, _) = two_node_bar();
        model.add_node(vector(3.0, 3.0));
        let error = model.displacements().expect_err("floating node");
        assert_eq!(error, NumericalError::FloatingNode { node: 2 });
    }

    #[test]
    fn fully_fixed_model_has_zero_displacements() {
        let (mut model, _, tip, _) = two_node_bar();
        model.fix_node(tip).expect("node exists");
        model
            .set_loads(&[0.0, 0.0, 1.0e5, 0.0])
            .expect("matching length accepted");
        let displacements = model.displacements().expect("zero-size solve");
        assert_eq!(displacements.len(), 4);
        assert!(displacements.iter().all(|value| *value == 0.0));
    }

    #[test]
    fn radius_change_is_visible_immediately() {
        let (mut model, _, _, bar) = two_node_bar();
        model
            .set_loads(&[0.0, 0.0, 1.0e5, 0.0])
            .expect("matching length accepted");
        let before = model.displacements().expect("supported")[2];
        let mass_before = model.total_mass();
        model.set_element_radius(bar, 0.2).expect("valid radius");
        let after = model.displacements().expect("supported")[2];
        assert_relative_eq!(after, before / 4.0, max_relative = 1.0e-10);
        assert_relative_eq!(model.total_mass(), 4.0 * mass_before, max_relative = 1.0e-12);

        let error = model
            .set_element_radius(bar, -1.0)
            .expect_err("negative radius rejected");
        assert!(matches!(
            error,
            ConfigurationError::InvalidElementProperties(_)
        ));
        assert_eq!(model.element(bar).map(Element::radius), Some(0.2));
    }

    #[test]
    fn over_loading_sign_tracks_yield() {
        let (mut model, support, tip, _) = two_node_bar();
        let area = PI * 0.01;
        let load_at_yield = 2.5e8 * area;
        model
            .set_node_load(tip, vector(0.5 * load_at_yield, 0.0))
            .expect("node exists");
        assert!(model.over_loading().expect("supported")[0] < 0.0);
        let fos = model.factors_of_safety().expect("supported");
        assert_relative_eq!(fos[0], 2.0, max_relative = 1.0e-9);

        model
            .set_node_load(tip, vector(-2.0 * load_at_yield, 0.0))
            .expect("node exists");
        let over = model.over_loading().expect("supported")[0];
        assert_relative_eq!(over, 2.5e8, max_relative = 1.0e-9);
        assert!(model.node(support).is_some_and(Node::is_fixed));
    }
}
