//! The Print Operation Tree.
//!
//! Other slicer cores model this as a shared-pointer tree with weak
//! back-references; here that becomes exclusive ownership of children plus
//! a non-owning parent handle. Rust has no safe
//! way to hold an owned child alongside a borrowed parent inside the same
//! struct, so the idiomatic realization is an arena: every node lives in one
//! `OperationTree`'s flat store, referenced everywhere else by a plain
//! [`NodeId`] index. A `children: Vec<NodeId>` is exclusive ownership in
//! every sense that matters (only the arena can resolve the index, and a
//! child detached from its parent is unreachable from the rest of the
//! tree); a `parent: Option<NodeId>` is the non-owning back-reference,
//! since dropping it costs nothing the arena doesn't already own.

pub mod traversal;

use crate::error::TreeError;
use crate::exporter::{PlanExporter, Position3};
use crate::feature_type::FeatureType;
use crate::geometry::Point;

/// An index into an [`OperationTree`]'s node store. Stable for the lifetime
/// of the tree: nodes are never compacted or reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// An absolute-or-relative 3D position carried by an `ExtruderMove`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovePosition {
    Absolute(Position3),
    /// `xy` is absolute; `dz` is added to the nearest ancestor `LayerPlan`'s
    /// `z` when the move is resolved.
    RelativeToLayerZ { xy: Point, dz: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveKind {
    ExtrusionMove { line_width_ratio: f64 },
    TravelMove,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtruderMoveData {
    pub kind: MoveKind,
    pub position: MovePosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerPlanData {
    pub layer_index: usize,
    pub z: f64,
    pub thickness: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct RetractionConfig {
    pub speed: f64,
    pub distance: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ExtruderPlanData {
    pub extruder_nr: usize,
    pub travel_speed: f64,
    pub fan_speed: f64,
    pub layer_time_target: f64,
    pub retraction: RetractionConfig,
    pub back_pressure_compensation: f64,
}

/// Distinguishes the `FeatureExtrusion` subvariants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureKind {
    Wall { inset_index: usize },
    Mesh { mesh_id: u64 },
    Skin,
    Infill,
    Support,
    /// `TravelRoute`: a travel-only leaf sequence.
    Travel,
}

#[derive(Debug, Clone, Copy)]
pub struct FeatureExtrusionData {
    pub kind: FeatureKind,
    pub feature_type: FeatureType,
    pub nominal_line_width: f64,
    pub flow_ratio: f64,
    pub layer_thickness: f64,
    pub width_factor: f64,
    /// Nominal speed for this feature's extrusion moves, mm/s.
    /// `feature.speed` in §4.6's velocity formula.
    pub speed: f64,
    pub speed_factor: f64,
}

/// The tagged-variant node type of the operation tree.
#[derive(Debug, Clone)]
pub enum PrintOperation {
    LayerPlan(LayerPlanData),
    ExtruderPlan(ExtruderPlanData),
    FeatureExtrusion(FeatureExtrusionData),
    ContinuousExtruderMoveSequence,
    ExtruderMove(ExtruderMoveData),
}

/// Discriminant used by `find_by_type`/`apply_transformer` sugar over the
/// tagged variant, the idiomatic stand-in for dynamic downcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    LayerPlan,
    ExtruderPlan,
    FeatureExtrusion,
    ContinuousExtruderMoveSequence,
    ExtruderMove,
}

impl PrintOperation {
    pub fn kind(&self) -> OperationKind {
        match self {
            PrintOperation::LayerPlan(_) => OperationKind::LayerPlan,
            PrintOperation::ExtruderPlan(_) => OperationKind::ExtruderPlan,
            PrintOperation::FeatureExtrusion(_) => OperationKind::FeatureExtrusion,
            PrintOperation::ContinuousExtruderMoveSequence => {
                OperationKind::ContinuousExtruderMoveSequence
            }
            PrintOperation::ExtruderMove(_) => OperationKind::ExtruderMove,
        }
    }
}

struct Slot {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: PrintOperation,
}

/// The arena backing every `PrintOperation` node, per the design note above.
#[derive(Default)]
pub struct OperationTree {
    nodes: Vec<Slot>,
}

impl OperationTree {
    pub fn new() -> Self {
        OperationTree { nodes: Vec::new() }
    }

    /// Creates a detached node (no parent, no children) and returns its id.
    pub fn insert(&mut self, data: PrintOperation) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Slot {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    fn slot(&self, id: NodeId) -> &Slot {
        &self.nodes[id.0]
    }

    fn slot_mut(&mut self, id: NodeId) -> &mut Slot {
        &mut self.nodes[id.0]
    }

    pub fn data(&self, id: NodeId) -> &PrintOperation {
        &self.slot(id).data
    }

    pub fn data_mut(&mut self, id: NodeId) -> &mut PrintOperation {
        &mut self.slot_mut(id).data
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slot(id).children
    }

    /// true iff `id` has no children.
    pub fn empty(&self, id: NodeId) -> bool {
        self.children(id).is_empty()
    }

    fn is_ancestor(&self, maybe_ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == maybe_ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// `child` becomes exclusively owned by `parent`; rejects an
    /// already-parented child or one that would close a cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if self.slot(child).parent.is_some() {
            return Err(TreeError::AlreadyParented);
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(TreeError::Cycle);
        }
        self.slot_mut(parent).children.push(child);
        self.slot_mut(child).parent = Some(parent);
        Ok(())
    }

    /// Detaches `child` from `parent` and clears its back-reference.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let position = self
            .slot(parent)
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(TreeError::NotAChild)?;
        self.slot_mut(parent).children.remove(position);
        self.slot_mut(child).parent = None;
        Ok(())
    }

    /// Like [`Self::append_child`], but splices `child` in at `index` rather
    /// than the end of `parent`'s children. Used by the travel-insertion
    /// transformer to interleave a synthesized `TravelRoute` between two
    /// existing `FeatureExtrusion`s without disturbing their relative order.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<(), TreeError> {
        if self.slot(child).parent.is_some() {
            return Err(TreeError::AlreadyParented);
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(TreeError::Cycle);
        }
        let index = index.min(self.slot(parent).children.len());
        self.slot_mut(parent).children.insert(index, child);
        self.slot_mut(child).parent = Some(parent);
        Ok(())
    }

    /// Replaces `parent`'s children order with `new_order`, a permutation of
    /// the current children. Used by the feature-extrusion-ordering
    /// transformer after it has computed a topologically-sorted order.
    pub fn reorder_children(&mut self, parent: NodeId, new_order: Vec<NodeId>) -> Result<(), TreeError> {
        let mut current = self.slot(parent).children.clone();
        current.sort_by_key(|n| n.0);
        let mut sorted_new = new_order.clone();
        sorted_new.sort_by_key(|n| n.0);
        if current != sorted_new {
            return Err(TreeError::NotAChild);
        }
        self.slot_mut(parent).children = new_order;
        Ok(())
    }

    fn nearest_layer_z(&self, from: NodeId) -> Option<f64> {
        let mut current = self.parent(from);
        while let Some(id) = current {
            if let PrintOperation::LayerPlan(layer) = self.data(id) {
                return Some(layer.z);
            }
            current = self.parent(id);
        }
        None
    }

    fn resolve_position(&self, move_id: NodeId) -> Option<Position3> {
        let PrintOperation::ExtruderMove(m) = self.data(move_id) else {
            return None;
        };
        match m.position {
            MovePosition::Absolute(p) => Some(p),
            MovePosition::RelativeToLayerZ { xy, dz } => {
                let layer_z = self.nearest_layer_z(move_id)?;
                Some(Position3 {
                    xy,
                    z: layer_z + dz,
                })
            }
        }
    }

    fn first_leaf(&self, id: NodeId) -> Option<NodeId> {
        if matches!(self.data(id), PrintOperation::ExtruderMove(_)) {
            return Some(id);
        }
        self.children(id).iter().find_map(|&c| self.first_leaf(c))
    }

    fn last_leaf(&self, id: NodeId) -> Option<NodeId> {
        if matches!(self.data(id), PrintOperation::ExtruderMove(_)) {
            return Some(id);
        }
        self.children(id)
            .iter()
            .rev()
            .find_map(|&c| self.last_leaf(c))
    }

    /// The first absolute position produced by an in-order traversal of the
    /// subtree's leaves, or `None` if the subtree has no move leaves or an
    /// ancestor `LayerPlan` is missing for a relative move.
    pub fn find_start_position(&self, id: NodeId) -> Option<Position3> {
        self.resolve_position(self.first_leaf(id)?)
    }

    /// Symmetric to [`Self::find_start_position`]: the last position.
    pub fn find_end_position(&self, id: NodeId) -> Option<Position3> {
        self.resolve_position(self.last_leaf(id)?)
    }

    /// Recursively writes `root` into `exporter`. `parents` is the ancestor
    /// chain accumulated so far (root-most first); callers at the top level
    /// pass an empty `Vec`. Missing-ancestor failures during leaf emission
    /// are logged and skipped, never propagated.
    pub fn write(&self, root: NodeId, exporter: &mut dyn PlanExporter, parents: &mut Vec<NodeId>) {
        parents.push(root);

        match self.data(root) {
            PrintOperation::LayerPlan(layer) => {
                let start = self
                    .find_start_position(root)
                    .unwrap_or(Position3 {
                        xy: Point::new(0, 0),
                        z: layer.z,
                    });
                exporter.write_layer_start(layer.layer_index, start);
                for &child in self.children(root).to_vec().iter() {
                    self.write(child, exporter, parents);
                }
                exporter.write_layer_end(layer.layer_index, layer.z, layer.thickness);
            }
            PrintOperation::ExtruderMove(_) => {
                self.write_move(root, exporter, parents);
            }
            _ => {
                for &child in self.children(root).to_vec().iter() {
                    self.write(child, exporter, parents);
                }
            }
        }

        parents.pop();
    }

    pub(crate) fn nearest_feature(&self, id: NodeId) -> Option<&FeatureExtrusionData> {
        let mut current = self.parent(id);
        while let Some(n) = current {
            if let PrintOperation::FeatureExtrusion(f) = self.data(n) {
                return Some(f);
            }
            current = self.parent(n);
        }
        None
    }

    pub(crate) fn nearest_extruder_plan(&self, id: NodeId) -> Option<&ExtruderPlanData> {
        let mut current = self.parent(id);
        while let Some(n) = current {
            if let PrintOperation::ExtruderPlan(e) = self.data(n) {
                return Some(e);
            }
            current = self.parent(n);
        }
        None
    }

    fn write_move(&self, id: NodeId, exporter: &mut dyn PlanExporter, _parents: &[NodeId]) {
        let Some(position) = self.resolve_position(id) else {
            log::warn!("extruder move has no resolvable position (missing LayerPlan ancestor); skipping");
            return;
        };
        let PrintOperation::ExtruderMove(m) = self.data(id) else {
            return;
        };
        let Some(feature) = self.nearest_feature(id) else {
            log::warn!("extruder move is not inside a FeatureExtrusion; skipping");
            return;
        };
        let Some(extruder_plan) = self.nearest_extruder_plan(id) else {
            log::warn!("extruder move is not inside an ExtruderPlan; skipping");
            return;
        };

        match m.kind {
            MoveKind::TravelMove => {
                exporter.write_travel(position, extruder_plan.travel_speed, feature.feature_type);
            }
            MoveKind::ExtrusionMove { line_width_ratio } => {
                use crate::emission::{derive_extrusion_params, BackPressureCompensation, PathConfig};

                let config = PathConfig {
                    feature_type: feature.feature_type,
                    line_width: feature.nominal_line_width,
                    flow_ratio: feature.flow_ratio,
                    layer_thickness: feature.layer_thickness,
                    z_offset: 0.0,
                    extrusion_mm3_per_mm: feature.nominal_line_width / 1000.0
                        * feature.layer_thickness
                        / 1000.0,
                };
                let compensation = BackPressureCompensation {
                    ratio: extruder_plan.back_pressure_compensation,
                };
                let derived = derive_extrusion_params(
                    &config,
                    1.0,
                    feature.width_factor,
                    line_width_ratio,
                    feature.speed,
                    feature.speed_factor,
                    &compensation,
                    position.z,
                );
                exporter.write_extrusion(
                    position,
                    derived.velocity,
                    derived.mm3_per_mm,
                    derived.line_width,
                    derived.line_thickness,
                    feature.feature_type,
                    true,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn move_node(tree: &mut OperationTree, x: i64, y: i64) -> NodeId {
        tree.insert(PrintOperation::ExtruderMove(ExtruderMoveData {
            kind: MoveKind::ExtrusionMove {
                line_width_ratio: 1.0,
            },
            position: MovePosition::RelativeToLayerZ {
                xy: Point::new(x, y),
                dz: 0.0,
            },
        }))
    }

    #[test]
    fn append_then_remove_restores_prior_state() {
        let mut tree = OperationTree::new();
        let parent = tree.insert(PrintOperation::ContinuousExtruderMoveSequence);
        let child = move_node(&mut tree, 0, 0);

        assert!(tree.empty(parent));
        tree.append_child(parent, child).unwrap();
        assert_eq!(tree.children(parent), &[child]);
        assert_eq!(tree.parent(child), Some(parent));

        tree.remove_child(parent, child).unwrap();
        assert!(tree.empty(parent));
        assert_eq!(tree.parent(child), None);
    }

    #[test]
    fn reparenting_an_already_parented_child_is_rejected() {
        let mut tree = OperationTree::new();
        let a = tree.insert(PrintOperation::ContinuousExtruderMoveSequence);
        let b = tree.insert(PrintOperation::ContinuousExtruderMoveSequence);
        let child = move_node(&mut tree, 0, 0);

        tree.append_child(a, child).unwrap();
        assert_eq!(tree.append_child(b, child), Err(TreeError::AlreadyParented));
    }

    #[test]
    fn cycles_are_rejected() {
        let mut tree = OperationTree::new();
        let a = tree.insert(PrintOperation::ContinuousExtruderMoveSequence);
        let b = tree.insert(PrintOperation::ContinuousExtruderMoveSequence);
        tree.append_child(a, b).unwrap();
        assert_eq!(tree.append_child(b, a), Err(TreeError::Cycle));
    }

    #[test]
    fn start_and_end_position_read_the_first_and_last_leaf() {
        let mut tree = OperationTree::new();
        let layer = tree.insert(PrintOperation::LayerPlan(LayerPlanData {
            layer_index: 0,
            z: 0.2,
            thickness: 0.2,
        }));
        let seq = tree.insert(PrintOperation::ContinuousExtruderMoveSequence);
        let m1 = move_node(&mut tree, 0, 0);
        let m2 = move_node(&mut tree, 1000, 0);
        tree.append_child(seq, m1).unwrap();
        tree.append_child(seq, m2).unwrap();
        tree.append_child(layer, seq).unwrap();

        let start = tree.find_start_position(layer).unwrap();
        let end = tree.find_end_position(layer).unwrap();
        assert_eq!(start.xy, Point::new(0, 0));
        assert_eq!(end.xy, Point::new(1000, 0));
        assert!((start.z - 0.2).abs() < 1e-9);
    }

    #[test]
    fn empty_subtree_has_no_start_position() {
        let mut tree = OperationTree::new();
        let seq = tree.insert(PrintOperation::ContinuousExtruderMoveSequence);
        assert_eq!(tree.find_start_position(seq), None);
    }
}
