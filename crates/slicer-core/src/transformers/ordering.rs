//! Feature-extrusion ordering: a pluggable constraint generator proposes
//! directed "must-come-before" edges between a layer's
//! `FeatureExtrusion`s, and this transformer topologically sorts them,
//! stable with respect to the current order, retaining the original order
//! for any cycle it finds.

use std::collections::{HashSet, VecDeque};

use crate::tree::traversal::{OperationKind, Transformer};
use crate::tree::{NodeId, OperationTree};

/// Produces ordering constraints among the `FeatureExtrusion` children of
/// one `ExtruderPlan`. Each returned pair `(before, after)` means `before`
/// must be emitted no later than `after`.
pub trait OrderingConstraintGenerator: Send + Sync {
    fn constraints(&self, tree: &OperationTree, features: &[NodeId]) -> Vec<(NodeId, NodeId)>;
}

/// Stable topological sort: among nodes with no remaining unsatisfied
/// predecessor, always picks the one appearing earliest in `original`.
/// Nodes that can't be resolved (a cycle) are appended at the end, in
/// their original relative order, and returned separately for logging.
pub fn stable_topological_sort(
    original: &[NodeId],
    constraints: &[(NodeId, NodeId)],
) -> (Vec<NodeId>, Vec<NodeId>) {
    let index_of: std::collections::HashMap<NodeId, usize> = original
        .iter()
        .enumerate()
        .map(|(i, &n)| (n, i))
        .collect();

    let mut indegree = vec![0usize; original.len()];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); original.len()];

    for &(before, after) in constraints {
        let (Some(&bi), Some(&ai)) = (index_of.get(&before), index_of.get(&after)) else {
            continue;
        };
        if bi == ai {
            continue;
        }
        successors[bi].push(ai);
        indegree[ai] += 1;
    }

    let mut ready: VecDeque<usize> = (0..original.len())
        .filter(|&i| indegree[i] == 0)
        .collect();
    // `VecDeque` from a range is already in index (= original-order) order;
    // pop the smallest index each time to stay stable.
    let mut sorted_indices: Vec<usize> = Vec::with_capacity(original.len());
    let mut resolved = vec![false; original.len()];

    loop {
        let mut candidates: Vec<usize> = ready.drain(..).collect();
        candidates.sort_unstable();
        let Some(&next) = candidates.first() else {
            break;
        };
        for &c in &candidates[1..] {
            ready.push_back(c);
        }

        sorted_indices.push(next);
        resolved[next] = true;
        for &succ in &successors[next] {
            indegree[succ] -= 1;
            if indegree[succ] == 0 {
                ready.push_back(succ);
            }
        }
    }

    let cycle_indices: HashSet<usize> = (0..original.len())
        .filter(|&i| !resolved[i])
        .collect();

    let mut order: Vec<NodeId> = sorted_indices.into_iter().map(|i| original[i]).collect();
    let mut cycle_members = Vec::new();
    for (i, &node) in original.iter().enumerate() {
        if cycle_indices.contains(&i) {
            order.push(node);
            cycle_members.push(node);
        }
    }

    (order, cycle_members)
}

/// A transformer keyed to `ExtruderPlan`: reorders its `FeatureExtrusion`
/// children per `constraints`' output.
pub struct FeatureOrderingTransformer<G: OrderingConstraintGenerator> {
    generator: G,
}

impl<G: OrderingConstraintGenerator> FeatureOrderingTransformer<G> {
    pub fn new(generator: G) -> Self {
        FeatureOrderingTransformer { generator }
    }
}

impl<G: OrderingConstraintGenerator> Transformer for FeatureOrderingTransformer<G> {
    fn kind(&self) -> OperationKind {
        OperationKind::ExtruderPlan
    }

    fn process(&mut self, tree: &mut OperationTree, node: NodeId) {
        let features = tree.children(node).to_vec();
        if features.len() < 2 {
            return;
        }

        let constraints = self.generator.constraints(tree, &features);
        let (order, cycle_members) = stable_topological_sort(&features, &constraints);

        if !cycle_members.is_empty() {
            log::warn!(
                "feature-extrusion ordering found a cycle among {} node(s); retaining original order for them",
                cycle_members.len()
            );
        }

        let _ = tree.reorder_children(node, order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_type::FeatureType;
    use crate::tree::traversal::apply_transformer;
    use crate::tree::{ExtruderPlanData, FeatureExtrusionData, FeatureKind, PrintOperation, RetractionConfig};

    fn feature(tree: &mut OperationTree) -> NodeId {
        tree.insert(PrintOperation::FeatureExtrusion(FeatureExtrusionData {
            kind: FeatureKind::Skin,
            feature_type: FeatureType::Skin,
            nominal_line_width: 400.0,
            flow_ratio: 1.0,
            layer_thickness: 200.0,
            width_factor: 1.0,
            speed: 60.0,
            speed_factor: 1.0,
        }))
    }

    struct ReverseConstraints;
    impl OrderingConstraintGenerator for ReverseConstraints {
        fn constraints(&self, _tree: &OperationTree, features: &[NodeId]) -> Vec<(NodeId, NodeId)> {
            let mut edges = Vec::new();
            for w in features.windows(2) {
                edges.push((w[1], w[0]));
            }
            edges
        }
    }

    struct CyclicConstraints;
    impl OrderingConstraintGenerator for CyclicConstraints {
        fn constraints(&self, _tree: &OperationTree, features: &[NodeId]) -> Vec<(NodeId, NodeId)> {
            vec![(features[0], features[1]), (features[1], features[0])]
        }
    }

    fn plan(tree: &mut OperationTree) -> NodeId {
        tree.insert(PrintOperation::ExtruderPlan(ExtruderPlanData {
            extruder_nr: 0,
            travel_speed: 150.0,
            fan_speed: 1.0,
            layer_time_target: 5.0,
            retraction: RetractionConfig {
                speed: 40.0,
                distance: 1.0,
            },
            back_pressure_compensation: 0.0,
        }))
    }

    #[test]
    fn constraints_invert_the_order() {
        let mut tree = OperationTree::new();
        let plan = plan(&mut tree);
        let a = feature(&mut tree);
        let b = feature(&mut tree);
        let c = feature(&mut tree);
        tree.append_child(plan, a).unwrap();
        tree.append_child(plan, b).unwrap();
        tree.append_child(plan, c).unwrap();

        let mut transformer = FeatureOrderingTransformer::new(ReverseConstraints);
        apply_transformer(&mut tree, plan, &mut transformer);

        assert_eq!(tree.children(plan), &[c, b, a]);
    }

    #[test]
    fn a_cycle_retains_the_original_order_for_its_members() {
        let mut tree = OperationTree::new();
        let plan = plan(&mut tree);
        let a = feature(&mut tree);
        let b = feature(&mut tree);
        tree.append_child(plan, a).unwrap();
        tree.append_child(plan, b).unwrap();

        let mut transformer = FeatureOrderingTransformer::new(CyclicConstraints);
        apply_transformer(&mut tree, plan, &mut transformer);

        assert_eq!(tree.children(plan), &[a, b]);
    }

    #[test]
    fn no_constraints_leaves_a_stable_order() {
        let mut tree = OperationTree::new();
        let plan = plan(&mut tree);
        let a = feature(&mut tree);
        let b = feature(&mut tree);
        let c = feature(&mut tree);
        tree.append_child(plan, a).unwrap();
        tree.append_child(plan, b).unwrap();
        tree.append_child(plan, c).unwrap();

        let (order, cycles) = stable_topological_sort(&[a, b, c], &[]);
        assert_eq!(order, vec![a, b, c]);
        assert!(cycles.is_empty());
    }
}
