//! Ordered search, type-filtered iteration, and transformer application
//! over an [`OperationTree`].

use super::{NodeId, OperationKind, OperationTree, PrintOperation};

/// The order children are visited in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Children in insertion order.
    Forward,
    /// Children in reverse insertion order.
    Backward,
    /// Recurse into children before reporting the node itself (post-order).
    DepthFirst,
}

/// How far a search is allowed to recurse below the starting node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDepth {
    /// Only the immediate children are considered.
    DirectChildren,
    /// Recurse without bound.
    Full,
    /// Recurse exactly this many levels below the starting node.
    Exact(usize),
}

fn depth_allows(depth: SearchDepth, level_below_root: usize) -> bool {
    match depth {
        SearchDepth::DirectChildren => level_below_root < 1,
        SearchDepth::Full => true,
        SearchDepth::Exact(n) => level_below_root < n,
    }
}

fn ordered_children(tree: &OperationTree, node: NodeId, backward: bool) -> Vec<NodeId> {
    let mut children = tree.children(node).to_vec();
    if backward {
        children.reverse();
    }
    children
}

fn find_pre_order<P>(
    tree: &OperationTree,
    node: NodeId,
    predicate: &P,
    depth: SearchDepth,
    backward: bool,
    level: usize,
) -> Option<NodeId>
where
    P: Fn(&PrintOperation) -> bool,
{
    for child in ordered_children(tree, node, backward) {
        if predicate(tree.data(child)) {
            return Some(child);
        }
        if depth_allows(depth, level + 1) {
            if let Some(found) = find_pre_order(tree, child, predicate, depth, backward, level + 1)
            {
                return Some(found);
            }
        }
    }
    None
}

fn find_post_order<P>(
    tree: &OperationTree,
    node: NodeId,
    predicate: &P,
    depth: SearchDepth,
    level: usize,
) -> Option<NodeId>
where
    P: Fn(&PrintOperation) -> bool,
{
    for child in ordered_children(tree, node, false) {
        if depth_allows(depth, level + 1) {
            if let Some(found) = find_post_order(tree, child, predicate, depth, level + 1) {
                return Some(found);
            }
        }
        if predicate(tree.data(child)) {
            return Some(child);
        }
    }
    None
}

/// Returns the first child (or descendant, when `depth` allows recursion)
/// matching `predicate`, visited per `order`.
pub fn find<P>(tree: &OperationTree, root: NodeId, predicate: P, order: Order, depth: SearchDepth) -> Option<NodeId>
where
    P: Fn(&PrintOperation) -> bool,
{
    match order {
        Order::Forward => find_pre_order(tree, root, &predicate, depth, false, 0),
        Order::Backward => find_pre_order(tree, root, &predicate, depth, true, 0),
        Order::DepthFirst => find_post_order(tree, root, &predicate, depth, 0),
    }
}

/// Sugar over [`find`] filtering by the node's [`OperationKind`] discriminant
/// — the tagged-variant stand-in for the source's `find_by_type<T>`.
pub fn find_by_kind(tree: &OperationTree, root: NodeId, kind: OperationKind, order: Order, depth: SearchDepth) -> Option<NodeId> {
    find(tree, root, |op| op.kind() == kind, order, depth)
}

/// A transformer pass keyed to one [`OperationKind`], applied depth-first.
pub trait Transformer {
    fn kind(&self) -> OperationKind;
    fn process(&mut self, tree: &mut OperationTree, node: NodeId);
}

/// Applies `transformer` to every descendant of `root` matching its
/// [`OperationKind`], depth-first: a sequence node is recursed into before
/// its own match is processed.
pub fn apply_transformer<T: Transformer>(tree: &mut OperationTree, root: NodeId, transformer: &mut T) {
    fn recurse<T: Transformer>(tree: &mut OperationTree, node: NodeId, transformer: &mut T) {
        let children = tree.children(node).to_vec();
        for child in children {
            recurse(tree, child, transformer);
        }
        if tree.data(node).kind() == transformer.kind() {
            transformer.process(tree, node);
        }
    }

    let children = tree.children(root).to_vec();
    for child in children {
        recurse(tree, child, transformer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{FeatureExtrusionData, FeatureKind};
    use crate::feature_type::FeatureType;

    fn wall_feature(tree: &mut OperationTree, inset_index: usize) -> NodeId {
        tree.insert(PrintOperation::FeatureExtrusion(FeatureExtrusionData {
            kind: FeatureKind::Wall { inset_index },
            feature_type: FeatureType::Wall,
            nominal_line_width: 400.0,
            flow_ratio: 1.0,
            layer_thickness: 200.0,
            width_factor: 1.0,
            speed: 60.0,
            speed_factor: 1.0,
        }))
    }

    #[test]
    fn forward_find_returns_the_first_match_in_insertion_order() {
        let mut tree = OperationTree::new();
        let root = tree.insert(PrintOperation::ContinuousExtruderMoveSequence);
        let a = wall_feature(&mut tree, 0);
        let b = wall_feature(&mut tree, 1);
        tree.append_child(root, a).unwrap();
        tree.append_child(root, b).unwrap();

        let found = find_by_kind(&tree, root, OperationKind::FeatureExtrusion, Order::Forward, SearchDepth::DirectChildren);
        assert_eq!(found, Some(a));

        let found_backward = find_by_kind(&tree, root, OperationKind::FeatureExtrusion, Order::Backward, SearchDepth::DirectChildren);
        assert_eq!(found_backward, Some(b));
    }

    #[test]
    fn direct_children_depth_does_not_recurse() {
        let mut tree = OperationTree::new();
        let root = tree.insert(PrintOperation::ContinuousExtruderMoveSequence);
        let middle = tree.insert(PrintOperation::ContinuousExtruderMoveSequence);
        let leaf = wall_feature(&mut tree, 0);
        tree.append_child(middle, leaf).unwrap();
        tree.append_child(root, middle).unwrap();

        let direct = find_by_kind(&tree, root, OperationKind::FeatureExtrusion, Order::Forward, SearchDepth::DirectChildren);
        assert_eq!(direct, None);

        let full = find_by_kind(&tree, root, OperationKind::FeatureExtrusion, Order::Forward, SearchDepth::Full);
        assert_eq!(full, Some(leaf));
    }

    struct CountingTransformer {
        kind: OperationKind,
        visits: Vec<NodeId>,
    }

    impl Transformer for CountingTransformer {
        fn kind(&self) -> OperationKind {
            self.kind
        }
        fn process(&mut self, _tree: &mut OperationTree, node: NodeId) {
            self.visits.push(node);
        }
    }

    #[test]
    fn apply_transformer_visits_every_matching_descendant() {
        let mut tree = OperationTree::new();
        let root = tree.insert(PrintOperation::ContinuousExtruderMoveSequence);
        let a = wall_feature(&mut tree, 0);
        let b = wall_feature(&mut tree, 1);
        tree.append_child(root, a).unwrap();
        tree.append_child(root, b).unwrap();

        let mut transformer = CountingTransformer {
            kind: OperationKind::FeatureExtrusion,
            visits: Vec::new(),
        };
        apply_transformer(&mut tree, root, &mut transformer);
        assert_eq!(transformer.visits, vec![a, b]);
    }
}
