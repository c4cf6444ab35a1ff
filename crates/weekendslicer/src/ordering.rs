//! The driver's feature-extrusion ordering policy: print walls
//! outside-in, same as the default most slicers ship (the outer wall sets
//! the visible surface, so it is sequenced before the inner walls it could
//! otherwise be dragged across).

use slicer_core::transformers::OrderingConstraintGenerator;
use slicer_core::tree::{FeatureKind, NodeId, OperationTree, PrintOperation};

pub struct InsetOrderConstraints;

fn inset_index(tree: &OperationTree, node: NodeId) -> Option<usize> {
    match tree.data(node) {
        PrintOperation::FeatureExtrusion(data) => match data.kind {
            FeatureKind::Wall { inset_index } => Some(inset_index),
            _ => None,
        },
        _ => None,
    }
}

impl OrderingConstraintGenerator for InsetOrderConstraints {
    fn constraints(&self, tree: &OperationTree, features: &[NodeId]) -> Vec<(NodeId, NodeId)> {
        let mut edges = Vec::new();
        for &a in features {
            for &b in features {
                if a == b {
                    continue;
                }
                if let (Some(ia), Some(ib)) = (inset_index(tree, a), inset_index(tree, b)) {
                    if ia < ib {
                        edges.push((a, b));
                    }
                }
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slicer_core::feature_type::FeatureType;
    use slicer_core::transformers::FeatureOrderingTransformer;
    use slicer_core::tree::traversal::apply_transformer;
    use slicer_core::tree::{ExtruderPlanData, FeatureExtrusionData, RetractionConfig};

    fn wall(tree: &mut OperationTree, inset_index: usize) -> NodeId {
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
    fn inner_walls_placed_before_outer_walls_get_reordered_outside_in() {
        let mut tree = OperationTree::new();
        let plan = tree.insert(PrintOperation::ExtruderPlan(ExtruderPlanData {
            extruder_nr: 0,
            travel_speed: 150.0,
            fan_speed: 1.0,
            layer_time_target: 5.0,
            retraction: RetractionConfig {
                speed: 40.0,
                distance: 1.0,
            },
            back_pressure_compensation: 0.0,
        }));
        let inner = wall(&mut tree, 1);
        let outer = wall(&mut tree, 0);
        tree.append_child(plan, inner).unwrap();
        tree.append_child(plan, outer).unwrap();

        let mut transformer = FeatureOrderingTransformer::new(InsetOrderConstraints);
        apply_transformer(&mut tree, plan, &mut transformer);

        assert_eq!(tree.children(plan), &[outer, inner]);
    }
}
