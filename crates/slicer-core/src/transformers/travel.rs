//! Travel-move insertion: closes the gap between one `FeatureExtrusion`'s
//! end and the next's start with a synthesized `TravelRoute`.

use crate::error::TreeError;
use crate::exporter::Position3;
use crate::feature_type::FeatureType;
use crate::tree::traversal::{OperationKind, Transformer};
use crate::tree::{
    ExtruderMoveData, FeatureExtrusionData, FeatureKind, MoveKind, MovePosition, NodeId,
    OperationTree, PrintOperation,
};

/// Generates the route between two points. The direct implementation below
/// produces a single straight line; collision-avoiding generators plug in
/// here without the transformer needing to change.
pub trait TravelMoveGenerator: Send + Sync {
    fn generate_route(&self, start: Position3, end: Position3, speed: f64) -> Vec<Position3>;
}

/// The only generator the core ships: one straight `TravelMove` to `end`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightTravelMoveGenerator;

impl TravelMoveGenerator for StraightTravelMoveGenerator {
    fn generate_route(&self, _start: Position3, end: Position3, _speed: f64) -> Vec<Position3> {
        vec![end]
    }
}

/// A transformer keyed to `ExtruderPlan`: walks its `FeatureExtrusion`
/// children in order and inserts a `TravelRoute` wherever one feature's end
/// position doesn't match the next's start.
pub struct TravelInsertionTransformer<G: TravelMoveGenerator> {
    generator: G,
}

impl<G: TravelMoveGenerator> TravelInsertionTransformer<G> {
    pub fn new(generator: G) -> Self {
        TravelInsertionTransformer { generator }
    }

    fn build_travel_route(
        &self,
        tree: &mut OperationTree,
        start: Position3,
        end: Position3,
        travel_speed: f64,
    ) -> NodeId {
        let route = tree.insert(PrintOperation::FeatureExtrusion(FeatureExtrusionData {
            kind: FeatureKind::Travel,
            feature_type: FeatureType::MoveRetraction,
            nominal_line_width: 0.0,
            flow_ratio: 0.0,
            layer_thickness: 0.0,
            width_factor: 1.0,
            speed: travel_speed,
            speed_factor: 1.0,
        }));
        let sequence = tree.insert(PrintOperation::ContinuousExtruderMoveSequence);
        tree.append_child(route, sequence).expect("fresh node has no parent");

        for point in self.generator.generate_route(start, end, travel_speed) {
            let mv = tree.insert(PrintOperation::ExtruderMove(ExtruderMoveData {
                kind: MoveKind::TravelMove,
                position: MovePosition::Absolute(point),
            }));
            tree.append_child(sequence, mv).expect("fresh node has no parent");
        }

        route
    }
}

impl<G: TravelMoveGenerator> Transformer for TravelInsertionTransformer<G> {
    fn kind(&self) -> OperationKind {
        OperationKind::ExtruderPlan
    }

    fn process(&mut self, tree: &mut OperationTree, node: NodeId) {
        let travel_speed = match tree.data(node) {
            PrintOperation::ExtruderPlan(plan) => plan.travel_speed,
            _ => return,
        };

        let mut features = tree.children(node).to_vec();
        let mut i = 0;
        while i + 1 < features.len() {
            let current = features[i];
            let next = features[i + 1];

            let (Some(end), Some(start)) =
                (tree.find_end_position(current), tree.find_start_position(next))
            else {
                i += 1;
                continue;
            };

            if positions_match(end, start) {
                i += 1;
                continue;
            }

            let route = self.build_travel_route(tree, end, start, travel_speed);
            insert_between(tree, node, &mut features, i + 1, route)
                .expect("route was just created with no parent");
            i += 2;
        }
    }
}

fn positions_match(a: Position3, b: Position3) -> bool {
    a.xy == b.xy && (a.z - b.z).abs() < 1e-9
}

fn insert_between(
    tree: &mut OperationTree,
    parent: NodeId,
    features: &mut Vec<NodeId>,
    index: usize,
    node: NodeId,
) -> Result<(), TreeError> {
    tree.insert_child(parent, index, node)?;
    features.insert(index, node);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::tree::traversal::apply_transformer;
    use crate::tree::{ExtruderPlanData, RetractionConfig};

    fn wall_feature_ending_at(tree: &mut OperationTree, x: i64) -> NodeId {
        let feature = tree.insert(PrintOperation::FeatureExtrusion(FeatureExtrusionData {
            kind: FeatureKind::Wall { inset_index: 0 },
            feature_type: FeatureType::Wall,
            nominal_line_width: 400.0,
            flow_ratio: 1.0,
            layer_thickness: 200.0,
            width_factor: 1.0,
            speed: 60.0,
            speed_factor: 1.0,
        }));
        let sequence = tree.insert(PrintOperation::ContinuousExtruderMoveSequence);
        let mv = tree.insert(PrintOperation::ExtruderMove(ExtruderMoveData {
            kind: MoveKind::ExtrusionMove {
                line_width_ratio: 1.0,
            },
            position: MovePosition::Absolute(Position3 {
                xy: Point::new(x, 0),
                z: 0.0,
            }),
        }));
        tree.append_child(sequence, mv).unwrap();
        tree.append_child(feature, sequence).unwrap();
        feature
    }

    #[test]
    fn a_gap_between_features_gets_a_travel_route() {
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
        let a = wall_feature_ending_at(&mut tree, 10);
        let b = wall_feature_ending_at(&mut tree, 20);
        tree.append_child(plan, a).unwrap();
        tree.append_child(plan, b).unwrap();

        let mut transformer = TravelInsertionTransformer::new(StraightTravelMoveGenerator);
        apply_transformer(&mut tree, plan, &mut transformer);

        let children = tree.children(plan).to_vec();
        assert_eq!(children.len(), 3);
        let PrintOperation::FeatureExtrusion(data) = tree.data(children[1]) else {
            panic!("expected a synthesized TravelRoute between a and b");
        };
        assert_eq!(data.kind, FeatureKind::Travel);
        assert_eq!(data.feature_type, FeatureType::MoveRetraction);
        assert_eq!(tree.find_start_position(children[1]).unwrap().xy, Point::new(20, 0));
    }

    #[test]
    fn matching_endpoints_need_no_travel_route() {
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
        let a = wall_feature_ending_at(&mut tree, 10);
        let b = wall_feature_ending_at(&mut tree, 10);
        tree.append_child(plan, a).unwrap();
        tree.append_child(plan, b).unwrap();

        let mut transformer = TravelInsertionTransformer::new(StraightTravelMoveGenerator);
        apply_transformer(&mut tree, plan, &mut transformer);

        assert_eq!(tree.children(plan).len(), 2);
    }
}
