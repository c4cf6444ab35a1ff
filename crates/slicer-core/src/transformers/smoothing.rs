//! Path smoothing: a sliding four-point window that shifts or drops corner
//! vertices introduced by upstream boolean/offset noise, bounded by
//! `max_resolution` and `fluid_angle`.
//!
//! Open paths use the same window without wraparound, and may collapse to
//! 2 vertices instead of 3.

use std::collections::HashSet;

use itertools::Itertools;

use crate::geometry::Point;
use crate::tree::traversal::{OperationKind, Transformer};
use crate::tree::{FeatureKind, MoveKind, MovePosition, NodeId, OperationTree, PrintOperation};

/// `allowed_deviation = (2/3) * max_resolution`.
fn allowed_deviation(max_resolution: f64) -> f64 {
    (2.0 / 3.0) * max_resolution
}

/// `smooth_distance = max_resolution / 2`.
fn smooth_distance(max_resolution: f64) -> f64 {
    max_resolution / 2.0
}

fn as_f64(p: Point) -> (f64, f64) {
    (p.x as f64, p.y as f64)
}

fn sub(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    (a.0 - b.0, a.1 - b.1)
}

fn length(v: (f64, f64)) -> f64 {
    (v.0 * v.0 + v.1 * v.1).sqrt()
}

fn dot(a: (f64, f64), b: (f64, f64)) -> f64 {
    a.0 * b.0 + a.1 * b.1
}

/// Angle at `mid`, between the edges to `prev` and `next`, in `[0, pi]`.
fn corner_angle(prev: Point, mid: Point, next: Point) -> f64 {
    let to_prev = sub(as_f64(prev), as_f64(mid));
    let to_next = sub(as_f64(next), as_f64(mid));
    let denom = length(to_prev) * length(to_next);
    if denom <= 1e-9 {
        return 0.0;
    }
    (dot(to_prev, to_next) / denom).clamp(-1.0, 1.0).acos()
}

fn shift_toward(point: Point, target: Point, distance: f64) -> Point {
    let v = sub(as_f64(target), as_f64(point));
    let len = length(v);
    if len <= 1e-9 {
        return point;
    }
    let fraction = distance / len;
    Point::new(
        (point.x as f64 + v.0 * fraction).round() as i64,
        (point.y as f64 + v.1 * fraction).round() as i64,
    )
}

/// Runs one smoothing pass over `points`, returning the (possibly
/// repositioned) point at every original index plus the set of indices
/// marked for removal. Kept separate from [`smooth_points`] so callers that
/// need to carry index-exact correspondence (the tree transformer, which
/// must drop the right `ExtruderMove` node rather than match by value) never
/// have to re-derive it from the filtered output.
pub fn smooth_indices(
    points: &[Point],
    closed: bool,
    max_resolution: f64,
    fluid_angle: f64,
) -> (Vec<Point>, HashSet<usize>) {
    let n = points.len();
    if n < 4 {
        return (points.to_vec(), HashSet::new());
    }

    let min_remaining = if closed { 3 } else { 2 };
    let allowed = allowed_deviation(max_resolution);
    let shift = smooth_distance(max_resolution);

    let mut positions: Vec<Point> = points.to_vec();
    let mut shifted: Vec<Option<Point>> = vec![None; n];
    let mut removed: HashSet<usize> = HashSet::new();

    // An index-addressable buffer, windowed four at a time; closed paths
    // wrap by appending the first three indices back onto the sequence so
    // `tuple_windows` produces exactly `n` (rather than `n - 3`) windows.
    let index_sequence: Vec<usize> = if closed {
        (0..n).chain(0..3.min(n)).collect()
    } else {
        (0..n).collect()
    };

    for (ia, ib, ic, id) in index_sequence.into_iter().tuple_windows() {
        let (a, b, c, d) = (points[ia], points[ib], points[ic], points[id]);
        let bc_len = length(sub(as_f64(c), as_f64(b)));
        if bc_len > max_resolution {
            continue;
        }

        let angle_with_c = corner_angle(a, b, c);
        let angle_skipping_c = corner_angle(a, b, d);
        if (angle_with_c - angle_skipping_c).abs() < fluid_angle {
            let ab_len = length(sub(as_f64(b), as_f64(a)));
            if ab_len > allowed {
                shifted[ib] = Some(shift_toward(b, a, shift));
            } else if (n - removed.len()) > min_remaining {
                removed.insert(ib);
            }
        }

        let angle_with_b = corner_angle(d, c, b);
        let angle_skipping_b = corner_angle(d, c, a);
        if (angle_with_b - angle_skipping_b).abs() < fluid_angle {
            let cd_len = length(sub(as_f64(d), as_f64(c)));
            if cd_len > allowed {
                shifted[ic] = Some(shift_toward(c, d, shift));
            } else if (n - removed.len()) > min_remaining {
                removed.insert(ic);
            }
        }
    }

    for (idx, pos) in shifted.into_iter().enumerate() {
        if let Some(p) = pos {
            positions[idx] = p;
        }
    }

    (positions, removed)
}

/// Runs one smoothing pass over `points` and returns the filtered,
/// repositioned point list. `closed` windows wrap around; open paths never
/// synthesize a wraparound window.
pub fn smooth_points(points: &[Point], closed: bool, max_resolution: f64, fluid_angle: f64) -> Vec<Point> {
    let (positions, removed) = smooth_indices(points, closed, max_resolution, fluid_angle);
    positions
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| !removed.contains(idx))
        .map(|(_, p)| p)
        .collect()
}

fn is_closed_feature(kind: FeatureKind) -> bool {
    matches!(
        kind,
        FeatureKind::Wall { .. } | FeatureKind::Skin | FeatureKind::Infill | FeatureKind::Support
    )
}

/// A transformer keyed to `ContinuousExtruderMoveSequence`: smooths the xy
/// positions of a sequence's extrusion moves in place, dropping the moves
/// the pass marked for removal.
pub struct SmoothingTransformer {
    pub max_resolution: f64,
    pub fluid_angle: f64,
}

impl Transformer for SmoothingTransformer {
    fn kind(&self) -> OperationKind {
        OperationKind::ContinuousExtruderMoveSequence
    }

    fn process(&mut self, tree: &mut OperationTree, node: NodeId) {
        let moves = tree.children(node).to_vec();
        if moves.len() < 4 {
            return;
        }

        let mut xy = Vec::with_capacity(moves.len());
        for &m in &moves {
            match tree.data(m) {
                PrintOperation::ExtruderMove(data) => match data.kind {
                    MoveKind::ExtrusionMove { .. } => match data.position {
                        MovePosition::Absolute(p) => xy.push(p.xy),
                        MovePosition::RelativeToLayerZ { xy: p, .. } => xy.push(p),
                    },
                    MoveKind::TravelMove => return,
                },
                _ => return,
            }
        }

        let closed = tree
            .nearest_feature(node)
            .map(|f| is_closed_feature(f.kind))
            .unwrap_or(false);

        let (positions, removed) =
            smooth_indices(&xy, closed, self.max_resolution, self.fluid_angle);

        for (idx, &m) in moves.iter().enumerate() {
            if removed.contains(&idx) {
                continue;
            }
            if let PrintOperation::ExtruderMove(data) = tree.data_mut(m) {
                match &mut data.position {
                    MovePosition::Absolute(p) => p.xy = positions[idx],
                    MovePosition::RelativeToLayerZ { xy, .. } => *xy = positions[idx],
                }
            }
        }
        for (idx, &m) in moves.iter().enumerate() {
            if removed.contains(&idx) {
                let _ = tree.remove_child(node, m);
            }
        }
    }
}
