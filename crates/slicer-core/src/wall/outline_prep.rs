//! Outline preparation: the cleanup pass that makes a layer outline stable
//! input for the trapezoidation engine.

use crate::geometry::{
    drop_small_areas, morphological_open, repair_self_intersections, shape_area, simplify_shape,
    Point, Polygon, Shape,
};

pub const SMALLEST_SEGMENT: f64 = 50.0;
pub const ALLOWED_DISTANCE: f64 = 50.0;
pub const EPSILON_OFFSET: f64 = ALLOWED_DISTANCE / 2.0 - 1.0;

/// Distance constants derived from the nominal outer bead width.
#[derive(Debug, Clone, Copy)]
pub struct DerivedConstants {
    pub small_area_length: f64,
    pub transition_length: f64,
    pub transitioning_angle: f64,
}

impl DerivedConstants {
    pub fn new(bead_width_0: f64) -> Self {
        DerivedConstants {
            small_area_length: bead_width_0 / 2.0,
            transition_length: 2.0 * bead_width_0,
            transitioning_angle: 0.5,
        }
    }

    pub fn small_area(&self) -> f64 {
        self.small_area_length * self.small_area_length
    }
}

/// Merges consecutive vertices spaced closer together than
/// `smallest_segment`, ahead of the Ramer-Douglas-Peucker pass. A separate
/// decimation stage from the `allowed_distance` simplification below, per
/// spec step 1b; the RDP pass still bounds the final result to
/// `allowed_distance` of whatever this stage leaves behind.
fn collapse_short_segments(poly: &Polygon, smallest_segment: f64) -> Polygon {
    if poly.len() < 4 {
        return poly.clone();
    }

    let mut kept: Vec<Point> = Vec::with_capacity(poly.len());
    for &point in poly {
        match kept.last() {
            Some(&last) if last.distance(&point) < smallest_segment => continue,
            _ => kept.push(point),
        }
    }
    while kept.len() > 3 && kept[0].distance(kept.last().unwrap()) < smallest_segment {
        kept.pop();
    }

    if kept.len() < 3 {
        poly.clone()
    } else {
        kept
    }
}

/// Runs every step of outline preparation, in order. Never fails:
/// degenerate input collapses to an empty shape, which the caller treats
/// as "produce empty toolpaths", not an error.
pub fn prepare_outline(outline: &Shape, bead_width_0: f64) -> Shape {
    let constants = DerivedConstants::new(bead_width_0);

    let opened = morphological_open(outline, EPSILON_OFFSET);
    let decimated: Shape = opened
        .iter()
        .map(|poly| collapse_short_segments(poly, SMALLEST_SEGMENT))
        .collect();
    let simplified = simplify_shape(&decimated, ALLOWED_DISTANCE);
    let repaired = repair_self_intersections(&simplified);
    let cleaned: Shape = repaired
        .into_iter()
        .filter(|poly| poly.len() >= 3)
        .collect();

    drop_small_areas(&cleaned, constants.small_area())
}

/// A prepared outline with non-positive area yields an empty result
/// without attempting trapezoidation.
pub fn is_degenerate(prepared: &Shape) -> bool {
    prepared.is_empty() || shape_area(prepared) <= 0.0
}
