//! The bead-placement engine ("skeletal trapezoidation").
//!
//! A real skeletal trapezoidation builds the medial axis of the outline and
//! walks its cells, asking the beading strategy for widths at every cell
//! boundary. No crate in reach of this workspace builds straight skeletons,
//! so this engine approximates the same contract with repeated inward
//! offsets: estimate the locally available thickness at the current
//! contour via binary-searched erosion, place one bead, offset inward by
//! its width, and repeat. Far from the medial axis this reduces to
//! nominal-width beads (matching a real trapezoidation's behavior away
//! from constrictions); near it, the beading strategy's adaptive
//! redistribution takes over so widths taper rather than clip.

use crate::beading::BeadingStrategy;
use crate::geometry::{offset, shape_area, ExtrusionLine, Junction, Point, Shape};

const EROSION_SEARCH_ITERATIONS: u32 = 24;

/// Binary-searches the largest inward offset that leaves `shape` with
/// positive area, and doubles it: for a locally constant-width slab this
/// recovers the slab's thickness, since insetting each side by half the
/// width is exactly what erases it.
pub fn estimate_local_thickness(shape: &Shape) -> f64 {
    if shape.is_empty() || shape_area(shape) <= 0.0 {
        return 0.0;
    }

    let mut hi = bounding_radius(shape);
    if hi <= 0.0 {
        return 0.0;
    }
    let mut lo = 0.0;

    for _ in 0..EROSION_SEARCH_ITERATIONS {
        let mid = (lo + hi) / 2.0;
        let eroded = offset(shape, -mid);
        if shape_area(&eroded) > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    2.0 * lo
}

fn bounding_radius(shape: &Shape) -> f64 {
    let mut min_x = i64::MAX;
    let mut max_x = i64::MIN;
    let mut min_y = i64::MAX;
    let mut max_y = i64::MIN;
    for poly in shape {
        for p in poly {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
    }
    if min_x > max_x {
        return 0.0;
    }
    let width = (max_x - min_x) as f64;
    let height = (max_y - min_y) as f64;
    width.max(height) / 2.0
}

/// One placed bead: its centerline polygons plus the width used to place it.
pub struct PlacedBead {
    pub inset_index: usize,
    pub width: f64,
    pub centerlines: Shape,
}

/// Walks inward from `prepared_outline`, placing up to `inset_count` beads,
/// and returns the placed beads plus whatever contour remains once no more
/// beads fit (or the request was exhausted).
///
/// Nominal widths are used as long as the remaining thickness comfortably
/// exceeds twice the nominal bead width;
/// once within that range of the medial axis, the beading strategy's own
/// `compute` redistributes the leftover so the final bead(s) taper smoothly
/// rather than overrun the outline.
pub fn generate_beads(
    prepared_outline: &Shape,
    strategy: &dyn BeadingStrategy,
    bead_width_0: f64,
    bead_width_x: f64,
    inset_count: usize,
) -> (Vec<PlacedBead>, Shape) {
    let mut beads = Vec::new();
    let mut current = prepared_outline.clone();
    let mut residual = prepared_outline.clone();

    for level in 0..inset_count {
        if current.is_empty() || shape_area(&current) <= 0.0 {
            break;
        }

        let nominal = if level == 0 { bead_width_0 } else { bead_width_x };
        let thickness = estimate_local_thickness(&current);
        if thickness < nominal.min(bead_width_x) * 0.1 {
            break;
        }

        let near_medial_axis = thickness <= nominal * 2.0;
        let width = if near_medial_axis {
            let count = strategy.optimal_bead_count(thickness).max(1);
            let beading = strategy.compute(thickness, count);
            match beading.bead_widths.first() {
                Some(&w) if w > 0.0 => w,
                _ => break,
            }
        } else {
            nominal.min(thickness)
        };

        let centerlines = offset(&current, -(width / 2.0));
        if centerlines.is_empty() {
            break;
        }

        // The area still open for infill sits at this bead's own centerline,
        // not past its far edge: the next bead (if any) starts from the far
        // edge, but a wall's toolpath already occupies the infill boundary
        // out to its own center, so the residual reported to callers tracks
        // the centerline of the last bead actually placed.
        residual = centerlines.clone();

        beads.push(PlacedBead {
            inset_index: level,
            width,
            centerlines,
        });

        current = offset(&current, -width);
    }

    (beads, residual)
}

/// Converts a placed bead's centerline polygons into closed extrusion lines,
/// one per polygon, with a uniform width at every junction.
pub fn bead_to_extrusion_lines(bead: &PlacedBead) -> Vec<ExtrusionLine> {
    let width_int = bead.width.round() as i64;
    bead.centerlines
        .iter()
        .filter(|poly| poly.len() >= 3)
        .map(|poly| {
            let junctions: Vec<Junction> = poly
                .iter()
                .map(|p| Junction::new(*p, width_int))
                .collect();
            ExtrusionLine::new(bead.inset_index, junctions)
        })
        .collect()
}

/// Converts the residual inner contour into zero-width contour junctions,
/// one `ExtrusionLine` per polygon.
pub fn contour_to_extrusion_lines(contour: &Shape, inset_index: usize) -> Vec<ExtrusionLine> {
    contour
        .iter()
        .filter(|poly| poly.len() >= 3)
        .map(|poly| {
            let junctions: Vec<Junction> = poly
                .iter()
                .map(|p: &Point| Junction::new(*p, 0))
                .collect();
            ExtrusionLine::new(inset_index, junctions)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beading::{BeadingStrategyParams, DistributedBeadingStrategy};
    use crate::geometry::Point;
    use approx::assert_abs_diff_eq;

    fn square(side: i64) -> Vec<Point> {
        vec![
            Point::new(0, 0),
            Point::new(side, 0),
            Point::new(side, side),
            Point::new(0, side),
        ]
    }

    fn params() -> BeadingStrategyParams {
        BeadingStrategyParams {
            bead_width_0: 400.0,
            bead_width_x: 400.0,
            transition_length: 800.0,
            transitioning_angle: 0.5,
            print_thin_walls: true,
            min_bead_width: 100.0,
            min_feature_size: 200.0,
            max_bead_count: 10,
        }
    }

    #[test]
    fn thickness_of_a_ten_mm_square_is_close_to_ten_mm() {
        let shape = vec![square(10_000)];
        let thickness = estimate_local_thickness(&shape);
        assert_abs_diff_eq!(thickness, 10_000.0, epsilon = 50.0);
    }

    #[test]
    fn single_wall_on_a_thick_square_uses_nominal_width() {
        let outline = vec![square(10_000)];
        let strategy = DistributedBeadingStrategy::new(params());
        let (beads, _contour) = generate_beads(&outline, &strategy, 400.0, 400.0, 1);
        assert_eq!(beads.len(), 1);
        assert_abs_diff_eq!(beads[0].width, 400.0, epsilon = 1.0);
    }

    #[test]
    fn zero_insets_places_no_beads_and_keeps_the_outline() {
        let outline = vec![square(10_000)];
        let strategy = DistributedBeadingStrategy::new(params());
        let (beads, contour) = generate_beads(&outline, &strategy, 400.0, 400.0, 0);
        assert!(beads.is_empty());
        assert_abs_diff_eq!(shape_area(&contour), shape_area(&outline), epsilon = 1.0);
    }

    #[test]
    fn empty_outline_places_no_beads() {
        let outline: Shape = Vec::new();
        let strategy = DistributedBeadingStrategy::new(params());
        let (beads, contour) = generate_beads(&outline, &strategy, 400.0, 400.0, 3);
        assert!(beads.is_empty());
        assert!(contour.is_empty());
    }
}
