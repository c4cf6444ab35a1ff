//! Integer-micron 2D geometry primitives.
//!
//! The boolean/offset/simplify operations are delegated to `clipper2-rust`,
//! which already works in 64-bit integer coordinates; the types here add the
//! domain semantics (junction widths, inset indices) that a generic
//! geometry crate has no reason to know about.

use clipper2_rust::core::{area as clipper_area, Path64, Paths64, Point64};
use clipper2_rust::engine::ClipType;
use clipper2_rust::offset::{EndType, JoinType};
use clipper2_rust::{boolean_op_64, inflate_paths_64, ramer_douglas_peucker, FillRule};
use serde::{Deserialize, Serialize};

/// An integer-micron 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Point { x, y }
    }

    pub fn distance_squared(&self, other: &Point) -> i64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.distance_squared(other) as f64).sqrt()
    }
}

impl From<Point64> for Point {
    fn from(p: Point64) -> Self {
        Point::new(p.x, p.y)
    }
}

impl From<Point> for Point64 {
    fn from(p: Point) -> Self {
        Point64::new(p.x, p.y)
    }
}

/// An ordered, implicitly-closed sequence of points.
pub type Polygon = Vec<Point>;

/// A set of polygons, interpreted by the even-odd rule.
pub type Shape = Vec<Polygon>;

pub(crate) fn polygon_to_path(poly: &Polygon) -> Path64 {
    poly.iter().map(|p| Point64::from(*p)).collect()
}

pub(crate) fn path_to_polygon(path: &Path64) -> Polygon {
    path.iter().map(|p| Point::from(*p)).collect()
}

pub(crate) fn shape_to_paths(shape: &Shape) -> Paths64 {
    shape.iter().map(polygon_to_path).collect()
}

pub(crate) fn paths_to_shape(paths: &Paths64) -> Shape {
    paths.iter().map(path_to_polygon).collect()
}

/// Signed area of a closed polygon, in square micrometers.
pub fn polygon_area(poly: &Polygon) -> f64 {
    clipper_area(&polygon_to_path(poly))
}

/// Sum of the unsigned areas of every polygon in the shape.
pub fn shape_area(shape: &Shape) -> f64 {
    shape.iter().map(|p| polygon_area(p).abs()).sum()
}

/// Offsets every polygon in `shape` outward (positive `delta`) or inward
/// (negative `delta`) by `delta` micrometers, treating each polygon as a
/// closed contour.
pub fn offset(shape: &Shape, delta: f64) -> Shape {
    if shape.is_empty() {
        return Shape::new();
    }
    let paths = shape_to_paths(shape);
    let result = inflate_paths_64(
        &paths,
        delta,
        JoinType::Miter,
        EndType::Polygon,
        2.0,
        0.0,
    );
    paths_to_shape(&result)
}

/// Morphological open: offset inward then outward by `epsilon`, erasing
/// features narrower than `epsilon`.
pub fn morphological_open(shape: &Shape, epsilon: f64) -> Shape {
    let eroded = offset(shape, -epsilon);
    if eroded.is_empty() {
        return Shape::new();
    }
    offset(&eroded, epsilon)
}

/// Even-odd union of `a` and `b`. Passing an empty `b` normalizes winding.
pub fn union(a: &Shape, b: &Shape) -> Shape {
    let result = boolean_op_64(
        ClipType::Union,
        FillRule::EvenOdd,
        &shape_to_paths(a),
        &shape_to_paths(b),
    );
    paths_to_shape(&result)
}

/// Self-intersection repair: union a shape with itself, which forces
/// Clipper's sweep-line engine to resolve any self-intersections.
pub fn repair_self_intersections(shape: &Shape) -> Shape {
    union(shape, &Shape::new())
}

/// Removes vertices whose segment length is below `tolerance` while keeping
/// the simplified polygon within `allowed_distance` of the original.
pub fn simplify_polygon(poly: &Polygon, allowed_distance: f64) -> Polygon {
    let path = polygon_to_path(poly);
    let simplified = ramer_douglas_peucker(&path, allowed_distance);
    path_to_polygon(&simplified)
}

pub fn simplify_shape(shape: &Shape, allowed_distance: f64) -> Shape {
    shape
        .iter()
        .map(|poly| simplify_polygon(poly, allowed_distance))
        .collect()
}

/// Drops every polygon in `shape` whose unsigned area is below `min_area`.
pub fn drop_small_areas(shape: &Shape, min_area: f64) -> Shape {
    shape
        .iter()
        .filter(|poly| polygon_area(poly).abs() >= min_area)
        .cloned()
        .collect()
}

/// A vertex of a variable-width line: a position plus a local extrusion
/// width. `w == 0` marks a contour (non-extruding) junction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Junction {
    pub p: Point,
    pub w: i64,
}

impl Junction {
    pub fn new(p: Point, w: i64) -> Self {
        Junction { p, w }
    }

    pub fn is_contour(&self) -> bool {
        self.w == 0
    }
}

/// A non-empty ordered sequence of junctions, tagged with its inset index
/// (distance from the outer wall, counted in bead counts; 0 is outermost).
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrusionLine {
    pub inset_index: usize,
    pub junctions: Vec<Junction>,
}

impl ExtrusionLine {
    pub fn new(inset_index: usize, junctions: Vec<Junction>) -> Self {
        debug_assert!(!junctions.is_empty());
        ExtrusionLine {
            inset_index,
            junctions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.junctions.is_empty()
    }

    pub fn start(&self) -> Option<&Junction> {
        self.junctions.first()
    }

    pub fn end(&self) -> Option<&Junction> {
        self.junctions.last()
    }

    /// True for genuine extrusion lines: classification looks only at the
    /// first junction.
    pub fn is_extrusion_path(&self) -> bool {
        match self.junctions.first() {
            Some(j) => !j.is_contour(),
            None => true,
        }
    }
}

/// The set of extrusion lines belonging to a single inset level.
pub type VariableWidthLines = Vec<ExtrusionLine>;

/// Lines grouped per inset level, outermost first.
pub type VariableWidthPaths = Vec<VariableWidthLines>;

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: i64) -> Polygon {
        vec![
            Point::new(0, 0),
            Point::new(side, 0),
            Point::new(side, side),
            Point::new(0, side),
        ]
    }

    #[test]
    fn area_of_unit_square_is_positive() {
        let poly = square(1000);
        assert!(polygon_area(&poly).abs() > 0.0);
    }

    #[test]
    fn offset_inward_shrinks_area() {
        let shape = vec![square(10_000)];
        let shrunk = offset(&shape, -1_000.0);
        assert!(shape_area(&shrunk) < shape_area(&shape));
    }

    #[test]
    fn drop_small_areas_removes_slivers() {
        let shape = vec![square(10_000), square(2)];
        let kept = drop_small_areas(&shape, 100.0);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn junction_contour_classification() {
        let j = Junction::new(Point::new(0, 0), 0);
        assert!(j.is_contour());
        let j2 = Junction::new(Point::new(0, 0), 400);
        assert!(!j2.is_contour());
    }
}
