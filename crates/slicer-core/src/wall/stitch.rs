//! Contour stitcher: joins the zero-width polylines the trapezoidation
//! engine emits into closed polygons, tolerating the small end-point
//! rounding gaps that offset/boolean operations leave behind.

use ordered_float::OrderedFloat;

use crate::geometry::{ExtrusionLine, Junction, Point, Polygon};
use indexmap::IndexMap;

type BucketKey = (i64, i64);

/// A reference to one endpoint of one input line, stored in a spatial index.
#[derive(Clone, Copy)]
struct Endpoint {
    line: usize,
    is_start: bool,
}

struct SpatialIndex {
    bucket_size: i64,
    buckets: IndexMap<BucketKey, Vec<Endpoint>>,
}

impl SpatialIndex {
    fn new(bucket_size: i64) -> Self {
        SpatialIndex {
            bucket_size: bucket_size.max(1),
            buckets: IndexMap::new(),
        }
    }

    fn key_for(&self, p: &Point) -> BucketKey {
        (
            p.x.div_euclid(self.bucket_size),
            p.y.div_euclid(self.bucket_size),
        )
    }

    fn insert(&mut self, p: &Point, endpoint: Endpoint) {
        let key = self.key_for(p);
        self.buckets.entry(key).or_default().push(endpoint);
    }

    /// Candidates in the point's own bucket and its 8 neighbors, in a fixed
    /// scan order, so that equal-distance ties resolve deterministically.
    fn candidates(&self, p: &Point) -> Vec<Endpoint> {
        let (bx, by) = self.key_for(p);
        let mut out = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(bucket) = self.buckets.get(&(bx + dx, by + dy)) {
                    out.extend(bucket.iter().copied());
                }
            }
        }
        out
    }
}

fn endpoint_position(lines: &[ExtrusionLine], e: Endpoint) -> Point {
    let junctions = &lines[e.line].junctions;
    if e.is_start {
        junctions.first().expect("non-empty line").p
    } else {
        junctions.last().expect("non-empty line").p
    }
}

/// Joins `lines` (each a non-empty, zero-width polyline) into closed
/// polygons via a search-and-append loop. Every input junction appears in
/// exactly one output polygon.
pub fn stitch(lines: &[ExtrusionLine], stitch_distance: f64) -> Vec<Polygon> {
    if lines.is_empty() {
        return Vec::new();
    }

    let bucket_size = stitch_distance.round() as i64;
    let stitch_distance_sq = stitch_distance * stitch_distance;

    let mut start_index = SpatialIndex::new(bucket_size);
    let mut end_index = SpatialIndex::new(bucket_size);
    for (i, line) in lines.iter().enumerate() {
        if line.junctions.is_empty() {
            continue;
        }
        start_index.insert(
            &line.junctions.first().unwrap().p,
            Endpoint {
                line: i,
                is_start: true,
            },
        );
        end_index.insert(
            &line.junctions.last().unwrap().p,
            Endpoint {
                line: i,
                is_start: false,
            },
        );
    }

    let mut processed = vec![false; lines.len()];
    let mut output: Vec<Polygon> = Vec::new();

    for i in 0..lines.len() {
        if processed[i] || lines[i].junctions.is_empty() {
            continue;
        }

        let mut polygon: Vec<Junction> = lines[i].junctions.clone();
        processed[i] = true;
        let mut current_position = polygon.last().unwrap().p;

        loop {
            let best = start_index
                .candidates(&current_position)
                .into_iter()
                .chain(end_index.candidates(&current_position))
                .filter_map(|candidate| {
                    let d = endpoint_position(lines, candidate).distance_squared(&current_position) as f64;
                    (d <= stitch_distance_sq).then_some((candidate, OrderedFloat(d)))
                })
                .min_by_key(|&(_, d)| d);

            let Some((candidate, _)) = best else {
                break;
            };

            if processed[candidate.line] {
                break;
            }

            let matched = &lines[candidate.line];
            if candidate.is_start {
                polygon.extend(matched.junctions.iter().copied());
            } else {
                polygon.extend(matched.junctions.iter().rev().copied());
            }
            processed[candidate.line] = true;
            current_position = polygon.last().unwrap().p;
        }

        output.push(polygon.into_iter().map(|j| j.p).collect());
    }

    output
}
