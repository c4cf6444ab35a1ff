use super::{PlanExporter, Position3};
use crate::error::ExportError;
use crate::feature_type::FeatureType;

/// Fans every call out to a registered list of exporters, in registration
/// order. Each child is independently best-effort: nothing here inspects
/// whether a child "succeeded" mid-call, since the `PlanExporter` contract
/// has no failure return there — a child that hits I/O trouble reports it
/// out-of-band via `take_error` instead of aborting the fan-out for its
/// siblings.
#[derive(Default)]
pub struct MultiExporter {
    children: Vec<Box<dyn PlanExporter>>,
}

impl MultiExporter {
    pub fn new() -> Self {
        MultiExporter {
            children: Vec::new(),
        }
    }

    pub fn register(&mut self, exporter: Box<dyn PlanExporter>) {
        self.children.push(exporter);
    }
}

impl PlanExporter for MultiExporter {
    fn write_layer_start(&mut self, layer_index: usize, start_position: Position3) {
        for child in &mut self.children {
            child.write_layer_start(layer_index, start_position);
        }
    }

    fn write_extrusion(
        &mut self,
        point: Position3,
        speed: f64,
        mm3_per_mm: f64,
        line_width: f64,
        line_thickness: f64,
        feature_type: FeatureType,
        update_extrusion_offset: bool,
    ) {
        for child in &mut self.children {
            child.write_extrusion(
                point,
                speed,
                mm3_per_mm,
                line_width,
                line_thickness,
                feature_type,
                update_extrusion_offset,
            );
        }
    }

    fn write_travel(&mut self, point: Position3, speed: f64, feature_type: FeatureType) {
        for child in &mut self.children {
            child.write_travel(point, speed, feature_type);
        }
    }

    fn write_layer_end(&mut self, layer_index: usize, z: f64, layer_thickness: f64) {
        for child in &mut self.children {
            child.write_layer_end(layer_index, z, layer_thickness);
        }
    }

    /// Drains every child's error so none of them gets stuck reporting a
    /// stale failure next layer; only the first one is handed back, the
    /// rest are logged so they aren't silently dropped.
    fn take_error(&mut self) -> Option<ExportError> {
        let mut first = None;
        for child in &mut self.children {
            if let Some(err) = child.take_error() {
                if first.is_none() {
                    first = Some(err);
                } else {
                    log::warn!("additional exporter error: {err}");
                }
            }
        }
        first
    }
}
