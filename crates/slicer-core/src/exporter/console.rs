use super::{PlanExporter, Position3};
use crate::feature_type::FeatureType;

/// Prints a human-readable trace of every call, for debugging and the
/// demo CLI. Logs per-layer progress at `info` and per-move detail at
/// `trace`.
#[derive(Default)]
pub struct ConsoleExporter;

impl ConsoleExporter {
    pub fn new() -> Self {
        ConsoleExporter
    }
}

impl PlanExporter for ConsoleExporter {
    fn write_layer_start(&mut self, layer_index: usize, start_position: Position3) {
        log::info!(
            "layer {layer_index} start at ({}, {}, {:.3})",
            start_position.xy.x,
            start_position.xy.y,
            start_position.z
        );
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
        log::trace!(
            "extrude {feature_type:?} to ({}, {}, {:.3}) speed={speed:.1} width={line_width:.1} \
             thickness={line_thickness:.3} mm3_per_mm={mm3_per_mm:.4} offset_update={update_extrusion_offset}",
            point.xy.x,
            point.xy.y,
            point.z,
        );
    }

    fn write_travel(&mut self, point: Position3, speed: f64, feature_type: FeatureType) {
        log::trace!(
            "travel {feature_type:?} to ({}, {}, {:.3}) speed={speed:.1}",
            point.xy.x,
            point.xy.y,
            point.z,
        );
    }

    fn write_layer_end(&mut self, layer_index: usize, z: f64, layer_thickness: f64) {
        log::info!("layer {layer_index} end at z={z:.3} thickness={layer_thickness:.3}");
    }
}
