//! Plan Exporter: the pluggable sink interface the tree writes itself
//! into, generalized to the four calls the print-operation tree needs.

mod communication;
mod console;
mod gcode;
mod multi;

pub use communication::CommunicationExporter;
pub use console::ConsoleExporter;
pub use gcode::GCodeExporter;
pub use multi::MultiExporter;

use crate::error::ExportError;
use crate::feature_type::FeatureType;
use crate::geometry::Point;

/// A 3D machine position in micrometers (x, y) plus millimeters (z), matched
/// to the precision each axis actually needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position3 {
    pub xy: Point,
    pub z: f64,
}

/// Sink for a plan's emitted calls. Every method is infallible from the
/// tree's perspective: an exporter that hits an I/O error reports it to the
/// driver out-of-band rather than unwinding through `write`.
pub trait PlanExporter {
    fn write_layer_start(&mut self, layer_index: usize, start_position: Position3);

    #[allow(clippy::too_many_arguments)]
    fn write_extrusion(
        &mut self,
        point: Position3,
        speed: f64,
        mm3_per_mm: f64,
        line_width: f64,
        line_thickness: f64,
        feature_type: FeatureType,
        update_extrusion_offset: bool,
    );

    fn write_travel(&mut self, point: Position3, speed: f64, feature_type: FeatureType);

    fn write_layer_end(&mut self, layer_index: usize, z: f64, layer_thickness: f64);

    /// Returns and clears the first out-of-band error this exporter has
    /// accumulated, if any. Exporters with no failure channel of their own
    /// (console, host communication) never have one to report.
    fn take_error(&mut self) -> Option<ExportError> {
        None
    }
}
