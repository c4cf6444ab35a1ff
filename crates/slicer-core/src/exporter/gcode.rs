use std::io::{self, Write};

use nalgebra::Vector3;

use super::{PlanExporter, Position3};
use crate::error::ExportError;
use crate::feature_type::FeatureType;

fn as_mm(position: Position3) -> Vector3<f64> {
    Vector3::new(position.xy.x as f64 / 1000.0, position.xy.y as f64 / 1000.0, position.z)
}

/// Formats machine instructions for an FDM printer. Grounded on the
/// teacher's `ExtrusionPath::write_gcode`, which tracked total extruded
/// filament length and wrote raw `G1 X.. Y.. E..` lines; generalized here to
/// travel moves (`G0`) and to the exporter's explicit speed/feature inputs
/// instead of a fixed per-path cross-section.
pub struct GCodeExporter<W: Write> {
    writer: W,
    extruded_volume_mm3: f64,
    last_position: Option<Position3>,
    last_feature: Option<FeatureType>,
    error: Option<io::Error>,
}

impl<W: Write> GCodeExporter<W> {
    pub fn new(writer: W) -> Self {
        GCodeExporter {
            writer,
            extruded_volume_mm3: 0.0,
            last_position: None,
            last_feature: None,
            error: None,
        }
    }

    /// Keeps the first I/O failure seen; later calls keep trying (matching
    /// the exporter stage's best-effort contract) but don't overwrite it.
    fn record(&mut self, result: io::Result<()>) {
        if let Err(err) = result {
            if self.error.is_none() {
                self.error = Some(err);
            }
        }
    }

    fn note_feature(&mut self, feature_type: FeatureType) -> io::Result<()> {
        if self.last_feature != Some(feature_type) {
            writeln!(self.writer, "; feature {feature_type:?}")?;
            self.last_feature = Some(feature_type);
        }
        Ok(())
    }

    /// Distance from the last emitted position to `point`, in millimeters,
    /// via `nalgebra`'s `Vector3` norm (absolute machine space, not the
    /// integer-micron plane the geometry side works in).
    fn travel_distance_mm(&self, point: Position3) -> f64 {
        match self.last_position {
            Some(last) => (as_mm(point) - as_mm(last)).norm(),
            None => 0.0,
        }
    }
}

impl<W: Write> PlanExporter for GCodeExporter<W> {
    fn write_layer_start(&mut self, layer_index: usize, start_position: Position3) {
        self.record(writeln!(self.writer, "; layer {layer_index}"));
        let result = writeln!(
            self.writer,
            "G0 X{:.3} Y{:.3} Z{:.3}",
            start_position.xy.x as f64 / 1000.0,
            start_position.xy.y as f64 / 1000.0,
            start_position.z
        );
        self.record(result);
        self.last_position = Some(start_position);
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
        let feature_result = self.note_feature(feature_type);
        self.record(feature_result);
        let _ = (line_width, line_thickness);
        if update_extrusion_offset {
            self.extruded_volume_mm3 += self.travel_distance_mm(point) * mm3_per_mm;
        }
        let result = writeln!(
            self.writer,
            "G1 X{:.3} Y{:.3} Z{:.3} E{:.5} F{:.0}",
            point.xy.x as f64 / 1000.0,
            point.xy.y as f64 / 1000.0,
            point.z,
            self.extruded_volume_mm3,
            speed * 60.0,
        );
        self.record(result);
        self.last_position = Some(point);
    }

    fn write_travel(&mut self, point: Position3, speed: f64, feature_type: FeatureType) {
        let feature_result = self.note_feature(feature_type);
        self.record(feature_result);
        let result = writeln!(
            self.writer,
            "G0 X{:.3} Y{:.3} Z{:.3} F{:.0}",
            point.xy.x as f64 / 1000.0,
            point.xy.y as f64 / 1000.0,
            point.z,
            speed * 60.0,
        );
        self.record(result);
        self.last_position = Some(point);
    }

    fn write_layer_end(&mut self, layer_index: usize, z: f64, layer_thickness: f64) {
        let result = writeln!(
            self.writer,
            "; end layer {layer_index} z={z:.3} thickness={layer_thickness:.3}"
        );
        self.record(result);
    }

    fn take_error(&mut self) -> Option<ExportError> {
        self.error.take().map(ExportError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    /// A writer that fails every call, to exercise the error-reporting
    /// path without touching the filesystem.
    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn position(x: i64, y: i64, z: f64) -> Position3 {
        Position3 {
            xy: Point::new(x, y),
            z,
        }
    }

    #[test]
    fn writes_layer_start_and_extrusion_lines() {
        let mut exporter = GCodeExporter::new(Vec::new());
        exporter.write_layer_start(0, position(0, 0, 0.2));
        exporter.write_extrusion(position(1000, 0, 0.2), 30.0, 0.05, 400.0, 200.0, FeatureType::Wall, true);
        assert!(exporter.take_error().is_none());

        let output = String::from_utf8(exporter.writer).unwrap();
        assert!(output.contains("G0 X0.000 Y0.000 Z0.200"));
        assert!(output.contains("G1 X1.000 Y0.000 Z0.200"));
    }

    #[test]
    fn a_write_failure_is_captured_and_reported_once() {
        let mut exporter = GCodeExporter::new(FailingWriter);
        exporter.write_layer_start(0, position(0, 0, 0.2));

        let err = exporter.take_error();
        assert!(matches!(err, Some(ExportError::Io(_))));
        assert!(exporter.take_error().is_none());
    }
}
