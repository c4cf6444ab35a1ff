//! The on-disk input format for the demo driver: a JSON document naming a
//! list of layers plus the core's settings. Mesh slicing and full
//! configuration-file parsing stay out of scope for the core itself, so
//! this format is intentionally the simplest thing that can feed the
//! core's public surface — a per-layer outline, not a full slicer
//! settings file.

use std::path::Path;

use serde::Deserialize;
use slicer_core::CoreSettings;

fn default_inset_count() -> usize {
    3
}

fn default_bead_width() -> f64 {
    400.0
}

fn default_wall_speed() -> f64 {
    60.0
}

fn default_travel_speed() -> f64 {
    150.0
}

fn default_layer_time_target() -> f64 {
    5.0
}

fn default_retraction_speed() -> f64 {
    40.0
}

fn default_retraction_distance() -> f64 {
    1.0
}

/// One layer's worth of wall-generator input plus the feature/extruder
/// knobs the driver needs to populate a `LayerPlan`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayerInput {
    pub z: f64,
    pub thickness: f64,
    /// Even-odd polygon set, each polygon an array of `[x, y]` micron pairs.
    pub outline: Vec<Vec<[i64; 2]>>,
    pub inset_count: usize,
    pub bead_width_0: f64,
    pub bead_width_x: f64,
    pub wall_speed: f64,
    pub travel_speed: f64,
    pub layer_time_target: f64,
    pub retraction_speed: f64,
    pub retraction_distance: f64,
}

impl Default for LayerInput {
    fn default() -> Self {
        LayerInput {
            z: 0.0,
            thickness: 200.0,
            outline: Vec::new(),
            inset_count: default_inset_count(),
            bead_width_0: default_bead_width(),
            bead_width_x: default_bead_width(),
            wall_speed: default_wall_speed(),
            travel_speed: default_travel_speed(),
            layer_time_target: default_layer_time_target(),
            retraction_speed: default_retraction_speed(),
            retraction_distance: default_retraction_distance(),
        }
    }
}

/// The full job: every layer plus the core settings that govern wall
/// generation and the smoothing/back-pressure transformer passes.
#[derive(Debug, Clone, Deserialize)]
pub struct PrintJob {
    pub layers: Vec<LayerInput>,
    #[serde(default)]
    pub settings: CoreSettings,
}

impl PrintJob {
    pub fn load(path: &Path) -> Result<PrintJob, LoadError> {
        let text = std::fs::read_to_string(path)?;
        let job = serde_json::from_str(&text)?;
        Ok(job)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("could not read input file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse input file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_minimal_layer_document_parses_with_defaults() {
        let json = r#"{
            "layers": [
                { "z": 0.2, "thickness": 0.2, "outline": [[[0,0],[10000,0],[10000,10000],[0,10000]]] }
            ]
        }"#;
        let job: PrintJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.layers.len(), 1);
        assert_eq!(job.layers[0].inset_count, default_inset_count());
        assert!((job.layers[0].bead_width_0 - default_bead_width()).abs() < 1e-9);
    }
}
