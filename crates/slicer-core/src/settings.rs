//! Configuration surface recognized by the core. `serde` derives let a
//! driver load this straight out of the layer-description file's settings
//! block.

use serde::{Deserialize, Serialize};

use crate::beading::BeadingStrategyType;

fn default_beading_strategy() -> BeadingStrategyType {
    BeadingStrategyType::Distributed
}

fn default_true() -> bool {
    true
}

fn default_min_feature_size() -> f64 {
    200.0
}

fn default_min_bead_width() -> f64 {
    100.0
}

fn default_max_resolution() -> f64 {
    500.0
}

fn default_fluid_angle() -> f64 {
    0.2
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreSettings {
    pub beading_strategy_type: BeadingStrategyType,
    pub fill_outline_gaps: bool,
    pub min_feature_size: f64,
    pub min_bead_width: f64,
    pub max_resolution: f64,
    pub fluid_angle: f64,
    /// Ratio passed to the back-pressure compensation formula; `0.0`
    /// disables it.
    pub back_pressure_compensation: f64,
}

impl Default for CoreSettings {
    fn default() -> Self {
        CoreSettings {
            beading_strategy_type: default_beading_strategy(),
            fill_outline_gaps: default_true(),
            min_feature_size: default_min_feature_size(),
            min_bead_width: default_min_bead_width(),
            max_resolution: default_max_resolution(),
            fluid_angle: default_fluid_angle(),
            back_pressure_compensation: 0.0,
        }
    }
}
