//! Feature-extrusion parameter derivation: turns a move plus its owning
//! feature's path config into the quantities an exporter call needs.

use crate::feature_type::FeatureType;

const BACK_PRESSURE_EPSILON: f64 = 1e-3;

/// Shared configuration every `FeatureExtrusion` carries.
#[derive(Debug, Clone, Copy)]
pub struct PathConfig {
    pub feature_type: FeatureType,
    pub line_width: f64,
    pub flow_ratio: f64,
    pub layer_thickness: f64,
    pub z_offset: f64,
    pub extrusion_mm3_per_mm: f64,
}

/// The per-extruder-plan back-pressure compensation ratio `r`; `0.0`
/// disables compensation.
#[derive(Debug, Clone, Copy)]
pub struct BackPressureCompensation {
    pub ratio: f64,
}

impl BackPressureCompensation {
    /// `speed_back_pressure_factor = max(ε, 1 + (nominal_width/actual_width − 1) × r)`
    pub fn factor(&self, nominal_width: f64, actual_width: f64) -> f64 {
        if self.ratio == 0.0 || actual_width <= 0.0 {
            return 1.0;
        }
        let raw = 1.0 + (nominal_width / actual_width - 1.0) * self.ratio;
        raw.max(BACK_PRESSURE_EPSILON)
    }
}

/// Parameters ready to hand to a [`crate::exporter::PlanExporter`] call.
#[derive(Debug, Clone, Copy)]
pub struct EmittedExtrusion {
    pub velocity: f64,
    pub line_width: f64,
    pub line_thickness: f64,
    pub mm3_per_mm: f64,
}

/// Derives the quantities for one extrusion move.
///
/// - `speed` / `speed_factor` come from the owning `ExtruderPlan`/
///   `FeatureExtrusion`.
/// - `back_pressure` is looked up once per extruder plan and applied only
///   to genuine extrusion moves (never travel/bridge paths, which the
///   caller should route around this function entirely).
#[allow(clippy::too_many_arguments)]
pub fn derive_extrusion_params(
    config: &PathConfig,
    flow: f64,
    width_factor: f64,
    line_width_ratio: f64,
    speed: f64,
    speed_factor: f64,
    back_pressure: &BackPressureCompensation,
    move_z: f64,
) -> EmittedExtrusion {
    let line_width = flow * width_factor * config.line_width * config.flow_ratio * line_width_ratio;
    let back_pressure_factor = back_pressure.factor(config.line_width, line_width.max(1e-6));

    EmittedExtrusion {
        velocity: speed * speed_factor * back_pressure_factor,
        line_width: line_width.round(),
        line_thickness: config.layer_thickness + config.z_offset + move_z,
        mm3_per_mm: config.extrusion_mm3_per_mm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PathConfig {
        PathConfig {
            feature_type: FeatureType::Wall,
            line_width: 400.0,
            flow_ratio: 1.0,
            layer_thickness: 200.0,
            z_offset: 0.0,
            extrusion_mm3_per_mm: 0.032,
        }
    }

    #[test]
    fn disabled_compensation_is_a_no_op() {
        let comp = BackPressureCompensation { ratio: 0.0 };
        assert_eq!(comp.factor(400.0, 200.0), 1.0);
    }

    #[test]
    fn compensation_never_drops_below_epsilon() {
        let comp = BackPressureCompensation { ratio: 5.0 };
        // actual_width >> nominal -> factor would go deeply negative without clamping.
        let factor = comp.factor(100.0, 10_000.0);
        assert!(factor >= BACK_PRESSURE_EPSILON);
    }

    #[test]
    fn thinner_than_nominal_lines_speed_up() {
        let comp = BackPressureCompensation { ratio: 1.0 };
        let factor = comp.factor(400.0, 200.0);
        assert!(factor > 1.0);
    }

    #[test]
    fn derive_extrusion_params_scales_nominal_width() {
        let config = config();
        let comp = BackPressureCompensation { ratio: 0.0 };
        let out = derive_extrusion_params(&config, 1.0, 1.0, 1.0, 50.0, 1.0, &comp, 0.0);
        assert!((out.line_width - 400.0).abs() < 1e-6);
        assert!((out.line_thickness - 200.0).abs() < 1e-6);
        assert!((out.velocity - 50.0).abs() < 1e-6);
    }
}
