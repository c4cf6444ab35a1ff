//! The Variable-Width Wall Generator: outline polygons plus an inset count
//! in, variable-width tool-path lines and a residual inner contour out.

mod outline_prep;
mod stitch;
mod trapezoidation;

pub use outline_prep::{is_degenerate, DerivedConstants, ALLOWED_DISTANCE, EPSILON_OFFSET};
pub use trapezoidation::estimate_local_thickness;

use crate::beading::{make_beading_strategy, BeadingStrategyParams, BeadingStrategyType};
use crate::geometry::{union, Shape, VariableWidthPaths};

/// Settings the generator consults.
#[derive(Debug, Clone, Copy)]
pub struct WallGeneratorSettings {
    pub beading_strategy_type: BeadingStrategyType,
    pub fill_outline_gaps: bool,
    pub min_feature_size: f64,
    pub min_bead_width: f64,
}

impl Default for WallGeneratorSettings {
    fn default() -> Self {
        WallGeneratorSettings {
            beading_strategy_type: BeadingStrategyType::Distributed,
            fill_outline_gaps: true,
            min_feature_size: 200.0,
            min_bead_width: 100.0,
        }
    }
}

/// `generate(outline, bead_width_0, bead_width_x, inset_count, settings)`:
/// the public contract of the wall generator.
pub fn generate(
    outline: &Shape,
    bead_width_0: f64,
    bead_width_x: f64,
    inset_count: usize,
    settings: &WallGeneratorSettings,
) -> (VariableWidthPaths, Shape) {
    let prepared = outline_prep::prepare_outline(outline, bead_width_0);
    if outline_prep::is_degenerate(&prepared) {
        log::debug!("wall generator received a degenerate outline; producing empty result");
        return (VariableWidthPaths::new(), Shape::new());
    }

    let constants = DerivedConstants::new(bead_width_0);
    let params = BeadingStrategyParams {
        bead_width_0,
        bead_width_x,
        transition_length: constants.transition_length,
        transitioning_angle: constants.transitioning_angle,
        print_thin_walls: settings.fill_outline_gaps,
        min_bead_width: settings.min_bead_width,
        min_feature_size: settings.min_feature_size,
        max_bead_count: 2 * inset_count.max(1),
    };
    let strategy = match make_beading_strategy(settings.beading_strategy_type, params) {
        Ok(strategy) => strategy,
        Err(err) => {
            log::warn!("{err}: layer's walls will be empty");
            return (VariableWidthPaths::new(), prepared);
        }
    };

    let (beads, residual) =
        trapezoidation::generate_beads(&prepared, strategy.as_ref(), bead_width_0, bead_width_x, inset_count);

    let mut toolpaths = VariableWidthPaths::new();
    let mut contour_lines = Vec::new();

    for bead in &beads {
        let lines = trapezoidation::bead_to_extrusion_lines(bead);
        let (tool_lines, contour): (Vec<_>, Vec<_>) =
            lines.into_iter().partition(|line| line.is_extrusion_path());
        contour_lines.extend(contour);
        if !tool_lines.is_empty() {
            toolpaths.push(tool_lines);
        }
    }

    let residual_lines = trapezoidation::contour_to_extrusion_lines(&residual, usize::MAX);
    contour_lines.extend(residual_lines);

    let stitch_distance = bead_width_0 / 2.0;
    let stitched = stitch::stitch(&contour_lines, stitch_distance);
    let inner_contour = union(&stitched, &Shape::new());

    toolpaths.retain(|lines| !lines.is_empty());

    (toolpaths, inner_contour)
}
