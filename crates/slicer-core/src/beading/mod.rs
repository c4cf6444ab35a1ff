//! Beading strategies: pattern definitions for how to distribute bead
//! widths across a skeletal cell of a given local thickness, available
//! through a factory keyed by strategy type. This crate implements two
//! and leaves the trait open for more.

mod distributed;
mod single_width;

pub use distributed::DistributedBeadingStrategy;
pub use single_width::SingleWidthBeadingStrategy;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString};

/// Parameters shared by every beading strategy.
#[derive(Debug, Clone, Copy)]
pub struct BeadingStrategyParams {
    pub bead_width_0: f64,
    pub bead_width_x: f64,
    pub transition_length: f64,
    pub transitioning_angle: f64,
    pub print_thin_walls: bool,
    pub min_bead_width: f64,
    pub min_feature_size: f64,
    pub max_bead_count: usize,
}

/// One bead's width plus the offset of its centerline from the outline, for
/// every bead a cell of a given thickness should carry.
#[derive(Debug, Clone, PartialEq)]
pub struct Beading {
    /// Width of each bead, outermost first.
    pub bead_widths: Vec<f64>,
    /// Distance of each bead's centerline from the outline, outermost
    /// first. Has the same length as `bead_widths`.
    pub toolpath_locations: Vec<f64>,
}

impl Beading {
    pub fn bead_count(&self) -> usize {
        self.bead_widths.len()
    }
}

/// Converts a local wall thickness into a set of bead widths/locations.
pub trait BeadingStrategy: Send + Sync {
    /// `thickness` is the locally available wall thickness in micrometers;
    /// `bead_count` is the number of beads the caller would like to place
    /// (typically capped by `max_bead_count`).
    fn compute(&self, thickness: f64, bead_count: usize) -> Beading;

    /// The number of beads this strategy would choose for the given
    /// thickness, bounded by `max_bead_count`.
    fn optimal_bead_count(&self, thickness: f64) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, Serialize, Deserialize)]
pub enum BeadingStrategyType {
    Distributed,
    SingleWidth,
}

/// Constructs a beading strategy by type.
///
/// Rejects parameters no strategy can make sense of — `StrategyUnavailable`
/// is the one wall-generation failure that isn't silently repaired; the
/// caller empties that layer's walls instead.
pub fn make_beading_strategy(
    kind: BeadingStrategyType,
    params: BeadingStrategyParams,
) -> Result<Box<dyn BeadingStrategy>, crate::error::StrategyError> {
    if params.bead_width_0 <= 0.0 || params.bead_width_x <= 0.0 || params.max_bead_count == 0 {
        return Err(crate::error::StrategyError::StrategyUnavailable);
    }
    Ok(match kind {
        BeadingStrategyType::Distributed => Box::new(DistributedBeadingStrategy::new(params)),
        BeadingStrategyType::SingleWidth => Box::new(SingleWidthBeadingStrategy::new(params)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_zero_bead_width_is_rejected() {
        let params = BeadingStrategyParams {
            bead_width_0: 0.0,
            bead_width_x: 400.0,
            transition_length: 800.0,
            transitioning_angle: 0.5,
            print_thin_walls: true,
            min_bead_width: 100.0,
            min_feature_size: 200.0,
            max_bead_count: 10,
        };
        assert!(make_beading_strategy(BeadingStrategyType::Distributed, params).is_err());
    }

    #[test]
    fn valid_parameters_construct_a_strategy() {
        let params = BeadingStrategyParams {
            bead_width_0: 400.0,
            bead_width_x: 400.0,
            transition_length: 800.0,
            transitioning_angle: 0.5,
            print_thin_walls: true,
            min_bead_width: 100.0,
            min_feature_size: 200.0,
            max_bead_count: 10,
        };
        assert!(make_beading_strategy(BeadingStrategyType::SingleWidth, params).is_ok());
    }
}
