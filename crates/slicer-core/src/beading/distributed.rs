use super::{Beading, BeadingStrategy, BeadingStrategyParams};

/// Distributes the difference between the nominal bead widths and the
/// actually available thickness evenly across every bead in the cell, so
/// that neither the outer nor the inner beads absorb all of a local
/// thickness variation.
pub struct DistributedBeadingStrategy {
    params: BeadingStrategyParams,
}

impl DistributedBeadingStrategy {
    pub fn new(params: BeadingStrategyParams) -> Self {
        DistributedBeadingStrategy { params }
    }

    fn nominal_widths(&self, bead_count: usize) -> Vec<f64> {
        if bead_count == 0 {
            return Vec::new();
        }
        let mut widths = Vec::with_capacity(bead_count);
        widths.push(self.params.bead_width_0);
        widths.resize(bead_count, self.params.bead_width_x);
        widths
    }

    fn locations_from_widths(widths: &[f64]) -> Vec<f64> {
        let mut locations = Vec::with_capacity(widths.len());
        let mut offset = 0.0;
        for (i, w) in widths.iter().enumerate() {
            if i == 0 {
                offset = w / 2.0;
            } else {
                offset += widths[i - 1] / 2.0 + w / 2.0;
            }
            locations.push(offset);
        }
        locations
    }
}

impl BeadingStrategy for DistributedBeadingStrategy {
    fn compute(&self, thickness: f64, bead_count: usize) -> Beading {
        let bead_count = bead_count.min(self.params.max_bead_count);
        if bead_count == 0 || thickness <= 0.0 {
            return Beading {
                bead_widths: Vec::new(),
                toolpath_locations: Vec::new(),
            };
        }

        let nominal = self.nominal_widths(bead_count);
        let nominal_total: f64 = nominal.iter().sum();
        let delta = thickness - nominal_total;
        let share = delta / bead_count as f64;

        let widths: Vec<f64> = nominal
            .iter()
            .map(|w| (w + share).max(self.params.min_bead_width))
            .collect();

        let toolpath_locations = Self::locations_from_widths(&widths);

        Beading {
            bead_widths: widths,
            toolpath_locations,
        }
    }

    fn optimal_bead_count(&self, thickness: f64) -> usize {
        if thickness < self.params.min_feature_size {
            return if self.params.print_thin_walls && thickness >= self.params.min_bead_width {
                1
            } else {
                0
            };
        }

        let extra = (thickness - self.params.bead_width_0).max(0.0);
        let inner_beads = (extra / self.params.bead_width_x).round() as usize;
        (inner_beads + 1).clamp(1, self.params.max_bead_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn params() -> BeadingStrategyParams {
        BeadingStrategyParams {
            bead_width_0: 400.0,
            bead_width_x: 400.0,
            transition_length: 800.0,
            transitioning_angle: 0.5,
            print_thin_walls: true,
            min_bead_width: 100.0,
            min_feature_size: 200.0,
            max_bead_count: 10,
        }
    }

    #[test]
    fn single_bead_matches_nominal_width_when_thickness_matches() {
        let strategy = DistributedBeadingStrategy::new(params());
        let beading = strategy.compute(400.0, 1);
        assert_eq!(beading.bead_count(), 1);
        assert_abs_diff_eq!(beading.bead_widths[0], 400.0, epsilon = 1e-6);
        assert_abs_diff_eq!(beading.toolpath_locations[0], 200.0, epsilon = 1e-6);
    }

    #[test]
    fn thin_wall_below_min_feature_size_drops_to_zero_beads() {
        let strategy = DistributedBeadingStrategy::new(BeadingStrategyParams {
            print_thin_walls: false,
            ..params()
        });
        assert_eq!(strategy.optimal_bead_count(50.0), 0);
    }

    #[test]
    fn surplus_thickness_distributes_across_beads() {
        let strategy = DistributedBeadingStrategy::new(params());
        let beading = strategy.compute(900.0, 2);
        assert_eq!(beading.bead_count(), 2);
        assert!(beading.bead_widths.iter().all(|&w| w > 400.0));
    }
}
