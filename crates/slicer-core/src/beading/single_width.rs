use super::{Beading, BeadingStrategy, BeadingStrategyParams};

/// Pins the outer bead at `bead_width_0` and every inner bead at
/// `bead_width_x`, packing as many as fit in the available thickness rather
/// than distributing slack. Simpler and cheaper than
/// [`super::DistributedBeadingStrategy`]; degrades to zero beads below
/// `min_feature_size`.
pub struct SingleWidthBeadingStrategy {
    params: BeadingStrategyParams,
}

impl SingleWidthBeadingStrategy {
    pub fn new(params: BeadingStrategyParams) -> Self {
        SingleWidthBeadingStrategy { params }
    }
}

impl BeadingStrategy for SingleWidthBeadingStrategy {
    fn compute(&self, thickness: f64, bead_count: usize) -> Beading {
        let bead_count = bead_count.min(self.params.max_bead_count);
        if bead_count == 0 || thickness <= 0.0 {
            return Beading {
                bead_widths: Vec::new(),
                toolpath_locations: Vec::new(),
            };
        }

        let mut widths = Vec::with_capacity(bead_count);
        let mut locations = Vec::with_capacity(bead_count);
        let mut consumed = 0.0;

        for i in 0..bead_count {
            let nominal = if i == 0 {
                self.params.bead_width_0
            } else {
                self.params.bead_width_x
            };
            let remaining = (thickness - consumed).max(0.0);
            let width = nominal.min(remaining).max(self.params.min_bead_width);
            let location = consumed + width / 2.0;
            consumed += width;
            widths.push(width);
            locations.push(location);
        }

        Beading {
            bead_widths: widths,
            toolpath_locations: locations,
        }
    }

    fn optimal_bead_count(&self, thickness: f64) -> usize {
        if thickness < self.params.min_feature_size {
            return 0;
        }
        let mut consumed = self.params.bead_width_0;
        let mut count = if consumed <= thickness { 1 } else { 0 };
        while consumed + self.params.bead_width_x <= thickness
            && count < self.params.max_bead_count
        {
            consumed += self.params.bead_width_x;
            count += 1;
        }
        count
    }
}
