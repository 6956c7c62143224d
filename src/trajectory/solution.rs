//! Solved (or seed) trajectory values

/// Per-sample state of a differential trajectory.
///
/// `dt[i]` is the duration from sample `i` to sample `i + 1`, so `dt` has one
/// entry fewer than the per-sample arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DifferentialSolution {
    pub dt: Vec<f64>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub heading: Vec<f64>,
    pub vl: Vec<f64>,
    pub vr: Vec<f64>,
    pub omega: Vec<f64>,
    pub al: Vec<f64>,
    pub ar: Vec<f64>,
    pub fl: Vec<f64>,
    pub fr: Vec<f64>,
}

impl DifferentialSolution {
    pub fn num_samples(&self) -> usize {
        self.x.len()
    }

    pub fn total_time(&self) -> f64 {
        self.dt.iter().sum()
    }

    /// Cumulative time at every sample, starting at zero
    pub fn timestamps(&self) -> Vec<f64> {
        let mut timestamps = Vec::with_capacity(self.num_samples());
        let mut t = 0.0;
        for i in 0..self.num_samples() {
            timestamps.push(t);
            if let Some(dt) = self.dt.get(i) {
                t += dt;
            }
        }
        timestamps
    }
}

/// Global sample index of `sample` within the segment starting at waypoint `waypoint`
pub fn sample_index(counts: &[usize], waypoint: usize, sample: usize) -> usize {
    counts[..waypoint].iter().sum::<usize>() + sample
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sample_index() {
        let counts = [3, 0, 4];
        assert_eq!(sample_index(&counts, 0, 0), 0);
        assert_eq!(sample_index(&counts, 1, 0), 3);
        assert_eq!(sample_index(&counts, 2, 0), 3);
        assert_eq!(sample_index(&counts, 2, 2), 5);
        // Final waypoint is the last sample
        assert_eq!(sample_index(&counts, 3, 0), 7);
    }

    #[test]
    fn test_timestamps() {
        let solution = DifferentialSolution {
            dt: vec![0.5, 0.25],
            x: vec![0.0; 3],
            ..Default::default()
        };
        assert_eq!(solution.timestamps(), vec![0.0, 0.5, 0.75]);
        assert_relative_eq!(solution.total_time(), 0.75);
    }
}
