//! Linear acceleration constraint

use super::{ConstraintType, SampleState};
use crate::optimization::{eq, le, OptimizationProblem};

/// Bounds the magnitude of the linear acceleration
#[derive(Debug, Clone, PartialEq)]
pub struct LinearAccelerationMaxMagnitudeConstraint {
    max_magnitude: f64,
}

impl LinearAccelerationMaxMagnitudeConstraint {
    pub fn new(max_magnitude: f64) -> Self {
        LinearAccelerationMaxMagnitudeConstraint { max_magnitude }
    }

    pub fn max_magnitude(&self) -> f64 {
        self.max_magnitude
    }
}

impl ConstraintType for LinearAccelerationMaxMagnitudeConstraint {
    fn apply(&self, problem: &mut OptimizationProblem, state: &SampleState) {
        let a = &state.linear_acceleration;
        if self.max_magnitude == 0.0 {
            problem.subject_to(eq(&a.x, 0.0));
            problem.subject_to(eq(&a.y, 0.0));
        } else {
            problem.subject_to(le(a.squared_norm(), self.max_magnitude * self.max_magnitude));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::test_util::FreeSample;

    #[test]
    fn test_acceleration_bound() {
        let mut problem = OptimizationProblem::new();
        let sample = FreeSample::new(&mut problem);
        LinearAccelerationMaxMagnitudeConstraint::new(1.0).apply(&mut problem, &sample.state);

        sample.set_acceleration(0.6, -0.8);
        assert!(problem.infeasibility() <= 1e-12);
        sample.set_acceleration(0.8, -0.8);
        assert!(problem.infeasibility() > 0.0);
    }
}
