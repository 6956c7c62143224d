//! Velocity constraints

use super::{ConstraintType, SampleState};
use crate::geometry::{Rotation2d, Translation2d};
use crate::optimization::{eq, ge, le, OptimizationProblem};

/// Bounds the magnitude of the linear velocity
#[derive(Debug, Clone, PartialEq)]
pub struct LinearVelocityMaxMagnitudeConstraint {
    max_magnitude: f64,
}

impl LinearVelocityMaxMagnitudeConstraint {
    pub fn new(max_magnitude: f64) -> Self {
        LinearVelocityMaxMagnitudeConstraint { max_magnitude }
    }

    pub fn max_magnitude(&self) -> f64 {
        self.max_magnitude
    }
}

impl ConstraintType for LinearVelocityMaxMagnitudeConstraint {
    fn apply(&self, problem: &mut OptimizationProblem, state: &SampleState) {
        let v = &state.linear_velocity;
        if self.max_magnitude == 0.0 {
            problem.subject_to(eq(&v.x, 0.0));
            problem.subject_to(eq(&v.y, 0.0));
        } else {
            problem.subject_to(le(v.squared_norm(), self.max_magnitude * self.max_magnitude));
        }
    }
}

/// Forces the linear velocity to point along a fixed field direction, or vanish
#[derive(Debug, Clone, PartialEq)]
pub struct LinearVelocityDirectionConstraint {
    angle: f64,
}

impl LinearVelocityDirectionConstraint {
    pub fn new(angle: f64) -> Self {
        LinearVelocityDirectionConstraint { angle }
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }
}

impl ConstraintType for LinearVelocityDirectionConstraint {
    fn apply(&self, problem: &mut OptimizationProblem, state: &SampleState) {
        let direction = Rotation2d::new(self.angle);
        let u = Translation2d::new(*direction.cos(), *direction.sin()).lift();
        let v = &state.linear_velocity;
        problem.subject_to(eq(v.cross(&u), 0.0));
        problem.subject_to(ge(v.dot(&u), 0.0));
    }
}

/// Bounds the magnitude of the angular velocity
#[derive(Debug, Clone, PartialEq)]
pub struct AngularVelocityMaxMagnitudeConstraint {
    max_magnitude: f64,
}

impl AngularVelocityMaxMagnitudeConstraint {
    pub fn new(max_magnitude: f64) -> Self {
        AngularVelocityMaxMagnitudeConstraint { max_magnitude }
    }

    pub fn max_magnitude(&self) -> f64 {
        self.max_magnitude
    }
}

impl ConstraintType for AngularVelocityMaxMagnitudeConstraint {
    fn apply(&self, problem: &mut OptimizationProblem, state: &SampleState) {
        let omega = &state.angular_velocity;
        if self.max_magnitude == 0.0 {
            problem.subject_to(eq(omega, 0.0));
        } else {
            problem.subject_to(ge(omega, -self.max_magnitude));
            problem.subject_to(le(omega, self.max_magnitude));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::test_util::FreeSample;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn test_linear_velocity_magnitude() {
        let mut problem = OptimizationProblem::new();
        let sample = FreeSample::new(&mut problem);
        LinearVelocityMaxMagnitudeConstraint::new(2.0).apply(&mut problem, &sample.state);
        assert_eq!(problem.num_inequality_constraints(), 1);

        sample.set_velocity(1.2, 1.5, 0.0);
        assert!(problem.infeasibility() <= 1e-12);
        sample.set_velocity(1.5, 1.5, 0.0);
        assert!(problem.infeasibility() > 0.0);
    }

    #[test]
    fn test_zero_linear_velocity_uses_equalities() {
        let mut problem = OptimizationProblem::new();
        let sample = FreeSample::new(&mut problem);
        LinearVelocityMaxMagnitudeConstraint::new(0.0).apply(&mut problem, &sample.state);
        assert_eq!(problem.num_equality_constraints(), 2);
        assert_eq!(problem.num_inequality_constraints(), 0);
    }

    #[test]
    fn test_velocity_direction() {
        let mut problem = OptimizationProblem::new();
        let sample = FreeSample::new(&mut problem);
        LinearVelocityDirectionConstraint::new(FRAC_PI_4).apply(&mut problem, &sample.state);

        sample.set_velocity(1.0, 1.0, 0.0);
        assert!(problem.infeasibility() <= 1e-12);
        sample.set_velocity(0.0, 0.0, 0.0);
        assert!(problem.infeasibility() <= 1e-12);
        sample.set_velocity(-1.0, -1.0, 0.0);
        assert!(problem.infeasibility() > 0.0);
        sample.set_velocity(1.0, 0.0, 0.0);
        assert!(problem.infeasibility() > 0.0);
    }

    #[test]
    fn test_angular_velocity_magnitude() {
        let mut problem = OptimizationProblem::new();
        let sample = FreeSample::new(&mut problem);
        AngularVelocityMaxMagnitudeConstraint::new(1.5).apply(&mut problem, &sample.state);

        sample.set_velocity(0.0, 0.0, -1.5);
        assert!(problem.infeasibility() <= 1e-12);
        sample.set_velocity(0.0, 0.0, 1.6);
        assert!(problem.infeasibility() > 0.0);

        let mut problem = OptimizationProblem::new();
        let sample = FreeSample::new(&mut problem);
        AngularVelocityMaxMagnitudeConstraint::new(0.0).apply(&mut problem, &sample.state);
        assert_eq!(problem.num_equality_constraints(), 1);
    }
}
