//! Keep-in and keep-out circle constraints
//!
//! Both use an auxiliary scaling unknown α instead of a square root on the
//! distance: ‖p − c‖² ≤ r²α² with α ∈ [0, 1] keeps the robot inside, and
//! ‖p − c‖² ≥ r²α² with α ≥ 1 keeps it outside.

use super::{ConstraintType, SampleState};
use crate::geometry::Translation2d;
use crate::optimization::{ge, le, OptimizationProblem};

/// Keeps the robot center inside a circle
#[derive(Debug, Clone, PartialEq)]
pub struct KeepInCircleConstraint {
    center: Translation2d,
    radius: f64,
}

impl KeepInCircleConstraint {
    pub fn new(center: Translation2d, radius: f64) -> Self {
        KeepInCircleConstraint { center, radius }
    }

    pub fn center(&self) -> &Translation2d {
        &self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl ConstraintType for KeepInCircleConstraint {
    fn apply(&self, problem: &mut OptimizationProblem, state: &SampleState) {
        let alpha = problem.decision_variable();
        alpha.set_value(1.0);

        let distance = state.pose.translation().clone() - self.center.lift();
        let r2 = self.radius * self.radius;
        problem.subject_to(le(distance.squared_norm(), r2 * &alpha * &alpha));
        problem.subject_to(le(&alpha, 1.0));
        // Without a lower bound, α = -1 would also pass
        problem.subject_to(ge(&alpha, 0.0));
    }
}

/// Keeps the robot center outside a circle
#[derive(Debug, Clone, PartialEq)]
pub struct KeepOutCircleConstraint {
    center: Translation2d,
    radius: f64,
}

impl KeepOutCircleConstraint {
    pub fn new(center: Translation2d, radius: f64) -> Self {
        KeepOutCircleConstraint { center, radius }
    }

    pub fn center(&self) -> &Translation2d {
        &self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl ConstraintType for KeepOutCircleConstraint {
    fn apply(&self, problem: &mut OptimizationProblem, state: &SampleState) {
        let alpha = problem.decision_variable();
        alpha.set_value(1.0);

        let distance = state.pose.translation().clone() - self.center.lift();
        let r2 = self.radius * self.radius;
        problem.subject_to(ge(distance.squared_norm(), r2 * &alpha * &alpha));
        problem.subject_to(ge(&alpha, 1.0));
    }
}
