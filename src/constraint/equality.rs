//! Pose and translation equality constraints

use super::{ConstraintType, SampleState};
use crate::geometry::{Pose2d, Translation2d};
use crate::optimization::OptimizationProblem;

/// Pins position and heading
#[derive(Debug, Clone, PartialEq)]
pub struct PoseEqualityConstraint {
    pose: Pose2d,
}

impl PoseEqualityConstraint {
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        PoseEqualityConstraint {
            pose: Pose2d::from_xy_heading(x, y, heading),
        }
    }

    pub fn pose(&self) -> &Pose2d {
        &self.pose
    }
}

impl From<Pose2d> for PoseEqualityConstraint {
    fn from(pose: Pose2d) -> Self {
        PoseEqualityConstraint { pose }
    }
}

impl ConstraintType for PoseEqualityConstraint {
    fn apply(&self, problem: &mut OptimizationProblem, state: &SampleState) {
        problem.subject_to(state.pose.equal_to(&self.pose));
    }
}

/// Pins position, leaving heading free
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationEqualityConstraint {
    translation: Translation2d,
}

impl TranslationEqualityConstraint {
    pub fn new(x: f64, y: f64) -> Self {
        TranslationEqualityConstraint {
            translation: Translation2d::new(x, y),
        }
    }

    pub fn translation(&self) -> &Translation2d {
        &self.translation
    }
}

impl ConstraintType for TranslationEqualityConstraint {
    fn apply(&self, problem: &mut OptimizationProblem, state: &SampleState) {
        problem.subject_to(state.pose.translation().equal_to(&self.translation));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::test_util::FreeSample;

    #[test]
    fn test_pose_equality() {
        let mut problem = OptimizationProblem::new();
        let sample = FreeSample::new(&mut problem);
        PoseEqualityConstraint::new(1.0, 2.0, 0.5).apply(&mut problem, &sample.state);
        // x, y, cross product and unit circle of the symbolic heading
        assert_eq!(problem.num_equality_constraints(), 4);

        sample.set_pose(1.0, 2.0, 0.5);
        assert!(problem.infeasibility() <= 1e-12);
        sample.set_pose(1.0, 2.0, 0.7);
        assert!(problem.infeasibility() > 0.0);
    }

    #[test]
    fn test_translation_equality_ignores_heading() {
        let mut problem = OptimizationProblem::new();
        let sample = FreeSample::new(&mut problem);
        TranslationEqualityConstraint::new(-1.0, 3.0).apply(&mut problem, &sample.state);
        assert_eq!(problem.num_equality_constraints(), 2);

        sample.set_pose(-1.0, 3.0, 2.0);
        assert!(problem.infeasibility() <= 1e-12);
    }
}
