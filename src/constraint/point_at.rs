//! Point-at constraint

use super::{ConstraintType, SampleState};
use crate::geometry::{Translation2, Translation2d};
use crate::optimization::{ge, le, OptimizationProblem};

/// Keeps the robot heading within a tolerance of the bearing to a field point.
///
/// With `flip` set the robot faces away from the target instead.
#[derive(Debug, Clone, PartialEq)]
pub struct PointAtConstraint {
    target: Translation2d,
    heading_tolerance: f64,
    flip: bool,
}

impl PointAtConstraint {
    pub fn new(target: Translation2d, heading_tolerance: f64, flip: bool) -> Self {
        PointAtConstraint {
            target,
            heading_tolerance,
            flip,
        }
    }

    pub fn target(&self) -> &Translation2d {
        &self.target
    }

    pub fn heading_tolerance(&self) -> f64 {
        self.heading_tolerance
    }

    pub fn flip(&self) -> bool {
        self.flip
    }
}

impl ConstraintType for PointAtConstraint {
    fn apply(&self, problem: &mut OptimizationProblem, state: &SampleState) {
        let rotation = state.pose.rotation();
        let heading = Translation2::new(rotation.cos().clone(), rotation.sin().clone());
        let bearing = self.target.lift() - state.pose.translation().clone();

        // cos(angle between heading and bearing) ≥ cos(tolerance), without dividing
        let alignment = heading.dot(&bearing);
        let bound = self.heading_tolerance.cos() * bearing.norm();
        if self.flip {
            problem.subject_to(le(alignment, -bound));
        } else {
            problem.subject_to(ge(alignment, bound));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::test_util::FreeSample;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_faces_target() {
        let constraint = PointAtConstraint::new(Translation2d::new(5.0, 0.0), 0.1, false);
        let mut problem = OptimizationProblem::new();
        let sample = FreeSample::new(&mut problem);
        constraint.apply(&mut problem, &sample.state);

        sample.set_pose(0.0, 0.0, 0.05);
        assert!(problem.infeasibility() <= 1e-12);
        sample.set_pose(0.0, 0.0, 0.2);
        assert!(problem.infeasibility() > 0.0);
        sample.set_pose(0.0, 0.0, FRAC_PI_2);
        assert!(problem.infeasibility() > 0.0);
    }

    #[test]
    fn test_flipped_faces_away() {
        let constraint = PointAtConstraint::new(Translation2d::new(5.0, 0.0), 0.1, true);
        let mut problem = OptimizationProblem::new();
        let sample = FreeSample::new(&mut problem);
        constraint.apply(&mut problem, &sample.state);

        sample.set_pose(0.0, 0.0, PI);
        assert!(problem.infeasibility() <= 1e-12);
        sample.set_pose(0.0, 0.0, 0.0);
        assert!(problem.infeasibility() > 0.0);
    }
}
