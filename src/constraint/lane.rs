//! Lane constraint

use super::{ConstraintType, HalfPlaneConstraint, SampleState, Side};
use crate::geometry::{Rotation2d, Translation2d};
use crate::optimization::OptimizationProblem;

/// Keeps the robot within `tolerance` of a center line.
///
/// A zero tolerance pins the robot onto the line itself.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneConstraint {
    top: HalfPlaneConstraint,
    bottom: Option<HalfPlaneConstraint>,
}

impl LaneConstraint {
    pub fn new(center_line_start: Translation2d, center_line_end: Translation2d, tolerance: f64) -> Self {
        let origin = Translation2d::new(0.0, 0.0);
        if tolerance == 0.0 {
            return LaneConstraint {
                top: HalfPlaneConstraint::new(origin, center_line_start, center_line_end, Side::On),
                bottom: None,
            };
        }

        let direction = center_line_end.clone() - center_line_start.clone();
        let offset = Translation2d::new(0.0, tolerance).rotate_by(&Rotation2d::from_vector(direction.x, direction.y));
        LaneConstraint {
            top: HalfPlaneConstraint::new(
                origin.clone(),
                center_line_start.clone() + offset.clone(),
                center_line_end.clone() + offset.clone(),
                Side::Below,
            ),
            bottom: Some(HalfPlaneConstraint::new(
                origin,
                center_line_start - offset.clone(),
                center_line_end - offset,
                Side::Above,
            )),
        }
    }

    /// The boundary half-planes: one for a zero tolerance, two otherwise
    pub fn half_planes(&self) -> Vec<&HalfPlaneConstraint> {
        std::iter::once(&self.top).chain(self.bottom.as_ref()).collect()
    }
}

impl ConstraintType for LaneConstraint {
    fn apply(&self, problem: &mut OptimizationProblem, state: &SampleState) {
        self.top.apply(problem, state);
        if let Some(bottom) = &self.bottom {
            bottom.apply(problem, state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::test_util::FreeSample;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_tolerance_is_line() {
        let start = Translation2d::new(1.0, 1.0);
        let end = Translation2d::new(4.0, 5.0);
        let lane = LaneConstraint::new(start.clone(), end.clone(), 0.0);
        let planes = lane.half_planes();
        assert_eq!(planes.len(), 1);
        assert_eq!(planes[0].side(), Side::On);
        assert_eq!(planes[0].line_start(), &start);
        assert_eq!(planes[0].line_end(), &end);
    }

    #[test]
    fn test_edges_at_tolerance() {
        let start = Translation2d::new(1.0, 1.0);
        let end = Translation2d::new(4.0, 5.0);
        let lane = LaneConstraint::new(start.clone(), end, 0.5);
        let planes = lane.half_planes();
        assert_eq!(planes.len(), 2);

        // The center line lies right of the top edge and left of the bottom edge
        assert_eq!(planes[0].side(), Side::Below);
        assert_relative_eq!(planes[0].signed_distance(&start), -0.5, epsilon = 1e-12);
        assert_eq!(planes[1].side(), Side::Above);
        assert_relative_eq!(planes[1].signed_distance(&start), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_lane_feasibility() {
        let lane = LaneConstraint::new(Translation2d::new(0.0, 0.0), Translation2d::new(2.0, 0.0), 0.3);
        let mut problem = OptimizationProblem::new();
        let sample = FreeSample::new(&mut problem);
        lane.apply(&mut problem, &sample.state);

        sample.set_pose(1.0, 0.2, 0.0);
        assert!(problem.infeasibility() <= 1e-12);
        sample.set_pose(1.0, -0.2, 0.0);
        assert!(problem.infeasibility() <= 1e-12);
        sample.set_pose(1.0, 0.4, 0.0);
        assert!(problem.infeasibility() > 0.0);
        sample.set_pose(1.0, -0.4, 0.0);
        assert!(problem.infeasibility() > 0.0);
    }
}
