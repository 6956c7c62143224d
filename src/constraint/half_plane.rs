//! Half-plane constraint

use super::{ConstraintType, SampleState};
use crate::geometry::Translation2d;
use crate::optimization::{eq, ge, le, OptimizationProblem};

/// Which side of a directed line the constrained point must stay on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Left of the line, looking from start to end
    Above,
    /// Right of the line, looking from start to end
    Below,
    /// On the line
    On,
}

/// Keeps a robot-frame point on one side of the line through two field points
#[derive(Debug, Clone, PartialEq)]
pub struct HalfPlaneConstraint {
    origin: Translation2d,
    line_start: Translation2d,
    line_end: Translation2d,
    side: Side,
}

impl HalfPlaneConstraint {
    /// `origin` is the constrained point in the robot frame
    pub fn new(origin: Translation2d, line_start: Translation2d, line_end: Translation2d, side: Side) -> Self {
        HalfPlaneConstraint {
            origin,
            line_start,
            line_end,
            side,
        }
    }

    pub fn origin(&self) -> &Translation2d {
        &self.origin
    }

    pub fn line_start(&self) -> &Translation2d {
        &self.line_start
    }

    pub fn line_end(&self) -> &Translation2d {
        &self.line_end
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Line as a·x + b·y = c, with (a, b) pointing to the left of the line
    pub fn coefficients(&self) -> (f64, f64, f64) {
        let a = -(self.line_end.y - self.line_start.y);
        let b = self.line_end.x - self.line_start.x;
        let c = a * self.line_start.x + b * self.line_start.y;
        (a, b, c)
    }

    /// Distance of a field point from the line, positive on the left
    pub fn signed_distance(&self, point: &Translation2d) -> f64 {
        let (a, b, c) = self.coefficients();
        (a * point.x + b * point.y - c) / a.hypot(b)
    }
}

impl ConstraintType for HalfPlaneConstraint {
    fn apply(&self, problem: &mut OptimizationProblem, state: &SampleState) {
        let point = state.pose.transform_point(&self.origin.lift());
        let (a, b, c) = self.coefficients();
        let lhs = a * point.x + b * point.y;
        let relation = match self.side {
            Side::Above => ge(lhs, c),
            Side::Below => le(lhs, c),
            Side::On => eq(lhs, c),
        };
        problem.subject_to(relation);
    }
}
