//! 2D pose: position and heading

use super::{Rotation2, Scalar, Translation2};
use crate::optimization::{Relation, Variable};

#[derive(Debug, Clone, PartialEq)]
pub struct Pose2<T> {
    translation: Translation2<T>,
    rotation: Rotation2<T>,
}

pub type Pose2d = Pose2<f64>;
pub type Pose2v = Pose2<Variable>;

impl<T: Scalar> Pose2<T> {
    pub fn new(translation: Translation2<T>, rotation: Rotation2<T>) -> Self {
        Pose2 { translation, rotation }
    }

    pub fn from_xy_heading(x: T, y: T, heading: T) -> Self {
        Pose2::new(Translation2::new(x, y), Rotation2::new(heading))
    }

    pub fn translation(&self) -> &Translation2<T> {
        &self.translation
    }

    pub fn rotation(&self) -> &Rotation2<T> {
        &self.rotation
    }

    pub fn x(&self) -> &T {
        &self.translation.x
    }

    pub fn y(&self) -> &T {
        &self.translation.y
    }

    /// Pose `other`, expressed in this pose's frame, mapped to the parent frame
    pub fn transform_by(&self, other: &Pose2<T>) -> Self {
        Pose2 {
            translation: self.translation.clone() + other.translation.rotate_by(&self.rotation),
            rotation: other.rotation.rotate_by(&self.rotation),
        }
    }

    /// Point given in the robot frame, mapped to the parent frame
    pub fn transform_point(&self, point: &Translation2<T>) -> Translation2<T> {
        self.translation.clone() + point.rotate_by(&self.rotation)
    }

    /// Position equality plus manifold-aware heading equality
    pub fn equal_to<U: Scalar>(&self, other: &Pose2<U>) -> Relation {
        let mut relations = match self.translation.equal_to(&other.translation) {
            Relation::Equality(exprs) | Relation::Inequality(exprs) => exprs,
        };
        relations.extend(self.rotation.equal_to(&other.rotation).expressions().iter().cloned());
        Relation::Equality(relations)
    }

    pub fn to_variable(&self) -> Pose2v {
        Pose2::new(self.translation.to_variable(), self.rotation.to_variable())
    }
}

impl Pose2d {
    pub fn heading(&self) -> f64 {
        self.rotation.angle()
    }

    pub fn lift(&self) -> Pose2v {
        self.to_variable()
    }
}

impl Pose2v {
    pub fn value(&self) -> Pose2d {
        Pose2::new(self.translation.value(), self.rotation.value())
    }
}

impl<T: Scalar> Default for Pose2<T> {
    fn default() -> Self {
        Pose2::new(Translation2::default(), Rotation2::identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::OptimizationProblem;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_transform_by() {
        let base = Pose2d::from_xy_heading(1.0, 2.0, FRAC_PI_2);
        let offset = Pose2d::from_xy_heading(1.0, 0.0, 0.0);
        let result = base.transform_by(&offset);
        assert_relative_eq!(*result.x(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(*result.y(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(result.heading(), FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_pose_equality_relation() {
        let mut problem = OptimizationProblem::new();
        let x = problem.decision_variable();
        let y = problem.decision_variable();
        let theta = problem.decision_variable();
        let pose = Pose2v::from_xy_heading(x.clone(), y.clone(), theta.clone());
        let target = Pose2d::from_xy_heading(1.0, -1.0, 0.25);

        let relation = pose.equal_to(&target);
        assert!(relation.is_equality());
        // x, y and the heading cross product
        assert_eq!(relation.len(), 3);

        x.set_value(1.0);
        y.set_value(-1.0);
        theta.set_value(0.25);
        assert!(relation.is_satisfied(1e-12));
        assert_relative_eq!(pose.value().heading(), 0.25, epsilon = 1e-12);
    }
}
