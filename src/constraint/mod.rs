//! Geometric and kinematic constraints applied at trajectory samples
//!
//! Each constraint is an immutable parameter holder that lowers a user intent
//! into relations on the symbolic state of one sample. The generator applies
//! every constraint exactly once per sample it covers.

mod acceleration;
mod circle;
mod equality;
mod half_plane;
mod lane;
mod point_at;
mod velocity;

pub use acceleration::LinearAccelerationMaxMagnitudeConstraint;
pub use circle::{KeepInCircleConstraint, KeepOutCircleConstraint};
pub use equality::{PoseEqualityConstraint, TranslationEqualityConstraint};
pub use half_plane::{HalfPlaneConstraint, Side};
pub use lane::LaneConstraint;
pub use point_at::PointAtConstraint;
pub use velocity::{
    AngularVelocityMaxMagnitudeConstraint, LinearVelocityDirectionConstraint, LinearVelocityMaxMagnitudeConstraint,
};

use crate::geometry::{HPolytope2v, Pose2v, Translation2v};
use crate::optimization::{OptimizationProblem, Variable};

/// Symbolic robot state at one sample
#[derive(Debug, Clone)]
pub struct SampleState {
    pub pose: Pose2v,
    /// Robot footprint, rotated by the sample heading
    pub robot_region: HPolytope2v,
    pub linear_velocity: Translation2v,
    pub angular_velocity: Variable,
    pub linear_acceleration: Translation2v,
    pub angular_acceleration: Variable,
}

/// Interface for all constraint types
pub trait ConstraintType {
    /// Register this constraint's relations for one sample
    fn apply(&self, problem: &mut OptimizationProblem, state: &SampleState);
}

/// Any supported constraint
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    AngularVelocityMaxMagnitude(AngularVelocityMaxMagnitudeConstraint),
    KeepInCircle(KeepInCircleConstraint),
    KeepOutCircle(KeepOutCircleConstraint),
    Lane(LaneConstraint),
    LinearAccelerationMaxMagnitude(LinearAccelerationMaxMagnitudeConstraint),
    LinearVelocityDirection(LinearVelocityDirectionConstraint),
    LinearVelocityMaxMagnitude(LinearVelocityMaxMagnitudeConstraint),
    PointAt(PointAtConstraint),
    HalfPlane(HalfPlaneConstraint),
    PoseEquality(PoseEqualityConstraint),
    TranslationEquality(TranslationEqualityConstraint),
}

impl ConstraintType for Constraint {
    fn apply(&self, problem: &mut OptimizationProblem, state: &SampleState) {
        match self {
            Constraint::AngularVelocityMaxMagnitude(c) => c.apply(problem, state),
            Constraint::KeepInCircle(c) => c.apply(problem, state),
            Constraint::KeepOutCircle(c) => c.apply(problem, state),
            Constraint::Lane(c) => c.apply(problem, state),
            Constraint::LinearAccelerationMaxMagnitude(c) => c.apply(problem, state),
            Constraint::LinearVelocityDirection(c) => c.apply(problem, state),
            Constraint::LinearVelocityMaxMagnitude(c) => c.apply(problem, state),
            Constraint::PointAt(c) => c.apply(problem, state),
            Constraint::HalfPlane(c) => c.apply(problem, state),
            Constraint::PoseEquality(c) => c.apply(problem, state),
            Constraint::TranslationEquality(c) => c.apply(problem, state),
        }
    }
}

macro_rules! impl_from_constraint {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Constraint {
                fn from(constraint: $ty) -> Self {
                    Constraint::$variant(constraint)
                }
            }
        )*
    };
}

impl_from_constraint! {
    AngularVelocityMaxMagnitude => AngularVelocityMaxMagnitudeConstraint,
    KeepInCircle => KeepInCircleConstraint,
    KeepOutCircle => KeepOutCircleConstraint,
    Lane => LaneConstraint,
    LinearAccelerationMaxMagnitude => LinearAccelerationMaxMagnitudeConstraint,
    LinearVelocityDirection => LinearVelocityDirectionConstraint,
    LinearVelocityMaxMagnitude => LinearVelocityMaxMagnitudeConstraint,
    PointAt => PointAtConstraint,
    HalfPlane => HalfPlaneConstraint,
    PoseEquality => PoseEqualityConstraint,
    TranslationEquality => TranslationEqualityConstraint,
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::SampleState;
    use crate::geometry::{HPolytope2d, Pose2v, Translation2};
    use crate::optimization::{OptimizationProblem, Variable};

    /// Sample state whose every component is a free decision variable
    pub(crate) struct FreeSample {
        pub x: Variable,
        pub y: Variable,
        pub theta: Variable,
        pub vx: Variable,
        pub vy: Variable,
        pub omega: Variable,
        pub ax: Variable,
        pub ay: Variable,
        pub state: SampleState,
    }

    impl FreeSample {
        pub(crate) fn new(problem: &mut OptimizationProblem) -> Self {
            let vars = problem.decision_variables(9);
            let [x, y, theta, vx, vy, omega, ax, ay, alpha]: [Variable; 9] = vars.try_into().unwrap();
            let pose = Pose2v::from_xy_heading(x.clone(), y.clone(), theta.clone());
            let robot_region = HPolytope2d::bumpers(0.5, 0.5, 0.5, 0.5).rotate_by(pose.rotation());
            let state = SampleState {
                pose,
                robot_region,
                linear_velocity: Translation2::new(vx.clone(), vy.clone()),
                angular_velocity: omega.clone(),
                linear_acceleration: Translation2::new(ax.clone(), ay.clone()),
                angular_acceleration: alpha,
            };
            FreeSample {
                x,
                y,
                theta,
                vx,
                vy,
                omega,
                ax,
                ay,
                state,
            }
        }

        pub(crate) fn set_pose(&self, x: f64, y: f64, theta: f64) {
            self.x.set_value(x);
            self.y.set_value(y);
            self.theta.set_value(theta);
        }

        pub(crate) fn set_velocity(&self, vx: f64, vy: f64, omega: f64) {
            self.vx.set_value(vx);
            self.vy.set_value(vy);
            self.omega.set_value(omega);
        }

        pub(crate) fn set_acceleration(&self, ax: f64, ay: f64) {
            self.ax.set_value(ax);
            self.ay.set_value(ay);
        }
    }
}
