pub mod common;
pub mod constraint;
pub mod geometry;
pub mod optimization;
pub mod trajectory;

pub use common::ConfigError;
pub use constraint::{Constraint, ConstraintType};
pub use geometry::{HPolytope2d, Pose2d, Rotation2d, Translation2d};
pub use optimization::{OptimizationProblem, SolverConfig, SolverExitCondition, SolverStatus, Variable};
pub use trajectory::{
    CancellationToken, DifferentialDrivetrain, DifferentialPathBuilder, DifferentialSolution,
    DifferentialTrajectory, DifferentialTrajectoryGenerator, FieldFlip, PathError,
};
