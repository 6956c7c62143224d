//! Trajectory generation for differential-drive robots
//!
//! A [`DifferentialPathBuilder`] collects waypoints, constraints and sample
//! counts; a [`DifferentialTrajectoryGenerator`] turns them into a
//! time-optimal [`DifferentialSolution`], which converts into a sampled
//! [`DifferentialTrajectory`].

pub mod builder;
pub mod cancellation;
pub mod drivetrain;
pub mod generator;
pub mod initial_guess;
pub mod path;
pub mod sample;
pub mod solution;

pub use builder::DifferentialPathBuilder;
pub use cancellation::CancellationToken;
pub use drivetrain::DifferentialDrivetrain;
pub use generator::{DifferentialTrajectoryGenerator, GENERATION_TOLERANCE};
pub use path::{DifferentialPath, PathError, ProgressCallback, Waypoint};
pub use sample::{
    ChassisSpeeds, DifferentialSample, DifferentialTrajectory, EventMarker, FieldFlip, FieldSymmetry,
};
pub use solution::{sample_index, DifferentialSolution};
