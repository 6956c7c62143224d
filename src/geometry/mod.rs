//! Planar geometry over numeric and symbolic scalars

mod polytope;
mod pose;
mod rotation;
mod scalar;
mod translation;

pub use polytope::{HPolytope2, HPolytope2d, HPolytope2v};
pub use pose::{Pose2, Pose2d, Pose2v};
pub use rotation::{Rotation2, Rotation2d, Rotation2v};
pub use scalar::Scalar;
pub use translation::{Translation2, Translation2d, Translation2v};
