//! Waypoints and the assembled path handed to a generator

use thiserror::Error;

use super::{DifferentialDrivetrain, DifferentialSolution};
use crate::constraint::Constraint;
use crate::geometry::{HPolytope2d, Pose2d};

/// Receives a solution snapshot and the caller's handle during a solve
pub type ProgressCallback = Box<dyn FnMut(&DifferentialSolution, i64)>;

/// Structural problems with a path
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path has no waypoints")]
    NoWaypoints,
    #[error("expected {expected} control interval counts, got {actual}")]
    IntervalCountMismatch { expected: usize, actual: usize },
    #[error("waypoint {0} has no initial guess point")]
    MissingInitialGuess(usize),
}

/// A waypoint and the constraints attached to it
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    /// Guess poses for the segment ending here; the last one is this waypoint's
    pub initial_guess_points: Vec<Pose2d>,
    /// Applied at this waypoint's sample
    pub waypoint_constraints: Vec<Constraint>,
    /// Applied at every sample of the segment ending at this waypoint
    pub segment_constraints: Vec<Constraint>,
}

impl Default for Waypoint {
    fn default() -> Self {
        Waypoint {
            initial_guess_points: vec![Pose2d::default()],
            waypoint_constraints: Vec::new(),
            segment_constraints: Vec::new(),
        }
    }
}

/// Everything a generator needs: drivetrain, footprint, waypoints and sampling
pub struct DifferentialPath {
    pub drivetrain: DifferentialDrivetrain,
    /// Robot footprint in the robot frame
    pub bumpers: Option<HPolytope2d>,
    pub waypoints: Vec<Waypoint>,
    /// Entry i is the sample count of the segment ending at waypoint i + 1
    pub control_interval_counts: Vec<usize>,
    pub callbacks: Vec<ProgressCallback>,
}

impl DifferentialPath {
    pub fn num_segments(&self) -> usize {
        self.waypoints.len().saturating_sub(1)
    }

    pub fn num_samples(&self) -> usize {
        self.control_interval_counts.iter().sum::<usize>() + 1
    }

    pub fn validate(&self) -> Result<(), PathError> {
        if self.waypoints.is_empty() {
            return Err(PathError::NoWaypoints);
        }
        if self.control_interval_counts.len() != self.num_segments() {
            return Err(PathError::IntervalCountMismatch {
                expected: self.num_segments(),
                actual: self.control_interval_counts.len(),
            });
        }
        if let Some(index) = self.waypoints.iter().position(|w| w.initial_guess_points.is_empty()) {
            return Err(PathError::MissingInitialGuess(index));
        }
        Ok(())
    }
}

impl std::fmt::Debug for DifferentialPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DifferentialPath")
            .field("drivetrain", &self.drivetrain)
            .field("bumpers", &self.bumpers)
            .field("waypoints", &self.waypoints)
            .field("control_interval_counts", &self.control_interval_counts)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}
