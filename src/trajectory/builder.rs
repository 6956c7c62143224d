//! Incremental construction of a differential path

use log::debug;

use super::initial_guess::calculate_initial_guess;
use super::path::{DifferentialPath, PathError, Waypoint};
use super::{DifferentialDrivetrain, DifferentialSolution};
use crate::constraint::{Constraint, PoseEqualityConstraint, TranslationEqualityConstraint};
use crate::geometry::{HPolytope2d, Pose2d};

/// Builds a [`DifferentialPath`] one waypoint at a time.
///
/// Waypoints are created on demand: referencing index 3 on an empty builder
/// creates waypoints 0 through 3. The builder is consumed by the generator.
pub struct DifferentialPathBuilder {
    path: DifferentialPath,
}

impl DifferentialPathBuilder {
    /// Create a builder with the default drivetrain and no waypoints
    pub fn new() -> Self {
        DifferentialPathBuilder {
            path: DifferentialPath {
                drivetrain: DifferentialDrivetrain::default(),
                bumpers: None,
                waypoints: Vec::new(),
                control_interval_counts: Vec::new(),
                callbacks: Vec::new(),
            },
        }
    }

    pub fn set_drivetrain(&mut self, drivetrain: DifferentialDrivetrain) {
        self.path.drivetrain = drivetrain;
    }

    pub fn drivetrain(&self) -> &DifferentialDrivetrain {
        &self.path.drivetrain
    }

    /// Rectangular footprint, given as distances from the robot center
    pub fn set_bumpers(&mut self, front: f64, left: f64, right: f64, back: f64) {
        self.path.bumpers = Some(HPolytope2d::bumpers(front, left, right, back));
    }

    /// Pin waypoint `index` to a full pose
    pub fn pose_wpt(&mut self, index: usize, x: f64, y: f64, heading: f64) {
        self.wpt_constraint(index, PoseEqualityConstraint::new(x, y, heading));
        self.wpt_initial_guess_point(index, Pose2d::from_xy_heading(x, y, heading));
    }

    /// Pin waypoint `index` to a position; `heading_guess` only seeds the solver
    pub fn translation_wpt(&mut self, index: usize, x: f64, y: f64, heading_guess: f64) {
        self.wpt_constraint(index, TranslationEqualityConstraint::new(x, y));
        self.wpt_initial_guess_point(index, Pose2d::from_xy_heading(x, y, heading_guess));
    }

    /// Replace the guessed pose of waypoint `index`
    pub fn wpt_initial_guess_point(&mut self, index: usize, pose: Pose2d) {
        let waypoint = self.waypoint_mut(index);
        match waypoint.initial_guess_points.last_mut() {
            Some(last) => *last = pose,
            None => waypoint.initial_guess_points.push(pose),
        }
    }

    /// Intermediate guess poses for the segment starting at waypoint `from_index`
    pub fn sgmt_initial_guess_points(&mut self, from_index: usize, poses: &[Pose2d]) {
        let waypoint = self.waypoint_mut(from_index + 1);
        let at = waypoint.initial_guess_points.len().saturating_sub(1);
        for (offset, pose) in poses.iter().enumerate() {
            waypoint.initial_guess_points.insert(at + offset, pose.clone());
        }
    }

    pub fn wpt_constraint(&mut self, index: usize, constraint: impl Into<Constraint>) {
        let constraint = constraint.into();
        debug!("waypoint {} constraint: {:?}", index, constraint);
        self.waypoint_mut(index).waypoint_constraints.push(constraint);
    }

    /// Apply `constraint` along every segment between waypoints `from_index` and `to_index`
    pub fn sgmt_constraint(&mut self, from_index: usize, to_index: usize, constraint: impl Into<Constraint>) {
        let constraint = constraint.into();
        debug!("segment {}..{} constraint: {:?}", from_index, to_index, constraint);
        for index in from_index + 1..=to_index {
            self.waypoint_mut(index).segment_constraints.push(constraint.clone());
        }
    }

    /// Sample counts per segment; entry i covers waypoint i to i + 1
    pub fn set_control_interval_counts(&mut self, counts: Vec<usize>) {
        self.path.control_interval_counts = counts;
    }

    pub fn control_interval_counts(&self) -> &[usize] {
        &self.path.control_interval_counts
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.path.waypoints
    }

    /// Register a consumer of progress snapshots
    pub fn add_progress_callback(&mut self, callback: impl FnMut(&DifferentialSolution, i64) + 'static) {
        self.path.callbacks.push(Box::new(callback));
    }

    /// Seed trajectory from the current waypoints and drivetrain
    pub fn calculate_initial_guess(&self) -> Result<DifferentialSolution, PathError> {
        self.path.validate()?;
        Ok(calculate_initial_guess(
            &self.path.drivetrain,
            &self.path.waypoints,
            &self.path.control_interval_counts,
        ))
    }

    pub fn path(&self) -> &DifferentialPath {
        &self.path
    }

    pub fn into_path(self) -> DifferentialPath {
        self.path
    }

    fn waypoint_mut(&mut self, index: usize) -> &mut Waypoint {
        if index >= self.path.waypoints.len() {
            self.path.waypoints.resize_with(index + 1, Waypoint::default);
        }
        &mut self.path.waypoints[index]
    }
}

impl Default for DifferentialPathBuilder {
    fn default() -> Self {
        Self::new()
    }
}
