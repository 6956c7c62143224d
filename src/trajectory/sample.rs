//! Timestamped trajectory samples and time-based lookup

use std::f64::consts::PI;

use super::DifferentialSolution;
use crate::common::{angle_modulus, lerp};
use crate::geometry::Pose2d;

/// How the field maps onto itself between the two starting sides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSymmetry {
    /// Reflected across the centerline: x → L − x
    Mirrored,
    /// Rotated half a turn about the field center: (x, y) → (L − x, W − y)
    Rotational,
}

/// Maps field-frame states onto the opposite side of a field of the given size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldFlip {
    pub symmetry: FieldSymmetry,
    pub length: f64, // m along x
    pub width: f64,  // m along y
}

impl FieldFlip {
    /// Mirror across the line x = length / 2
    pub fn mirrored(length: f64) -> Self {
        FieldFlip {
            symmetry: FieldSymmetry::Mirrored,
            length,
            width: 0.0,
        }
    }

    /// Half turn about the field center
    pub fn rotational(length: f64, width: f64) -> Self {
        FieldFlip {
            symmetry: FieldSymmetry::Rotational,
            length,
            width,
        }
    }

    pub fn is_mirrored(&self) -> bool {
        self.symmetry == FieldSymmetry::Mirrored
    }

    pub fn flip_x(&self, x: f64) -> f64 {
        self.length - x
    }

    pub fn flip_y(&self, y: f64) -> f64 {
        match self.symmetry {
            FieldSymmetry::Mirrored => y,
            FieldSymmetry::Rotational => self.width - y,
        }
    }

    /// Headings are not wrapped, so flipping a continuous heading sequence keeps it continuous
    pub fn flip_heading(&self, heading: f64) -> f64 {
        match self.symmetry {
            FieldSymmetry::Mirrored => PI - heading,
            FieldSymmetry::Rotational => heading + PI,
        }
    }
}

/// Robot-relative chassis velocity
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChassisSpeeds {
    pub vx: f64,    // m/s forward
    pub vy: f64,    // m/s left, always zero for a differential drive
    pub omega: f64, // rad/s counter-clockwise
}

/// Robot state at one instant of a differential trajectory
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DifferentialSample {
    pub timestamp: f64, // s from trajectory start
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub vl: f64, // left wheel velocity
    pub vr: f64,
    pub omega: f64,
    pub al: f64, // left wheel acceleration
    pub ar: f64,
    pub fl: f64, // left wheel force
    pub fr: f64,
}

impl DifferentialSample {
    pub fn pose(&self) -> Pose2d {
        Pose2d::from_xy_heading(self.x, self.y, self.heading)
    }

    pub fn chassis_speeds(&self) -> ChassisSpeeds {
        ChassisSpeeds {
            vx: (self.vl + self.vr) / 2.0,
            vy: 0.0,
            omega: self.omega,
        }
    }

    /// State at time `t` between this sample and a later `end`.
    ///
    /// Heading follows the shorter arc from this sample's heading and is not
    /// wrapped, so it agrees with the stored headings at both ends.
    pub fn interpolate(&self, end: &DifferentialSample, t: f64) -> DifferentialSample {
        let scale = (t - self.timestamp) / (end.timestamp - self.timestamp);
        let turn = angle_modulus(end.heading - self.heading);
        DifferentialSample {
            timestamp: t,
            x: lerp(self.x, end.x, scale),
            y: lerp(self.y, end.y, scale),
            heading: self.heading + turn * scale,
            vl: lerp(self.vl, end.vl, scale),
            vr: lerp(self.vr, end.vr, scale),
            omega: lerp(self.omega, end.omega, scale),
            al: lerp(self.al, end.al, scale),
            ar: lerp(self.ar, end.ar, scale),
            fl: lerp(self.fl, end.fl, scale),
            fr: lerp(self.fr, end.fr, scale),
        }
    }

    /// This sample seen from the other side of the field.
    ///
    /// A mirror reverses the turning direction, so the wheels trade places
    /// and ω changes sign. A half turn leaves the robot-frame quantities alone.
    pub fn flipped(&self, flip: &FieldFlip) -> DifferentialSample {
        let position = DifferentialSample {
            x: flip.flip_x(self.x),
            y: flip.flip_y(self.y),
            heading: flip.flip_heading(self.heading),
            ..*self
        };
        if !flip.is_mirrored() {
            return position;
        }
        DifferentialSample {
            vl: self.vr,
            vr: self.vl,
            omega: -self.omega,
            al: self.ar,
            ar: self.al,
            fl: self.fr,
            fr: self.fl,
            ..position
        }
    }
}

/// A named event at a point in time
#[derive(Debug, Clone, PartialEq)]
pub struct EventMarker {
    pub timestamp: f64,
    pub event: String,
}

impl EventMarker {
    pub fn new(timestamp: f64, event: impl Into<String>) -> Self {
        EventMarker {
            timestamp,
            event: event.into(),
        }
    }

    /// Same event, shifted in time
    pub fn offset_by(&self, offset: f64) -> EventMarker {
        EventMarker::new(self.timestamp + offset, self.event.clone())
    }
}

/// A generated trajectory as a list of timestamped samples
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DifferentialTrajectory {
    pub name: String,
    pub samples: Vec<DifferentialSample>,
    /// Sample indices where the trajectory may be split into parts
    pub splits: Vec<usize>,
    pub events: Vec<EventMarker>,
}

impl DifferentialTrajectory {
    /// Timestamps the solution's samples by accumulating its timesteps
    pub fn from_solution(name: impl Into<String>, solution: &DifferentialSolution) -> Self {
        let samples = solution
            .timestamps()
            .into_iter()
            .enumerate()
            .map(|(i, timestamp)| DifferentialSample {
                timestamp,
                x: solution.x[i],
                y: solution.y[i],
                heading: solution.heading[i],
                vl: solution.vl[i],
                vr: solution.vr[i],
                omega: solution.omega[i],
                al: solution.al[i],
                ar: solution.ar[i],
                fl: solution.fl[i],
                fr: solution.fr[i],
            })
            .collect();
        DifferentialTrajectory {
            name: name.into(),
            samples,
            splits: vec![0],
            events: Vec::new(),
        }
    }

    /// Interpolated state at `timestamp`, clamped to the trajectory's time range
    pub fn sample_at(&self, timestamp: f64) -> Option<DifferentialSample> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;
        if self.samples.len() == 1 || timestamp < first.timestamp {
            return Some(*first);
        }
        if timestamp > last.timestamp {
            return Some(*last);
        }

        // First sample at or after `timestamp`
        let ahead = self.samples.partition_point(|s| s.timestamp < timestamp);
        if ahead == 0 {
            return Some(*first);
        }
        let behind = &self.samples[ahead - 1];
        let ahead = &self.samples[ahead];
        if ahead.timestamp - behind.timestamp < 1e-6 {
            return Some(*ahead);
        }
        Some(behind.interpolate(ahead, timestamp))
    }

    /// [`sample_at`](Self::sample_at) on the other side of the field
    pub fn sample_at_flipped(&self, timestamp: f64, flip: &FieldFlip) -> Option<DifferentialSample> {
        self.sample_at(timestamp).map(|sample| sample.flipped(flip))
    }

    pub fn initial_pose(&self) -> Option<Pose2d> {
        self.samples.first().map(DifferentialSample::pose)
    }

    pub fn initial_pose_flipped(&self, flip: &FieldFlip) -> Option<Pose2d> {
        self.samples.first().map(|sample| sample.flipped(flip).pose())
    }

    pub fn final_pose(&self) -> Option<Pose2d> {
        self.samples.last().map(DifferentialSample::pose)
    }

    pub fn final_pose_flipped(&self, flip: &FieldFlip) -> Option<Pose2d> {
        self.samples.last().map(|sample| sample.flipped(flip).pose())
    }

    /// Timestamp of the last sample, zero when empty
    pub fn total_time(&self) -> f64 {
        self.samples.last().map_or(0.0, |s| s.timestamp)
    }

    pub fn poses(&self) -> Vec<Pose2d> {
        self.samples.iter().map(DifferentialSample::pose).collect()
    }

    /// Every sample flipped; name, splits and events are kept
    pub fn flipped(&self, flip: &FieldFlip) -> DifferentialTrajectory {
        DifferentialTrajectory {
            name: self.name.clone(),
            samples: self.samples.iter().map(|sample| sample.flipped(flip)).collect(),
            splits: self.splits.clone(),
            events: self.events.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn solution() -> DifferentialSolution {
        DifferentialSolution {
            dt: vec![0.5, 0.5],
            x: vec![0.0, 1.0, 2.0],
            y: vec![0.0, 0.0, 1.0],
            heading: vec![0.0, 0.2, 0.4],
            vl: vec![0.0, 2.0, 0.0],
            vr: vec![0.0, 2.0, 1.0],
            omega: vec![0.0, 0.0, 1.0],
            al: vec![4.0, 0.0, -4.0],
            ar: vec![4.0, 0.0, -2.0],
            fl: vec![1.0, 0.0, -1.0],
            fr: vec![1.0, 0.0, -0.5],
        }
    }

    #[test]
    fn test_from_solution_timestamps() {
        let trajectory = DifferentialTrajectory::from_solution("test", &solution());
        assert_eq!(trajectory.name, "test");
        assert_eq!(trajectory.samples.len(), 3);
        assert_eq!(trajectory.samples[2].timestamp, 1.0);
        assert_eq!(trajectory.total_time(), 1.0);
        assert_eq!(trajectory.splits, vec![0]);
        assert_eq!(trajectory.final_pose(), Some(Pose2d::from_xy_heading(2.0, 1.0, 0.4)));
    }

    #[test]
    fn test_sample_at_interpolates() {
        let trajectory = DifferentialTrajectory::from_solution("test", &solution());
        let sample = trajectory.sample_at(0.75).unwrap();
        assert_relative_eq!(sample.timestamp, 0.75);
        assert_relative_eq!(sample.x, 1.5);
        assert_relative_eq!(sample.y, 0.5);
        assert_relative_eq!(sample.heading, 0.3, epsilon = 1e-12);
        assert_relative_eq!(sample.vr, 1.5);
        assert_relative_eq!(sample.fr, -0.25);

        let exact = trajectory.sample_at(0.5).unwrap();
        assert_relative_eq!(exact.x, 1.0);
        assert_relative_eq!(exact.heading, 0.2, epsilon = 1e-12);
        assert_relative_eq!(exact.vl, 2.0);
    }

    #[test]
    fn test_sample_at_clamps() {
        let trajectory = DifferentialTrajectory::from_solution("test", &solution());
        assert_eq!(trajectory.sample_at(-1.0), Some(trajectory.samples[0]));
        assert_eq!(trajectory.sample_at(5.0), Some(trajectory.samples[2]));
        assert_eq!(DifferentialTrajectory::default().sample_at(0.0), None);
    }

    #[test]
    fn test_coincident_samples_return_later() {
        let mut trajectory = DifferentialTrajectory::from_solution("test", &solution());
        trajectory.samples[2].timestamp = 0.5 + 1e-7;
        let sample = trajectory.sample_at(0.5 + 5e-8).unwrap();
        assert_eq!(sample, trajectory.samples[2]);
    }

    #[test]
    fn test_heading_takes_short_arc() {
        let start = DifferentialSample {
            heading: PI - 0.1,
            ..Default::default()
        };
        let end = DifferentialSample {
            timestamp: 1.0,
            heading: -PI + 0.1,
            ..Default::default()
        };
        let mid = start.interpolate(&end, 0.5);
        assert_relative_eq!(mid.heading, PI, epsilon = 1e-12);
    }

    #[test]
    fn test_heading_is_continuous_past_half_turn() {
        // A robot spinning past π keeps an unwrapped heading
        let mut solution = solution();
        solution.heading = vec![3.0, 3.3, 3.6];
        let trajectory = DifferentialTrajectory::from_solution("spin", &solution);

        let before = trajectory.sample_at(0.5 - 1e-4).unwrap();
        let exact = trajectory.sample_at(0.5).unwrap();
        let after = trajectory.sample_at(0.5 + 1e-4).unwrap();
        assert_relative_eq!(exact.heading, 3.3, epsilon = 1e-12);
        assert!((before.heading - exact.heading).abs() < 1e-3);
        assert!((after.heading - exact.heading).abs() < 1e-3);
        assert_relative_eq!(trajectory.sample_at(0.75).unwrap().heading, 3.45, epsilon = 1e-12);
        assert_relative_eq!(trajectory.sample_at(9.0).unwrap().heading, 3.6);
    }

    #[test]
    fn test_mirror_swaps_wheels() {
        let flip = FieldFlip::mirrored(16.0);
        let trajectory = DifferentialTrajectory::from_solution("test", &solution());
        let sample = trajectory.samples[2].flipped(&flip);

        assert_eq!(sample.timestamp, 1.0);
        assert_relative_eq!(sample.x, 14.0);
        assert_relative_eq!(sample.y, 1.0);
        assert_relative_eq!(sample.heading, PI - 0.4);
        assert_eq!((sample.vl, sample.vr), (1.0, 0.0));
        assert_eq!(sample.omega, -1.0);
        assert_eq!((sample.al, sample.ar), (-2.0, -4.0));
        assert_eq!((sample.fl, sample.fr), (-0.5, -1.0));
        // Still a valid differential drive state: ω keeps the sign of vr − vl
        assert!((sample.vr - sample.vl) * sample.omega > 0.0);
    }

    #[test]
    fn test_rotation_keeps_wheels() {
        let flip = FieldFlip::rotational(16.0, 8.0);
        let original = DifferentialTrajectory::from_solution("test", &solution()).samples[2];
        let sample = original.flipped(&flip);

        assert_relative_eq!(sample.x, 14.0);
        assert_relative_eq!(sample.y, 7.0);
        assert_relative_eq!(sample.heading, 0.4 + PI);
        assert_eq!((sample.vl, sample.vr, sample.omega), (original.vl, original.vr, original.omega));
        assert_eq!((sample.fl, sample.fr), (original.fl, original.fr));
    }

    #[test]
    fn test_flipping_twice_restores_poses() {
        let trajectory = DifferentialTrajectory::from_solution("test", &solution());
        for flip in [FieldFlip::mirrored(16.0), FieldFlip::rotational(16.0, 8.0)] {
            let twice = trajectory.flipped(&flip).flipped(&flip);
            for (a, b) in twice.samples.iter().zip(&trajectory.samples) {
                assert_relative_eq!(a.x, b.x, epsilon = 1e-12);
                assert_relative_eq!(a.y, b.y, epsilon = 1e-12);
                assert_relative_eq!(angle_modulus(a.heading - b.heading), 0.0, epsilon = 1e-12);
                assert_eq!((a.vl, a.vr, a.omega), (b.vl, b.vr, b.omega));
            }
        }
    }

    #[test]
    fn test_flipped_lookups() {
        let flip = FieldFlip::mirrored(16.0);
        let mut trajectory = DifferentialTrajectory::from_solution("test", &solution());
        trajectory.events.push(EventMarker::new(0.5, "intake"));
        let flipped = trajectory.flipped(&flip);

        assert_eq!(flipped.name, "test");
        assert_eq!(flipped.splits, trajectory.splits);
        assert_eq!(flipped.events, trajectory.events);
        let direct = trajectory.sample_at_flipped(0.75, &flip).unwrap();
        let from_flipped = flipped.sample_at(0.75).unwrap();
        assert_relative_eq!(direct.x, from_flipped.x, epsilon = 1e-12);
        assert_relative_eq!(direct.heading, from_flipped.heading, epsilon = 1e-12);
        assert_relative_eq!(direct.vl, from_flipped.vl, epsilon = 1e-12);
        assert_eq!(trajectory.initial_pose_flipped(&flip), flipped.initial_pose());
        assert_eq!(trajectory.final_pose_flipped(&flip), flipped.final_pose());
        assert_eq!(DifferentialTrajectory::default().final_pose_flipped(&flip), None);
    }

    #[test]
    fn test_chassis_speeds() {
        let sample = DifferentialSample {
            vl: 1.0,
            vr: 3.0,
            omega: 0.5,
            ..Default::default()
        };
        assert_eq!(
            sample.chassis_speeds(),
            ChassisSpeeds {
                vx: 2.0,
                vy: 0.0,
                omega: 0.5
            }
        );
    }

    #[test]
    fn test_event_offset() {
        let marker = EventMarker::new(1.0, "intake");
        let shifted = marker.offset_by(0.5);
        assert_eq!(shifted.timestamp, 1.5);
        assert_eq!(shifted.event, "intake");
    }
}
