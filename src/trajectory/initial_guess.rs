//! Seed trajectory for the solver.
//!
//! Positions and headings are interpolated linearly between the waypoints'
//! guess points. Each segment's duration is estimated from trapezoidal
//! velocity profiles: first the time to turn through the heading change, then
//! the time to drive the straight-line distance with the linear speed capped
//! so the drive does not outpace the turn. Velocities and accelerations are
//! finite differences of consecutive samples.

use log::debug;

use super::path::Waypoint;
use super::solution::sample_index;
use super::{DifferentialDrivetrain, DifferentialSolution};
use crate::common::{angle_linspace, angle_modulus, linspace};

/// Seed duration of a segment whose endpoints coincide, in seconds
const MIN_SEGMENT_TIME: f64 = 0.1;

/// Time to travel `distance` from rest to rest under velocity and acceleration limits
pub fn trapezoidal_time(distance: f64, velocity: f64, acceleration: f64) -> f64 {
    if distance == 0.0 {
        return 0.0;
    }
    // Distance spent accelerating to `velocity` and braking back to rest
    let ramp_distance = velocity * velocity / acceleration;
    if distance <= ramp_distance {
        2.0 * (distance / acceleration).sqrt()
    } else {
        2.0 * velocity / acceleration + (distance - ramp_distance) / velocity
    }
}

/// Samples interpolated between guess points; only x, y and heading are filled
pub fn linear_initial_guess(waypoints: &[Waypoint], counts: &[usize]) -> DifferentialSolution {
    let mut guess = DifferentialSolution::default();
    let Some(start) = waypoints.first().and_then(|w| w.initial_guess_points.last()) else {
        return guess;
    };
    guess.x.push(*start.x());
    guess.y.push(*start.y());
    guess.heading.push(start.heading());

    for (waypoint, &count) in waypoints.iter().skip(1).zip(counts) {
        let points = &waypoint.initial_guess_points;
        if points.is_empty() {
            continue;
        }
        let per_point = count / points.len();
        for (j, point) in points.iter().enumerate() {
            // The last guess point absorbs the remainder
            let samples = if j + 1 == points.len() {
                count - per_point * (points.len() - 1)
            } else {
                per_point
            };
            let (x0, y0, h0) = match (guess.x.last(), guess.y.last(), guess.heading.last()) {
                (Some(&x), Some(&y), Some(&h)) => (x, y, h),
                _ => continue,
            };
            guess.x.extend(linspace(x0, *point.x(), samples));
            guess.y.extend(linspace(y0, *point.y(), samples));
            guess.heading.extend(angle_linspace(h0, point.heading(), samples));
        }
    }
    guess
}

/// Estimated timestep of every segment; zero for segments without samples.
///
/// A segment with samples but no distance or turn to cover is seeded with
/// a 0.1 s duration so every interval starts with a positive timestep.
pub fn segment_timesteps(guess: &DifferentialSolution, counts: &[usize], drivetrain: &DifferentialDrivetrain) -> Vec<f64> {
    let max_velocity = drivetrain.max_wheel_velocity();
    let max_acceleration = drivetrain.max_linear_acceleration();
    let max_angular_velocity = drivetrain.max_angular_velocity();
    let max_angular_acceleration = drivetrain.max_angular_acceleration();

    (0..counts.len())
        .map(|segment| {
            let count = counts[segment];
            if count == 0 {
                return 0.0;
            }
            let start = sample_index(counts, segment, 0);
            let end = sample_index(counts, segment + 1, 0);
            let distance = (guess.x[end] - guess.x[start]).hypot(guess.y[end] - guess.y[start]);
            let turn = angle_modulus(guess.heading[end] - guess.heading[start]).abs();

            let angular_time = trapezoidal_time(turn, max_angular_velocity, max_angular_acceleration);
            let velocity_cap = if angular_time > 0.0 {
                max_velocity.min(distance / angular_time)
            } else {
                max_velocity
            };
            let linear_time = trapezoidal_time(distance, velocity_cap, max_acceleration);
            let duration = angular_time + linear_time;
            if duration > 0.0 {
                duration / count as f64
            } else {
                MIN_SEGMENT_TIME / count as f64
            }
        })
        .collect()
}

/// Fills wheel velocities and accelerations by finite differences over `dt`.
///
/// The first sample starts at rest, and zero-length intervals leave zeros.
pub fn finite_difference_kinematics(guess: &mut DifferentialSolution, trackwidth: f64) {
    let n = guess.num_samples();
    for values in [
        &mut guess.vl,
        &mut guess.vr,
        &mut guess.omega,
        &mut guess.al,
        &mut guess.ar,
        &mut guess.fl,
        &mut guess.fr,
    ] {
        values.clear();
        values.resize(n, 0.0);
    }

    for k in 1..n {
        let dt = guess.dt[k - 1];
        if dt <= 0.0 {
            continue;
        }
        let linear = (guess.x[k] - guess.x[k - 1]).hypot(guess.y[k] - guess.y[k - 1]) / dt;
        let angular = angle_modulus(guess.heading[k] - guess.heading[k - 1]) / dt;
        guess.omega[k] = angular;
        guess.vl[k] = linear - trackwidth / 2.0 * angular;
        guess.vr[k] = linear + trackwidth / 2.0 * angular;
        guess.al[k] = (guess.vl[k] - guess.vl[k - 1]) / dt;
        guess.ar[k] = (guess.vr[k] - guess.vr[k - 1]) / dt;
    }
}

/// Complete seed: interpolated poses, heuristic timesteps, finite-differenced kinematics
pub fn calculate_initial_guess(
    drivetrain: &DifferentialDrivetrain,
    waypoints: &[Waypoint],
    counts: &[usize],
) -> DifferentialSolution {
    let mut guess = linear_initial_guess(waypoints, counts);
    let timesteps = segment_timesteps(&guess, counts, drivetrain);
    guess.dt = counts
        .iter()
        .zip(&timesteps)
        .flat_map(|(&count, &dt)| std::iter::repeat(dt).take(count))
        .collect();
    finite_difference_kinematics(&mut guess, drivetrain.trackwidth);
    debug!(
        "initial guess: {} samples, estimated duration {:.3} s",
        guess.num_samples(),
        guess.total_time()
    );
    guess
}
