use approx::assert_abs_diff_eq;

use prometheus_trajopt::constraint::{AngularVelocityMaxMagnitudeConstraint, LinearVelocityMaxMagnitudeConstraint};
use prometheus_trajopt::trajectory::initial_guess::trapezoidal_time;
use prometheus_trajopt::{
    DifferentialDrivetrain, DifferentialPathBuilder, DifferentialTrajectory, DifferentialTrajectoryGenerator,
    SolverExitCondition,
};

/// Rest-to-rest drive between the given waypoints along the x axis
fn rest_to_rest(xs: &[f64], counts: Vec<usize>) -> DifferentialPathBuilder {
    let mut builder = DifferentialPathBuilder::new();
    for (index, &x) in xs.iter().enumerate() {
        builder.pose_wpt(index, x, 0.0, 0.0);
    }
    let last = xs.len() - 1;
    for index in [0, last] {
        builder.wpt_constraint(index, LinearVelocityMaxMagnitudeConstraint::new(0.0));
        builder.wpt_constraint(index, AngularVelocityMaxMagnitudeConstraint::new(0.0));
    }
    builder.set_control_interval_counts(counts);
    builder
}

fn expected_time(distance: f64) -> f64 {
    let drivetrain = DifferentialDrivetrain::default();
    trapezoidal_time(
        distance,
        drivetrain.max_wheel_velocity(),
        drivetrain.max_linear_acceleration(),
    )
}

#[test]
fn test_straight_line_is_time_optimal() {
    let mut generator = DifferentialTrajectoryGenerator::new(rest_to_rest(&[0.0, 1.0], vec![12]), 0).unwrap();
    let solution = generator.generate(false).unwrap();

    assert_eq!(solution.num_samples(), 13);
    let expected = expected_time(1.0);
    assert!(
        (solution.total_time() - expected).abs() <= 0.1 * expected,
        "total time {} vs {}",
        solution.total_time(),
        expected
    );

    for k in [0, 12] {
        assert_abs_diff_eq!(solution.vl[k], 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(solution.vr[k], 0.0, epsilon = 1e-3);
    }
    assert_abs_diff_eq!(solution.x[12], 1.0, epsilon = 1e-3);
    assert_abs_diff_eq!(solution.y[12], 0.0, epsilon = 1e-3);

    let trajectory = DifferentialTrajectory::from_solution("straight", &solution);
    assert_abs_diff_eq!(trajectory.total_time(), solution.total_time(), epsilon = 1e-12);
    let midpoint = trajectory.sample_at(trajectory.total_time() / 2.0).unwrap();
    assert!(midpoint.chassis_speeds().vx > 0.0);
}

#[test]
fn test_cancellation_before_generate() {
    let mut generator = DifferentialTrajectoryGenerator::new(rest_to_rest(&[0.0, 1.0], vec![12]), 0).unwrap();
    let token = generator.cancellation_token();

    token.cancel();
    assert_eq!(generator.generate(false), Err(SolverExitCondition::CallbackRequestedStop));

    token.reset();
    let solution = generator.generate(false).unwrap();
    assert_abs_diff_eq!(solution.x[12], 1.0, epsilon = 1e-3);
}

#[test]
fn test_zero_sample_segment_is_absorbed() {
    let mut generator =
        DifferentialTrajectoryGenerator::new(rest_to_rest(&[0.0, 0.0, 1.0], vec![0, 12]), 0).unwrap();
    let solution = generator.generate(false).unwrap();

    assert_eq!(solution.num_samples(), 13);
    assert_eq!(solution.dt.len(), 12);
    let expected = expected_time(1.0);
    assert!((solution.total_time() - expected).abs() <= 0.1 * expected);
}
