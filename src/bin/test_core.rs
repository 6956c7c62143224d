use std::collections::HashMap;

use anyhow::{Context, Result};
use log::info;

use prometheus_trajopt::constraint::{
    AngularVelocityMaxMagnitudeConstraint, KeepOutCircleConstraint, LinearVelocityMaxMagnitudeConstraint,
};
use prometheus_trajopt::{
    DifferentialPathBuilder, DifferentialTrajectory, DifferentialTrajectoryGenerator, FieldFlip, Translation2d,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("Generating a differential-drive trajectory...");

    let mut builder = DifferentialPathBuilder::new();

    // Tune the drivetrain the same way a deployment would
    let mut drivetrain = builder.drivetrain().clone();
    let mut params = HashMap::new();
    params.insert("mass".to_string(), 40.0);
    params.insert("wheel_max_torque".to_string(), 1.8);
    drivetrain.configure(&params).context("invalid drivetrain parameters")?;
    builder.set_drivetrain(drivetrain);
    builder.set_bumpers(0.35, 0.3, 0.3, 0.35);

    builder.pose_wpt(0, 0.0, 0.0, 0.0);
    builder.translation_wpt(1, 2.0, 1.0, 0.5);
    builder.pose_wpt(2, 4.0, 1.0, 0.0);
    builder.set_control_interval_counts(vec![20, 20]);

    // Start and end at rest
    for index in [0, 2] {
        builder.wpt_constraint(index, LinearVelocityMaxMagnitudeConstraint::new(0.0));
        builder.wpt_constraint(index, AngularVelocityMaxMagnitudeConstraint::new(0.0));
    }
    builder.sgmt_constraint(0, 2, KeepOutCircleConstraint::new(Translation2d::new(2.0, -0.2), 0.4));

    builder.add_progress_callback(|solution, handle| {
        info!("[{}] progress: {:.3} s", handle, solution.total_time());
    });

    let mut generator = DifferentialTrajectoryGenerator::new(builder, 1).context("invalid path")?;
    let solution = generator
        .generate(false)
        .map_err(|exit| anyhow::anyhow!("generation failed ({}): {}", exit.code(), exit))?;

    let trajectory = DifferentialTrajectory::from_solution("demo", &solution);
    println!("Trajectory '{}' with {} samples", trajectory.name, trajectory.samples.len());
    println!("Total time: {:.3} s", trajectory.total_time());
    if let (Some(start), Some(end)) = (trajectory.initial_pose(), trajectory.final_pose()) {
        println!("Start: ({:.3}, {:.3}, {:.3})", start.x(), start.y(), start.heading());
        println!("End:   ({:.3}, {:.3}, {:.3})", end.x(), end.y(), end.heading());
    }
    if let Some(midpoint) = trajectory.sample_at(trajectory.total_time() / 2.0) {
        let speeds = midpoint.chassis_speeds();
        println!("Midpoint speed: linear={:.3} m/s, angular={:.3} rad/s", speeds.vx, speeds.omega);
    }

    // Same run from the other side of a 16.5 m field
    if let Some(end) = trajectory.final_pose_flipped(&FieldFlip::mirrored(16.5)) {
        println!("Mirrored end: ({:.3}, {:.3}, {:.3})", end.x(), end.y(), end.heading());
    }

    Ok(())
}
