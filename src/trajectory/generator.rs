//! Differential-drive trajectory generator.
//!
//! Physics notation:
//!
//! ```text
//! x, y   position          θ  heading
//! vₗ, vᵣ wheel velocity    aₗ, aᵣ wheel acceleration
//! Fₗ, Fᵣ wheel force       dt timestep
//! ```
//!
//! Dynamics, with r_b = trackwidth / 2:
//!
//! ```text
//! dx/dt  = v cos θ          v = (vₗ + vᵣ) / 2
//! dy/dt  = v sin θ
//! dθ/dt  = (vᵣ − vₗ) / trackwidth
//! dvₗ/dt = (1/m + r_b²/J) Fₗ + (1/m − r_b²/J) Fᵣ
//! dvᵣ/dt = (1/m − r_b²/J) Fₗ + (1/m + r_b²/J) Fᵣ
//! ```
//!
//! Consecutive samples of a segment are linked by Hermite–Simpson
//! collocation, and the objective is total time Σ dtₛ·Nₛ.

use std::time::{Duration, Instant};

use log::{info, warn};

use super::initial_guess::calculate_initial_guess;
use super::path::{DifferentialPath, PathError, ProgressCallback};
use super::solution::sample_index;
use super::{CancellationToken, DifferentialDrivetrain, DifferentialPathBuilder, DifferentialSolution};
use crate::constraint::{ConstraintType, SampleState};
use crate::geometry::{HPolytope2d, Pose2v, Translation2};
use crate::optimization::{eq, ge, le, OptimizationProblem, SolverConfig, SolverExitCondition, Variable};

/// Solver tolerance used by [`DifferentialTrajectoryGenerator::generate`] (0.1 mm)
pub const GENERATION_TOLERANCE: f64 = 1e-4;

/// Progress snapshots are published at most this often
const PROGRESS_FRAME_PERIOD: Duration = Duration::from_micros(1_000_000 / 60);

/// Handles to the decision variables, read back into a [`DifferentialSolution`]
#[derive(Clone)]
struct SolutionVariables {
    x: Vec<Variable>,
    y: Vec<Variable>,
    theta: Vec<Variable>,
    vl: Vec<Variable>,
    vr: Vec<Variable>,
    al: Vec<Variable>,
    ar: Vec<Variable>,
    fl: Vec<Variable>,
    fr: Vec<Variable>,
    dts: Vec<Variable>,
    counts: Vec<usize>,
    trackwidth: f64,
}

impl SolutionVariables {
    fn allocate(problem: &mut OptimizationProblem, counts: &[usize], trackwidth: f64) -> Self {
        let samples = counts.iter().sum::<usize>() + 1;
        SolutionVariables {
            x: problem.decision_variables(samples),
            y: problem.decision_variables(samples),
            theta: problem.decision_variables(samples),
            vl: problem.decision_variables(samples),
            vr: problem.decision_variables(samples),
            al: problem.decision_variables(samples),
            ar: problem.decision_variables(samples),
            fl: problem.decision_variables(samples),
            fr: problem.decision_variables(samples),
            dts: problem.decision_variables(counts.len()),
            counts: counts.to_vec(),
            trackwidth,
        }
    }

    fn num_samples(&self) -> usize {
        self.x.len()
    }

    fn materialize(&self) -> DifferentialSolution {
        let values = |vars: &[Variable]| vars.iter().map(Variable::value).collect::<Vec<_>>();
        let vl = values(&self.vl);
        let vr = values(&self.vr);
        let omega = vl.iter().zip(&vr).map(|(l, r)| (r - l) / self.trackwidth).collect();
        let dt = self
            .counts
            .iter()
            .zip(&self.dts)
            .flat_map(|(&count, dt)| std::iter::repeat(dt.value()).take(count))
            .collect();
        DifferentialSolution {
            dt,
            x: values(&self.x),
            y: values(&self.y),
            heading: values(&self.theta),
            vl,
            vr,
            omega,
            al: values(&self.al),
            ar: values(&self.ar),
            fl: values(&self.fl),
            fr: values(&self.fr),
        }
    }

    fn apply_initial_guess(&self, guess: &DifferentialSolution) {
        for k in 0..self.num_samples() {
            self.x[k].set_value(guess.x[k]);
            self.y[k].set_value(guess.y[k]);
            self.theta[k].set_value(guess.heading[k]);
            self.vl[k].set_value(guess.vl[k]);
            self.vr[k].set_value(guess.vr[k]);
            self.al[k].set_value(guess.al[k]);
            self.ar[k].set_value(guess.ar[k]);
        }
        for (segment, dt) in self.dts.iter().enumerate() {
            let value = if self.counts[segment] == 0 {
                0.0
            } else {
                guess.dt[sample_index(&self.counts, segment, 0)]
            };
            dt.set_value(value);
        }
    }

    /// Symbolic state of sample `k` as seen by constraints
    fn sample_state(&self, k: usize, bumpers: &HPolytope2d) -> SampleState {
        let pose = Pose2v::from_xy_heading(self.x[k].clone(), self.y[k].clone(), self.theta[k].clone());
        let robot_region = bumpers.rotate_by(pose.rotation());
        let heading = Translation2::new(pose.rotation().cos().clone(), pose.rotation().sin().clone());

        let v = (&self.vl[k] + &self.vr[k]) / 2.0;
        let a = (&self.al[k] + &self.ar[k]) / 2.0;
        SampleState {
            linear_velocity: heading.scaled(v),
            angular_velocity: (&self.vr[k] - &self.vl[k]) / self.trackwidth,
            linear_acceleration: heading.scaled(a),
            angular_acceleration: (&self.ar[k] - &self.al[k]) / self.trackwidth,
            pose,
            robot_region,
        }
    }
}

/// Continuous dynamics of a differential drive
struct Dynamics {
    trackwidth: f64,
    // Input matrix B, symmetric
    b_same: f64,
    b_cross: f64,
}

impl Dynamics {
    fn new(drivetrain: &DifferentialDrivetrain) -> Self {
        let r_b = drivetrain.trackwidth / 2.0;
        let inv_mass = 1.0 / drivetrain.mass;
        let turning = r_b * r_b / drivetrain.moi;
        Dynamics {
            trackwidth: drivetrain.trackwidth,
            b_same: inv_mass + turning,
            b_cross: inv_mass - turning,
        }
    }

    /// ẋ for state [x, y, θ, vₗ, vᵣ] and input [Fₗ, Fᵣ]
    fn derivative(&self, state: &[Variable; 5], input: &[Variable; 2]) -> [Variable; 5] {
        let [_, _, theta, vl, vr] = state;
        let [fl, fr] = input;
        let v = (vl + vr) / 2.0;
        [
            &v * theta.cos(),
            &v * theta.sin(),
            (vr - vl) / self.trackwidth,
            self.b_same * fl + self.b_cross * fr,
            self.b_cross * fl + self.b_same * fr,
        ]
    }
}

/// Generates time-optimal trajectories for a differential drive
pub struct DifferentialTrajectoryGenerator {
    problem: OptimizationProblem,
    variables: SolutionVariables,
    cancellation: CancellationToken,
}

impl DifferentialTrajectoryGenerator {
    /// Build the optimization problem for the builder's path.
    ///
    /// `handle` is passed unchanged to every progress callback.
    pub fn new(builder: DifferentialPathBuilder, handle: i64) -> Result<Self, PathError> {
        let path = builder.into_path();
        path.validate()?;
        let DifferentialPath {
            drivetrain,
            bumpers,
            waypoints,
            control_interval_counts: counts,
            callbacks,
        } = path;

        let initial_guess = calculate_initial_guess(&drivetrain, &waypoints, &counts);
        let bumpers = bumpers.unwrap_or_else(|| HPolytope2d::from_points(&[]));

        let mut problem = OptimizationProblem::new();
        let variables = SolutionVariables::allocate(&mut problem, &counts, drivetrain.trackwidth);
        let cancellation = CancellationToken::new();

        // Minimize total time
        let total_time: Variable = variables
            .dts
            .iter()
            .zip(&counts)
            .map(|(dt, &count)| dt * count as f64)
            .sum();
        problem.minimize(total_time);

        let max_wheel_velocity = drivetrain.max_wheel_velocity();
        for dt in &variables.dts {
            problem.subject_to(ge(dt, 0.0));
            problem.subject_to(le(dt * max_wheel_velocity, drivetrain.trackwidth));
        }

        // Dynamics via Hermite–Simpson collocation
        let dynamics = Dynamics::new(&drivetrain);
        for (segment, &count) in counts.iter().enumerate() {
            let dt = &variables.dts[segment];
            for sample in 0..count {
                let k = sample_index(&counts, segment, sample);
                let state_k = variables.dynamic_state(k);
                let state_k1 = variables.dynamic_state(k + 1);
                let input_k = variables.input(k);
                let input_k1 = variables.input(k + 1);

                let xdot_k = dynamics.derivative(&state_k, &input_k);
                let xdot_k1 = dynamics.derivative(&state_k1, &input_k1);

                let state_c: [Variable; 5] = std::array::from_fn(|i| {
                    0.5 * (&state_k[i] + &state_k1[i]) + dt / 8.0 * (&xdot_k[i] - &xdot_k1[i])
                });
                let input_c: [Variable; 2] = std::array::from_fn(|i| 0.5 * (&input_k[i] + &input_k1[i]));
                let xdot_c = dynamics.derivative(&state_c, &input_c);

                for i in 0..5 {
                    let slope = -3.0 / (2.0 * dt) * (&state_k[i] - &state_k1[i]) - 0.25 * (&xdot_k[i] + &xdot_k1[i]);
                    problem.subject_to(eq(slope, &xdot_c[i]));
                }

                problem.subject_to(eq(&variables.al[k], &xdot_k[3]));
                problem.subject_to(eq(&variables.ar[k], &xdot_k[4]));
            }
        }

        // Wheel velocity and force limits
        let max_wheel_force = drivetrain.max_wheel_force();
        for k in 0..variables.num_samples() {
            for v in [&variables.vl[k], &variables.vr[k]] {
                problem.subject_to(ge(v, -max_wheel_velocity));
                problem.subject_to(le(v, max_wheel_velocity));
            }
            for f in [&variables.fl[k], &variables.fr[k]] {
                problem.subject_to(ge(f, -max_wheel_force));
                problem.subject_to(le(f, max_wheel_force));
            }
        }

        for (index, waypoint) in waypoints.iter().enumerate() {
            let k = sample_index(&counts, index, 0);
            let state = variables.sample_state(k, &bumpers);
            for constraint in &waypoint.waypoint_constraints {
                constraint.apply(&mut problem, &state);
            }
        }

        for segment in 0..counts.len() {
            let constraints = &waypoints[segment + 1].segment_constraints;
            if constraints.is_empty() {
                continue;
            }
            let start = sample_index(&counts, segment, 0);
            let end = sample_index(&counts, segment + 1, 0);
            for k in start..end {
                let state = variables.sample_state(k, &bumpers);
                for constraint in constraints {
                    constraint.apply(&mut problem, &state);
                }
            }
        }

        variables.apply_initial_guess(&initial_guess);
        install_progress_hook(&mut problem, variables.clone(), callbacks, cancellation.clone(), handle);

        info!(
            "built trajectory problem: {} waypoints, {} samples, {} variables, {} equalities, {} inequalities",
            waypoints.len(),
            variables.num_samples(),
            problem.num_decision_variables(),
            problem.num_equality_constraints(),
            problem.num_inequality_constraints()
        );

        Ok(DifferentialTrajectoryGenerator {
            problem,
            variables,
            cancellation,
        })
    }

    /// Token that stops this generator's solves; clone it to cancel from elsewhere
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn num_samples(&self) -> usize {
        self.variables.num_samples()
    }

    /// Current values of the decision variables, the initial guess before any solve
    pub fn current_solution(&self) -> DifferentialSolution {
        self.variables.materialize()
    }

    /// Solve with the default tolerance
    pub fn generate(&mut self, diagnostics: bool) -> Result<DifferentialSolution, SolverExitCondition> {
        let config = SolverConfig::default()
            .with_tolerance(GENERATION_TOLERANCE)
            .with_diagnostics(diagnostics);
        self.generate_with(&config)
    }

    /// Solve with explicit solver options
    pub fn generate_with(&mut self, config: &SolverConfig) -> Result<DifferentialSolution, SolverExitCondition> {
        info!("generating trajectory with {} samples", self.num_samples());
        let status = self.problem.solve(config);
        let exit = status.exit_condition;
        if exit.is_failure() || exit == SolverExitCondition::CallbackRequestedStop {
            warn!("trajectory generation failed after {} iterations: {}", status.iterations, exit);
            return Err(exit);
        }

        let solution = self.variables.materialize();
        info!(
            "trajectory generated in {} iterations: {} ({:.3} s)",
            status.iterations,
            exit,
            solution.total_time()
        );
        Ok(solution)
    }
}

impl SolutionVariables {
    fn dynamic_state(&self, k: usize) -> [Variable; 5] {
        [
            self.x[k].clone(),
            self.y[k].clone(),
            self.theta[k].clone(),
            self.vl[k].clone(),
            self.vr[k].clone(),
        ]
    }

    fn input(&self, k: usize) -> [Variable; 2] {
        [self.fl[k].clone(), self.fr[k].clone()]
    }
}

/// Lets at most one frame through per period
struct FrameThrottle {
    period: Duration,
    last: Option<Instant>,
}

impl FrameThrottle {
    fn new(period: Duration) -> Self {
        FrameThrottle { period, last: None }
    }

    /// True when a frame may be published at `now`. The first call always is.
    fn ready(&mut self, now: Instant) -> bool {
        if self
            .last
            .is_some_and(|last| now.saturating_duration_since(last) < self.period)
        {
            return false;
        }
        self.last = Some(now);
        true
    }
}

/// Publishes throttled progress snapshots and reports cancellation to the solver
fn install_progress_hook(
    problem: &mut OptimizationProblem,
    variables: SolutionVariables,
    mut consumers: Vec<ProgressCallback>,
    cancellation: CancellationToken,
    handle: i64,
) {
    let mut throttle = FrameThrottle::new(PROGRESS_FRAME_PERIOD);
    problem.add_callback(move |_| {
        if cancellation.is_cancelled() {
            return true;
        }
        if consumers.is_empty() || !throttle.ready(Instant::now()) {
            return false;
        }

        let snapshot = variables.materialize();
        for consumer in consumers.iter_mut() {
            consumer(&snapshot, handle);
        }
        cancellation.is_cancelled()
    });
}
