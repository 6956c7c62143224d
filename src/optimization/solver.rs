//! Augmented Lagrangian solver with a log barrier on simple bounds.
//!
//! # Algorithm
//!
//! Inequalities that are affine in a single decision variable become bounds
//! `l ≤ x ≤ u`. Iterates stay strictly inside them: the merit function carries
//! the barrier `-μ Σ (ln(x - l) + ln(u - x))` and every step is cut back by the
//! fraction-to-boundary rule. Equality constraints `c_e(x) = 0` and the
//! remaining inequality constraints `c_i(x) >= 0` enter through
//!
//! ```text
//! φ(x) = f(x) - λᵀc_e + ρ/2 ‖c_e‖² + 1/(2ρ) Σ (max(0, z - ρ c_i)² - z²)
//! ```
//!
//! which is minimized with Newton steps and a backtracking line search. The
//! multipliers are then updated
//!
//! ```text
//! λ ← λ - ρ c_e      z ← max(0, z - ρ c_i)
//! ```
//!
//! the penalty `ρ` grows whenever the constraint violation does not shrink
//! fast enough, and μ shrinks superlinearly.
//!
//! The Newton matrix is the exact Hessian of the Lagrangian, assembled row by
//! row from second-order adjoints, plus the `ρ JᵀJ` term of equality and active
//! inequality constraints and the bound duals `z_l/(x - l) + z_u/(u - x)` on
//! the diagonal. It is factored with a sparse Cholesky decomposition.

use std::collections::HashMap;

use log::{log, warn, Level};
use nalgebra::DVector;
use thiserror::Error;

use super::problem::OptimizationProblem;
use super::sparse::SymmetricPattern;
use super::variable::{ExpressionGraph, HessianScratch};
use crate::common::{require_positive, ConfigError};

const INITIAL_PENALTY: f64 = 10.0;
const MAX_PENALTY: f64 = 1e10;
const PENALTY_GROWTH: f64 = 10.0;
// Violation must shrink by this ratio per outer iteration to keep the penalty.
const PROGRESS_RATIO: f64 = 0.25;
const INITIAL_INNER_TOLERANCE: f64 = 1.0;
const MAX_INNER_ITERATIONS: usize = 50;
const ARMIJO: f64 = 1e-4;
const MIN_STEP_LENGTH: f64 = 1e-10;
const DIVERGENCE_LIMIT: f64 = 1e20;
const DUAL_SCALE_MAX: f64 = 100.0;
const INFEASIBLE_STALLS: usize = 3;
const INITIAL_BARRIER: f64 = 0.1;
const BARRIER_DECREASE: f64 = 0.2;
const BARRIER_EXPONENT: f64 = 1.5;
const MIN_FRACTION_TO_BOUNDARY: f64 = 0.99;
// Initial distance from a bound, relative to its magnitude and to the span.
const BOUND_PUSH: f64 = 1e-2;
const BOUND_FRACTION: f64 = 1e-2;
// Bounds closer than this (relative) are kept as inequality rows.
const MIN_BOUND_SPAN: f64 = 1e-8;
const DUAL_SAFEGUARD: f64 = 1e10;

/// Configuration for the solver
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Convergence tolerance on infeasibility and scaled stationarity
    pub tolerance: f64,

    /// Looser tolerance accepted once the line search stalls
    pub acceptable_tolerance: f64,

    /// Maximum number of Newton iterations
    pub max_iterations: usize,

    /// Log every iteration at info level instead of debug
    pub diagnostics: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            acceptable_tolerance: 1e-2,
            max_iterations: 5000,
            diagnostics: false,
        }
    }
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Apply parameters from a name/value map
    pub fn configure(&mut self, params: &HashMap<String, f64>) -> Result<(), ConfigError> {
        for (name, &value) in params {
            match name.as_str() {
                "tolerance" => self.tolerance = require_positive(name, value)?,
                "acceptable_tolerance" => self.acceptable_tolerance = require_positive(name, value)?,
                "max_iterations" => {
                    if !(value >= 1.0 && value.fract() == 0.0 && value <= usize::MAX as f64) {
                        return Err(ConfigError::invalid(name, value, "must be a positive integer"));
                    }
                    self.max_iterations = value as usize;
                }
                "diagnostics" => self.diagnostics = value != 0.0,
                _ => return Err(ConfigError::UnknownParameter(name.clone())),
            }
        }
        Ok(())
    }
}

/// Terminal state of a solve. Negative codes are failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum SolverExitCondition {
    #[error("solved to desired tolerance")]
    Success,
    #[error("solved to acceptable tolerance")]
    SolvedToAcceptableTolerance,
    #[error("callback requested stop")]
    CallbackRequestedStop,
    #[error("problem has too few degrees of freedom")]
    TooFewDofs,
    #[error("problem is locally infeasible")]
    LocallyInfeasible,
    #[error("initial cost or constraints evaluated to a non-finite value")]
    NonfiniteInitialCostOrConstraints,
    #[error("iterates diverged")]
    DivergingIterates,
    #[error("maximum iterations exceeded")]
    MaxIterationsExceeded,
}

impl SolverExitCondition {
    pub fn code(self) -> i8 {
        match self {
            SolverExitCondition::Success => 0,
            SolverExitCondition::SolvedToAcceptableTolerance => 1,
            SolverExitCondition::CallbackRequestedStop => 2,
            SolverExitCondition::TooFewDofs => -1,
            SolverExitCondition::LocallyInfeasible => -2,
            SolverExitCondition::NonfiniteInitialCostOrConstraints => -3,
            SolverExitCondition::DivergingIterates => -4,
            SolverExitCondition::MaxIterationsExceeded => -5,
        }
    }

    pub fn is_failure(self) -> bool {
        self.code() < 0
    }
}

/// Outcome of a solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverStatus {
    pub exit_condition: SolverExitCondition,
    pub iterations: usize,
    /// Cost at the final iterate
    pub cost: f64,
    /// Largest constraint violation at the final iterate
    pub infeasibility: f64,
}

/// Snapshot handed to iteration callbacks
#[derive(Debug, Clone, Copy)]
pub struct IterationInfo<'a> {
    pub iteration: usize,
    /// Current decision variable values
    pub x: &'a [f64],
    pub cost: f64,
    pub infeasibility: f64,
}

/// Objective or constraint expression with its slice of the Hessian structure
struct Row {
    node: usize,
    /// Tape nodes reachable from `node`, descending
    support: Vec<usize>,
    /// Decision variables the row depends on, ascending
    decisions: Vec<usize>,
    affine: bool,
    /// Hessian value slot of `(decisions[a], decisions[b])` at `a * d + b`
    slots: Vec<usize>,
    /// Gradient at the last linearization, aligned with `decisions`
    gradient: Vec<f64>,
}

impl Row {
    fn new(graph: &ExpressionGraph, node: usize, support: Vec<usize>) -> Self {
        let decisions = graph.decisions(&support);
        let affine = graph.is_affine(&support);
        let gradient = vec![0.0; decisions.len()];
        Row {
            node,
            support,
            decisions,
            affine,
            slots: Vec::new(),
            gradient,
        }
    }

    fn assign_slots(&mut self, pattern: &SymmetricPattern) -> Option<()> {
        let mut slots = Vec::with_capacity(self.decisions.len() * self.decisions.len());
        for &a in &self.decisions {
            for &b in &self.decisions {
                slots.push(pattern.slot(a, b)?);
            }
        }
        self.slots = slots;
        Some(())
    }

    fn linearize(
        &mut self,
        graph: &ExpressionGraph,
        values: &[f64],
        adjoints: &mut [f64],
        entries: &mut Vec<(usize, f64)>,
    ) {
        graph.sparse_gradient(&self.support, values, adjoints, entries);
        self.gradient.iter_mut().for_each(|g| *g = 0.0);
        for &(k, g) in entries.iter() {
            if let Ok(a) = self.decisions.binary_search(&k) {
                self.gradient[a] += g;
            }
        }
    }

    /// Adds `weight ∇²r + outer ∇r∇rᵀ` to the Hessian values.
    ///
    /// The outer product uses the gradient from the last [`Row::linearize`].
    #[allow(clippy::too_many_arguments)]
    fn accumulate(
        &self,
        graph: &ExpressionGraph,
        values: &[f64],
        scratch: &mut HessianScratch,
        entries: &mut Vec<(usize, f64)>,
        weight: f64,
        outer: f64,
        hessian: &mut [f64],
    ) {
        let d = self.decisions.len();
        if !self.affine && weight != 0.0 {
            for (j, &direction) in self.decisions.iter().enumerate() {
                graph.hessian_column(&self.support, values, direction, scratch, entries);
                for &(k, h) in entries.iter() {
                    if let Ok(a) = self.decisions.binary_search(&k) {
                        hessian[self.slots[a * d + j]] += weight * h;
                    }
                }
            }
        }
        if outer != 0.0 {
            for a in 0..d {
                for b in 0..d {
                    hessian[self.slots[a * d + b]] += outer * self.gradient[a] * self.gradient[b];
                }
            }
        }
    }
}

/// Simple bounds `lower ≤ x ≤ upper` and the state of their log barrier
struct Barrier {
    lower: Vec<f64>,
    upper: Vec<f64>,
    lower_duals: Vec<f64>,
    upper_duals: Vec<f64>,
    mu: f64,
}

impl Barrier {
    fn new(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        let n = lower.len();
        Self {
            lower,
            upper,
            lower_duals: vec![0.0; n],
            upper_duals: vec![0.0; n],
            mu: INITIAL_BARRIER,
        }
    }

    fn count(&self) -> usize {
        let lower = self.lower.iter().filter(|l| l.is_finite()).count();
        let upper = self.upper.iter().filter(|u| u.is_finite()).count();
        lower + upper
    }

    fn is_active(&self) -> bool {
        self.count() > 0
    }

    /// Moves `x` strictly inside its bounds
    fn push_inside(&self, x: &mut [f64]) {
        for (i, xi) in x.iter_mut().enumerate() {
            let (l, u) = (self.lower[i], self.upper[i]);
            let span = u - l;
            if l.is_finite() {
                let margin = (BOUND_PUSH * l.abs().max(1.0)).min(BOUND_FRACTION * span);
                *xi = xi.max(l + margin);
            }
            if u.is_finite() {
                let margin = (BOUND_PUSH * u.abs().max(1.0)).min(BOUND_FRACTION * span);
                *xi = xi.min(u - margin);
            }
        }
    }

    fn merit(&self, x: &[f64]) -> f64 {
        let mut phi = 0.0;
        for (i, &xi) in x.iter().enumerate() {
            for gap in [xi - self.lower[i], self.upper[i] - xi] {
                if gap.is_finite() {
                    if gap <= 0.0 {
                        return f64::INFINITY;
                    }
                    phi -= self.mu * gap.ln();
                }
            }
        }
        phi
    }

    fn add_gradient(&self, x: &[f64], gradient: &mut DVector<f64>) {
        for (i, &xi) in x.iter().enumerate() {
            if self.lower[i].is_finite() {
                gradient[i] -= self.mu / (xi - self.lower[i]);
            }
            if self.upper[i].is_finite() {
                gradient[i] += self.mu / (self.upper[i] - xi);
            }
        }
    }

    fn add_hessian(&self, x: &[f64], diagonal: &[usize], hessian: &mut [f64]) {
        for (i, &xi) in x.iter().enumerate() {
            if self.lower[i].is_finite() {
                hessian[diagonal[i]] += self.lower_duals[i] / (xi - self.lower[i]);
            }
            if self.upper[i].is_finite() {
                hessian[diagonal[i]] += self.upper_duals[i] / (self.upper[i] - xi);
            }
        }
    }

    fn fraction_to_boundary(&self) -> f64 {
        (1.0 - self.mu).max(MIN_FRACTION_TO_BOUNDARY)
    }

    /// Largest step length in (0, 1] that keeps a `1 - tau` share of every gap
    fn max_step(&self, x: &[f64], step: &DVector<f64>, tau: f64) -> f64 {
        let mut alpha: f64 = 1.0;
        for (i, &xi) in x.iter().enumerate() {
            let p = step[i];
            if p < 0.0 && self.lower[i].is_finite() {
                alpha = alpha.min(-tau * (xi - self.lower[i]) / p);
            }
            if p > 0.0 && self.upper[i].is_finite() {
                alpha = alpha.min(tau * (self.upper[i] - xi) / p);
            }
        }
        alpha
    }

    /// Primal-dual update of the bound duals for the step `p` taken from `x`
    fn update_duals(&mut self, x: &[f64], step: &DVector<f64>, tau: f64) {
        let n = x.len();
        let mut lower_steps = vec![0.0; n];
        let mut upper_steps = vec![0.0; n];
        let mut alpha: f64 = 1.0;
        for (i, &xi) in x.iter().enumerate() {
            if self.lower[i].is_finite() {
                let gap = xi - self.lower[i];
                let z = self.lower_duals[i];
                lower_steps[i] = self.mu / gap - z - z / gap * step[i];
                if lower_steps[i] < 0.0 {
                    alpha = alpha.min(-tau * z / lower_steps[i]);
                }
            }
            if self.upper[i].is_finite() {
                let gap = self.upper[i] - xi;
                let z = self.upper_duals[i];
                upper_steps[i] = self.mu / gap - z + z / gap * step[i];
                if upper_steps[i] < 0.0 {
                    alpha = alpha.min(-tau * z / upper_steps[i]);
                }
            }
        }
        for i in 0..n {
            self.lower_duals[i] += alpha * lower_steps[i];
            self.upper_duals[i] += alpha * upper_steps[i];
        }
    }

    /// Keeps each dual within a factor of its barrier estimate `μ / gap`
    fn safeguard_duals(&mut self, x: &[f64]) {
        for (i, &xi) in x.iter().enumerate() {
            if self.lower[i].is_finite() {
                let estimate = self.mu / (xi - self.lower[i]);
                self.lower_duals[i] = self.lower_duals[i]
                    .max(estimate / DUAL_SAFEGUARD)
                    .min(estimate * DUAL_SAFEGUARD);
            }
            if self.upper[i].is_finite() {
                let estimate = self.mu / (self.upper[i] - xi);
                self.upper_duals[i] = self.upper_duals[i]
                    .max(estimate / DUAL_SAFEGUARD)
                    .min(estimate * DUAL_SAFEGUARD);
            }
        }
    }

    fn reset_duals(&mut self, x: &[f64]) {
        for (i, &xi) in x.iter().enumerate() {
            if self.lower[i].is_finite() {
                self.lower_duals[i] = self.mu / (xi - self.lower[i]);
            }
            if self.upper[i].is_finite() {
                self.upper_duals[i] = self.mu / (self.upper[i] - xi);
            }
        }
    }

    fn decrease(&mut self, tolerance: f64, x: &[f64]) {
        if !self.is_active() {
            return;
        }
        self.mu = (BARRIER_DECREASE * self.mu)
            .min(self.mu.powf(BARRIER_EXPONENT))
            .max(0.1 * tolerance);
        self.safeguard_duals(x);
    }

    fn is_converged(&self, tolerance: f64) -> bool {
        !self.is_active() || self.mu <= tolerance
    }

    fn violation(&self, x: &[f64]) -> f64 {
        x.iter()
            .enumerate()
            .map(|(i, &xi)| (self.lower[i] - xi).max(xi - self.upper[i]).max(0.0))
            .fold(0.0, f64::max)
    }
}

/// Splits inequality rows into simple bounds and general constraints.
///
/// A row affine in a single variable `a x_k + b ≥ 0` bounds `x_k` from below
/// when `a > 0` and from above when `a < 0`. Variables whose bounds leave no
/// interior keep their rows as general constraints.
fn split_bounds(
    graph: &ExpressionGraph,
    values: &[f64],
    x: &[f64],
    rows: Vec<Row>,
    adjoints: &mut [f64],
    entries: &mut Vec<(usize, f64)>,
) -> (Barrier, Vec<Row>) {
    let n = x.len();
    let mut lower = vec![f64::NEG_INFINITY; n];
    let mut upper = vec![f64::INFINITY; n];

    let bounded: Vec<Option<usize>> = rows
        .iter()
        .map(|row| {
            if !row.affine || row.decisions.len() != 1 {
                return None;
            }
            graph.sparse_gradient(&row.support, values, adjoints, entries);
            let &(k, a) = entries.first()?;
            let bound = x[k] - values[row.node] / a;
            if a == 0.0 || !bound.is_finite() {
                return None;
            }
            if a > 0.0 {
                lower[k] = lower[k].max(bound);
            } else {
                upper[k] = upper[k].min(bound);
            }
            Some(k)
        })
        .collect();

    let mut empty = vec![false; n];
    for k in 0..n {
        let span = upper[k] - lower[k];
        if span.is_finite() && !(span > MIN_BOUND_SPAN * lower[k].abs().max(1.0)) {
            empty[k] = true;
            lower[k] = f64::NEG_INFINITY;
            upper[k] = f64::INFINITY;
        }
    }

    let general = rows
        .into_iter()
        .zip(bounded)
        .filter_map(|(row, bounded)| match bounded {
            Some(k) if !empty[k] => None,
            _ => Some(row),
        })
        .collect();
    (Barrier::new(lower, upper), general)
}

/// Numeric view of a problem: compiled expression graph plus scratch space.
struct Evaluator {
    graph: ExpressionGraph,
    objective: Option<usize>,
    /// Terms of the objective's outermost sum with their signs
    objective_terms: Vec<(Row, f64)>,
    equalities: Vec<Row>,
    inequalities: Vec<Row>,
    barrier: Barrier,
    pattern: SymmetricPattern,
    num_variables: usize,
    values: Vec<f64>,
    adjoints: Vec<f64>,
    scratch: HessianScratch,
    entries: Vec<(usize, f64)>,
}

impl Evaluator {
    /// Compiles the rows at the starting point `x`, which fixes the bounds.
    fn new(
        graph: ExpressionGraph,
        objective: Option<usize>,
        equalities: Vec<usize>,
        inequalities: Vec<usize>,
        x: &[f64],
    ) -> Option<Self> {
        let n = x.len();
        let terms = objective.map(|root| graph.summands(root)).unwrap_or_default();
        let roots: Vec<usize> = terms
            .iter()
            .map(|&(node, _)| node)
            .chain(equalities.iter().copied())
            .chain(inequalities.iter().copied())
            .collect();
        let mut rows: Vec<Row> = roots
            .iter()
            .zip(graph.supports(&roots))
            .map(|(&node, support)| Row::new(&graph, node, support))
            .collect();
        let inequality_rows = rows.split_off(rows.len() - inequalities.len());
        let mut equality_rows = rows.split_off(rows.len() - equalities.len());
        let mut objective_terms: Vec<(Row, f64)> =
            rows.into_iter().zip(terms).map(|(row, (_, weight))| (row, weight)).collect();

        let len = graph.len();
        let mut values = Vec::with_capacity(len);
        graph.evaluate(x, &mut values);
        let mut adjoints = vec![0.0; len];
        let mut entries = Vec::new();
        let (barrier, mut inequality_rows) =
            split_bounds(&graph, &values, x, inequality_rows, &mut adjoints, &mut entries);

        let mut cliques: Vec<&[usize]> = Vec::new();
        cliques.extend(
            objective_terms
                .iter()
                .filter(|(row, _)| !row.affine)
                .map(|(row, _)| row.decisions.as_slice()),
        );
        cliques.extend(
            equality_rows
                .iter()
                .chain(&inequality_rows)
                .map(|row| row.decisions.as_slice()),
        );
        let pattern = SymmetricPattern::from_cliques(n, &cliques)?;

        for (row, _) in objective_terms.iter_mut().filter(|(row, _)| !row.affine) {
            row.assign_slots(&pattern)?;
        }
        for row in equality_rows.iter_mut().chain(inequality_rows.iter_mut()) {
            row.assign_slots(&pattern)?;
        }

        Some(Self {
            scratch: HessianScratch::new(len),
            graph,
            objective,
            objective_terms,
            equalities: equality_rows,
            inequalities: inequality_rows,
            barrier,
            pattern,
            num_variables: n,
            values,
            adjoints,
            entries,
        })
    }

    fn evaluate(&mut self, x: &[f64]) {
        self.graph.evaluate(x, &mut self.values);
    }

    fn cost(&self) -> f64 {
        self.objective.map_or(0.0, |i| self.values[i])
    }

    fn equality(&self, j: usize) -> f64 {
        self.values[self.equalities[j].node]
    }

    fn inequality(&self, k: usize) -> f64 {
        self.values[self.inequalities[k].node]
    }

    fn is_finite(&self) -> bool {
        self.cost().is_finite()
            && (0..self.equalities.len()).all(|j| self.equality(j).is_finite())
            && (0..self.inequalities.len()).all(|k| self.inequality(k).is_finite())
    }

    fn infeasibility(&self, x: &[f64]) -> f64 {
        let equality = (0..self.equalities.len()).map(|j| self.equality(j).abs());
        let inequality = (0..self.inequalities.len()).map(|k| (-self.inequality(k)).max(0.0));
        equality
            .chain(inequality)
            .fold(self.barrier.violation(x), f64::max)
    }

    /// ∇f + Σ w_e ∇c_e + Σ w_i ∇c_i at the last evaluated point
    fn gradient(&mut self, equality_weights: &[f64], inequality_weights: &[f64]) -> DVector<f64> {
        if let Some(i) = self.objective {
            self.adjoints[i] += 1.0;
        }
        for (row, &w) in self.equalities.iter().zip(equality_weights) {
            self.adjoints[row.node] += w;
        }
        for (row, &w) in self.inequalities.iter().zip(inequality_weights) {
            self.adjoints[row.node] += w;
        }
        let mut gradient = vec![0.0; self.num_variables];
        self.graph.backpropagate(&self.values, &mut self.adjoints, &mut gradient);
        DVector::from_vec(gradient)
    }

    /// Hessian values of the merit function at the last evaluated point `x`
    fn hessian(&mut self, multipliers: &Multipliers, x: &[f64]) -> Vec<f64> {
        let Evaluator {
            graph,
            objective_terms,
            equalities,
            inequalities,
            barrier,
            pattern,
            values,
            adjoints,
            scratch,
            entries,
            ..
        } = self;
        let graph: &ExpressionGraph = graph;
        let values: &[f64] = values;
        let rho = multipliers.penalty;
        let mut hessian = vec![0.0; pattern.nnz()];

        for (row, weight) in objective_terms.iter() {
            row.accumulate(graph, values, scratch, entries, *weight, 0.0, &mut hessian);
        }
        for (j, row) in equalities.iter_mut().enumerate() {
            let weight = rho * values[row.node] - multipliers.equality[j];
            row.linearize(graph, values, adjoints, entries);
            row.accumulate(graph, values, scratch, entries, weight, rho, &mut hessian);
        }
        for (k, row) in inequalities.iter_mut().enumerate() {
            let shifted = multipliers.shifted(k, values[row.node]);
            let outer = if shifted > 0.0 {
                row.linearize(graph, values, adjoints, entries);
                rho
            } else {
                0.0
            };
            row.accumulate(graph, values, scratch, entries, -shifted, outer, &mut hessian);
        }
        barrier.add_hessian(x, pattern.diagonal(), &mut hessian);
        hessian
    }
}

/// Multiplier estimates and penalty parameter
struct Multipliers {
    equality: Vec<f64>,
    inequality: Vec<f64>,
    penalty: f64,
}

impl Multipliers {
    fn new(num_equalities: usize, num_inequalities: usize) -> Self {
        Self {
            equality: vec![0.0; num_equalities],
            inequality: vec![0.0; num_inequalities],
            penalty: INITIAL_PENALTY,
        }
    }

    fn shifted(&self, k: usize, value: f64) -> f64 {
        (self.inequality[k] - self.penalty * value).max(0.0)
    }

    fn shifted_inequality(&self, ev: &Evaluator, k: usize) -> f64 {
        self.shifted(k, ev.inequality(k))
    }

    /// Constraint gradient weights of ∇φ
    fn weights(&self, ev: &Evaluator) -> (Vec<f64>, Vec<f64>) {
        let equality = (0..self.equality.len())
            .map(|j| self.penalty * ev.equality(j) - self.equality[j])
            .collect();
        let inequality = (0..self.inequality.len())
            .map(|k| -self.shifted_inequality(ev, k))
            .collect();
        (equality, inequality)
    }

    fn merit(&self, ev: &Evaluator) -> f64 {
        let rho = self.penalty;
        let mut phi = ev.cost();
        for (j, &lambda) in self.equality.iter().enumerate() {
            let c = ev.equality(j);
            phi += -lambda * c + 0.5 * rho * c * c;
        }
        for (k, &z) in self.inequality.iter().enumerate() {
            let s = self.shifted_inequality(ev, k);
            phi += (s * s - z * z) / (2.0 * rho);
        }
        phi
    }

    /// Infeasibility measure that also accounts for complementarity
    fn violation(&self, ev: &Evaluator) -> f64 {
        let equality = (0..self.equality.len()).map(|j| ev.equality(j).abs());
        let inequality =
            (0..self.inequality.len()).map(|k| ev.inequality(k).min(self.inequality[k] / self.penalty).abs());
        equality.chain(inequality).fold(0.0, f64::max)
    }

    fn update(&mut self, ev: &Evaluator) {
        for j in 0..self.equality.len() {
            self.equality[j] -= self.penalty * ev.equality(j);
        }
        for k in 0..self.inequality.len() {
            self.inequality[k] = self.shifted_inequality(ev, k);
        }
    }

    fn dual_scale(&self) -> f64 {
        let count = self.equality.len() + self.inequality.len();
        if count == 0 {
            return 1.0;
        }
        let sum: f64 = self.equality.iter().chain(&self.inequality).map(|v| v.abs()).sum();
        (sum / count as f64).max(DUAL_SCALE_MAX) / DUAL_SCALE_MAX
    }
}

fn inf_norm(v: &DVector<f64>) -> f64 {
    v.iter().fold(0.0, |acc, x| acc.max(x.abs()))
}

/// Gradient of the full merit function, barrier included
fn merit_gradient(ev: &mut Evaluator, multipliers: &Multipliers, x: &[f64]) -> DVector<f64> {
    let (equality_weights, inequality_weights) = multipliers.weights(ev);
    let mut gradient = ev.gradient(&equality_weights, &inequality_weights);
    ev.barrier.add_gradient(x, &mut gradient);
    gradient
}

enum LineSearch {
    Accepted,
    Stalled,
}

/// Backtracking line search on the merit function. Updates `x` and the bound
/// duals on success.
fn line_search(
    ev: &mut Evaluator,
    multipliers: &Multipliers,
    x: &mut [f64],
    step: &DVector<f64>,
    gradient: &DVector<f64>,
) -> LineSearch {
    ev.evaluate(x);
    let phi0 = multipliers.merit(ev) + ev.barrier.merit(x);
    let mut slope = gradient.dot(step);
    let steepest;
    let step = if slope < 0.0 {
        step
    } else {
        steepest = -gradient;
        slope = -gradient.dot(gradient);
        &steepest
    };

    let tau = ev.barrier.fraction_to_boundary();
    let slack = 10.0 * f64::EPSILON * phi0.abs();
    let mut trial = vec![0.0; x.len()];
    let mut alpha = ev.barrier.max_step(x, step, tau);
    while alpha >= MIN_STEP_LENGTH {
        for (i, t) in trial.iter_mut().enumerate() {
            *t = x[i] + alpha * step[i];
        }
        ev.evaluate(&trial);
        let phi = multipliers.merit(ev) + ev.barrier.merit(&trial);
        if phi.is_finite() && phi <= phi0 + ARMIJO * alpha * slope + slack {
            ev.barrier.update_duals(x, step, tau);
            x.copy_from_slice(&trial);
            ev.barrier.safeguard_duals(x);
            return LineSearch::Accepted;
        }
        alpha *= 0.5;
    }
    LineSearch::Stalled
}

fn invoke_callbacks(problem: &mut OptimizationProblem, info: &IterationInfo<'_>) -> bool {
    if problem.callbacks.is_empty() {
        return false;
    }
    problem.tape.borrow_mut().set_values(info.x);
    let mut stop = false;
    for callback in problem.callbacks.iter_mut() {
        stop |= callback(info);
    }
    stop
}

/// Compiles `problem` at its current decision values
fn compile(problem: &OptimizationProblem) -> (Option<Evaluator>, Vec<f64>) {
    let tape = problem.tape.clone();
    let objective = problem.objective.as_ref().map(|f| f.node_on(&tape));
    let equalities: Vec<usize> = problem.equalities.iter().map(|c| c.node_on(&tape)).collect();
    let inequalities: Vec<usize> = problem.inequalities.iter().map(|c| c.node_on(&tape)).collect();
    let (graph, x) = {
        let tape = tape.borrow();
        (tape.graph().clone(), tape.values().to_vec())
    };
    let ev = Evaluator::new(graph, objective, equalities, inequalities, &x);
    (ev, x)
}

pub(crate) fn solve(problem: &mut OptimizationProblem, config: &SolverConfig) -> SolverStatus {
    let level = if config.diagnostics { Level::Info } else { Level::Debug };

    let (ev, mut x) = compile(problem);
    let mut iterations = 0;
    let (exit_condition, cost, infeasibility) = match ev {
        Some(mut ev) => {
            log!(
                level,
                "{} variables, {} equalities, {} inequalities, {} bounds, {} Hessian nonzeros",
                x.len(),
                ev.equalities.len(),
                ev.inequalities.len(),
                ev.barrier.count(),
                ev.pattern.nnz()
            );
            let mut multipliers = Multipliers::new(ev.equalities.len(), ev.inequalities.len());
            let exit = run(problem, config, level, &mut ev, &mut multipliers, &mut x, &mut iterations);
            ev.evaluate(&x);
            (exit, ev.cost(), ev.infeasibility(&x))
        }
        None => {
            warn!("could not build the Hessian structure");
            (SolverExitCondition::DivergingIterates, f64::NAN, f64::NAN)
        }
    };

    problem.tape.borrow_mut().set_values(&x);
    let status = SolverStatus {
        exit_condition,
        iterations,
        cost,
        infeasibility,
    };
    log!(
        level,
        "solver exited after {} iterations: {} (cost {:.6e}, infeasibility {:.3e})",
        status.iterations,
        exit_condition,
        status.cost,
        status.infeasibility
    );
    status
}

fn run(
    problem: &mut OptimizationProblem,
    config: &SolverConfig,
    level: Level,
    ev: &mut Evaluator,
    multipliers: &mut Multipliers,
    x: &mut [f64],
    iterations: &mut usize,
) -> SolverExitCondition {
    let n = x.len();
    if ev.equalities.len() > n {
        log!(level, "{} equality constraints but only {} variables", ev.equalities.len(), n);
        return SolverExitCondition::TooFewDofs;
    }

    ev.barrier.push_inside(x);
    ev.evaluate(x);
    if !ev.is_finite() {
        return SolverExitCondition::NonfiniteInitialCostOrConstraints;
    }
    ev.barrier.reset_duals(x);

    let tolerance = config.tolerance;
    let acceptable = config.acceptable_tolerance.max(tolerance);
    let mut inner_tolerance = INITIAL_INNER_TOLERANCE.max(tolerance);
    let mut previous_violation = f64::INFINITY;
    let mut infeasible_stalls = 0;
    let mut last_regularization = 0.0;

    loop {
        let mut stalled = false;
        for _ in 0..MAX_INNER_ITERATIONS {
            ev.evaluate(x);
            let cost = ev.cost();
            let infeasibility = ev.infeasibility(x);
            log!(
                level,
                "iter {:4}  cost {:.6e}  infeasibility {:.3e}  penalty {:.1e}  barrier {:.1e}",
                *iterations,
                cost,
                infeasibility,
                multipliers.penalty,
                ev.barrier.mu
            );

            if *iterations >= config.max_iterations {
                return SolverExitCondition::MaxIterationsExceeded;
            }
            let info = IterationInfo {
                iteration: *iterations,
                x,
                cost,
                infeasibility,
            };
            if invoke_callbacks(problem, &info) {
                return SolverExitCondition::CallbackRequestedStop;
            }
            *iterations += 1;

            let gradient = merit_gradient(ev, multipliers, x);
            if inf_norm(&gradient) <= inner_tolerance || n == 0 {
                break;
            }

            let hessian = ev.hessian(multipliers, x);
            let rhs: Vec<f64> = gradient.iter().map(|g| -g).collect();
            let Some(step) = ev.pattern.solve_regularized(&hessian, &rhs, &mut last_regularization) else {
                return SolverExitCondition::DivergingIterates;
            };
            let step = DVector::from_vec(step);
            match line_search(ev, multipliers, x, &step, &gradient) {
                LineSearch::Accepted => {}
                LineSearch::Stalled => {
                    stalled = true;
                    break;
                }
            }
            if x.iter().any(|v| v.abs() > DIVERGENCE_LIMIT) {
                return SolverExitCondition::DivergingIterates;
            }
        }

        ev.evaluate(x);
        let violation = multipliers.violation(ev);
        let stationarity = inf_norm(&merit_gradient(ev, multipliers, x));
        multipliers.update(ev);
        let kkt_error = stationarity / multipliers.dual_scale();
        log!(
            level,
            "outer: violation {:.3e}  stationarity {:.3e}  penalty {:.1e}  barrier {:.1e}",
            violation,
            kkt_error,
            multipliers.penalty,
            ev.barrier.mu
        );

        if violation <= tolerance && kkt_error <= tolerance && ev.barrier.is_converged(tolerance) {
            return SolverExitCondition::Success;
        }
        if stalled && violation <= acceptable && kkt_error <= acceptable {
            return SolverExitCondition::SolvedToAcceptableTolerance;
        }

        if violation > PROGRESS_RATIO * previous_violation && violation > tolerance {
            if multipliers.penalty >= MAX_PENALTY {
                infeasible_stalls += 1;
                if infeasible_stalls >= INFEASIBLE_STALLS {
                    return SolverExitCondition::LocallyInfeasible;
                }
            } else {
                multipliers.penalty = (multipliers.penalty * PENALTY_GROWTH).min(MAX_PENALTY);
            }
        } else {
            infeasible_stalls = 0;
        }
        previous_violation = violation;
        ev.barrier.decrease(tolerance, x);
        inner_tolerance = (inner_tolerance * 0.1).max(0.1 * tolerance);
    }
}
