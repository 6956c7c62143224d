//! Optimization problem container

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};

use super::solver::{self, IterationInfo, SolverConfig, SolverStatus};
use super::variable::{SharedTape, Tape};
use super::{Relation, Variable};

/// Hook invoked at the start of every solver iteration; returning `true` stops the solve
pub type IterationCallback = Box<dyn FnMut(&IterationInfo<'_>) -> bool>;

/// A nonlinear program: decision variables, an objective and constraints
pub struct OptimizationProblem {
    pub(crate) tape: SharedTape,
    pub(crate) objective: Option<Variable>,
    pub(crate) equalities: Vec<Variable>,
    pub(crate) inequalities: Vec<Variable>,
    pub(crate) callbacks: Vec<IterationCallback>,
}

impl OptimizationProblem {
    /// Create an empty problem
    pub fn new() -> Self {
        OptimizationProblem {
            tape: Rc::new(RefCell::new(Tape::default())),
            objective: None,
            equalities: Vec::new(),
            inequalities: Vec::new(),
            callbacks: Vec::new(),
        }
    }

    /// Allocate a new decision variable with initial value zero
    pub fn decision_variable(&mut self) -> Variable {
        Variable::decision(&self.tape, 0.0)
    }

    pub fn decision_variables(&mut self, count: usize) -> Vec<Variable> {
        (0..count).map(|_| self.decision_variable()).collect()
    }

    pub fn num_decision_variables(&self) -> usize {
        self.tape.borrow().num_decisions()
    }

    pub fn num_equality_constraints(&self) -> usize {
        self.equalities.len()
    }

    pub fn num_inequality_constraints(&self) -> usize {
        self.inequalities.len()
    }

    /// Set the cost to minimize, replacing any previous objective
    pub fn minimize(&mut self, cost: impl Into<Variable>) {
        self.objective = Some(cost.into());
    }

    pub fn maximize(&mut self, objective: impl Into<Variable>) {
        self.objective = Some(-objective.into());
    }

    /// Register a relation.
    ///
    /// Expressions that fold to constants are checked immediately: satisfied
    /// ones are dropped, violated ones are kept so the solve reports
    /// infeasibility.
    pub fn subject_to(&mut self, relation: Relation) {
        let is_equality = relation.is_equality();
        let expressions = match relation {
            Relation::Equality(exprs) | Relation::Inequality(exprs) => exprs,
        };
        for expr in expressions {
            if expr.is_constant() {
                let value = expr.value();
                let satisfied = if is_equality { value == 0.0 } else { value >= 0.0 };
                if satisfied {
                    continue;
                }
                warn!(
                    "registered constant {} constraint is violated ({})",
                    if is_equality { "equality" } else { "inequality" },
                    value
                );
            }
            if is_equality {
                self.equalities.push(expr);
            } else {
                self.inequalities.push(expr);
            }
        }
    }

    /// Largest constraint violation at the current decision values
    pub fn infeasibility(&self) -> f64 {
        let equality = self.equalities.iter().map(|c| c.value().abs());
        let inequality = self.inequalities.iter().map(|c| (-c.value()).max(0.0));
        equality.chain(inequality).fold(0.0, f64::max)
    }

    /// Register a per-iteration hook
    pub fn add_callback(&mut self, callback: impl FnMut(&IterationInfo<'_>) -> bool + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    pub fn clear_callbacks(&mut self) {
        self.callbacks.clear();
    }

    /// Solve from the current decision values, writing the result back to them
    pub fn solve(&mut self, config: &SolverConfig) -> SolverStatus {
        debug!(
            "solving problem with {} variables, {} equalities, {} inequalities",
            self.num_decision_variables(),
            self.equalities.len(),
            self.inequalities.len()
        );
        solver::solve(self, config)
    }
}

impl Default for OptimizationProblem {
    fn default() -> Self {
        Self::new()
    }
}
