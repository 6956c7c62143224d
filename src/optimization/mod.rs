//! Nonlinear optimization: symbolic variables, constraints and the solver

mod problem;
mod relation;
mod solver;
mod sparse;
mod variable;

pub use problem::{IterationCallback, OptimizationProblem};
pub use relation::{eq, ge, le, Relation};
pub use solver::{IterationInfo, SolverConfig, SolverExitCondition, SolverStatus};
pub use variable::Variable;
