//! Scalar abstraction shared by numeric and symbolic geometry

use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::optimization::Variable;

/// A real number that is either a plain `f64` or a symbolic [`Variable`].
///
/// Geometry formulas are written once against this trait and serve both
/// numeric evaluation and constraint construction.
pub trait Scalar:
    Clone
    + Debug
    + From<f64>
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    /// True for types whose values are decided by the solver
    const SYMBOLIC: bool;

    fn sin(&self) -> Self;
    fn cos(&self) -> Self;
    fn sqrt(&self) -> Self;
    fn abs(&self) -> Self;
    fn atan2(&self, x: &Self) -> Self;
    fn to_variable(&self) -> Variable;
}

impl Scalar for f64 {
    const SYMBOLIC: bool = false;

    fn sin(&self) -> Self {
        f64::sin(*self)
    }

    fn cos(&self) -> Self {
        f64::cos(*self)
    }

    fn sqrt(&self) -> Self {
        f64::sqrt(*self)
    }

    fn abs(&self) -> Self {
        f64::abs(*self)
    }

    fn atan2(&self, x: &Self) -> Self {
        f64::atan2(*self, *x)
    }

    fn to_variable(&self) -> Variable {
        Variable::constant(*self)
    }
}

impl Scalar for Variable {
    const SYMBOLIC: bool = true;

    fn sin(&self) -> Self {
        Variable::sin(self)
    }

    fn cos(&self) -> Self {
        Variable::cos(self)
    }

    fn sqrt(&self) -> Self {
        Variable::sqrt(self)
    }

    fn abs(&self) -> Self {
        Variable::abs(self)
    }

    fn atan2(&self, x: &Self) -> Self {
        Variable::atan2(self, x)
    }

    fn to_variable(&self) -> Variable {
        self.clone()
    }
}
