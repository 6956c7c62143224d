//! Equality and inequality relations between expressions

use super::Variable;

/// A set of constraints registered on an optimization problem
#[derive(Debug, Clone)]
pub enum Relation {
    /// Every expression must equal zero
    Equality(Vec<Variable>),
    /// Every expression must be non-negative
    Inequality(Vec<Variable>),
}

impl Relation {
    /// The constrained expressions in normalized form
    pub fn expressions(&self) -> &[Variable] {
        match self {
            Relation::Equality(exprs) | Relation::Inequality(exprs) => exprs,
        }
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, Relation::Equality(_))
    }

    pub fn len(&self) -> usize {
        self.expressions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions().is_empty()
    }

    /// True when every expression holds at the current decision values
    pub fn is_satisfied(&self, tolerance: f64) -> bool {
        match self {
            Relation::Equality(exprs) => exprs.iter().all(|e| e.value().abs() <= tolerance),
            Relation::Inequality(exprs) => exprs.iter().all(|e| e.value() >= -tolerance),
        }
    }
}

/// `lhs == rhs`
pub fn eq(lhs: impl Into<Variable>, rhs: impl Into<Variable>) -> Relation {
    Relation::Equality(vec![lhs.into() - rhs.into()])
}

/// `lhs <= rhs`
pub fn le(lhs: impl Into<Variable>, rhs: impl Into<Variable>) -> Relation {
    Relation::Inequality(vec![rhs.into() - lhs.into()])
}

/// `lhs >= rhs`
pub fn ge(lhs: impl Into<Variable>, rhs: impl Into<Variable>) -> Relation {
    Relation::Inequality(vec![lhs.into() - rhs.into()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_forms() {
        let r = le(1.0, 3.0);
        assert!(!r.is_equality());
        assert_eq!(r.expressions()[0].value(), 2.0);

        let r = ge(1.0, 3.0);
        assert_eq!(r.expressions()[0].value(), -2.0);
        assert!(!r.is_satisfied(0.0));

        let r = eq(2.0, 2.0);
        assert!(r.is_equality());
        assert!(r.is_satisfied(0.0));
    }
}
