//! 2D rotation stored as a (cos, sin) pair

use super::Scalar;
use crate::optimization::{Relation, Variable};

/// Magnitude below which a raw vector is treated as having no direction
const MIN_VECTOR_NORM: f64 = 1e-6;

/// A planar rotation.
///
/// Built from an angle or a normalized vector, cos² + sin² = 1 holds. A
/// symbolic rotation built from raw components can leave the unit circle
/// while solving, so equality relations pin its magnitude.
#[derive(Debug, Clone)]
pub struct Rotation2<T> {
    cos: T,
    sin: T,
    /// cos² + sin² = 1 holds for every value of the inputs
    unit: bool,
}

pub type Rotation2d = Rotation2<f64>;
pub type Rotation2v = Rotation2<Variable>;

impl<T: Scalar> Rotation2<T> {
    /// Rotation by `angle` radians
    pub fn new(angle: T) -> Self {
        Rotation2 {
            cos: angle.cos(),
            sin: angle.sin(),
            unit: true,
        }
    }

    /// Rotation from raw components, which are not normalized
    pub fn from_components(cos: T, sin: T) -> Self {
        Rotation2 { cos, sin, unit: false }
    }

    pub fn identity() -> Self {
        Rotation2 {
            cos: T::from(1.0),
            sin: T::from(0.0),
            unit: true,
        }
    }

    pub fn cos(&self) -> &T {
        &self.cos
    }

    pub fn sin(&self) -> &T {
        &self.sin
    }

    /// Angle in (-π, π]
    pub fn angle(&self) -> T {
        self.sin.atan2(&self.cos)
    }

    /// Composition: applies `self`, then `other`
    pub fn rotate_by(&self, other: &Rotation2<T>) -> Self {
        Rotation2 {
            cos: self.cos.clone() * other.cos.clone() - self.sin.clone() * other.sin.clone(),
            sin: self.cos.clone() * other.sin.clone() + self.sin.clone() * other.cos.clone(),
            unit: self.unit && other.unit,
        }
    }

    pub fn inverse(&self) -> Self {
        Rotation2 {
            cos: self.cos.clone(),
            sin: -self.sin.clone(),
            unit: self.unit,
        }
    }

    /// Rotation from `other` to `self`
    pub fn minus(&self, other: &Rotation2<T>) -> Self {
        self.rotate_by(&other.inverse())
    }

    /// Equality with another rotation.
    ///
    /// Two numeric rotations compare component-wise. Otherwise registers
    /// cos·sin' − sin·cos' == 0, which antipodal rotations also satisfy, plus
    /// cos² + sin² == 1 for every symbolic operand built from raw components.
    pub fn equal_to<U: Scalar>(&self, other: &Rotation2<U>) -> Relation {
        let (c1, s1) = (self.cos.to_variable(), self.sin.to_variable());
        let (c2, s2) = (other.cos.to_variable(), other.sin.to_variable());
        if !T::SYMBOLIC && !U::SYMBOLIC {
            return Relation::Equality(vec![c1 - c2, s1 - s2]);
        }
        let mut relations = vec![&c1 * &s2 - &s1 * &c2];
        if T::SYMBOLIC && !self.unit {
            relations.push(&c1 * &c1 + &s1 * &s1 - 1.0);
        }
        if U::SYMBOLIC && !other.unit {
            relations.push(&c2 * &c2 + &s2 * &s2 - 1.0);
        }
        Relation::Equality(relations)
    }

    pub fn to_variable(&self) -> Rotation2v {
        Rotation2 {
            cos: self.cos.to_variable(),
            sin: self.sin.to_variable(),
            unit: self.unit,
        }
    }
}

impl Rotation2d {
    /// Rotation pointing along (x, y); the identity for vectors shorter than 1e-6
    pub fn from_vector(x: f64, y: f64) -> Self {
        let magnitude = x.hypot(y);
        if magnitude > MIN_VECTOR_NORM {
            Rotation2 {
                cos: x / magnitude,
                sin: y / magnitude,
                unit: true,
            }
        } else {
            Rotation2::identity()
        }
    }

    pub fn lift(&self) -> Rotation2v {
        self.to_variable()
    }
}

impl Rotation2v {
    pub fn value(&self) -> Rotation2d {
        Rotation2 {
            cos: self.cos.value(),
            sin: self.sin.value(),
            unit: self.unit,
        }
    }
}

impl<T: PartialEq> PartialEq for Rotation2<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cos == other.cos && self.sin == other.sin
    }
}

impl<T: Scalar> Default for Rotation2<T> {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::angle_modulus;
    use crate::optimization::OptimizationProblem;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_angle_round_trip() {
        for i in -20..=20 {
            let angle = i as f64 * 0.37;
            let rotation = Rotation2d::new(angle);
            assert_relative_eq!(rotation.angle(), angle_modulus(angle), epsilon = 1e-12);
        }
        assert_relative_eq!(Rotation2d::new(PI).angle(), PI, epsilon = 1e-12);
    }

    #[test]
    fn test_from_vector_normalizes() {
        let rotation = Rotation2d::from_vector(3.0, 4.0);
        assert_relative_eq!(*rotation.cos(), 0.6);
        assert_relative_eq!(*rotation.sin(), 0.8);
    }

    #[test]
    fn test_tiny_vector_is_identity() {
        assert_eq!(Rotation2d::from_vector(1e-7, -1e-7), Rotation2d::identity());
        assert_eq!(Rotation2d::from_vector(0.0, 0.0), Rotation2d::identity());
    }

    #[test]
    fn test_composition_and_difference() {
        let a = Rotation2d::new(0.3);
        let b = Rotation2d::new(1.1);
        assert_relative_eq!(a.rotate_by(&b).angle(), 1.4, epsilon = 1e-12);
        assert_relative_eq!(b.minus(&a).angle(), 0.8, epsilon = 1e-12);
        assert_relative_eq!(a.inverse().angle(), -0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_numeric_equality_is_component_wise() {
        let numeric = Rotation2d::new(0.5);
        let same = numeric.equal_to(&Rotation2d::new(0.5));
        assert_eq!(same.len(), 2);
        assert!(same.is_satisfied(1e-12));

        // Antipodal rotations share the cross product but not the components
        let antipodal = numeric.equal_to(&Rotation2d::new(0.5 + PI));
        assert!(!antipodal.is_satisfied(1e-6));
    }

    #[test]
    fn test_raw_components_pin_the_unit_circle() {
        let mut problem = OptimizationProblem::new();
        let c = problem.decision_variable();
        let s = problem.decision_variable();
        let raw = Rotation2v::from_components(c.clone(), s.clone());
        let relation = raw.equal_to(&Rotation2d::identity());
        assert_eq!(relation.len(), 2);

        // Right direction, wrong magnitude
        c.set_value(2.0);
        s.set_value(0.0);
        assert!(!relation.is_satisfied(1e-6));
        c.set_value(1.0);
        assert!(relation.is_satisfied(1e-12));

        // Composition with an angle-built rotation keeps the raw magnitude
        let theta = problem.decision_variable();
        let composed = raw.rotate_by(&Rotation2v::new(theta));
        assert_eq!(composed.equal_to(&Rotation2d::identity()).len(), 2);
    }

    #[test]
    fn test_equality_relation_counts() {
        let numeric = Rotation2d::new(0.5);

        let mut problem = OptimizationProblem::new();
        let theta = problem.decision_variable();
        let symbolic = Rotation2v::new(theta.clone());
        let relation = symbolic.equal_to(&numeric);
        // cos²θ + sin²θ − 1 vanishes identically, so only the cross product
        assert_eq!(relation.len(), 1);
        assert_eq!(symbolic.inverse().rotate_by(&symbolic).equal_to(&numeric).len(), 1);

        theta.set_value(0.5);
        assert!(relation.is_satisfied(1e-12));
        // Antipodal heading satisfies the cross product too
        theta.set_value(0.5 + PI);
        assert!(relation.is_satisfied(1e-12));
        theta.set_value(1.0);
        assert!(!relation.is_satisfied(1e-6));
    }
}
