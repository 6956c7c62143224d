//! 2D translation

use std::ops::{Add, Neg, Sub};

use super::{Rotation2, Scalar};
use crate::optimization::{Relation, Variable};

/// A point or displacement in the plane
#[derive(Debug, Clone, PartialEq)]
pub struct Translation2<T> {
    pub x: T,
    pub y: T,
}

pub type Translation2d = Translation2<f64>;
pub type Translation2v = Translation2<Variable>;

impl<T: Scalar> Translation2<T> {
    pub fn new(x: T, y: T) -> Self {
        Translation2 { x, y }
    }

    /// Translation of length `distance` in the direction of `angle`
    pub fn from_polar(distance: T, angle: &Rotation2<T>) -> Self {
        Translation2::new(distance.clone() * angle.cos().clone(), distance * angle.sin().clone())
    }

    pub fn rotate_by<U>(&self, rotation: &Rotation2<U>) -> Self
    where
        U: Scalar + Into<T>,
    {
        let c: T = rotation.cos().clone().into();
        let s: T = rotation.sin().clone().into();
        Translation2::new(
            self.x.clone() * c.clone() - self.y.clone() * s.clone(),
            self.x.clone() * s + self.y.clone() * c,
        )
    }

    pub fn squared_norm(&self) -> T {
        self.x.clone() * self.x.clone() + self.y.clone() * self.y.clone()
    }

    pub fn norm(&self) -> T {
        self.squared_norm().sqrt()
    }

    /// Heading of the vector as an angle
    pub fn angle(&self) -> T {
        self.y.atan2(&self.x)
    }

    pub fn dot(&self, other: &Translation2<T>) -> T {
        self.x.clone() * other.x.clone() + self.y.clone() * other.y.clone()
    }

    /// z component of the 3D cross product
    pub fn cross(&self, other: &Translation2<T>) -> T {
        self.x.clone() * other.y.clone() - self.y.clone() * other.x.clone()
    }

    pub fn distance(&self, other: &Translation2<T>) -> T {
        (self.clone() - other.clone()).norm()
    }

    pub fn scaled(&self, factor: T) -> Self {
        Translation2::new(self.x.clone() * factor.clone(), self.y.clone() * factor)
    }

    pub fn divided(&self, divisor: T) -> Self {
        Translation2::new(self.x.clone() / divisor.clone(), self.y.clone() / divisor)
    }

    /// Component equality with another translation
    pub fn equal_to<U: Scalar>(&self, other: &Translation2<U>) -> Relation {
        Relation::Equality(vec![
            self.x.to_variable() - other.x.to_variable(),
            self.y.to_variable() - other.y.to_variable(),
        ])
    }

    pub fn to_variable(&self) -> Translation2v {
        Translation2::new(self.x.to_variable(), self.y.to_variable())
    }
}

impl Translation2d {
    /// Numeric value as a constant symbolic translation
    pub fn lift(&self) -> Translation2v {
        self.to_variable()
    }
}

impl Translation2v {
    /// Current numeric value
    pub fn value(&self) -> Translation2d {
        Translation2::new(self.x.value(), self.y.value())
    }
}

impl<T: Scalar> Default for Translation2<T> {
    fn default() -> Self {
        Translation2::new(T::from(0.0), T::from(0.0))
    }
}

impl<T: Scalar> Add for Translation2<T> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Translation2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<T: Scalar> Sub for Translation2<T> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Translation2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl<T: Scalar> Neg for Translation2<T> {
    type Output = Self;
    fn neg(self) -> Self {
        Translation2::new(-self.x, -self.y)
    }
}
