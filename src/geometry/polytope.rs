//! Convex polygons in half-plane form

use nalgebra::{DVector, Dyn, OMatrix, U2};

use super::{Rotation2, Scalar, Translation2d};
use crate::optimization::Variable;

/// Convex region {p : A·p ≤ b}, one row per edge
#[derive(Debug, Clone, PartialEq)]
pub struct HPolytope2<T> {
    a: Vec<[T; 2]>,
    b: Vec<T>,
}

pub type HPolytope2d = HPolytope2<f64>;
pub type HPolytope2v = HPolytope2<Variable>;

impl<T: Scalar> HPolytope2<T> {
    pub fn num_faces(&self) -> usize {
        self.b.len()
    }

    pub fn rows(&self) -> &[[T; 2]] {
        &self.a
    }

    pub fn offsets(&self) -> &[T] {
        &self.b
    }

    /// Rotates the region about the origin. Only the normals change.
    pub fn rotate_by<U>(&self, rotation: &Rotation2<U>) -> HPolytope2<U>
    where
        U: Scalar + From<T>,
    {
        let c = rotation.cos();
        let s = rotation.sin();
        let a = self
            .a
            .iter()
            .map(|[a0, a1]| {
                let a0 = U::from(a0.clone());
                let a1 = U::from(a1.clone());
                [
                    a0.clone() * c.clone() - a1.clone() * s.clone(),
                    a0 * s.clone() + a1 * c.clone(),
                ]
            })
            .collect();
        let b = self.b.iter().cloned().map(U::from).collect();
        HPolytope2 { a, b }
    }
}

impl HPolytope2d {
    /// Builds the region bounded by `points`, which must wind clockwise.
    ///
    /// Counter-clockwise input yields the wrong region without any error.
    pub fn from_points(points: &[Translation2d]) -> Self {
        let n = points.len();
        let mut a = Vec::with_capacity(n);
        let mut b = Vec::with_capacity(n);
        for (i, start) in points.iter().enumerate() {
            let end = &points[(i + 1) % n];
            let nx = -(end.y - start.y);
            let ny = end.x - start.x;
            a.push([nx, ny]);
            b.push(nx * start.x + ny * start.y);
        }
        HPolytope2d { a, b }
    }

    /// Rectangular robot footprint from its extents past the robot center
    pub fn bumpers(front: f64, left: f64, right: f64, back: f64) -> Self {
        HPolytope2d::from_points(&[
            Translation2d::new(front, left),
            Translation2d::new(front, -right),
            Translation2d::new(-back, -right),
            Translation2d::new(-back, left),
        ])
    }

    /// True when `point` lies inside or on the boundary
    pub fn contains(&self, point: &Translation2d) -> bool {
        self.a
            .iter()
            .zip(&self.b)
            .all(|([a0, a1], b)| a0 * point.x + a1 * point.y <= *b)
    }

    pub fn a_matrix(&self) -> OMatrix<f64, Dyn, U2> {
        OMatrix::<f64, Dyn, U2>::from_fn(self.a.len(), |i, j| self.a[i][j])
    }

    pub fn b_vector(&self) -> DVector<f64> {
        DVector::from_column_slice(&self.b)
    }

    pub fn lift(&self) -> HPolytope2v {
        HPolytope2 {
            a: self.a.iter().map(|[a0, a1]| [Variable::from(*a0), Variable::from(*a1)]).collect(),
            b: self.b.iter().map(|&b| Variable::from(b)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Matrix4x2;
    use std::f64::consts::FRAC_PI_2;

    fn square() -> HPolytope2d {
        HPolytope2d::from_points(&[
            Translation2d::new(1.0, -1.0),
            Translation2d::new(-1.0, -1.0),
            Translation2d::new(-1.0, 1.0),
            Translation2d::new(1.0, 1.0),
        ])
    }

    #[test]
    fn test_square_matrices() {
        let square = square();
        let expected_a = Matrix4x2::new(0.0, -2.0, -2.0, 0.0, 0.0, 2.0, 2.0, 0.0);
        assert_eq!(square.a_matrix(), expected_a);
        assert_eq!(square.b_vector(), DVector::from_vec(vec![2.0, 2.0, 2.0, 2.0]));
    }

    #[test]
    fn test_square_containment() {
        let square = square();
        assert!(square.contains(&Translation2d::new(0.0, 0.0)));
        for (x, y) in [(2.0, 0.0), (0.0, 2.0), (-2.0, 0.0), (0.0, -2.0)] {
            assert!(!square.contains(&Translation2d::new(x, y)), "({}, {})", x, y);
        }
    }

    #[test]
    fn test_diamond_boundary_is_inside() {
        let diamond = HPolytope2d::from_points(&[
            Translation2d::new(0.0, -1.0),
            Translation2d::new(-1.0, 0.0),
            Translation2d::new(0.0, 1.0),
            Translation2d::new(1.0, 0.0),
        ]);
        for (x, y) in [(0.0, -1.0), (-1.0, 0.0), (0.0, 1.0), (1.0, 0.0)] {
            assert!(diamond.contains(&Translation2d::new(x, y)));
        }
        for (x, y) in [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)] {
            assert!(!diamond.contains(&Translation2d::new(x, y)));
        }
    }

    #[test]
    fn test_rotation_keeps_offsets() {
        let bumpers = HPolytope2d::bumpers(2.0, 0.5, 0.5, 0.5);
        let rotated: HPolytope2d = bumpers.rotate_by(&Rotation2::new(FRAC_PI_2));
        assert_eq!(rotated.offsets(), bumpers.offsets());
        // The front now faces +y
        assert!(rotated.contains(&Translation2d::new(0.0, 1.9)));
        assert!(!rotated.contains(&Translation2d::new(1.9, 0.0)));
        assert_relative_eq!(rotated.rows()[0][1], bumpers.rows()[0][0], epsilon = 1e-12);
    }
}
