//! Sparse symmetric Newton systems
//!
//! The structure of the merit Hessian is fixed for a problem, so it is
//! computed once: every constraint contributes a dense block over its decision
//! variables, the union is reordered by minimum degree to limit Cholesky fill,
//! and each block entry is mapped to a slot in the value array.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use log::warn;
use nalgebra::DMatrix;
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::CscMatrix;

const INITIAL_REGULARIZATION: f64 = 1e-4;
const MIN_REGULARIZATION: f64 = 1e-20;
const MAX_REGULARIZATION: f64 = 1e40;
const REGULARIZATION_GROWTH: f64 = 8.0;

/// Nonzero structure of a symmetric matrix, both triangles stored, in a
/// fill-reducing column order.
pub(crate) struct SymmetricPattern {
    pattern: SparsityPattern,
    /// Position of each original index in the permuted order
    permutation: Vec<usize>,
    diagonal: Vec<usize>,
}

impl SymmetricPattern {
    /// Structure covering every pair within each clique plus the diagonal.
    pub(crate) fn from_cliques(n: usize, cliques: &[&[usize]]) -> Option<Self> {
        let mut adjacency = vec![BTreeSet::new(); n];
        for clique in cliques {
            for &a in clique.iter() {
                for &b in clique.iter() {
                    if a != b {
                        adjacency[a].insert(b);
                    }
                }
            }
        }

        let order = minimum_degree_ordering(&adjacency);
        let mut permutation = vec![0; n];
        for (position, &original) in order.iter().enumerate() {
            permutation[original] = position;
        }

        let mut offsets = Vec::with_capacity(n + 1);
        let mut indices = Vec::new();
        offsets.push(0);
        for &original in &order {
            let mut rows: Vec<usize> = adjacency[original].iter().map(|&i| permutation[i]).collect();
            rows.push(permutation[original]);
            rows.sort_unstable();
            indices.extend(rows);
            offsets.push(indices.len());
        }

        let pattern = match SparsityPattern::try_from_offsets_and_indices(n, n, offsets, indices) {
            Ok(pattern) => pattern,
            Err(err) => {
                warn!("invalid Hessian sparsity pattern: {:?}", err);
                return None;
            }
        };
        let mut symmetric = SymmetricPattern {
            pattern,
            permutation,
            diagonal: Vec::new(),
        };
        symmetric.diagonal = (0..n).map(|i| symmetric.slot(i, i)).collect::<Option<_>>()?;
        Some(symmetric)
    }

    pub(crate) fn nnz(&self) -> usize {
        self.pattern.nnz()
    }

    /// Value slots of the diagonal entries, by original index
    pub(crate) fn diagonal(&self) -> &[usize] {
        &self.diagonal
    }

    /// Value slot of entry `(row, col)` in original indices
    pub(crate) fn slot(&self, row: usize, col: usize) -> Option<usize> {
        let major = *self.permutation.get(col)?;
        let minor = *self.permutation.get(row)?;
        let offset = self.pattern.major_offsets()[major];
        self.pattern
            .lane(major)
            .binary_search(&minor)
            .ok()
            .map(|position| offset + position)
    }

    /// Solves `(H + δI) p = rhs` for the matrix with the given values.
    ///
    /// δ starts at zero and then grows geometrically from a fraction of the
    /// previous solve's δ until the factorization succeeds. Returns `None`
    /// when no δ up to the limit works.
    pub(crate) fn solve_regularized(
        &self,
        values: &[f64],
        rhs: &[f64],
        last_regularization: &mut f64,
    ) -> Option<Vec<f64>> {
        let n = rhs.len();
        let mut permuted = DMatrix::zeros(n, 1);
        for (i, &value) in rhs.iter().enumerate() {
            permuted[(self.permutation[i], 0)] = value;
        }

        let attempt = |delta: f64| -> Option<Vec<f64>> {
            let mut shifted = values.to_vec();
            for &slot in &self.diagonal {
                shifted[slot] += delta;
            }
            let matrix = CscMatrix::try_from_pattern_and_values(self.pattern.clone(), shifted).ok()?;
            let cholesky = CscCholesky::factor(&matrix).ok()?;
            let solution = cholesky.solve(&permuted);
            let step: Vec<f64> = (0..n).map(|i| solution[(self.permutation[i], 0)]).collect();
            step.iter().all(|v| v.is_finite()).then_some(step)
        };

        if let Some(step) = attempt(0.0) {
            *last_regularization = 0.0;
            return Some(step);
        }
        let mut delta = if *last_regularization == 0.0 {
            INITIAL_REGULARIZATION
        } else {
            (*last_regularization / 3.0).max(MIN_REGULARIZATION)
        };
        while delta <= MAX_REGULARIZATION {
            if let Some(step) = attempt(delta) {
                *last_regularization = delta;
                return Some(step);
            }
            delta *= REGULARIZATION_GROWTH;
        }
        None
    }
}

/// Greedy minimum-degree elimination order over an undirected graph.
///
/// Eliminating a vertex connects its remaining neighbors, so the degrees seen
/// by later choices include the fill created so far. Ties go to the lower
/// index.
fn minimum_degree_ordering(adjacency: &[BTreeSet<usize>]) -> Vec<usize> {
    let n = adjacency.len();
    let mut graph = adjacency.to_vec();
    let mut eliminated = vec![false; n];
    let mut queue: BinaryHeap<Reverse<(usize, usize)>> = (0..n).map(|i| Reverse((graph[i].len(), i))).collect();
    let mut order = Vec::with_capacity(n);

    while let Some(Reverse((degree, v))) = queue.pop() {
        if eliminated[v] || degree != graph[v].len() {
            continue;
        }
        eliminated[v] = true;
        order.push(v);

        let neighbors: Vec<usize> = std::mem::take(&mut graph[v]).into_iter().collect();
        for &a in &neighbors {
            graph[a].remove(&v);
            for &b in &neighbors {
                if a != b {
                    graph[a].insert(b);
                }
            }
            queue.push(Reverse((graph[a].len(), a)));
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DVector;

    fn fill(pattern: &SymmetricPattern, dense: &DMatrix<f64>) -> Vec<f64> {
        let mut values = vec![0.0; pattern.nnz()];
        for col in 0..dense.ncols() {
            for row in 0..dense.nrows() {
                if let Some(slot) = pattern.slot(row, col) {
                    values[slot] = dense[(row, col)];
                }
            }
        }
        values
    }

    #[test]
    fn test_chain_has_no_fill() {
        let n = 50;
        let links: Vec<[usize; 2]> = (0..n - 1).map(|i| [i, i + 1]).collect();
        let cliques: Vec<&[usize]> = links.iter().map(|l| l.as_slice()).collect();
        let pattern = SymmetricPattern::from_cliques(n, &cliques).unwrap();

        assert_eq!(pattern.nnz(), n + 2 * (n - 1));
        assert!(pattern.slot(3, 4).is_some());
        assert!(pattern.slot(3, 5).is_none());
        assert_eq!(pattern.diagonal().len(), n);
    }

    #[test]
    fn test_hub_is_eliminated_last() {
        // Arrow structure: vertex 0 touches everything
        let n = 6;
        let mut adjacency = vec![BTreeSet::new(); n];
        for i in 1..n {
            adjacency[0].insert(i);
            adjacency[i].insert(0);
        }
        let order = minimum_degree_ordering(&adjacency);

        assert_eq!(order.len(), n);
        assert_eq!(*order.last().unwrap(), 0);
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn test_solve_matches_dense_cholesky() {
        let dense = DMatrix::from_row_slice(
            4,
            4,
            &[
                4.0, 1.0, 0.0, 0.5, //
                1.0, 3.0, 0.2, 0.0, //
                0.0, 0.2, 2.0, 0.0, //
                0.5, 0.0, 0.0, 5.0,
            ],
        );
        let cliques: Vec<&[usize]> = vec![&[0, 1][..], &[1, 2][..], &[0, 3][..]];
        let pattern = SymmetricPattern::from_cliques(4, &cliques).unwrap();
        let rhs = [1.0, -2.0, 0.5, 3.0];

        let mut last = 0.0;
        let step = pattern.solve_regularized(&fill(&pattern, &dense), &rhs, &mut last).unwrap();
        let expected = dense.cholesky().unwrap().solve(&DVector::from_row_slice(&rhs));

        assert_eq!(last, 0.0);
        for i in 0..4 {
            assert_relative_eq!(step[i], expected[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_indefinite_matrix_is_regularized() {
        let dense = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, -1.0]);
        let cliques: Vec<&[usize]> = vec![&[0, 1][..]];
        let pattern = SymmetricPattern::from_cliques(2, &cliques).unwrap();

        let mut last = 0.0;
        let step = pattern
            .solve_regularized(&fill(&pattern, &dense), &[1.0, 1.0], &mut last)
            .unwrap();
        assert!(last > 1.0);
        // (H + δI) p = rhs on the diagonal
        assert_relative_eq!(step[0], 1.0 / (1.0 + last), epsilon = 1e-12);
        assert_relative_eq!(step[1], 1.0 / (last - 1.0), epsilon = 1e-12);
    }

    #[test]
    fn test_nonfinite_matrix_is_rejected() {
        let cliques: Vec<&[usize]> = vec![&[0][..]];
        let pattern = SymmetricPattern::from_cliques(1, &cliques).unwrap();
        let mut last = 0.0;
        assert!(pattern.solve_regularized(&[f64::NAN], &[1.0], &mut last).is_none());
    }
}
