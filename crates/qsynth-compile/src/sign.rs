//! Sign matrices for uniformly controlled rotations.
//!
//! For a rotation on one target with `k` controls, the effective angle seen
//! by control value `x` after the Gray-code ladder is
//! `α_x = Σ_j M[x][j] θ_j` with `M[x][j] = (-1)^{popcount(x & g(j))}`.
//! `M` is a Walsh-Hadamard matrix with its columns in Gray order, so
//! `M⁻¹ = 2^{-k} Mᵀ` and solving for the rotation angles is one dense
//! product.

use ndarray::{Array1, Array2};
use rustc_hash::FxHashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use crate::error::{CompileError, CompileResult};
use crate::gray::{control_ladder, eta_col, greyencode};

/// Sign-matrix data for one rotation width.
#[derive(Debug, Clone)]
pub struct SignTable {
    /// Qubits spanned: the target plus `num_qubits - 1` controls.
    num_qubits: u32,
    /// `M⁻¹`, rows indexed by Gray step `j`, columns by control value `x`.
    inverse: Array2<f64>,
    /// `E·M`: maps rotation angles to consecutive differences of `α`.
    forward: Array2<f64>,
    /// Control bit driving the CNOT after each step.
    ladder: Vec<u32>,
}

impl SignTable {
    /// Build the table for a rotation spanning `num_qubits` wires.
    pub fn new(num_qubits: u32) -> Self {
        let k = num_qubits.saturating_sub(1);
        let dim = 1usize << k;
        let scale = 1.0 / dim as f64;
        let sign = |x: usize, j: usize| {
            if (x & greyencode(j)).count_ones() % 2 == 0 {
                1.0
            } else {
                -1.0
            }
        };

        let inverse = Array2::from_shape_fn((dim, dim), |(j, x)| scale * sign(x, j));
        let m = Array2::from_shape_fn((dim, dim), |(x, j)| sign(x, j));

        let steps = dim - 1;
        let mut e = Array2::<f64>::zeros((steps, dim));
        for i in 0..dim {
            for (row, value) in eta_col(steps, i).into_iter().enumerate() {
                e[[row, i]] = value;
            }
        }
        let forward = e.dot(&m);

        Self {
            num_qubits,
            inverse,
            forward,
            ladder: control_ladder(k),
        }
    }

    /// Number of wires the rotation spans.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Number of controls.
    pub fn num_controls(&self) -> u32 {
        self.num_qubits.saturating_sub(1)
    }

    /// The inverse sign matrix `M⁻¹`.
    pub fn inverse(&self) -> &Array2<f64> {
        &self.inverse
    }

    /// Control bit per ladder step.
    pub fn ladder(&self) -> &[u32] {
        &self.ladder
    }

    /// Solve for the rotation angles realizing the effective angles `alpha`.
    ///
    /// The solution is checked against the differences of `alpha` and its
    /// first entry; a non-finite or inconsistent result is a
    /// [`CompileError::NumericOverflow`].
    pub fn solve(&self, alpha: &[f64]) -> CompileResult<Vec<f64>> {
        let dim = self.inverse.nrows();
        if alpha.len() != dim {
            return Err(CompileError::Shape(format!(
                "rotation over {} qubits needs {dim} angles, got {}",
                self.num_qubits,
                alpha.len()
            )));
        }
        let alpha_vec = Array1::from(alpha.to_vec());
        let theta = self.inverse.dot(&alpha_vec);

        let scale = 1.0 + alpha.iter().fold(0.0_f64, |acc, a| acc.max(a.abs()));
        let limit = 1e-9 * scale * dim as f64;

        let boundary = (theta.sum() - alpha[0]).abs();
        if !boundary.is_finite() || boundary > limit {
            return Err(CompileError::NumericOverflow {
                stage: "sign solve",
                index: 0,
                value: boundary,
            });
        }

        let differences = self.forward.dot(&theta);
        for (i, got) in differences.iter().enumerate() {
            let residual = (got - (alpha[i + 1] - alpha[i])).abs();
            if !residual.is_finite() || residual > limit {
                return Err(CompileError::NumericOverflow {
                    stage: "sign solve",
                    index: i + 1,
                    value: residual,
                });
            }
        }

        Ok(theta.to_vec())
    }
}

/// Lazily filled cache of [`SignTable`]s keyed by rotation width.
///
/// Tables are immutable once inserted. Two threads racing on the same width
/// compute identical tables and the first insert wins.
#[derive(Debug, Default)]
pub struct SignTableCache {
    tables: RwLock<FxHashMap<u32, Arc<SignTable>>>,
}

impl SignTableCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or build the table for `num_qubits` wires.
    pub fn get(&self, num_qubits: u32) -> Arc<SignTable> {
        if let Some(table) = self
            .tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&num_qubits)
        {
            return Arc::clone(table);
        }

        debug!("Building sign table for {} qubits", num_qubits);
        let table = Arc::new(SignTable::new(num_qubits));
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(tables.entry(num_qubits).or_insert(table))
    }

    /// `M⁻¹` for a rotation spanning `num_qubits` wires, from the cache.
    pub fn inverse_m(&self, num_qubits: u32) -> Array2<f64> {
        self.get(num_qubits).inverse().clone()
    }

    /// Number of cached widths.
    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no table has been built yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_m_four_qubits() {
        let table = SignTable::new(4);
        let p = 0.125;
        let n = -0.125;
        let expected = ndarray::arr2(&[
            [p, p, p, p, p, p, p, p],
            [p, n, p, n, p, n, p, n],
            [p, n, n, p, p, n, n, p],
            [p, p, n, n, p, p, n, n],
            [p, p, n, n, n, n, p, p],
            [p, n, n, p, n, p, p, n],
            [p, n, p, n, n, p, n, p],
            [p, p, p, p, n, n, n, n],
        ]);
        assert_eq!(table.inverse(), &expected);
        assert_eq!(table.num_controls(), 3);
        assert_eq!(table.ladder().len(), 8);
    }

    #[test]
    fn test_inverse_m_reads_cache() {
        let cache = SignTableCache::new();
        let inverse = cache.inverse_m(3);
        assert_eq!(cache.len(), 1);
        assert_eq!(&inverse, SignTable::new(3).inverse());

        // M⁻¹·M = I
        let m = inverse.t().mapv(|x| x * 4.0);
        let product = inverse.dot(&m);
        for ((r, c), value) in product.indexed_iter() {
            let expected = if r == c { 1.0 } else { 0.0 };
            assert!((value - expected).abs() < 1e-12);
        }

        cache.inverse_m(3);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_single_qubit_table() {
        let table = SignTable::new(1);
        assert_eq!(table.inverse().dim(), (1, 1));
        assert!(table.ladder().is_empty());
        assert_eq!(table.solve(&[0.7]).unwrap(), vec![0.7]);
    }

    #[test]
    fn test_solve_reproduces_effective_angles() {
        let table = SignTable::new(3);
        let alpha = [0.3, -1.2, 2.5, 0.05];
        let theta = table.solve(&alpha).unwrap();

        // Effective angle for control value x is Σ_j (-1)^{popcount(x & g(j))} θ_j.
        for (x, &target) in alpha.iter().enumerate() {
            let effective: f64 = theta
                .iter()
                .enumerate()
                .map(|(j, t)| {
                    if (x & greyencode(j)).count_ones() % 2 == 0 {
                        *t
                    } else {
                        -*t
                    }
                })
                .sum();
            assert!((effective - target).abs() < 1e-12);
        }
    }

    #[test]
    fn test_solve_rejects_non_finite() {
        let table = SignTable::new(2);
        let err = table.solve(&[f64::NAN, 0.0]).unwrap_err();
        assert!(matches!(err, CompileError::NumericOverflow { .. }));
    }

    #[test]
    fn test_solve_rejects_wrong_length() {
        let table = SignTable::new(2);
        assert!(matches!(
            table.solve(&[0.0; 3]),
            Err(CompileError::Shape(_))
        ));
    }

    #[test]
    fn test_cache_reuses_tables() {
        let cache = SignTableCache::new();
        assert!(cache.is_empty());
        let a = cache.get(3);
        let b = cache.get(3);
        assert!(Arc::ptr_eq(&a, &b));
        cache.get(2);
        assert_eq!(cache.len(), 2);
    }
}
