//! Householder QR factorization.
//!
//! [`HouseholderQr`] reduces a matrix one column at a time and hands each
//! reflector back to the caller, which is how the general compiler peels
//! a unitary into reflections and a diagonal. [`qr_unblocked`] runs the
//! same reduction to completion and stores the factors in packed form.

use ndarray::{Array1, Array2, s};
use num_complex::Complex64;

use crate::error::{CompileError, CompileResult};

/// Columns whose norm falls below this cannot be reduced.
const MIN_COLUMN_NORM: f64 = 1e-300;

/// Relative size of the sub-diagonal below which a column counts as reduced.
const REDUCED_RATIO: f64 = 1e-14;

/// One Householder reflection `I − 2uu†`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reflector {
    /// Column whose sub-diagonal this reflection annihilated.
    pub column: usize,
    /// Unit vector `u`, zero above `column`.
    pub vector: Array1<Complex64>,
}

impl Reflector {
    /// The dense reflection matrix.
    pub fn matrix(&self) -> Array2<Complex64> {
        let n = self.vector.len();
        Array2::from_shape_fn((n, n), |(i, j)| {
            let identity = if i == j { 1.0 } else { 0.0 };
            Complex64::new(identity, 0.0) - 2.0 * self.vector[i] * self.vector[j].conj()
        })
    }
}

/// Column-by-column Householder reduction of a matrix.
#[derive(Debug, Clone)]
pub struct HouseholderQr {
    work: Array2<Complex64>,
    next: usize,
}

impl HouseholderQr {
    /// Start reducing `a`.
    pub fn new(a: Array2<Complex64>) -> Self {
        Self { work: a, next: 0 }
    }

    /// Index of the next column to reduce.
    pub fn next_column(&self) -> usize {
        self.next
    }

    /// Whether every reducible column has been processed.
    pub fn is_done(&self) -> bool {
        let (rows, cols) = self.work.dim();
        self.next >= rows.min(cols)
    }

    /// The partially reduced matrix.
    pub fn work(&self) -> &Array2<Complex64> {
        &self.work
    }

    /// Consume the reducer and return the partially reduced matrix.
    pub fn into_inner(self) -> Array2<Complex64> {
        self.work
    }

    /// Reduce the next column.
    ///
    /// Returns the reflector applied, or `None` when the column already had
    /// no sub-diagonal weight. After the call, entries below the diagonal in
    /// that column are exactly zero.
    pub fn step(&mut self) -> CompileResult<Option<Reflector>> {
        let (rows, cols) = self.work.dim();
        let j = self.next;
        if j >= rows.min(cols) {
            return Err(CompileError::Shape(format!(
                "no column left to reduce in a {rows}x{cols} matrix"
            )));
        }
        self.next += 1;

        let x = self.work.slice(s![j.., j]).to_owned();
        let norm = x.iter().map(Complex64::norm_sqr).sum::<f64>().sqrt();
        if !norm.is_finite() || norm < MIN_COLUMN_NORM {
            return Err(CompileError::NumericOverflow {
                stage: "householder",
                index: j,
                value: norm,
            });
        }
        let below = x.iter().skip(1).map(Complex64::norm_sqr).sum::<f64>().sqrt();
        if below <= REDUCED_RATIO * norm {
            for i in j + 1..rows {
                self.work[[i, j]] = Complex64::new(0.0, 0.0);
            }
            return Ok(None);
        }

        let head = Complex64::from_polar(1.0, x[0].arg());
        let alpha = -head * norm;
        let mut v = x;
        v[0] -= alpha;
        let v_norm = v.iter().map(Complex64::norm_sqr).sum::<f64>().sqrt();
        if !v_norm.is_finite() || v_norm < MIN_COLUMN_NORM {
            return Err(CompileError::NumericOverflow {
                stage: "householder",
                index: j,
                value: v_norm,
            });
        }
        v.mapv_inplace(|z| z / v_norm);

        // work[j.., j..] -= 2 u (u† work[j.., j..])
        let mut block = self.work.slice_mut(s![j.., j..]);
        let projections: Vec<Complex64> = block
            .columns()
            .into_iter()
            .map(|col| v.iter().zip(col.iter()).map(|(u, w)| u.conj() * w).sum())
            .collect();
        for ((r, c), entry) in block.indexed_iter_mut() {
            *entry -= 2.0 * v[r] * projections[c];
        }
        self.work[[j, j]] = alpha;
        for i in j + 1..rows {
            self.work[[i, j]] = Complex64::new(0.0, 0.0);
        }

        let mut vector = Array1::zeros(rows);
        vector.slice_mut(s![j..]).assign(&v);
        Ok(Some(Reflector { column: j, vector }))
    }
}

/// Packed QR factors in the layout LAPACK's `geqr2` produces.
///
/// `R` occupies the upper triangle of `packed`. Below the diagonal of
/// column `j` sit the tail of `v_j`, whose head `v_j[j] = 1` is implicit,
/// and `H_j = I − tau[j]·v_j v_j†`. `A = H_0 H_1 ⋯ H_{k-1} R`.
#[derive(Debug, Clone)]
pub struct QrFactors {
    /// `R` and the reflector tails.
    pub packed: Array2<Complex64>,
    /// Reflector scales; zero marks a skipped column.
    pub tau: Vec<f64>,
}

impl QrFactors {
    /// Form the unitary factor `Q` explicitly (`rows × rows`).
    pub fn q(&self) -> Array2<Complex64> {
        let rows = self.packed.nrows();
        let mut q = Array2::from_diag_elem(rows, Complex64::new(1.0, 0.0));
        for (j, &tau) in self.tau.iter().enumerate().rev() {
            if tau == 0.0 {
                continue;
            }
            let mut v = Array1::zeros(rows);
            v[j] = Complex64::new(1.0, 0.0);
            for i in j + 1..rows {
                v[i] = self.packed[[i, j]];
            }
            // q = H_j q
            let projections: Vec<Complex64> = q
                .columns()
                .into_iter()
                .map(|col| v.iter().zip(col.iter()).map(|(a, b)| a.conj() * b).sum())
                .collect();
            for ((r, c), entry) in q.indexed_iter_mut() {
                *entry -= tau * v[r] * projections[c];
            }
        }
        q
    }

    /// Diagonal of `R`.
    pub fn r_diagonal(&self) -> Vec<Complex64> {
        self.packed.diag().to_vec()
    }
}

/// Full unblocked Householder QR of `a`.
pub fn qr_unblocked(a: &Array2<Complex64>) -> CompileResult<QrFactors> {
    let mut reducer = HouseholderQr::new(a.clone());
    let mut tails = Vec::new();
    let mut tau = Vec::new();
    while !reducer.is_done() {
        match reducer.step()? {
            None => {
                tails.push(None);
                tau.push(0.0);
            }
            Some(reflector) => {
                let j = reflector.column;
                let head = reflector.vector[j];
                let tail: Vec<Complex64> = reflector
                    .vector
                    .iter()
                    .skip(j + 1)
                    .map(|z| z / head)
                    .collect();
                tails.push(Some(tail));
                tau.push(2.0 * head.norm_sqr());
            }
        }
    }

    let mut packed = reducer.into_inner();
    for (j, tail) in tails.into_iter().enumerate() {
        if let Some(tail) = tail {
            for (offset, value) in tail.into_iter().enumerate() {
                packed[[j + 1 + offset, j]] = value;
            }
        }
    }
    Ok(QrFactors { packed, tau })
}
