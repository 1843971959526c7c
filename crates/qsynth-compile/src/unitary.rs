//! Small dense linear algebra for synthesis.
//!
//! [`Unitary2x2`] is the payload of emitted single-qubit gates. The free
//! functions work on `ndarray` operators of any width.

use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_1_SQRT_2, PI, TAU};
use std::ops::Mul;

/// Tolerance for treating entries as zero or equal.
const EPSILON: f64 = 1e-10;

const fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

/// A 2x2 complex matrix, row-major `[[a, b], [c, d]]`.
///
/// Wire convention: basis index 0 is `|0⟩`, index 1 is `|1⟩`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Unitary2x2 {
    /// Entries `[a, b, c, d]`.
    pub data: [Complex64; 4],
}

impl Unitary2x2 {
    /// Matrix from its four entries.
    pub fn new(a: Complex64, b: Complex64, c: Complex64, d: Complex64) -> Self {
        Self { data: [a, b, c, d] }
    }

    fn real(a: f64, b: f64, c_: f64, d: f64) -> Self {
        Self::new(c(a, 0.0), c(b, 0.0), c(c_, 0.0), c(d, 0.0))
    }

    fn diagonal(top: Complex64, bottom: Complex64) -> Self {
        Self::new(top, c(0.0, 0.0), c(0.0, 0.0), bottom)
    }

    pub fn identity() -> Self {
        Self::real(1.0, 0.0, 0.0, 1.0)
    }

    /// Hadamard.
    pub fn h() -> Self {
        let s = FRAC_1_SQRT_2;
        Self::real(s, s, s, -s)
    }

    /// Pauli X.
    pub fn x() -> Self {
        Self::real(0.0, 1.0, 1.0, 0.0)
    }

    /// Pauli Y.
    pub fn y() -> Self {
        Self::new(c(0.0, 0.0), c(0.0, -1.0), c(0.0, 1.0), c(0.0, 0.0))
    }

    /// Pauli Z.
    pub fn z() -> Self {
        Self::real(1.0, 0.0, 0.0, -1.0)
    }

    /// `diag(1, i)`.
    pub fn s() -> Self {
        Self::diagonal(c(1.0, 0.0), c(0.0, 1.0))
    }

    /// `diag(1, -i)`.
    pub fn sdg() -> Self {
        Self::diagonal(c(1.0, 0.0), c(0.0, -1.0))
    }

    /// `exp(-iθY/2)`.
    pub fn ry(theta: f64) -> Self {
        let (s, co) = (theta / 2.0).sin_cos();
        Self::real(co, -s, s, co)
    }

    /// `diag(e^{-iθ/2}, e^{iθ/2})`.
    pub fn rz(theta: f64) -> Self {
        Self::diagonal(
            Complex64::from_polar(1.0, -theta / 2.0),
            Complex64::from_polar(1.0, theta / 2.0),
        )
    }

    /// Read the top-left 2x2 block of an `ndarray` matrix.
    pub fn from_array(m: &Array2<Complex64>) -> Self {
        Self::new(m[[0, 0]], m[[0, 1]], m[[1, 0]], m[[1, 1]])
    }

    pub fn to_array(&self) -> Array2<Complex64> {
        let [a, b, c_, d] = self.data;
        ndarray::arr2(&[[a, b], [c_, d]])
    }

    /// Every entry multiplied by `factor`.
    pub fn scale(&self, factor: Complex64) -> Self {
        Self {
            data: self.data.map(|z| z * factor),
        }
    }

    /// Conjugate transpose.
    pub fn dagger(&self) -> Self {
        let [a, b, c_, d] = self.data;
        Self::new(a.conj(), c_.conj(), b.conj(), d.conj())
    }

    pub fn det(&self) -> Complex64 {
        let [a, b, c_, d] = self.data;
        a * d - b * c_
    }

    /// Whether the matrix is a scalar multiple of the identity.
    pub fn is_identity(&self) -> bool {
        let [a, b, c_, d] = self.data;
        b.norm() < EPSILON && c_.norm() < EPSILON && (a - d).norm() < EPSILON
    }

    /// `arg(det)/2`: dividing by `e^{i·phase}` leaves a matrix in SU(2).
    pub fn global_phase(&self) -> f64 {
        self.det().arg() / 2.0
    }

    /// Euler angles with `U = e^{iφ}·Rz(α)·Ry(β)·Rz(γ)`.
    ///
    /// Returns `(α, β, γ, φ)` with `β ∈ [0, π]`. When `β` is 0 or π only
    /// the sum or the difference of `α` and `γ` is fixed; it is split
    /// evenly between them.
    pub fn zyz_decomposition(&self) -> (f64, f64, f64, f64) {
        let phase = self.global_phase();
        // a = cos(β/2)·e^{-i(α+γ)/2}, c = sin(β/2)·e^{i(α-γ)/2}
        let [a, _, c_, _] = self.scale(Complex64::from_polar(1.0, -phase)).data;
        let beta = 2.0 * c_.norm().atan2(a.norm());

        if c_.norm() < EPSILON {
            let half_sum = -a.arg();
            return (half_sum, 0.0, half_sum, phase);
        }
        if a.norm() < EPSILON {
            let half_difference = c_.arg();
            return (half_difference, beta, -half_difference, phase);
        }

        let half_sum = -a.arg();
        let half_difference = c_.arg();
        (
            half_sum + half_difference,
            beta,
            half_sum - half_difference,
            phase,
        )
    }
}

impl Mul for Unitary2x2 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let [a, b, c_, d] = self.data;
        let [e, f, g, h] = rhs.data;
        Self::new(a * e + b * g, a * f + b * h, c_ * e + d * g, c_ * f + d * h)
    }
}

/// Bring a rotation angle into `[-π, π]`.
///
/// Returns the wrapped angle and the number of full turns removed. Each
/// turn flips the sign of `Ry`/`Rz`, so the caller owes `turns·π` of
/// global phase.
pub fn wrap_angle(angle: f64) -> (f64, f64) {
    let turns = (angle / TAU).round();
    (angle - turns * TAU, turns)
}

// =============================================================================
// Dense helpers
// =============================================================================

/// Conjugate transpose of a dense matrix.
pub fn dagger(m: &Array2<Complex64>) -> Array2<Complex64> {
    m.t().mapv(|z| z.conj())
}

/// `||U U† - I||_F`.
pub fn unitarity_deviation(u: &Array2<Complex64>) -> f64 {
    u.dot(&dagger(u))
        .indexed_iter()
        .map(|((i, j), z)| {
            let target = if i == j { 1.0 } else { 0.0 };
            (z - c(target, 0.0)).norm_sqr()
        })
        .sum::<f64>()
        .sqrt()
}

/// Largest magnitude of an off-diagonal entry.
pub fn max_off_diagonal(m: &Array2<Complex64>) -> f64 {
    m.indexed_iter()
        .filter(|((i, j), _)| i != j)
        .map(|(_, z)| z.norm())
        .fold(0.0, f64::max)
}

/// Kronecker product `a ⊗ b`; `a` acts on the more significant index bits.
pub fn kron(a: &Array2<Complex64>, b: &Array2<Complex64>) -> Array2<Complex64> {
    let (ar, ac) = a.dim();
    let (br, bc) = b.dim();
    Array2::from_shape_fn((ar * br, ac * bc), |(i, j)| {
        a[[i / br, j / bc]] * b[[i % br, j % bc]]
    })
}
