//! Two-qubit synthesis via the magic basis.
//!
//! In the magic basis, `SU(2) ⊗ SU(2)` becomes `SO(4)` and the interaction
//! `exp(i(aXX + bYY + cZZ))` becomes diagonal. A two-qubit unitary then
//! factors as `K1 · A · K2` with local `K1`, `K2` and diagonal `A`, which
//! costs at most six CNOTs.

use nalgebra::{Matrix2, Matrix4, Vector4};
use ndarray::Array2;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2};
use tracing::{debug, warn};

use crate::config::CompilerConfig;
use crate::error::{CompileError, CompileResult};
use crate::program::{EmittedGate, RotationAxis};
use crate::unitary::Unitary2x2;

/// Largest off-diagonal entry accepted after diagonalizing `UᵀU`.
const EIGEN_TOLERANCE: f64 = 1e-9;

/// Frobenius error accepted when rebuilding a tensor product.
const PRODUCT_TOLERANCE: f64 = 1e-8;

/// Columns are the magic basis states, normalized.
#[rustfmt::skip]
fn magic_basis() -> Matrix4<Complex64> {
    let o = Complex64::new(0.0, 0.0);
    let r = Complex64::new(FRAC_1_SQRT_2, 0.0);
    let i = Complex64::new(0.0, FRAC_1_SQRT_2);
    Matrix4::new(
        r,  i, o, o,
        o,  o, i, r,
        o,  o, i, -r,
        r, -i, o, o,
    )
}

fn complexify(m: &Matrix4<f64>) -> Matrix4<Complex64> {
    m.map(|x| Complex64::new(x, 0.0))
}

/// `a ⊗ b` with `a` on wire 1.
fn kron2(a: &Matrix2<Complex64>, b: &Matrix2<Complex64>) -> Matrix4<Complex64> {
    Matrix4::from_fn(|r, c| a[(r / 2, c / 2)] * b[(r % 2, c % 2)])
}

fn to_unitary(m: &Matrix2<Complex64>) -> Unitary2x2 {
    Unitary2x2::new(m[(0, 0)], m[(0, 1)], m[(1, 0)], m[(1, 1)])
}

/// Nearest unitary in the Frobenius norm: `W·V†` for `u = W·Σ·V†`.
///
/// Inputs are only unitary to within the validation tolerance, while the
/// real eigenbasis of `UᵀU` exists only for exact unitaries.
pub fn closest_unitary(u: &Matrix4<Complex64>) -> CompileResult<Matrix4<Complex64>> {
    let svd = (*u).svd(true, true);
    match (svd.u, svd.v_t) {
        (Some(w), Some(v_t)) => Ok(w * v_t),
        _ => Err(CompileError::NumericOverflow {
            stage: "two-qubit projection",
            index: 0,
            value: f64::NAN,
        }),
    }
}

/// Convert a dense 4x4 operator.
pub fn to_matrix4(u: &Array2<Complex64>) -> CompileResult<Matrix4<Complex64>> {
    if u.dim() != (4, 4) {
        return Err(CompileError::Shape(format!(
            "two-qubit operator must be 4x4, got {:?}",
            u.dim()
        )));
    }
    Ok(Matrix4::from_fn(|r, c| u[[r, c]]))
}

/// Local factors of a real orthogonal 4x4 matrix taken out of the magic basis.
#[derive(Debug, Clone, PartialEq)]
pub struct So4Factors {
    /// Factor on wire 1.
    pub left: Unitary2x2,
    /// Factor on wire 0.
    pub right: Unitary2x2,
    /// Phase `ψ` of the product.
    pub phase: f64,
    /// Whether the input had determinant −1. The operator is then
    /// `e^{iψ}(left ⊗ right)·SWAP`.
    pub swapped: bool,
}

impl So4Factors {
    /// The operator these factors represent, in the computational basis.
    pub fn matrix(&self) -> Matrix4<Complex64> {
        let [a, b, c, d] = self.left.data;
        let left = Matrix2::new(a, b, c, d);
        let [a, b, c, d] = self.right.data;
        let right = Matrix2::new(a, b, c, d);
        let product = kron2(&left, &right) * Complex64::from_polar(1.0, self.phase);
        if self.swapped {
            product * swap_matrix()
        } else {
            product
        }
    }
}

fn swap_matrix() -> Matrix4<Complex64> {
    Matrix4::from_fn(|r, c| {
        let swapped = ((r & 1) << 1) | (r >> 1);
        Complex64::new(if swapped == c { 1.0 } else { 0.0 }, 0.0)
    })
}

/// Split a real orthogonal `Q` into local factors.
///
/// `B·Q·B†` is a tensor product of two `SU(2)` matrices up to phase when
/// `det Q = +1`. For `det Q = −1` the last column is negated first, which
/// is a SWAP once mapped out of the magic basis.
pub fn decompose_so4(q: &Matrix4<f64>) -> CompileResult<So4Factors> {
    let det = q.determinant();
    if !det.is_finite() || (det.abs() - 1.0).abs() > 1e-6 {
        return Err(CompileError::DegenerateDecomposition(format!(
            "matrix is not orthogonal (det = {det})"
        )));
    }

    let swapped = det < 0.0;
    let mut q = *q;
    if swapped {
        for r in 0..4 {
            q[(r, 3)] = -q[(r, 3)];
        }
    }

    let b = magic_basis();
    let k = b * complexify(&q) * b.adjoint();

    let mut r: Matrix2<Complex64> = k.fixed_view::<2, 2>(0, 0).into_owned();
    if r.determinant().norm() < 0.1 {
        r = k.fixed_view::<2, 2>(2, 0).into_owned();
    }
    let det_r = r.determinant();
    if det_r.norm() < 1e-12 {
        return Err(CompileError::DegenerateDecomposition(
            "no invertible block in magic-basis image".to_string(),
        ));
    }
    let root = det_r.sqrt();
    let r = r.map(|z| z / root);

    let stripped = k * kron2(&Matrix2::identity(), &r.adjoint());
    let l0 = Matrix2::new(
        stripped[(0, 0)],
        stripped[(0, 2)],
        stripped[(2, 0)],
        stripped[(2, 2)],
    );
    let det_l = l0.determinant();
    if det_l.norm() < 0.9 {
        return Err(CompileError::DegenerateDecomposition(format!(
            "magic-basis image is not a tensor product (|det| = {:.3})",
            det_l.norm()
        )));
    }
    let phase = det_l.arg() / 2.0;
    let l = l0.map(|z| z * Complex64::from_polar(1.0 / det_l.norm().sqrt(), -phase));

    let error = (k - kron2(&l, &r) * Complex64::from_polar(1.0, phase)).norm();
    if !error.is_finite() || error > PRODUCT_TOLERANCE {
        return Err(CompileError::DegenerateDecomposition(format!(
            "tensor factors rebuild with error {error:.3e}"
        )));
    }

    Ok(So4Factors {
        left: to_unitary(&l),
        right: to_unitary(&r),
        phase,
        swapped,
    })
}

/// `U = e^{iφ} · K1 · exp(i(aXX + bYY + cZZ)) · K2`.
#[derive(Debug, Clone, PartialEq)]
pub struct TwoQubitDecomposition {
    /// Local factors applied after the interaction.
    pub k1: So4Factors,
    /// Local factors applied before the interaction.
    pub k2: So4Factors,
    /// Interaction coefficients `(a, b, c)`.
    pub coefficients: (f64, f64, f64),
    /// Phase outside the local factors.
    pub phase: f64,
}

impl TwoQubitDecomposition {
    /// Decompose `u`.
    ///
    /// `u` is first replaced by its nearest unitary.
    /// `UᵀU` in the magic basis is diagonalized by a real orthogonal matrix.
    /// Degenerate eigenspaces are split by diagonalizing a random real
    /// combination of its real and imaginary parts; the mixing is drawn
    /// from `config.tie_break_seed` and retried up to
    /// `config.max_degeneracy_retries` times.
    pub fn new(u: &Matrix4<Complex64>, config: &CompilerConfig) -> CompileResult<Self> {
        let det = u.determinant();
        if !det.norm().is_finite() || det.norm() < 1e-12 {
            return Err(CompileError::DegenerateDecomposition(format!(
                "two-qubit operator is singular (|det| = {:.3e})",
                det.norm()
            )));
        }
        let u = closest_unitary(u)?;
        let phase = u.determinant().arg() / 4.0;
        let u_s = u * Complex64::from_polar(1.0, -phase);

        let b = magic_basis();
        let u_p = b.adjoint() * u_s * b;
        let m2 = u_p.transpose() * u_p;

        let p = Self::diagonalize(&m2, config)?;
        let d = complexify(&p).transpose() * m2 * complexify(&p);

        let mut h = [0.0; 4];
        for (i, value) in h.iter_mut().take(3).enumerate() {
            *value = d[(i, i)].arg() / 2.0;
        }
        h[3] = -(h[0] + h[1] + h[2]);

        let d_inv = Matrix4::from_diagonal(&Vector4::from_fn(|i, _| {
            Complex64::from_polar(1.0, -h[i])
        }));
        let k1 = (u_p * complexify(&p) * d_inv).map(|z| z.re);
        let k2 = p.transpose();

        let mut k1 = decompose_so4(&k1)?;
        let k2 = decompose_so4(&k2)?;
        if k1.swapped || k2.swapped {
            return Err(CompileError::DegenerateDecomposition(
                "local factor left SO(4)".to_string(),
            ));
        }

        // exp(i·kπ/2·PP) = e^{ikπ/2}·(P⊗P)^k, so whole quarter turns of each
        // coefficient move into K1 and the phase.
        let mut raw = [(h[0] + h[2]) / 2.0, (h[1] + h[2]) / 2.0, (h[0] + h[1]) / 2.0];
        let mut phase = phase;
        let mut correction = Unitary2x2::identity();
        for (coefficient, pauli) in raw
            .iter_mut()
            .zip([Unitary2x2::x(), Unitary2x2::y(), Unitary2x2::z()])
        {
            let turns = (*coefficient / FRAC_PI_2).round();
            *coefficient -= turns * FRAC_PI_2;
            phase += turns * FRAC_PI_2;
            if turns.rem_euclid(2.0) == 1.0 {
                correction = correction * pauli;
            }
        }
        k1.left = k1.left * correction;
        k1.right = k1.right * correction;

        let coefficients = (raw[0], raw[1], raw[2]);
        debug!(
            a = coefficients.0,
            b = coefficients.1,
            c = coefficients.2,
            "Two-qubit interaction coefficients"
        );

        Ok(Self {
            k1,
            k2,
            coefficients,
            phase,
        })
    }

    /// Real orthogonal `P` with `Pᵀ·m2·P` diagonal, columns ordered by
    /// eigenphase and `det P = +1`.
    fn diagonalize(m2: &Matrix4<Complex64>, config: &CompilerConfig) -> CompileResult<Matrix4<f64>> {
        let re = m2.map(|z| z.re);
        let im = m2.map(|z| z.im);
        let mut rng = StdRng::seed_from_u64(config.tie_break_seed);

        for attempt in 0..config.max_degeneracy_retries {
            let a: f64 = rng.gen_range(-1.0..1.0);
            let b: f64 = rng.gen_range(-1.0..1.0);
            let p = (re * a + im * b).symmetric_eigen().eigenvectors;

            let d = complexify(&p).transpose() * m2 * complexify(&p);
            let off_diagonal = (0..4)
                .flat_map(|r| (0..4).map(move |c| (r, c)))
                .filter(|(r, c)| r != c)
                .map(|(r, c)| d[(r, c)].norm())
                .fold(0.0, f64::max);
            if !off_diagonal.is_finite() || off_diagonal > EIGEN_TOLERANCE {
                warn!(
                    attempt,
                    off_diagonal, "Eigenbasis did not diagonalize; retrying with new mixing"
                );
                continue;
            }

            let mut order: Vec<usize> = (0..4).collect();
            order.sort_by(|&i, &j| {
                d[(i, i)]
                    .arg()
                    .total_cmp(&d[(j, j)].arg())
                    .then(i.cmp(&j))
            });
            let mut sorted = Matrix4::from_fn(|r, c| p[(r, order[c])]);
            if sorted.determinant() < 0.0 {
                for r in 0..4 {
                    sorted[(r, 3)] = -sorted[(r, 3)];
                }
            }
            return Ok(sorted);
        }

        Err(CompileError::DegenerateDecomposition(format!(
            "no diagonalizing basis after {} attempts",
            config.max_degeneracy_retries
        )))
    }

    /// Total global phase of the factored form.
    pub fn global_phase(&self) -> f64 {
        self.phase + self.k1.phase + self.k2.phase
    }

    /// Rebuild the operator from its factors.
    pub fn matrix(&self) -> Matrix4<Complex64> {
        let (a, b, c) = self.coefficients;
        let h = [a - b + c, -a + b + c, a + b - c, -a - b - c];
        let interaction = Matrix4::from_diagonal(&Vector4::from_fn(|i, _| {
            Complex64::from_polar(1.0, h[i])
        }));
        let basis = magic_basis();
        let interaction = basis * interaction * basis.adjoint();
        self.k1.matrix() * interaction * self.k2.matrix() * Complex64::from_polar(1.0, self.phase)
    }

    /// Emit gates on wires 0 and 1 in application order, with the global
    /// phase. Interaction terms below `cutoff` are left out and adjacent
    /// single-qubit matrices are fused.
    pub fn gates(&self, cutoff: f64) -> (Vec<EmittedGate>, f64) {
        let (a, b, c) = self.coefficients;
        let local = |wire: u32, matrix: Unitary2x2| EmittedGate::Unitary { wire, matrix };
        let both = |gates: &mut Vec<EmittedGate>, matrix: Unitary2x2| {
            gates.push(local(1, matrix));
            gates.push(local(0, matrix));
        };
        // CNOT · Rz(θ) · CNOT = exp(-iθ/2 ZZ)
        let zz = |gates: &mut Vec<EmittedGate>, coefficient: f64| {
            let cx = EmittedGate::Entangler {
                control: 0,
                target: 1,
            };
            gates.push(cx.clone());
            gates.push(EmittedGate::Rotation {
                wire: 1,
                axis: RotationAxis::Z,
                angle: -2.0 * coefficient,
            });
            gates.push(cx);
        };

        let mut gates = vec![local(1, self.k2.left), local(0, self.k2.right)];
        if (2.0 * c).abs() >= cutoff {
            zz(&mut gates, c);
        }
        if (2.0 * a).abs() >= cutoff {
            both(&mut gates, Unitary2x2::h());
            zz(&mut gates, a);
            both(&mut gates, Unitary2x2::h());
        }
        if (2.0 * b).abs() >= cutoff {
            both(&mut gates, Unitary2x2::sdg());
            both(&mut gates, Unitary2x2::h());
            zz(&mut gates, b);
            both(&mut gates, Unitary2x2::h());
            both(&mut gates, Unitary2x2::s());
        }
        gates.push(local(1, self.k1.left));
        gates.push(local(0, self.k1.right));

        fuse_single_qubit(gates, self.global_phase())
    }
}

/// Merge runs of matrix gates on the same wire and drop the ones that are
/// a pure phase.
fn fuse_single_qubit(gates: Vec<EmittedGate>, global_phase: f64) -> (Vec<EmittedGate>, f64) {
    let mut pending: [Option<Unitary2x2>; 2] = [None, None];
    let mut fused = Vec::with_capacity(gates.len());
    let mut global_phase = global_phase;

    let mut flush = |wire: u32,
                     pending: &mut [Option<Unitary2x2>; 2],
                     fused: &mut Vec<EmittedGate>| {
        if let Some(matrix) = pending[wire as usize].take() {
            if matrix.is_identity() {
                global_phase += matrix.data[0].arg();
            } else {
                fused.push(EmittedGate::Unitary { wire, matrix });
            }
        }
    };

    for gate in gates {
        match gate {
            EmittedGate::Unitary { wire, matrix } if wire < 2 => {
                let slot = &mut pending[wire as usize];
                *slot = Some(match slot.take() {
                    Some(earlier) => matrix * earlier,
                    None => matrix,
                });
            }
            other => {
                for wire in other.wires() {
                    if wire < 2 {
                        flush(wire, &mut pending, &mut fused);
                    }
                }
                fused.push(other);
            }
        }
    }
    flush(1, &mut pending, &mut fused);
    flush(0, &mut pending, &mut fused);

    (fused, global_phase)
}
