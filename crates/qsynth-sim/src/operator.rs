//! Dense operator reconstruction and comparison.

use ndarray::Array2;
use num_complex::Complex64;
use tracing::debug;

use qsynth_ir::Circuit;

use crate::error::{SimError, SimResult};
use crate::statevector::Statevector;

/// Widest circuit [`circuit_unitary`] will expand into a dense matrix.
pub const MAX_DENSE_QUBITS: u32 = 12;

/// Reconstruct the operator a circuit implements, global phase included.
///
/// Column `j` is the circuit applied to `|j⟩`.
pub fn circuit_unitary(circuit: &Circuit) -> SimResult<Array2<Complex64>> {
    let n = circuit.num_qubits();
    if n > MAX_DENSE_QUBITS {
        return Err(SimError::TooManyQubits {
            requested: n,
            max: MAX_DENSE_QUBITS,
        });
    }
    let dim = 1usize << n;
    let mut unitary = Array2::<Complex64>::zeros((dim, dim));
    for col in 0..dim {
        let mut sv = Statevector::basis(n as usize, col);
        sv.apply_circuit(circuit)?;
        for (row, amp) in sv.amplitudes().iter().enumerate() {
            unitary[[row, col]] = *amp;
        }
    }
    debug!(qubits = n, gates = circuit.len(), "Reconstructed circuit operator");
    Ok(unitary)
}

/// Relative Frobenius distance between `expected` and `actual` after
/// removing the best global phase.
///
/// Returns `‖e^{iφ}·expected − actual‖_F / ‖expected‖_F` with
/// `φ = arg tr(expected† · actual)`.
pub fn phase_aligned_error(
    expected: &Array2<Complex64>,
    actual: &Array2<Complex64>,
) -> SimResult<f64> {
    let (rows, cols) = expected.dim();
    if actual.dim() != (rows, cols) {
        let (r, c) = actual.dim();
        return Err(SimError::DimensionMismatch {
            rows: r,
            cols: c,
            dim: rows,
        });
    }
    let overlap: Complex64 = expected
        .iter()
        .zip(actual.iter())
        .map(|(e, a)| e.conj() * a)
        .sum();
    let phase = if overlap.norm() > 0.0 {
        overlap / overlap.norm()
    } else {
        Complex64::new(1.0, 0.0)
    };
    let diff: f64 = expected
        .iter()
        .zip(actual.iter())
        .map(|(e, a)| (e * phase - a).norm_sqr())
        .sum();
    let scale: f64 = expected.iter().map(Complex64::norm_sqr).sum();
    if scale == 0.0 {
        return Ok(diff.sqrt());
    }
    Ok((diff / scale).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsynth_ir::QubitId;
    use std::f64::consts::PI;

    #[test]
    fn test_cnot_operator() {
        let mut circuit = Circuit::new("cx", 2);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        let u = circuit_unitary(&circuit).unwrap();

        // Little-endian: |01⟩ (index 1, control set) maps to |11⟩ (index 3).
        assert!((u[[3, 1]] - Complex64::new(1.0, 0.0)).norm() < 1e-12);
        assert!((u[[1, 3]] - Complex64::new(1.0, 0.0)).norm() < 1e-12);
        assert!((u[[0, 0]] - Complex64::new(1.0, 0.0)).norm() < 1e-12);
        assert!((u[[2, 2]] - Complex64::new(1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_phase_alignment_ignores_global_phase() {
        let mut a = Circuit::new("a", 1);
        a.h(QubitId(0)).unwrap();
        let mut b = a.clone();
        b.set_global_phase(PI / 3.0);

        let ua = circuit_unitary(&a).unwrap();
        let ub = circuit_unitary(&b).unwrap();
        assert!(phase_aligned_error(&ua, &ub).unwrap() < 1e-12);
    }

    #[test]
    fn test_phase_alignment_detects_difference() {
        let mut a = Circuit::new("a", 1);
        a.h(QubitId(0)).unwrap();
        let mut b = Circuit::new("b", 1);
        b.x(QubitId(0)).unwrap();

        let err = phase_aligned_error(&circuit_unitary(&a).unwrap(), &circuit_unitary(&b).unwrap())
            .unwrap();
        assert!(err > 0.1);
    }

    #[test]
    fn test_too_wide() {
        let circuit = Circuit::new("wide", MAX_DENSE_QUBITS + 1);
        assert!(matches!(
            circuit_unitary(&circuit),
            Err(SimError::TooManyQubits { .. })
        ));
    }
}
