//! Diagonal phase synthesis.
//!
//! A diagonal operator over `m` wires is peeled one wire at a time: the
//! lowest remaining wire receives a uniformly controlled `Rz` and the
//! residual phases move onto the wires above it. After `m` levels a single
//! scalar remains, which is the global phase.

use num_complex::Complex64;
use tracing::debug;

use crate::error::{CompileError, CompileResult};
use crate::program::{EmittedGate, RotationAxis};
use crate::sign::{SignTable, SignTableCache};

/// Magnitudes below this cannot carry a phase.
const MIN_MAGNITUDE: f64 = 1e-12;

/// Emit a rotation about `axis` on `target`, uniformly controlled by the
/// `table.num_controls()` wires directly above it.
///
/// `angles[x]` is the rotation applied when the controls read `x`, with
/// control wire `target + 1 + b` holding bit `b` of `x`. Steps whose angle
/// is below `cutoff` emit only their CNOT; when every step past the first
/// vanishes the ladder collapses to a single rotation.
pub(crate) fn uniformly_controlled(
    axis: RotationAxis,
    angles: &[f64],
    target: u32,
    table: &SignTable,
    cutoff: f64,
) -> CompileResult<Vec<EmittedGate>> {
    let theta = table.solve(angles)?;
    let significant = |angle: &f64| angle.abs() >= cutoff;

    let Some(first) = theta.first() else {
        return Ok(vec![]);
    };
    if !theta.iter().skip(1).any(significant) {
        if significant(first) {
            return Ok(vec![EmittedGate::Rotation {
                wire: target,
                axis,
                angle: *first,
            }]);
        }
        return Ok(vec![]);
    }

    let mut gates = Vec::with_capacity(2 * theta.len());
    for (angle, control) in theta.iter().zip(table.ladder()) {
        if significant(angle) {
            gates.push(EmittedGate::Rotation {
                wire: target,
                axis,
                angle: *angle,
            });
        }
        gates.push(EmittedGate::Entangler {
            control: target + 1 + control,
            target,
        });
    }
    Ok(gates)
}

/// Phase differences between neighbouring control blocks.
///
/// `ψ_i = arg(d[2i]·d[2i+3] / (d[2i+1]·d[2i+2]))`, one entry per adjacent
/// pair of the `d.len() / 2` blocks.
pub fn fill_psi(d: &[Complex64]) -> Vec<f64> {
    let blocks = d.len() / 2;
    (0..blocks.saturating_sub(1))
        .map(|i| {
            let i = 2 * i;
            (d[i] * d[i + 3] / (d[i + 1] * d[i + 2])).arg()
        })
        .collect()
}

/// Synthesize `diag(diagonal)` on wires `lo..lo + log2(len)`.
///
/// Entry `x` of `diagonal` is the phase on basis state `x`, with wire
/// `lo + b` holding bit `b`. Returns the gates in application order and the
/// global phase that completes the operator.
pub fn synthesize_diagonal(
    diagonal: &[Complex64],
    lo: u32,
    tables: &SignTableCache,
    cutoff: f64,
) -> CompileResult<(Vec<EmittedGate>, f64)> {
    let len = diagonal.len();
    if len == 0 || !len.is_power_of_two() {
        return Err(CompileError::Shape(format!(
            "diagonal length must be a power of two, got {len}"
        )));
    }

    let mut current = Vec::with_capacity(len);
    for (index, z) in diagonal.iter().enumerate() {
        let magnitude = z.norm();
        if !magnitude.is_finite() || magnitude < MIN_MAGNITUDE {
            return Err(CompileError::NumericOverflow {
                stage: "diagonal",
                index,
                value: magnitude,
            });
        }
        current.push(z / magnitude);
    }

    let mut gates = Vec::new();
    let mut target = lo;
    while current.len() > 1 {
        let half = current.len() / 2;
        let table = tables.get(half.trailing_zeros() + 1);

        let psi = fill_psi(&current);
        let mut alpha = Vec::with_capacity(half);
        alpha.push((current[1] / current[0]).arg());
        for step in &psi {
            let last = alpha[alpha.len() - 1];
            alpha.push(last + step);
        }

        let level = uniformly_controlled(RotationAxis::Z, &alpha, target, &table, cutoff)?;
        debug!(
            wire = target,
            controls = table.num_controls(),
            gates = level.len(),
            "Diagonal level"
        );
        gates.extend(level);

        current = (0..half)
            .map(|x| current[2 * x] * Complex64::from_polar(1.0, alpha[x] / 2.0))
            .collect();
        target += 1;
    }

    Ok((gates, current[0].arg()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Program, Strategy};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn operator(gates: Vec<EmittedGate>, phase: f64, n: u32) -> ndarray::Array2<Complex64> {
        let program = Program {
            num_qubits: n,
            gates,
            global_phase: phase,
            strategy: Strategy::Diagonal,
        };
        qsynth_sim::circuit_unitary(&program.to_circuit("diag").unwrap()).unwrap()
    }

    fn random_phases(len: usize, seed: u64) -> Vec<Complex64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..len)
            .map(|_| Complex64::from_polar(1.0, rng.gen_range(-3.0..3.0)))
            .collect()
    }

    #[test]
    fn test_fill_psi() {
        let d: Vec<Complex64> = [0.0, 0.1, 0.5, 0.2]
            .iter()
            .map(|&a| Complex64::from_polar(1.0, a))
            .collect();
        let psi = fill_psi(&d);
        assert_eq!(psi.len(), 1);
        assert!((psi[0] - (0.0 + 0.2 - 0.1 - 0.5)).abs() < 1e-12);
        assert!(fill_psi(&d[..2]).is_empty());
    }

    #[test]
    fn test_diagonal_exact_with_phase() {
        let tables = SignTableCache::new();
        for n in 1..=4u32 {
            let d = random_phases(1 << n, u64::from(n));
            let (gates, phase) = synthesize_diagonal(&d, 0, &tables, 1e-12).unwrap();
            let u = operator(gates, phase, n);
            for (i, expected) in d.iter().enumerate() {
                assert!((u[[i, i]] - expected).norm() < 1e-9, "n={n} entry {i}");
            }
        }
    }

    #[test]
    fn test_diagonal_on_upper_wires() {
        let tables = SignTableCache::new();
        let d = random_phases(4, 11);
        let (gates, phase) = synthesize_diagonal(&d, 1, &tables, 1e-12).unwrap();
        assert!(gates.iter().all(|g| g.wires().iter().all(|&w| w >= 1)));
        let u = operator(gates, phase, 3);
        for i in 0..8 {
            assert!((u[[i, i]] - d[i >> 1]).norm() < 1e-9);
        }
    }

    #[test]
    fn test_scalar_diagonal_has_no_gates() {
        let tables = SignTableCache::new();
        let phase = Complex64::from_polar(1.0, 0.8);
        let (gates, global) = synthesize_diagonal(&[phase; 8], 0, &tables, 1e-12).unwrap();
        assert!(gates.is_empty());
        assert!((global - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_single_rotation_collapses() {
        let tables = SignTableCache::new();
        let a = Complex64::from_polar(1.0, -0.3);
        let b = Complex64::from_polar(1.0, 0.3);
        // Rz(0.6) on wire 0, independent of wire 1.
        let (gates, _) = synthesize_diagonal(&[a, b, a, b], 0, &tables, 1e-12).unwrap();
        assert_eq!(gates.len(), 1);
        assert!(!gates[0].is_entangler());
    }

    #[test]
    fn test_rejects_bad_input() {
        let tables = SignTableCache::new();
        let one = Complex64::new(1.0, 0.0);
        assert!(matches!(
            synthesize_diagonal(&[one; 3], 0, &tables, 1e-12),
            Err(CompileError::Shape(_))
        ));
        assert!(matches!(
            synthesize_diagonal(&[one, Complex64::new(0.0, 0.0)], 0, &tables, 1e-12),
            Err(CompileError::NumericOverflow { index: 1, .. })
        ));
    }

    #[test]
    fn test_uniformly_controlled_ry() {
        let tables = SignTableCache::new();
        let table = tables.get(2);
        let gates = uniformly_controlled(RotationAxis::Y, &[0.4, -1.0], 0, &table, 1e-12).unwrap();
        assert_eq!(gates.iter().filter(|g| g.is_entangler()).count(), 2);
        let u = operator(gates, 0.0, 2);
        // Control wire 1 clear: Ry(0.4) on wire 0.
        assert!((u[[1, 0]].re - 0.2_f64.sin()).abs() < 1e-12);
        // Control wire 1 set: Ry(-1.0) on wire 0.
        assert!((u[[3, 2]].re - (-0.5_f64).sin()).abs() < 1e-12);
    }
}
