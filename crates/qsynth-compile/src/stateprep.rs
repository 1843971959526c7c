//! State preparation by amplitude splitting.
//!
//! Amplitudes are paired along the lowest wire. Each pair `(a, b)` fixes a
//! `Ry` angle from the magnitude split and an `Rz` angle from the phase
//! difference, and collapses into one parent amplitude on the wires above.
//! Repeating until one amplitude remains leaves a tower of uniformly
//! controlled rotations that is emitted top wire first.

use num_complex::Complex64;
use tracing::debug;

use crate::diagonal::uniformly_controlled;
use crate::error::{CompileError, CompileResult};
use crate::program::{EmittedGate, RotationAxis};
use crate::sign::SignTableCache;

/// Rotation angles for one wire of the tower.
struct Level {
    magnitudes: Vec<f64>,
    phases: Vec<f64>,
}

/// Synthesize `W` with `W|0…0⟩ = amplitudes` on wires `lo..lo + log2(len)`.
///
/// Amplitude `x` belongs to basis state `x`, with wire `lo + b` holding bit
/// `b`. Returns the gates in application order and the global phase. The
/// prepared state carries the norm of `amplitudes`; callers that need a
/// unitary check normalization first.
pub fn synthesize_state(
    amplitudes: &[Complex64],
    lo: u32,
    tables: &SignTableCache,
    cutoff: f64,
) -> CompileResult<(Vec<EmittedGate>, f64)> {
    let len = amplitudes.len();
    if len == 0 || !len.is_power_of_two() {
        return Err(CompileError::Shape(format!(
            "state length must be a power of two, got {len}"
        )));
    }
    if let Some((index, z)) = amplitudes
        .iter()
        .enumerate()
        .find(|(_, z)| !z.re.is_finite() || !z.im.is_finite())
    {
        return Err(CompileError::NumericOverflow {
            stage: "state preparation",
            index,
            value: z.norm(),
        });
    }

    let mut levels = Vec::new();
    let mut current = amplitudes.to_vec();
    while current.len() > 1 {
        let half = current.len() / 2;
        let mut level = Level {
            magnitudes: Vec::with_capacity(half),
            phases: Vec::with_capacity(half),
        };
        let mut parent = Vec::with_capacity(half);
        for pair in current.chunks_exact(2) {
            let (a, b) = (pair[0], pair[1]);
            let (arg_a, arg_b) = (a.arg(), b.arg());
            level.magnitudes.push(2.0 * b.norm().atan2(a.norm()));
            level.phases.push(arg_b - arg_a);
            parent.push(Complex64::from_polar(
                a.norm().hypot(b.norm()),
                (arg_a + arg_b) / 2.0,
            ));
        }
        levels.push(level);
        current = parent;
    }
    let global_phase = current[0].arg();

    let mut gates = Vec::new();
    for (depth, level) in levels.iter().enumerate().rev() {
        let target = lo + depth as u32;
        let table = tables.get(level.magnitudes.len().trailing_zeros() + 1);
        let ry = uniformly_controlled(RotationAxis::Y, &level.magnitudes, target, &table, cutoff)?;
        let rz = uniformly_controlled(RotationAxis::Z, &level.phases, target, &table, cutoff)?;
        debug!(
            wire = target,
            ry_gates = ry.len(),
            rz_gates = rz.len(),
            "State preparation level"
        );
        gates.extend(ry);
        gates.extend(rz);
    }

    Ok((gates, global_phase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Program, Strategy};
    use qsynth_sim::Statevector;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn prepared(amplitudes: &[Complex64], lo: u32, n: u32) -> Vec<Complex64> {
        let tables = SignTableCache::new();
        let (gates, global_phase) = synthesize_state(amplitudes, lo, &tables, 1e-12).unwrap();
        let program = Program {
            num_qubits: n,
            gates,
            global_phase,
            strategy: Strategy::StatePreparation,
        };
        let mut sv = Statevector::new(n as usize);
        sv.apply_circuit(&program.to_circuit("prep").unwrap()).unwrap();
        sv.into_amplitudes()
    }

    #[test]
    fn test_random_states_exact() {
        let mut rng = StdRng::seed_from_u64(5);
        for n in 1..=5u32 {
            let target = Statevector::random(n as usize, &mut rng);
            let got = prepared(target.amplitudes(), 0, n);
            for (i, (g, t)) in got.iter().zip(target.amplitudes()).enumerate() {
                assert!((g - t).norm() < 1e-9, "n={n} amplitude {i}: {g} vs {t}");
            }
        }
    }

    #[test]
    fn test_sparse_state() {
        let zero = Complex64::new(0.0, 0.0);
        let h = Complex64::new(0.0, std::f64::consts::FRAC_1_SQRT_2);
        let target = [zero, h, zero, zero, zero, zero, h, zero];
        let got = prepared(&target, 0, 3);
        for (g, t) in got.iter().zip(&target) {
            assert!((g - t).norm() < 1e-9);
        }
    }

    #[test]
    fn test_ground_state_needs_no_gates() {
        let tables = SignTableCache::new();
        let mut target = vec![Complex64::new(0.0, 0.0); 8];
        target[0] = Complex64::new(1.0, 0.0);
        let (gates, phase) = synthesize_state(&target, 0, &tables, 1e-12).unwrap();
        assert!(gates.is_empty());
        assert_eq!(phase, 0.0);
    }

    #[test]
    fn test_offset_wires() {
        let mut rng = StdRng::seed_from_u64(9);
        let target = Statevector::random(2, &mut rng);
        let got = prepared(target.amplitudes(), 1, 3);
        // Wire 0 stays |0⟩; the state sits on wires 1 and 2.
        for (x, t) in target.amplitudes().iter().enumerate() {
            assert!((got[x << 1] - t).norm() < 1e-9);
            assert!(got[(x << 1) | 1].norm() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_non_finite() {
        let tables = SignTableCache::new();
        let bad = [Complex64::new(f64::NAN, 0.0), Complex64::new(0.0, 0.0)];
        assert!(matches!(
            synthesize_state(&bad, 0, &tables, 1e-12),
            Err(CompileError::NumericOverflow { index: 0, .. })
        ));
    }
}
