//! Statevector simulation engine.

use ndarray::Array2;
use num_complex::Complex64;
use rand::Rng;
use std::f64::consts::PI;

use qsynth_ir::{Circuit, Gate, Instruction, StandardGate};

use crate::error::{SimError, SimResult};

/// A statevector representing a quantum state.
///
/// Little-endian: qubit `q` is bit `q` of the amplitude index.
#[derive(Debug, Clone, PartialEq)]
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> Self {
        Self::basis(num_qubits, 0)
    }

    /// Create the computational basis state `|index⟩`.
    pub fn basis(num_qubits: usize, index: usize) -> Self {
        let size = 1 << num_qubits;
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); size];
        amplitudes[index % size] = Complex64::new(1.0, 0.0);
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Wrap raw amplitudes. The length must be a power of two.
    pub fn from_amplitudes(amplitudes: Vec<Complex64>) -> SimResult<Self> {
        let len = amplitudes.len();
        if len == 0 || !len.is_power_of_two() {
            return Err(SimError::InvalidLength(len));
        }
        Ok(Self {
            amplitudes,
            num_qubits: len.trailing_zeros() as usize,
        })
    }

    /// Draw a random normalized state.
    pub fn random<R: Rng>(num_qubits: usize, rng: &mut R) -> Self {
        let size = 1 << num_qubits;
        let mut amplitudes: Vec<Complex64> = (0..size)
            .map(|_| Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
            .collect();
        let norm = amplitudes.iter().map(Complex64::norm_sqr).sum::<f64>().sqrt();
        for amp in &mut amplitudes {
            *amp /= norm;
        }
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The amplitudes in basis order.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Consume the state and return its amplitudes.
    pub fn into_amplitudes(self) -> Vec<Complex64> {
        self.amplitudes
    }

    /// Squared norm of the state.
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(Complex64::norm_sqr).sum()
    }

    /// Inner product `⟨self|other⟩`.
    pub fn inner(&self, other: &Statevector) -> Complex64 {
        self.amplitudes
            .iter()
            .zip(&other.amplitudes)
            .map(|(a, b)| a.conj() * b)
            .sum()
    }

    /// Expectation value `⟨ψ|M|ψ⟩` of a dense operator.
    pub fn expectation(&self, observable: &Array2<Complex64>) -> SimResult<Complex64> {
        let dim = self.amplitudes.len();
        let (rows, cols) = observable.dim();
        if rows != dim || cols != dim {
            return Err(SimError::DimensionMismatch { rows, cols, dim });
        }
        let mut total = Complex64::new(0.0, 0.0);
        for (i, row) in observable.outer_iter().enumerate() {
            let m_psi: Complex64 = row
                .iter()
                .zip(&self.amplitudes)
                .map(|(m, a)| m * a)
                .sum();
            total += self.amplitudes[i].conj() * m_psi;
        }
        Ok(total)
    }

    /// Apply every instruction of a circuit, then its global phase.
    pub fn apply_circuit(&mut self, circuit: &Circuit) -> SimResult<()> {
        if circuit.num_qubits() as usize != self.num_qubits {
            return Err(SimError::WidthMismatch {
                circuit: circuit.num_qubits(),
                state: self.num_qubits as u32,
            });
        }
        for instruction in circuit.instructions() {
            self.apply(instruction)?;
        }
        if circuit.global_phase() != 0.0 {
            let phase = Complex64::from_polar(1.0, circuit.global_phase());
            for amp in &mut self.amplitudes {
                *amp *= phase;
            }
        }
        Ok(())
    }

    /// Apply an instruction to the statevector.
    pub fn apply(&mut self, instruction: &Instruction) -> SimResult<()> {
        let qubits: Vec<_> = instruction.qubits.iter().map(|q| q.index()).collect();
        match &instruction.gate {
            Gate::Standard(gate) => self.apply_standard_gate(gate, &qubits),
            Gate::Matrix(gate) => self.apply_matrix(&qubits, &gate.matrix),
        }
        Ok(())
    }

    /// Apply a standard gate.
    fn apply_standard_gate(&mut self, gate: &StandardGate, qubits: &[usize]) {
        match gate {
            // Single-qubit gates
            StandardGate::X => self.apply_x(qubits[0]),
            StandardGate::Y => self.apply_y(qubits[0]),
            StandardGate::Z => self.apply_phase(qubits[0], PI),
            StandardGate::H => self.apply_h(qubits[0]),
            StandardGate::S => self.apply_phase(qubits[0], PI / 2.0),
            StandardGate::Sdg => self.apply_phase(qubits[0], -PI / 2.0),
            StandardGate::Rx(t) => self.apply_rx(qubits[0], *t),
            StandardGate::Ry(t) => self.apply_ry(qubits[0], *t),
            StandardGate::Rz(t) => self.apply_rz(qubits[0], *t),

            // Two-qubit gates
            StandardGate::CX => self.apply_cx(qubits[0], qubits[1]),
            StandardGate::CZ => self.apply_cz(qubits[0], qubits[1]),
            StandardGate::Swap => self.apply_swap(qubits[0], qubits[1]),
        }
    }

    // =========================================================================
    // Single-qubit gate implementations
    // =========================================================================

    fn apply_x(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                self.amplitudes.swap(i, j);
            }
        }
    }

    fn apply_y(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        let i_val = Complex64::new(0.0, 1.0);
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let tmp = self.amplitudes[i];
                self.amplitudes[i] = -i_val * self.amplitudes[j];
                self.amplitudes[j] = i_val * tmp;
            }
        }
    }

    fn apply_h(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        let sqrt2_inv = 1.0 / 2.0_f64.sqrt();
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = sqrt2_inv * (a + b);
                self.amplitudes[j] = sqrt2_inv * (a - b);
            }
        }
    }

    fn apply_phase(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let phase = Complex64::from_polar(1.0, theta);
        for i in 0..(1 << self.num_qubits) {
            if i & mask != 0 {
                self.amplitudes[i] *= phase;
            }
        }
    }

    fn apply_rx(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        let neg_i_s = Complex64::new(0.0, -s);
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a + neg_i_s * b;
                self.amplitudes[j] = neg_i_s * a + c * b;
            }
        }
    }

    fn apply_ry(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a - s * b;
                self.amplitudes[j] = s * a + c * b;
            }
        }
    }

    fn apply_rz(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let phase_0 = Complex64::from_polar(1.0, -theta / 2.0);
        let phase_1 = Complex64::from_polar(1.0, theta / 2.0);
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                self.amplitudes[i] *= phase_0;
            } else {
                self.amplitudes[i] *= phase_1;
            }
        }
    }

    // =========================================================================
    // Two-qubit gate implementations
    // =========================================================================

    fn apply_cx(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        for i in 0..(1 << self.num_qubits) {
            if (i & ctrl_mask != 0) && (i & tgt_mask == 0) {
                let j = i | tgt_mask;
                self.amplitudes.swap(i, j);
            }
        }
    }

    fn apply_cz(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        for i in 0..(1 << self.num_qubits) {
            if (i & ctrl_mask != 0) && (i & tgt_mask != 0) {
                self.amplitudes[i] = -self.amplitudes[i];
            }
        }
    }

    fn apply_swap(&mut self, q1: usize, q2: usize) {
        let mask1 = 1 << q1;
        let mask2 = 1 << q2;
        for i in 0..(1 << self.num_qubits) {
            let b1 = (i & mask1) != 0;
            let b2 = (i & mask2) != 0;
            if b1 && !b2 {
                let j = (i & !mask1) | mask2;
                self.amplitudes.swap(i, j);
            }
        }
    }

    // =========================================================================
    // Dense matrix gates
    // =========================================================================

    /// Apply a row-major `2^k × 2^k` matrix to `qubits`.
    ///
    /// Operand `b` of the gate maps to bit `b` of the matrix index.
    fn apply_matrix(&mut self, qubits: &[usize], matrix: &[Complex64]) {
        let k = qubits.len();
        let sub_dim = 1usize << k;
        let full_mask: usize = qubits.iter().map(|q| 1usize << q).sum();
        let offsets: Vec<usize> = (0..sub_dim)
            .map(|s| {
                qubits
                    .iter()
                    .enumerate()
                    .filter(|(b, _)| (s >> b) & 1 == 1)
                    .map(|(_, q)| 1usize << q)
                    .sum()
            })
            .collect();

        let mut gathered = vec![Complex64::new(0.0, 0.0); sub_dim];
        for base in 0..(1usize << self.num_qubits) {
            if base & full_mask != 0 {
                continue;
            }
            for (s, off) in offsets.iter().enumerate() {
                gathered[s] = self.amplitudes[base | off];
            }
            for (r, off) in offsets.iter().enumerate() {
                self.amplitudes[base | off] = matrix[r * sub_dim..(r + 1) * sub_dim]
                    .iter()
                    .zip(&gathered)
                    .map(|(m, a)| m * a)
                    .sum();
            }
        }
    }
}
