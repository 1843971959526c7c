//! Ordered circuit container and builder API.

use num_complex::Complex64;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::{Gate, MatrixGate, StandardGate};
use crate::instruction::Instruction;
use crate::qubit::QubitId;

/// A quantum circuit.
///
/// An ordered gate list over a fixed number of wires, plus a global phase
/// `e^{iφ}` that multiplies the operator the gates implement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Number of wires.
    num_qubits: u32,
    /// Instructions in application order.
    instructions: Vec<Instruction>,
    /// Global phase in radians.
    global_phase: f64,
}

impl Circuit {
    /// Create an empty circuit over `num_qubits` wires.
    pub fn new(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            instructions: vec![],
            global_phase: 0.0,
        }
    }

    /// Append an instruction after validating its operands.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        self.validate(&instruction)?;
        self.instructions.push(instruction);
        Ok(self)
    }

    fn validate(&self, instruction: &Instruction) -> IrResult<()> {
        let gate_name = instruction.name();
        let expected = instruction.gate.num_qubits();
        let got = instruction.qubits.len() as u32;
        if expected != got {
            return Err(IrError::QubitCountMismatch {
                gate_name: gate_name.to_string(),
                expected,
                got,
            });
        }
        for (i, &qubit) in instruction.qubits.iter().enumerate() {
            if qubit.0 >= self.num_qubits {
                return Err(IrError::QubitNotFound {
                    qubit,
                    width: self.num_qubits,
                    gate_name: gate_name.to_string(),
                });
            }
            if instruction.qubits[..i].contains(&qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    gate_name: gate_name.to_string(),
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::H, qubit))
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::X, qubit))
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Y, qubit))
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Z, qubit))
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::S, qubit))
    }

    /// Apply S-dagger gate.
    pub fn sdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Sdg, qubit))
    }

    /// Apply Rx rotation gate.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Rx(theta), qubit))
    }

    /// Apply Ry rotation gate.
    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Ry(theta), qubit))
    }

    /// Apply Rz rotation gate.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Rz(theta), qubit))
    }

    /// Apply an arbitrary single-qubit matrix `[m00, m01, m10, m11]`.
    pub fn unitary(&mut self, matrix: [Complex64; 4], qubit: QubitId) -> IrResult<&mut Self> {
        let gate = MatrixGate::new("unitary", 1, matrix.to_vec())?;
        self.apply(Instruction::gate(gate, [qubit]))
    }

    // =========================================================================
    // Two-qubit gates
    // =========================================================================

    /// Apply CNOT (CX) gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::CX, control, target))
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::CZ, control, target))
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::Swap, q1, q2))
    }

    // =========================================================================
    // Other operations
    // =========================================================================

    /// Apply any gate.
    pub fn gate(
        &mut self,
        gate: impl Into<Gate>,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::gate(gate, qubits))
    }

    /// Append all instructions of `other` and add its global phase.
    pub fn append(&mut self, other: &Circuit) -> IrResult<&mut Self> {
        if other.num_qubits != self.num_qubits {
            return Err(IrError::WidthMismatch {
                expected: self.num_qubits,
                got: other.num_qubits,
            });
        }
        self.instructions.extend(other.instructions.iter().cloned());
        self.global_phase += other.global_phase;
        Ok(self)
    }

    /// Add `phase` radians to the global phase.
    pub fn add_global_phase(&mut self, phase: f64) -> &mut Self {
        self.global_phase += phase;
        self
    }

    /// Replace the global phase.
    pub fn set_global_phase(&mut self, phase: f64) -> &mut Self {
        self.global_phase = phase;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Instructions in application order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the circuit has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Global phase in radians.
    pub fn global_phase(&self) -> f64 {
        self.global_phase
    }

    /// Count instructions by gate name.
    pub fn count_ops(&self) -> FxHashMap<String, usize> {
        let mut counts = FxHashMap::default();
        for inst in &self.instructions {
            *counts.entry(inst.name().to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of instructions acting on two or more wires.
    pub fn num_multi_qubit_gates(&self) -> usize {
        self.instructions
            .iter()
            .filter(|inst| inst.is_multi_qubit())
            .count()
    }

    /// Group instruction indices into layers of mutually disjoint wires.
    ///
    /// Each instruction is placed in the earliest layer after the last
    /// layer touching any of its wires.
    pub fn layers(&self) -> Vec<Vec<usize>> {
        let mut wire_depth = vec![0usize; self.num_qubits as usize];
        let mut layers: Vec<Vec<usize>> = vec![];
        for (idx, inst) in self.instructions.iter().enumerate() {
            let level = inst
                .qubits
                .iter()
                .map(|q| wire_depth[q.index()])
                .max()
                .unwrap_or(0);
            if level == layers.len() {
                layers.push(vec![]);
            }
            layers[level].push(idx);
            for q in &inst.qubits {
                wire_depth[q.index()] = level + 1;
            }
        }
        layers
    }

    /// Get the circuit depth.
    pub fn depth(&self) -> usize {
        self.layers().len()
    }
}
