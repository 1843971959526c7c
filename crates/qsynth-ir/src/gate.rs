//! Gate vocabulary of synthesized circuits.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};

/// Fixed gates the simulator applies with dedicated kernels.
///
/// Rotations follow `R_a(θ) = exp(-iθ·A/2)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "angle", rename_all = "lowercase")]
pub enum StandardGate {
    /// Pauli-X.
    X,
    /// Pauli-Y.
    Y,
    /// Pauli-Z.
    Z,
    /// Hadamard.
    H,
    /// `diag(1, i)`.
    S,
    /// `diag(1, -i)`.
    Sdg,
    /// X rotation.
    Rx(f64),
    /// Y rotation.
    Ry(f64),
    /// Z rotation, `diag(e^{-iθ/2}, e^{iθ/2})`.
    Rz(f64),
    /// CNOT, operands `[control, target]`.
    CX,
    /// Controlled-Z.
    CZ,
    /// Exchange of two wires.
    Swap,
}

impl StandardGate {
    /// Lowercase mnemonic.
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::CX => "cx",
            StandardGate::CZ => "cz",
            StandardGate::Swap => "swap",
        }
    }

    /// Number of operands.
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::CX | StandardGate::CZ | StandardGate::Swap => 2,
            _ => 1,
        }
    }

    /// Rotation angle, if the gate has one.
    pub fn angle(&self) -> Option<f64> {
        match self {
            StandardGate::Rx(t) | StandardGate::Ry(t) | StandardGate::Rz(t) => Some(*t),
            _ => None,
        }
    }
}

/// Gate given by a dense row-major `2^n × 2^n` matrix.
///
/// Operand `k` of the instruction corresponds to bit `k` of the matrix index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixGate {
    /// Display name.
    pub name: String,
    /// Number of operands.
    pub num_qubits: u32,
    /// Row-major entries.
    pub matrix: Vec<Complex64>,
}

impl MatrixGate {
    /// Create a matrix gate, checking that `matrix` has `(2^num_qubits)^2` entries.
    pub fn new(
        name: impl Into<String>,
        num_qubits: u32,
        matrix: Vec<Complex64>,
    ) -> IrResult<Self> {
        let name = name.into();
        let dim = 1usize << num_qubits;
        if matrix.len() != dim * dim {
            return Err(IrError::InvalidMatrix {
                gate_name: name,
                expected: dim * dim,
                got: matrix.len(),
            });
        }
        Ok(Self {
            name,
            num_qubits,
            matrix,
        })
    }
}

/// An operation placed in a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    /// One of the fixed gates.
    Standard(StandardGate),
    /// An explicit matrix.
    Matrix(MatrixGate),
}

impl Gate {
    /// Mnemonic of a standard gate, or the matrix gate's name.
    pub fn name(&self) -> &str {
        match self {
            Gate::Standard(g) => g.name(),
            Gate::Matrix(g) => &g.name,
        }
    }

    /// Number of operands.
    pub fn num_qubits(&self) -> u32 {
        match self {
            Gate::Standard(g) => g.num_qubits(),
            Gate::Matrix(g) => g.num_qubits,
        }
    }
}

impl From<StandardGate> for Gate {
    fn from(gate: StandardGate) -> Self {
        Gate::Standard(gate)
    }
}

impl From<MatrixGate> for Gate {
    fn from(gate: MatrixGate) -> Self {
        Gate::Matrix(gate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operand_counts() {
        assert_eq!(StandardGate::H.num_qubits(), 1);
        assert_eq!(StandardGate::Rz(0.1).num_qubits(), 1);
        assert_eq!(StandardGate::CX.num_qubits(), 2);
        assert_eq!(StandardGate::Swap.num_qubits(), 2);
    }

    #[test]
    fn test_angles() {
        assert_eq!(StandardGate::Ry(0.25).angle(), Some(0.25));
        assert_eq!(StandardGate::Sdg.angle(), None);
        assert_eq!(StandardGate::CZ.angle(), None);
    }

    #[test]
    fn test_matrix_gate_size_checked() {
        let one = Complex64::new(1.0, 0.0);
        let zero = Complex64::new(0.0, 0.0);
        let gate = MatrixGate::new("id", 1, vec![one, zero, zero, one]).unwrap();
        assert_eq!(Gate::from(gate).name(), "id");

        let err = MatrixGate::new("bad", 2, vec![one; 4]).unwrap_err();
        assert!(err.to_string().contains("has 4 entries, expected 16"));
    }

    #[test]
    fn test_serialized_form() {
        let json = serde_json::to_string(&Gate::from(StandardGate::Rz(0.5))).unwrap();
        assert_eq!(json, r#"{"standard":{"name":"rz","angle":0.5}}"#);
        let back: Gate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Gate::Standard(StandardGate::Rz(0.5)));
    }
}
