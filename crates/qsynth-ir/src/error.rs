//! Error types for the IR crate.

use crate::qubit::QubitId;
use thiserror::Error;

/// Errors raised while building circuits.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Operand outside the circuit's wire range.
    #[error("Gate '{gate_name}' addresses {qubit}, outside a {width}-qubit circuit")]
    QubitNotFound {
        /// The offending operand.
        qubit: QubitId,
        /// Width of the circuit.
        width: u32,
        /// Gate being placed.
        gate_name: String,
    },

    /// Operand count differs from the gate's arity.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Gate being placed.
        gate_name: String,
        /// Arity of the gate.
        expected: u32,
        /// Operands supplied.
        got: u32,
    },

    /// The same wire appears twice in one instruction.
    #[error("Gate '{gate_name}' uses {qubit} more than once")]
    DuplicateQubit {
        /// The repeated operand.
        qubit: QubitId,
        /// Gate being placed.
        gate_name: String,
    },

    /// Matrix attached to a gate has the wrong number of entries.
    #[error("Matrix for '{gate_name}' has {got} entries, expected {expected}")]
    InvalidMatrix {
        /// Gate being built.
        gate_name: String,
        /// `(2^n)^2`.
        expected: usize,
        /// Entries supplied.
        got: usize,
    },

    /// Two circuits with different wire counts were combined.
    #[error("Circuit width mismatch: expected {expected} qubits, got {got}")]
    WidthMismatch {
        /// Width of the receiving circuit.
        expected: u32,
        /// Width of the appended circuit.
        got: u32,
    },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
