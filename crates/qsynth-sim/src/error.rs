//! Error types for the sim crate.

use thiserror::Error;

/// Errors produced while simulating circuits.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimError {
    /// Circuit and state disagree on the number of wires.
    #[error("Circuit acts on {circuit} qubits but the state has {state}")]
    WidthMismatch {
        /// Width of the circuit.
        circuit: u32,
        /// Width of the state.
        state: u32,
    },

    /// Amplitude vector length is not a power of two.
    #[error("State length {0} is not a power of two")]
    InvalidLength(usize),

    /// Operator does not match the state dimension.
    #[error("Operator is {rows}x{cols}, expected {dim}x{dim}")]
    DimensionMismatch {
        /// Operator rows.
        rows: usize,
        /// Operator columns.
        cols: usize,
        /// State dimension.
        dim: usize,
    },

    /// Dense reconstruction requested for too wide a circuit.
    #[error("Refusing to build a dense operator on {requested} qubits (max {max})")]
    TooManyQubits {
        /// Requested width.
        requested: u32,
        /// Maximum supported width.
        max: u32,
    },
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
