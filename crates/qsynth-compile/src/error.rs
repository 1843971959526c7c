//! Error types for the compilation crate.

use thiserror::Error;

/// Errors that can occur during synthesis.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Error from the IR crate.
    #[error("IR error: {0}")]
    Ir(#[from] qsynth_ir::IrError),

    /// Input has the wrong shape for the declared qubit count.
    #[error("Invalid shape: {0}")]
    Shape(String),

    /// Input is not unitary within tolerance.
    #[error("Matrix is not unitary: ||UU^dag - I||_F = {deviation:.3e} exceeds {tolerance:.1e}")]
    Unitarity {
        /// Measured Frobenius deviation.
        deviation: f64,
        /// Configured tolerance.
        tolerance: f64,
    },

    /// A factorization step could not separate its factors.
    #[error("Degenerate decomposition: {0}")]
    DegenerateDecomposition(String),

    /// A norm, residual or angle left the finite range.
    #[error("Numeric overflow in {stage} at index {index}: {value:e}")]
    NumericOverflow {
        /// Which synthesizer produced the value.
        stage: &'static str,
        /// Column, level or step index.
        index: usize,
        /// The offending value.
        value: f64,
    },

    /// Amplitude vector does not have unit norm.
    #[error("State is not normalized: norm {norm} (tolerance {tolerance:.1e})")]
    NotNormalized {
        /// Measured Euclidean norm.
        norm: f64,
        /// Configured tolerance.
        tolerance: f64,
    },

    /// Invalid compiler configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
