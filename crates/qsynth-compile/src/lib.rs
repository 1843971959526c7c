//! qsynth Unitary Synthesis
//!
//! This crate turns numerically specified unitaries into gate programs over
//! single-qubit matrices, `Ry`/`Rz` rotations and CNOT. The result, applied
//! in order and multiplied by its global phase, reproduces the input.
//!
//! # Overview
//!
//! Every input is validated and classified before synthesis:
//! 1. **Single qubit**: one matrix gate
//! 2. **Diagonal**: uniformly controlled `Rz` ladders in Gray-code order
//! 3. **Two qubit**: magic-basis (KAK) decomposition, at most six CNOTs
//! 4. **General**: Householder peeling, one wire per frame
//!
//! # Architecture
//!
//! ```text
//! Unitary (ndarray)
//!       │
//!       ▼
//! ┌──────────────────┐
//! │ UnitaryCompiler  │ ◄── CompilerConfig, SignTableCache
//! └──────────────────┘
//!       │
//!       ├── single qubit ──► Unitary2x2
//!       ├── diagonal ──────► synthesize_diagonal ◄── gray, sign
//!       ├── two qubit ─────► TwoQubitDecomposition ◄── decompose_so4
//!       └── general ───────► HouseholderQr ──► synthesize_state + synthesize_diagonal
//!       │
//!       ▼
//! Program ──► qsynth_ir::Circuit
//! ```
//!
//! # Example
//!
//! ```rust
//! use qsynth_compile::{Strategy, UnitaryCompiler, Unitary2x2};
//! use qsynth_compile::unitary::kron;
//!
//! let h = Unitary2x2::h().to_array();
//! let hh = kron(&h, &h);
//!
//! let compiler = UnitaryCompiler::default();
//! let program = compiler.compile(&hh, 2).unwrap();
//! assert_eq!(program.strategy, Strategy::TwoQubit);
//!
//! let circuit = program.to_circuit("hh").unwrap();
//! assert_eq!(circuit.num_qubits(), 2);
//! ```

pub mod compiler;
pub mod config;
pub mod diagonal;
pub mod error;
pub mod gray;
pub mod householder;
pub mod program;
pub mod sign;
pub mod stateprep;
pub mod two_qubit;
pub mod unitary;

pub use compiler::{Classification, UnitaryCompiler, compile};
pub use config::CompilerConfig;
pub use diagonal::synthesize_diagonal;
pub use error::{CompileError, CompileResult};
pub use householder::{HouseholderQr, QrFactors, Reflector, qr_unblocked};
pub use program::{EmittedGate, Program, RotationAxis, Strategy};
pub use sign::{SignTable, SignTableCache};
pub use stateprep::synthesize_state;
pub use two_qubit::{So4Factors, TwoQubitDecomposition, decompose_so4};
pub use unitary::Unitary2x2;
