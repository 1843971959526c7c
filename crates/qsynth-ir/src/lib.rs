//! qsynth Circuit Intermediate Representation
//!
//! This crate provides the gate library and the circuit container that the
//! unitary compiler emits into and the verification simulator consumes.
//!
//! # Core Components
//!
//! - **Wires**: [`QubitId`], little-endian (wire `w` is bit `w` of a basis index)
//! - **Gates**: [`StandardGate`] for the fixed gates (H, Rz, CX, etc.) and [`MatrixGate`]
//!   for gates given by an explicit matrix
//! - **Instructions**: [`Instruction`] combining a gate with its operands
//! - **Circuit**: [`Circuit`], an ordered instruction list with a global phase
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use qsynth_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::new("bell_state", 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.depth(), 2);
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `H` | 1 | Hadamard gate |
//! | `X`, `Y`, `Z` | 1 | Pauli gates |
//! | `S`, `Sdg` | 1 | S and S-dagger gates |
//! | `Rx`, `Ry`, `Rz` | 1 | Rotation gates |
//! | `CX` | 2 | Controlled-NOT (CNOT) |
//! | `CZ` | 2 | Controlled-Z |
//! | `Swap` | 2 | SWAP gate |
//! | matrix | n | Explicit 2^n × 2^n matrix |

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::{Gate, MatrixGate, StandardGate};
pub use instruction::Instruction;
pub use qubit::QubitId;
