//! qsynth Statevector Engine
//!
//! Executes `qsynth_ir::Circuit`s on dense statevectors so compiled programs
//! can be checked against the operator they were synthesized from:
//!
//! - [`Statevector`]: little-endian amplitude vector with gate kernels,
//!   expectation values and inner products
//! - [`circuit_unitary`]: column-by-column operator reconstruction
//! - [`phase_aligned_error`]: relative Frobenius error modulo a global phase
//!
//! # Quick start
//!
//! ```rust
//! use qsynth_ir::{Circuit, QubitId};
//! use qsynth_sim::{Statevector, circuit_unitary};
//!
//! let mut circuit = Circuit::new("bell", 2);
//! circuit.h(QubitId(0)).unwrap().cx(QubitId(0), QubitId(1)).unwrap();
//!
//! let mut sv = Statevector::new(2);
//! sv.apply_circuit(&circuit).unwrap();
//! assert!((sv.amplitudes()[3].norm_sqr() - 0.5).abs() < 1e-12);
//!
//! let u = circuit_unitary(&circuit).unwrap();
//! assert_eq!(u.dim(), (4, 4));
//! ```

pub mod error;
pub mod operator;
pub mod statevector;

pub use error::{SimError, SimResult};
pub use operator::{MAX_DENSE_QUBITS, circuit_unitary, phase_aligned_error};
pub use statevector::Statevector;
