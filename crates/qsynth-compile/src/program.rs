//! Synthesized gate programs.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

use qsynth_ir::{Circuit, IrResult, QubitId};

use crate::unitary::{Unitary2x2, wrap_angle};

/// Axis of an emitted rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationAxis {
    /// Rotation about Y.
    Y,
    /// Rotation about Z.
    Z,
}

/// One elementary operation of a synthesized program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmittedGate {
    /// Arbitrary single-qubit matrix.
    Unitary {
        /// Wire acted on.
        wire: u32,
        /// The 2x2 matrix.
        matrix: Unitary2x2,
    },
    /// Single-qubit rotation, one step of a controlled-rotation ladder.
    Rotation {
        /// Wire acted on.
        wire: u32,
        /// Rotation axis.
        axis: RotationAxis,
        /// Angle in radians.
        angle: f64,
    },
    /// CNOT.
    Entangler {
        /// Control wire.
        control: u32,
        /// Target wire.
        target: u32,
    },
}

impl EmittedGate {
    /// The inverse operation.
    pub fn inverse(&self) -> EmittedGate {
        match self {
            EmittedGate::Unitary { wire, matrix } => EmittedGate::Unitary {
                wire: *wire,
                matrix: matrix.dagger(),
            },
            EmittedGate::Rotation { wire, axis, angle } => EmittedGate::Rotation {
                wire: *wire,
                axis: *axis,
                angle: -angle,
            },
            EmittedGate::Entangler { .. } => self.clone(),
        }
    }

    /// Wires the gate touches.
    pub fn wires(&self) -> Vec<u32> {
        match self {
            EmittedGate::Unitary { wire, .. } | EmittedGate::Rotation { wire, .. } => vec![*wire],
            EmittedGate::Entangler { control, target } => vec![*control, *target],
        }
    }

    /// Whether this is a CNOT.
    pub fn is_entangler(&self) -> bool {
        matches!(self, EmittedGate::Entangler { .. })
    }
}

/// How the compiler handled an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// One qubit: a single matrix gate.
    SingleQubit,
    /// Diagonal operator: phase synthesis only.
    Diagonal,
    /// Two qubits: KAK decomposition.
    TwoQubit,
    /// Recursive Householder peeling.
    General,
    /// Amplitude encoding of a state vector.
    StatePreparation,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::SingleQubit => "single-qubit",
            Strategy::Diagonal => "diagonal",
            Strategy::TwoQubit => "two-qubit",
            Strategy::General => "general",
            Strategy::StatePreparation => "state-preparation",
        };
        f.write_str(name)
    }
}

/// A compiled gate sequence.
///
/// Applying `gates` in order and multiplying by `e^{i·global_phase}`
/// reproduces the compiled operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Number of wires.
    pub num_qubits: u32,
    /// Gates in application order.
    pub gates: Vec<EmittedGate>,
    /// Global phase in radians.
    pub global_phase: f64,
    /// The path that produced this program.
    pub strategy: Strategy,
}

impl Program {
    /// Number of gates.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Whether the program has no gates.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Number of CNOTs.
    pub fn entangler_count(&self) -> usize {
        self.gates.iter().filter(|g| g.is_entangler()).count()
    }

    /// The program implementing the inverse operator.
    pub fn inverse(&self) -> Program {
        Program {
            num_qubits: self.num_qubits,
            gates: self.gates.iter().rev().map(EmittedGate::inverse).collect(),
            global_phase: -self.global_phase,
            strategy: self.strategy,
        }
    }

    /// Rewrite every matrix gate as `Rz·Ry·Rz`, moving its phase into the
    /// global phase. Identity-like matrices are dropped.
    pub fn lower_to_rotations(&self) -> Program {
        let mut gates = Vec::with_capacity(self.gates.len());
        let mut global_phase = self.global_phase;
        for gate in &self.gates {
            let EmittedGate::Unitary { wire, matrix } = gate else {
                gates.push(gate.clone());
                continue;
            };
            if matrix.is_identity() {
                global_phase += matrix.data[0].arg();
                continue;
            }
            let (alpha, beta, gamma, phase) = matrix.zyz_decomposition();
            global_phase += phase;
            // Operator Rz(alpha)·Ry(beta)·Rz(gamma): gamma is applied first.
            for (axis, angle) in [
                (RotationAxis::Z, gamma),
                (RotationAxis::Y, beta),
                (RotationAxis::Z, alpha),
            ] {
                let (angle, turns) = wrap_angle(angle);
                global_phase += turns * PI;
                if angle.abs() > 0.0 {
                    gates.push(EmittedGate::Rotation {
                        wire: *wire,
                        axis,
                        angle,
                    });
                }
            }
        }
        Program {
            num_qubits: self.num_qubits,
            gates,
            global_phase,
            strategy: self.strategy,
        }
    }

    /// Convert into a circuit.
    ///
    /// Matrix gates become single-qubit matrix gates, rotations become
    /// `ry`/`rz` and entanglers become `cx`.
    pub fn to_circuit(&self, name: impl Into<String>) -> IrResult<Circuit> {
        let mut circuit = Circuit::new(name, self.num_qubits);
        for gate in &self.gates {
            match gate {
                EmittedGate::Unitary { wire, matrix } => {
                    circuit.unitary(matrix.data, QubitId(*wire))?;
                }
                EmittedGate::Rotation {
                    wire,
                    axis: RotationAxis::Y,
                    angle,
                } => {
                    circuit.ry(*angle, QubitId(*wire))?;
                }
                EmittedGate::Rotation {
                    wire,
                    axis: RotationAxis::Z,
                    angle,
                } => {
                    circuit.rz(*angle, QubitId(*wire))?;
                }
                EmittedGate::Entangler { control, target } => {
                    circuit.cx(QubitId(*control), QubitId(*target))?;
                }
            }
        }
        circuit.set_global_phase(self.global_phase);
        Ok(circuit)
    }

    /// `e^{i·global_phase}` as a complex number.
    pub fn phase_factor(&self) -> Complex64 {
        Complex64::from_polar(1.0, self.global_phase)
    }
}
