//! The unitary compiler.
//!
//! Inputs are validated and classified once, then dispatched to the
//! synthesizer for their class. General operators are peeled by
//! Householder reflections, one wire per frame: the first half of the
//! block's columns is reduced, which leaves a diagonal on the upper half
//! and a unitary on the lower half for the next frame. Each reflection
//! `I − 2uu†` is realized as `W·Z_e·W†` with `W` preparing `u` and `Z_e`
//! flipping the phase of one basis state.

use ndarray::{Array2, s};
use num_complex::Complex64;
use std::fmt;
use tracing::{debug, info, instrument};

use crate::config::CompilerConfig;
use crate::diagonal::synthesize_diagonal;
use crate::error::{CompileError, CompileResult};
use crate::householder::{HouseholderQr, Reflector};
use crate::program::{EmittedGate, Program, Strategy};
use crate::sign::SignTableCache;
use crate::stateprep::synthesize_state;
use crate::two_qubit::{TwoQubitDecomposition, to_matrix4};
use crate::unitary::{Unitary2x2, max_off_diagonal, unitarity_deviation};

/// Which synthesizer handles an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// One qubit.
    SingleQubit,
    /// Diagonal within `diagonal_tolerance`, any width.
    Diagonal,
    /// Two qubits, not diagonal.
    TwoQubit,
    /// Three or more qubits, not diagonal.
    General,
}

impl From<Classification> for Strategy {
    fn from(class: Classification) -> Self {
        match class {
            Classification::SingleQubit => Strategy::SingleQubit,
            Classification::Diagonal => Strategy::Diagonal,
            Classification::TwoQubit => Strategy::TwoQubit,
            Classification::General => Strategy::General,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Strategy::from(*self))
    }
}

/// A block still to be peeled.
struct DecompositionFrame {
    /// The remaining sub-unitary.
    block: Array2<Complex64>,
    /// Number of high wires fixed to |1⟩.
    depth: u32,
}

/// What a frame and everything below it contributes.
struct FrameOutput {
    /// Reflection gates, deepest frame first.
    gates: Vec<EmittedGate>,
    /// Pivots of this frame followed by those of deeper frames.
    diagonal: Vec<Complex64>,
    global_phase: f64,
}

/// Compiles unitaries and state vectors into gate programs.
///
/// Sign tables are built on first use and shared by every compilation that
/// runs on this compiler.
#[derive(Debug)]
pub struct UnitaryCompiler {
    config: CompilerConfig,
    tables: SignTableCache,
}

impl UnitaryCompiler {
    /// Create a compiler with a validated configuration.
    pub fn new(config: CompilerConfig) -> CompileResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            tables: SignTableCache::new(),
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Number of sign tables built so far.
    pub fn cached_tables(&self) -> usize {
        self.tables.len()
    }

    /// Check that `unitary` is a `2^num_qubits` square unitary.
    pub fn validate(&self, unitary: &Array2<Complex64>, num_qubits: u32) -> CompileResult<()> {
        let (rows, cols) = unitary.dim();
        if rows != cols {
            return Err(CompileError::Shape(format!(
                "matrix is {rows}x{cols}, expected square"
            )));
        }
        if num_qubits == 0 {
            return Err(CompileError::Shape(
                "qubit count must be at least 1".to_string(),
            ));
        }
        if num_qubits > self.config.max_qubits {
            return Err(CompileError::Shape(format!(
                "{num_qubits} qubits exceeds the configured maximum of {}",
                self.config.max_qubits
            )));
        }
        if rows != 1usize << num_qubits {
            return Err(CompileError::Shape(format!(
                "dimension {rows} does not match 2^{num_qubits}"
            )));
        }

        let deviation = unitarity_deviation(unitary);
        // NaN fails this comparison too.
        if !(deviation < self.config.unitarity_tolerance) {
            return Err(CompileError::Unitarity {
                deviation,
                tolerance: self.config.unitarity_tolerance,
            });
        }
        Ok(())
    }

    /// Validate `unitary` and pick its synthesizer.
    pub fn classify(
        &self,
        unitary: &Array2<Complex64>,
        num_qubits: u32,
    ) -> CompileResult<Classification> {
        self.validate(unitary, num_qubits)?;
        Ok(self.classify_unchecked(unitary, num_qubits))
    }

    fn classify_unchecked(&self, unitary: &Array2<Complex64>, num_qubits: u32) -> Classification {
        if num_qubits == 1 {
            Classification::SingleQubit
        } else if max_off_diagonal(unitary) < self.config.diagonal_tolerance {
            Classification::Diagonal
        } else if num_qubits == 2 {
            Classification::TwoQubit
        } else {
            Classification::General
        }
    }

    /// Compile `unitary` on `num_qubits` wires.
    ///
    /// Applying the returned gates in order and multiplying by
    /// `e^{i·global_phase}` reproduces `unitary`.
    #[instrument(skip(self, unitary))]
    pub fn compile(&self, unitary: &Array2<Complex64>, num_qubits: u32) -> CompileResult<Program> {
        let class = self.classify(unitary, num_qubits)?;
        debug!("Classified {}-qubit operator as {}", num_qubits, class);

        let (gates, global_phase) = match class {
            Classification::SingleQubit => self.compile_single_qubit(unitary),
            Classification::Diagonal => self.compile_diagonal(unitary)?,
            Classification::TwoQubit => self.compile_two_qubit(unitary)?,
            Classification::General => self.compile_general(unitary, num_qubits)?,
        };

        let program = Program {
            num_qubits,
            gates,
            global_phase,
            strategy: class.into(),
        };
        info!(
            "Compiled {} qubits with {} strategy: {} gates, {} entanglers",
            num_qubits,
            program.strategy,
            program.len(),
            program.entangler_count()
        );
        Ok(program)
    }

    /// Synthesize a program that maps `|0…0⟩` to `amplitudes`.
    #[instrument(skip(self, amplitudes))]
    pub fn prepare_state(&self, amplitudes: &[Complex64]) -> CompileResult<Program> {
        let len = amplitudes.len();
        if len < 2 || !len.is_power_of_two() {
            return Err(CompileError::Shape(format!(
                "state length must be a power of two of at least 2, got {len}"
            )));
        }
        let num_qubits = len.trailing_zeros();
        if num_qubits > self.config.max_qubits {
            return Err(CompileError::Shape(format!(
                "{num_qubits} qubits exceeds the configured maximum of {}",
                self.config.max_qubits
            )));
        }
        let norm = amplitudes
            .iter()
            .map(Complex64::norm_sqr)
            .sum::<f64>()
            .sqrt();
        if !((norm - 1.0).abs() <= self.config.unitarity_tolerance) {
            return Err(CompileError::NotNormalized {
                norm,
                tolerance: self.config.unitarity_tolerance,
            });
        }

        let (gates, global_phase) =
            synthesize_state(amplitudes, 0, &self.tables, self.config.rotation_cutoff)?;
        let program = Program {
            num_qubits,
            gates,
            global_phase,
            strategy: Strategy::StatePreparation,
        };
        info!(
            "Prepared {}-qubit state: {} gates, {} entanglers",
            num_qubits,
            program.len(),
            program.entangler_count()
        );
        Ok(program)
    }

    /// Synthesize `diag(diagonal)`. Every entry must have unit modulus.
    pub fn synthesize_diagonal(&self, diagonal: &[Complex64]) -> CompileResult<Program> {
        let len = diagonal.len();
        if len < 2 || !len.is_power_of_two() {
            return Err(CompileError::Shape(format!(
                "diagonal length must be a power of two of at least 2, got {len}"
            )));
        }
        let deviation = diagonal
            .iter()
            .map(|z| (z.norm() - 1.0).abs())
            .fold(0.0, f64::max);
        if !(deviation < self.config.unitarity_tolerance) {
            return Err(CompileError::Unitarity {
                deviation,
                tolerance: self.config.unitarity_tolerance,
            });
        }

        let (gates, global_phase) =
            synthesize_diagonal(diagonal, 0, &self.tables, self.config.rotation_cutoff)?;
        Ok(Program {
            num_qubits: len.trailing_zeros(),
            gates,
            global_phase,
            strategy: Strategy::Diagonal,
        })
    }

    fn compile_single_qubit(&self, unitary: &Array2<Complex64>) -> (Vec<EmittedGate>, f64) {
        let matrix = Unitary2x2::from_array(unitary);
        let phase = matrix.global_phase();
        let special = matrix.scale(Complex64::from_polar(1.0, -phase));
        (
            vec![EmittedGate::Unitary {
                wire: 0,
                matrix: special,
            }],
            phase,
        )
    }

    fn compile_diagonal(&self, unitary: &Array2<Complex64>) -> CompileResult<(Vec<EmittedGate>, f64)> {
        let diagonal = unitary.diag().to_vec();
        synthesize_diagonal(&diagonal, 0, &self.tables, self.config.rotation_cutoff)
    }

    fn compile_two_qubit(&self, unitary: &Array2<Complex64>) -> CompileResult<(Vec<EmittedGate>, f64)> {
        let u = to_matrix4(unitary)?;
        let decomposition = TwoQubitDecomposition::new(&u, &self.config)?;
        Ok(decomposition.gates(self.config.rotation_cutoff))
    }

    fn compile_general(
        &self,
        unitary: &Array2<Complex64>,
        num_qubits: u32,
    ) -> CompileResult<(Vec<EmittedGate>, f64)> {
        let frame = DecompositionFrame {
            block: unitary.clone(),
            depth: 0,
        };
        let output = self.peel(frame, num_qubits)?;

        let (mut gates, phase) = synthesize_diagonal(
            &output.diagonal,
            0,
            &self.tables,
            self.config.rotation_cutoff,
        )?;
        gates.extend(output.gates);
        Ok((gates, phase + output.global_phase))
    }

    /// Peel one frame and recurse on its lower half.
    fn peel(&self, frame: DecompositionFrame, num_qubits: u32) -> CompileResult<FrameOutput> {
        let size = frame.block.nrows();
        if size == 1 || max_off_diagonal(&frame.block) < self.config.diagonal_tolerance {
            debug!(depth = frame.depth, size, "Terminal frame");
            return Ok(FrameOutput {
                gates: vec![],
                diagonal: frame.block.diag().to_vec(),
                global_phase: 0.0,
            });
        }

        let half = size / 2;
        let mut qr = HouseholderQr::new(frame.block);
        let mut reflectors = Vec::with_capacity(half);
        for _ in 0..half {
            reflectors.extend(qr.step()?);
        }
        let work = qr.into_inner();
        debug!(
            depth = frame.depth,
            size,
            reflections = reflectors.len(),
            "Peeled frame"
        );

        let child = self.peel(
            DecompositionFrame {
                block: work.slice(s![half.., half..]).to_owned(),
                depth: frame.depth + 1,
            },
            num_qubits,
        )?;

        let mut gates = child.gates;
        let mut global_phase = child.global_phase;
        for reflector in reflectors.iter().rev() {
            let (reflection, phase) = self.emit_reflection(reflector, frame.depth, num_qubits)?;
            gates.extend(reflection);
            global_phase += phase;
        }

        let mut diagonal: Vec<Complex64> = (0..half).map(|i| work[[i, i]]).collect();
        diagonal.extend(child.diagonal);
        Ok(FrameOutput {
            gates,
            diagonal,
            global_phase,
        })
    }

    /// Realize `I − 2ũũ†`, where `ũ` places the reflector on the block of
    /// basis states whose top `depth` wires are set.
    fn emit_reflection(
        &self,
        reflector: &Reflector,
        depth: u32,
        num_qubits: u32,
    ) -> CompileResult<(Vec<EmittedGate>, f64)> {
        let cutoff = self.config.rotation_cutoff;
        let amplitudes = reflector.vector.to_vec();
        let (prepare, _) = synthesize_state(&amplitudes, 0, &self.tables, cutoff)?;

        let active = num_qubits - depth;
        let flipped = ((1usize << depth) - 1) << active;
        let mut phases = vec![Complex64::new(1.0, 0.0); 1usize << num_qubits];
        phases[flipped] = Complex64::new(-1.0, 0.0);
        let (flip, phase) = synthesize_diagonal(&phases, 0, &self.tables, cutoff)?;

        // W† then Z_e then W; the phases of W and W† cancel.
        let mut gates = Vec::with_capacity(2 * prepare.len() + flip.len());
        gates.extend(prepare.iter().rev().map(EmittedGate::inverse));
        gates.extend(flip);
        gates.extend(prepare);
        Ok((gates, phase))
    }
}

impl Default for UnitaryCompiler {
    fn default() -> Self {
        Self {
            config: CompilerConfig::default(),
            tables: SignTableCache::new(),
        }
    }
}

/// Compile `unitary` with the default configuration.
pub fn compile(unitary: &Array2<Complex64>, num_qubits: u32) -> CompileResult<Program> {
    UnitaryCompiler::default().compile(unitary, num_qubits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(entries: &[Complex64]) -> Array2<Complex64> {
        Array2::from_diag(&ndarray::Array1::from(entries.to_vec()))
    }

    fn phases(angles: &[f64]) -> Vec<Complex64> {
        angles.iter().map(|&a| Complex64::from_polar(1.0, a)).collect()
    }

    #[test]
    fn test_compiler_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<UnitaryCompiler>();
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = CompilerConfig::default().with_unitarity_tolerance(0.0);
        assert!(matches!(
            UnitaryCompiler::new(config),
            Err(CompileError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_shape_errors() {
        let compiler = UnitaryCompiler::default();
        let rect = Array2::<Complex64>::zeros((2, 4));
        assert!(matches!(compiler.compile(&rect, 1), Err(CompileError::Shape(_))));

        let three = Array2::from_diag_elem(3, Complex64::new(1.0, 0.0));
        assert!(matches!(compiler.compile(&three, 2), Err(CompileError::Shape(_))));

        let four = Array2::from_diag_elem(4, Complex64::new(1.0, 0.0));
        assert!(matches!(compiler.compile(&four, 3), Err(CompileError::Shape(_))));
        assert!(matches!(compiler.compile(&four, 0), Err(CompileError::Shape(_))));
    }

    #[test]
    fn test_max_qubits_enforced() {
        let config = CompilerConfig {
            max_qubits: 2,
            ..CompilerConfig::default()
        };
        let compiler = UnitaryCompiler::new(config).unwrap();
        let eight = Array2::from_diag_elem(8, Complex64::new(1.0, 0.0));
        assert!(matches!(compiler.compile(&eight, 3), Err(CompileError::Shape(_))));
    }

    #[test]
    fn test_unitarity_error() {
        let compiler = UnitaryCompiler::default();
        let scaled = Array2::from_diag_elem(2, Complex64::new(1.1, 0.0));
        assert!(matches!(
            compiler.compile(&scaled, 1),
            Err(CompileError::Unitarity { .. })
        ));
        let nan = Array2::from_diag_elem(2, Complex64::new(f64::NAN, 0.0));
        assert!(matches!(
            compiler.compile(&nan, 1),
            Err(CompileError::Unitarity { .. })
        ));
    }

    #[test]
    fn test_classification() {
        let compiler = UnitaryCompiler::default();
        let h = Unitary2x2::h().to_array();
        assert_eq!(compiler.classify(&h, 1).unwrap(), Classification::SingleQubit);

        let d = diag(&phases(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8]));
        assert_eq!(compiler.classify(&d, 3).unwrap(), Classification::Diagonal);

        let hh = crate::unitary::kron(&h, &h);
        assert_eq!(compiler.classify(&hh, 2).unwrap(), Classification::TwoQubit);

        let hhh = crate::unitary::kron(&hh, &h);
        assert_eq!(compiler.classify(&hhh, 3).unwrap(), Classification::General);
        assert_eq!(Classification::General.to_string(), "general");
    }

    #[test]
    fn test_single_qubit_is_one_gate() {
        let compiler = UnitaryCompiler::default();
        let u = Unitary2x2::ry(0.3).scale(Complex64::from_polar(1.0, 0.9));
        let program = compiler.compile(&u.to_array(), 1).unwrap();
        assert_eq!(program.strategy, Strategy::SingleQubit);
        assert_eq!(program.len(), 1);
        let EmittedGate::Unitary { matrix, .. } = &program.gates[0] else {
            panic!("expected a matrix gate");
        };
        let rebuilt = matrix.scale(program.phase_factor());
        for (a, b) in rebuilt.data.iter().zip(u.data.iter()) {
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn test_diagonal_skips_householder() {
        let compiler = UnitaryCompiler::default();
        let d = diag(&phases(&[0.0, 1.0, -0.5, 2.0, 0.3, 0.3, -1.2, 0.9]));
        let program = compiler.compile(&d, 3).unwrap();
        assert_eq!(program.strategy, Strategy::Diagonal);
        assert!(program.gates.iter().all(|g| match g {
            EmittedGate::Rotation { axis, .. } => *axis == crate::program::RotationAxis::Z,
            EmittedGate::Entangler { .. } => true,
            EmittedGate::Unitary { .. } => false,
        }));
        // Only the diagonal synthesizer ran: tables for 1..=3 wires.
        assert_eq!(compiler.cached_tables(), 3);
    }

    #[test]
    fn test_prepare_state_validation() {
        let compiler = UnitaryCompiler::default();
        let one = Complex64::new(1.0, 0.0);
        assert!(matches!(
            compiler.prepare_state(&[one]),
            Err(CompileError::Shape(_))
        ));
        assert!(matches!(
            compiler.prepare_state(&[one, one]),
            Err(CompileError::NotNormalized { .. })
        ));
        let program = compiler
            .prepare_state(&[Complex64::new(0.0, 0.0), one])
            .unwrap();
        assert_eq!(program.strategy, Strategy::StatePreparation);
        assert_eq!(program.num_qubits, 1);
    }

    #[test]
    fn test_synthesize_diagonal_validation() {
        let compiler = UnitaryCompiler::default();
        let half = Complex64::new(0.5, 0.0);
        assert!(matches!(
            compiler.synthesize_diagonal(&[half, half]),
            Err(CompileError::Unitarity { .. })
        ));
        let program = compiler
            .synthesize_diagonal(&phases(&[0.0, 0.4, 0.8, 1.2]))
            .unwrap();
        assert_eq!(program.num_qubits, 2);
    }
}
