//! Compiler configuration.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML, or JSON by `.json` extension)
//! 2. Environment variables (with QSYNTH_ prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CompileError, CompileResult};

/// Numerical settings for the unitary compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Maximum allowed `||UU† - I||_F` for accepted inputs.
    #[serde(default = "default_unitarity_tolerance")]
    pub unitarity_tolerance: f64,

    /// Largest off-diagonal magnitude for a block to count as diagonal.
    #[serde(default = "default_diagonal_tolerance")]
    pub diagonal_tolerance: f64,

    /// Rotation angles below this magnitude are not emitted.
    #[serde(default = "default_rotation_cutoff")]
    pub rotation_cutoff: f64,

    /// Attempts at separating degenerate eigenspaces in the two-qubit path.
    #[serde(default = "default_max_degeneracy_retries")]
    pub max_degeneracy_retries: u32,

    /// Seed for the random mixing used to split degenerate eigenspaces.
    #[serde(default = "default_tie_break_seed")]
    pub tie_break_seed: u64,

    /// Acceptable phase-aligned error when verifying a compiled program.
    #[serde(default = "default_verify_tolerance")]
    pub verify_tolerance: f64,

    /// Widest operator the compiler accepts.
    #[serde(default = "default_max_qubits")]
    pub max_qubits: u32,
}

// Default value functions
fn default_unitarity_tolerance() -> f64 {
    1e-8
}

fn default_diagonal_tolerance() -> f64 {
    1e-10
}

fn default_rotation_cutoff() -> f64 {
    1e-12
}

fn default_max_degeneracy_retries() -> u32 {
    100
}

fn default_tie_break_seed() -> u64 {
    2023
}

fn default_verify_tolerance() -> f64 {
    1e-6
}

fn default_max_qubits() -> u32 {
    12
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            unitarity_tolerance: default_unitarity_tolerance(),
            diagonal_tolerance: default_diagonal_tolerance(),
            rotation_cutoff: default_rotation_cutoff(),
            max_degeneracy_retries: default_max_degeneracy_retries(),
            tie_break_seed: default_tie_break_seed(),
            verify_tolerance: default_verify_tolerance(),
            max_qubits: default_max_qubits(),
        }
    }
}

impl CompilerConfig {
    /// Load configuration from a YAML or JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> CompileResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CompileError::InvalidConfiguration(format!("cannot read {}: {e}", path.display()))
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config: CompilerConfig = if is_json {
            serde_json::from_str(&contents)
                .map_err(|e| CompileError::InvalidConfiguration(e.to_string()))?
        } else {
            serde_yaml_ng::from_str(&contents)
                .map_err(|e| CompileError::InvalidConfiguration(e.to_string()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables over the defaults.
    pub fn from_env() -> Self {
        Self::default().merge_env()
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> CompileResult<Self> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?.merge_env(),
            None => Self::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Merge environment variables into this configuration.
    fn merge_env(self) -> Self {
        self.merge_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `QSYNTH_*` overrides from `lookup`. Unparseable values are ignored.
    fn merge_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(val) = lookup("QSYNTH_UNITARITY_TOLERANCE").and_then(|v| v.parse().ok()) {
            self.unitarity_tolerance = val;
        }
        if let Some(val) = lookup("QSYNTH_DIAGONAL_TOLERANCE").and_then(|v| v.parse().ok()) {
            self.diagonal_tolerance = val;
        }
        if let Some(val) = lookup("QSYNTH_ROTATION_CUTOFF").and_then(|v| v.parse().ok()) {
            self.rotation_cutoff = val;
        }
        if let Some(val) = lookup("QSYNTH_MAX_DEGENERACY_RETRIES").and_then(|v| v.parse().ok()) {
            self.max_degeneracy_retries = val;
        }
        if let Some(val) = lookup("QSYNTH_TIE_BREAK_SEED").and_then(|v| v.parse().ok()) {
            self.tie_break_seed = val;
        }
        if let Some(val) = lookup("QSYNTH_VERIFY_TOLERANCE").and_then(|v| v.parse().ok()) {
            self.verify_tolerance = val;
        }
        if let Some(val) = lookup("QSYNTH_MAX_QUBITS").and_then(|v| v.parse().ok()) {
            self.max_qubits = val;
        }
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> CompileResult<()> {
        let positive = [
            ("unitarity_tolerance", self.unitarity_tolerance),
            ("diagonal_tolerance", self.diagonal_tolerance),
            ("verify_tolerance", self.verify_tolerance),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(CompileError::InvalidConfiguration(format!(
                    "{name} must be a positive finite number, got {value}"
                )));
            }
        }

        if !self.rotation_cutoff.is_finite() || self.rotation_cutoff < 0.0 {
            return Err(CompileError::InvalidConfiguration(format!(
                "rotation_cutoff must be non-negative, got {}",
                self.rotation_cutoff
            )));
        }

        if self.max_degeneracy_retries == 0 {
            return Err(CompileError::InvalidConfiguration(
                "max_degeneracy_retries must be greater than 0".to_string(),
            ));
        }

        if self.max_qubits == 0 || self.max_qubits > 16 {
            return Err(CompileError::InvalidConfiguration(format!(
                "max_qubits must be in 1..=16, got {}",
                self.max_qubits
            )));
        }

        Ok(())
    }

    /// Set the unitarity tolerance.
    #[must_use]
    pub fn with_unitarity_tolerance(mut self, tolerance: f64) -> Self {
        self.unitarity_tolerance = tolerance;
        self
    }

    /// Set the diagonal classification tolerance.
    #[must_use]
    pub fn with_diagonal_tolerance(mut self, tolerance: f64) -> Self {
        self.diagonal_tolerance = tolerance;
        self
    }

    /// Set the rotation cutoff.
    #[must_use]
    pub fn with_rotation_cutoff(mut self, cutoff: f64) -> Self {
        self.rotation_cutoff = cutoff;
        self
    }

    /// Set the tie-break seed.
    #[must_use]
    pub fn with_tie_break_seed(mut self, seed: u64) -> Self {
        self.tie_break_seed = seed;
        self
    }

    /// Set the maximum number of degeneracy retries.
    #[must_use]
    pub fn with_max_degeneracy_retries(mut self, retries: u32) -> Self {
        self.max_degeneracy_retries = retries;
        self
    }
}
