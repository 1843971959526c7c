//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::Array2;
use num_complex::Complex64;
use serde::Deserialize;
use tracing::debug;

use qsynth_compile::{CompilerConfig, EmittedGate, Program, RotationAxis};

/// Matrix file: rows of `[re, im]` pairs.
#[derive(Debug, Deserialize)]
pub struct MatrixFile {
    pub rows: Vec<Vec<[f64; 2]>>,
}

/// State file: a list of `[re, im]` amplitudes.
#[derive(Debug, Deserialize)]
pub struct StateFile {
    pub amplitudes: Vec<[f64; 2]>,
}

fn read_source(path: &str) -> Result<String> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))
}

/// Load a square matrix and the number of qubits it acts on.
pub fn load_matrix(path: &str) -> Result<(Array2<Complex64>, u32)> {
    let source = read_source(path)?;
    let file: MatrixFile =
        serde_json::from_str(&source).with_context(|| format!("Invalid matrix file: {path}"))?;

    let dim = file.rows.len();
    if dim == 0 || !dim.is_power_of_two() {
        anyhow::bail!("Matrix dimension {dim} is not a positive power of two");
    }
    if let Some((i, row)) = file.rows.iter().enumerate().find(|(_, r)| r.len() != dim) {
        anyhow::bail!("Row {i} has {} entries, expected {dim}", row.len());
    }

    let matrix = Array2::from_shape_fn((dim, dim), |(r, c)| {
        let [re, im] = file.rows[r][c];
        Complex64::new(re, im)
    });
    debug!(path, dim, "loaded matrix");
    Ok((matrix, dim.trailing_zeros()))
}

/// Load a state vector.
pub fn load_state(path: &str) -> Result<Vec<Complex64>> {
    let source = read_source(path)?;
    let file: StateFile =
        serde_json::from_str(&source).with_context(|| format!("Invalid state file: {path}"))?;
    debug!(path, len = file.amplitudes.len(), "loaded state");
    Ok(file
        .amplitudes
        .iter()
        .map(|[re, im]| Complex64::new(*re, *im))
        .collect())
}

/// Load the compiler configuration, file first, then `QSYNTH_` variables.
pub fn load_config(path: Option<&str>) -> Result<CompilerConfig> {
    let config =
        CompilerConfig::load(path.map(Path::new)).context("Failed to load compiler configuration")?;
    debug!(?config, "compiler configuration");
    Ok(config)
}

/// Spinner shown while a synthesis runs.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Write to a file, or to stdout when no path is given.
pub fn write_output(content: &str, output: Option<&str>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("Failed to write file: {path}"))
        }
        None => {
            println!("{content}");
            Ok(())
        }
    }
}

/// Serialize a program as pretty JSON.
pub fn program_json(program: &Program) -> Result<String> {
    serde_json::to_string_pretty(program).context("Failed to serialize program")
}

/// Render a program one gate per line.
pub fn program_text(program: &Program) -> String {
    let mut lines = vec![
        format!("# strategy: {}", program.strategy),
        format!("# qubits: {}", program.num_qubits),
        format!("# global_phase: {:.12}", program.global_phase),
    ];
    lines.extend(program.gates.iter().map(gate_text));
    lines.join("\n")
}

fn gate_text(gate: &EmittedGate) -> String {
    match gate {
        EmittedGate::Unitary { wire, matrix } => {
            let entries: Vec<String> = matrix
                .data
                .iter()
                .map(|z| format!("{:.9}{:+.9}i", z.re, z.im))
                .collect();
            format!("u q[{wire}] [{}]", entries.join(", "))
        }
        EmittedGate::Rotation { wire, axis, angle } => {
            let name = match axis {
                RotationAxis::Y => "ry",
                RotationAxis::Z => "rz",
            };
            format!("{name}({angle:.12}) q[{wire}]")
        }
        EmittedGate::Entangler { control, target } => format!("cx q[{control}], q[{target}]"),
    }
}
