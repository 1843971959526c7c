//! Verify command implementation.

use anyhow::{Context, Result};
use console::style;

use qsynth_compile::UnitaryCompiler;
use qsynth_sim::{MAX_DENSE_QUBITS, circuit_unitary, phase_aligned_error};

use super::common::{load_config, load_matrix, spinner};

/// Execute the verify command.
///
/// Fails when the phase-aligned error exceeds the configured
/// `verify_tolerance`.
pub fn execute(input: &str, config: Option<&str>) -> Result<()> {
    eprintln!(
        "{} Verifying {}",
        style("→").cyan().bold(),
        style(input).green()
    );

    let (matrix, num_qubits) = load_matrix(input)?;
    if num_qubits > MAX_DENSE_QUBITS {
        anyhow::bail!("{num_qubits} qubits exceed the verifier limit of {MAX_DENSE_QUBITS}");
    }

    let config = load_config(config)?;
    let tolerance = config.verify_tolerance;
    let compiler = UnitaryCompiler::new(config)?;

    let pb = spinner("Synthesizing");
    let result = compiler.compile(&matrix, num_qubits);
    pb.finish_and_clear();
    let program = result.with_context(|| format!("Failed to compile {input}"))?;

    let circuit = program.to_circuit("verify")?;
    let rebuilt = circuit_unitary(&circuit).context("Failed to reconstruct operator")?;

    let error = phase_aligned_error(&matrix, &rebuilt)?;
    println!(
        "  Strategy: {}, {} gates, {} CNOTs",
        style(program.strategy).yellow(),
        program.len(),
        program.entangler_count()
    );
    println!("  Phase-aligned error: {error:.3e} (tolerance {tolerance:.1e})");

    if error > tolerance {
        anyhow::bail!("Verification failed: error {error:.3e} exceeds {tolerance:.1e}");
    }

    println!("{} Program matches input", style("✓").green().bold());
    Ok(())
}
