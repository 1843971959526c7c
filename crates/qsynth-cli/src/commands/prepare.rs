//! Prepare command implementation.

use anyhow::{Context, Result};
use console::style;

use qsynth_compile::UnitaryCompiler;

use super::common::{load_config, load_state, program_json, spinner, write_output};

/// Execute the prepare command.
pub fn execute(input: &str, output: Option<&str>, config: Option<&str>) -> Result<()> {
    eprintln!(
        "{} Preparing state from {}",
        style("→").cyan().bold(),
        style(input).green()
    );

    let amplitudes = load_state(input)?;
    eprintln!("  Loaded: {} amplitudes", amplitudes.len());

    let compiler = UnitaryCompiler::new(load_config(config)?)?;

    let pb = spinner("Synthesizing");
    let result = compiler.prepare_state(&amplitudes);
    pb.finish_and_clear();
    let program = result.with_context(|| format!("Failed to prepare state from {input}"))?;

    eprintln!(
        "{} {} gates, {} CNOTs on {} qubits",
        style("✓").green().bold(),
        program.len(),
        program.entangler_count(),
        program.num_qubits
    );

    write_output(&program_json(&program)?, output)?;
    if let Some(path) = output {
        eprintln!("  Output: {}", style(path).green());
    }

    Ok(())
}
