//! Compile command implementation.

use anyhow::{Context, Result};
use console::style;

use qsynth_compile::UnitaryCompiler;

use super::common::{load_config, load_matrix, program_json, program_text, spinner, write_output};
use crate::OutputFormat;

/// Execute the compile command.
pub fn execute(
    input: &str,
    output: Option<&str>,
    config: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    eprintln!(
        "{} Compiling {}",
        style("→").cyan().bold(),
        style(input).green()
    );

    let (matrix, num_qubits) = load_matrix(input)?;
    eprintln!("  Loaded: {num_qubits} qubits");

    let compiler = UnitaryCompiler::new(load_config(config)?)?;

    let pb = spinner("Synthesizing");
    let result = compiler.compile(&matrix, num_qubits);
    pb.finish_and_clear();
    let program = result.with_context(|| format!("Failed to compile {input}"))?;

    eprintln!("{} Compilation complete", style("✓").green().bold());
    eprintln!(
        "  Strategy: {}, {} gates, {} CNOTs",
        style(program.strategy).yellow(),
        program.len(),
        program.entangler_count()
    );

    let content = match format {
        OutputFormat::Json => program_json(&program)?,
        OutputFormat::Text => program_text(&program),
    };
    write_output(&content, output)?;
    if let Some(path) = output {
        eprintln!("  Output: {}", style(path).green());
    }

    Ok(())
}
