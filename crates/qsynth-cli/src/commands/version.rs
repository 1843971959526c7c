//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - unitary-to-circuit synthesis",
        style("qsynth").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qsynth-ir       Circuit intermediate representation");
    println!("  qsynth-compile  Diagonal, two-qubit and Householder synthesis");
    println!("  qsynth-sim      Statevector verification engine");
    println!("  qsynth-cli      Command-line interface");
    println!();
    println!("License: {}", style("Apache-2.0").dim());
}
