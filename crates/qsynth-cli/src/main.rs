//! qsynth Command-Line Interface
//!
//! Compiles numerically specified unitaries from JSON files into gate
//! programs, verifies them against the input, and synthesizes amplitude
//! encodings of state vectors.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{compile, prepare, verify, version};

/// qsynth - unitary-to-circuit synthesis
#[derive(Parser)]
#[command(name = "qsynth")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Output format of a compiled program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Serialized program (gates, phase, strategy)
    Json,
    /// One gate per line
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a unitary matrix into a gate program
    Compile {
        /// Input matrix file (JSON)
        #[arg(short, long)]
        input: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Compiler configuration (YAML or JSON)
        #[arg(short, long, env = "QSYNTH_CONFIG")]
        config: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Compile a unitary and check the program against it
    Verify {
        /// Input matrix file (JSON)
        #[arg(short, long)]
        input: String,

        /// Compiler configuration (YAML or JSON)
        #[arg(short, long, env = "QSYNTH_CONFIG")]
        config: Option<String>,
    },

    /// Synthesize a program preparing a state from |0…0⟩
    Prepare {
        /// Input state file (JSON)
        #[arg(short, long)]
        input: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Compiler configuration (YAML or JSON)
        #[arg(short, long, env = "QSYNTH_CONFIG")]
        config: Option<String>,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Compile {
            input,
            output,
            config,
            format,
        } => compile::execute(&input, output.as_deref(), config.as_deref(), format),
        Commands::Verify { input, config } => verify::execute(&input, config.as_deref()),
        Commands::Prepare {
            input,
            output,
            config,
        } => prepare::execute(&input, output.as_deref(), config.as_deref()),
        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}
