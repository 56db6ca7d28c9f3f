//! # imx CLI entry point
//!
//! Parses command-line arguments, sets up logging and dispatches to the
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use imx_cli::build::{run_build, BuildArgs};
use imx_cli::check::{run_check, CheckArgs};
use imx_cli::{resolve_config, EXIT_OPERATIONAL};

/// Imagery index builder.
///
/// Validates feature and resource documents, keeps them in canonical form
/// and produces the aggregate JSON artifacts and the localization extract.
#[derive(Parser, Debug)]
#[command(name = "imx", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file (default: ./imx.yaml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rewrite sources in canonical form and write the artifacts.
    Build(BuildArgs),

    /// Report non-canonical sources without writing anything.
    Check(CheckArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let working_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let result = resolve_config(cli.config.as_deref(), &working_dir).and_then(|config| {
        match &cli.command {
            Commands::Build(args) => run_build(args, config),
            Commands::Check(args) => run_check(args, config),
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_OPERATIONAL)
        }
    }
}
