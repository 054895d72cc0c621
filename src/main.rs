//! Binary entry point for stageprune.
//!
//! This binary provides the CLI interface for pruning version-stage labels.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use commands::{TargetArgs, cmd_completions, cmd_prune, cmd_stages};
use stageprune::config::StagepruneConfig;
use stageprune::observability::{self, InitOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Stageprune - keeps version-stage labels on a secret under a threshold.
#[derive(Parser)]
#[command(name = "stageprune")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "STAGEPRUNE_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Remove the oldest manageable stage if the secret is over the threshold.
    Prune {
        #[command(flatten)]
        target: TargetArgs,

        /// Show what would be removed without removing it.
        #[arg(long, env = "STAGEPRUNE_DRY_RUN")]
        dry_run: bool,
    },

    /// List the manageable stages of a secret, oldest first.
    Stages {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Print a shell completion script.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Main entry point.
#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = dotenv_outcome(dotenvy::dotenv()) {
        eprintln!("Failed to load .env: {e}");
        return ExitCode::FAILURE;
    }

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let mut observability = match observability::init_from_config(
        &config.observability,
        InitOptions {
            verbose: cli.verbose,
        },
    ) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to initialize observability: {e}");
            return ExitCode::FAILURE;
        },
    };

    let result = run_command(cli.command, &config).await;
    observability.shutdown();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
async fn run_command(
    command: Commands,
    config: &StagepruneConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Prune { target, dry_run } => cmd_prune(config, target, dry_run).await,
        Commands::Stages { target } => cmd_stages(config, target).await,
        Commands::Completions { shell } => {
            cmd_completions(shell, Cli::command());
            Ok(())
        },
    }
}

/// Accepts a missing `.env` file; parse and read failures are returned.
fn dotenv_outcome<T>(result: Result<T, dotenvy::Error>) -> Result<(), dotenvy::Error> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e),
    }
}

/// Loads configuration from an explicit path or the default location.
fn load_config(path: Option<&Path>) -> stageprune::Result<StagepruneConfig> {
    match path {
        Some(path) => StagepruneConfig::load_from_file(path),
        None => StagepruneConfig::load_default(),
    }
}
