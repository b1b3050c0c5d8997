//! Ticktrace CLI - author, inspect and play replay recordings
//!
//! # Commands
//!
//! - `ticktrace write-example` - Write the bundled sandbox recording to disk
//! - `ticktrace inspect` - Print a recording's header and event summary
//! - `ticktrace play` - Replay a recording against the sandbox world
//!
//! # Usage
//!
//! ```bash
//! ticktrace write-example --dir recordings
//! ticktrace inspect recordings/Example.ttrp
//! ticktrace play Example --dir recordings --tick-rate 1000
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

mod inspect;
mod play;
mod write_example;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ticktrace_core::{HarnessConfig, config};

/// Ticktrace CLI - record-and-replay verification tool
#[derive(Parser)]
#[command(name = "ticktrace")]
#[command(about = "Author, inspect and play replay recordings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the bundled "Example" sandbox recording
    WriteExample(write_example::WriteExampleArgs),

    /// Print a recording's header and event summary
    Inspect(inspect::InspectArgs),

    /// Replay a recording against the sandbox world
    Play(play::PlayArgs),
}

/// Resolve the recordings directory: explicit flag, then config, then the
/// platform data dir, then `./recordings`.
pub(crate) fn recordings_dir(explicit: Option<PathBuf>, config: &HarnessConfig) -> PathBuf {
    explicit
        .or_else(|| config.host.recordings_dir())
        .unwrap_or_else(|| PathBuf::from("recordings"))
}

/// Load the config from `path`, or the user config when none is given.
pub(crate) fn load_config(path: Option<&PathBuf>) -> Result<HarnessConfig> {
    match path {
        Some(path) => HarnessConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => HarnessConfig::load_user().with_context(|| {
            format!(
                "Failed to load {} from the user config directory",
                config::CONFIG_FILE_NAME
            )
        }),
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::WriteExample(args) => write_example::execute(args),
        Commands::Inspect(args) => inspect::execute(args),
        Commands::Play(args) => play::execute(args),
    }
}
