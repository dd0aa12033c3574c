//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod build;
mod inspect;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;

/// Assetpipe - Incremental asset build pipeline
#[derive(Parser)]
#[command(name = "assetpipe")]
#[command(about = "Assetpipe - Build game assets incrementally from assetpipe.toml")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build all assets declared in assetpipe.toml
    Build {
        /// Config file (default: search for assetpipe.toml upwards from the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Rebuild everything, ignoring the previous manifest
        #[arg(long)]
        force: bool,

        /// Log every pipeline step
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the contents of a build manifest
    Inspect {
        /// Manifest file (usually <output>/.assetpipe-manifest)
        manifest: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Parse arguments and run the selected command.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { config, force, verbose } => {
            init_tracing(verbose);
            build::run_build(config.as_deref(), force)
        }
        Commands::Inspect { manifest, json } => {
            init_tracing(false);
            inspect::run_inspect(&manifest, json)
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
fn init_tracing(verbose: bool) {
    let default = if verbose { "assetpipe=debug" } else { "assetpipe=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
