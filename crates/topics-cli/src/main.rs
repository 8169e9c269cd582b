//! # topics CLI entry point
//!
//! Parses command-line arguments, loads `topics.yaml`, and dispatches to
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use topics_cli::config::{TopicsConfig, CONFIG_FILE};
use topics_cli::export::{run_export, ExportArgs};
use topics_cli::lock::{run_lock, LockArgs};
use topics_cli::schema::{run_schema, SchemaArgs};
use topics_cli::validate::{run_validate, ValidateArgs};

/// Topic content toolkit
///
/// Validates, normalizes and locks educational topic modules written as
/// JSON or YAML.
#[derive(Parser, Debug)]
#[command(name = "topics", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file (defaults to topics.yaml at the repository root).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate every topic module and report all findings.
    Validate(ValidateArgs),

    /// Write the normalized catalog as JSON.
    Export(ExportArgs),

    /// Generate or verify the topic lockfile.
    Lock(LockArgs),

    /// Print the JSON Schema for raw topic modules.
    Schema(SchemaArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "topics CLI starting");

    let repo_root = resolve_repo_root().unwrap_or_else(|| {
        tracing::debug!("no {CONFIG_FILE} found above the current directory; using it as root");
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    });

    tracing::debug!(repo_root = %repo_root.display(), "resolved repository root");

    let config = match TopicsConfig::discover(&repo_root, cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::from(1);
        }
    };

    let result = match cli.command {
        Commands::Validate(args) => run_validate(&args, &repo_root, &config),
        Commands::Export(args) => run_export(&args, &repo_root, &config),
        Commands::Lock(args) => run_lock(&args, &repo_root, &config),
        Commands::Schema(args) => run_schema(&args, &repo_root),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

/// Walk up from the current directory to the first one holding `topics.yaml`.
fn resolve_repo_root() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let mut dir = cwd.as_path();
    loop {
        if dir.join(CONFIG_FILE).is_file() {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}
