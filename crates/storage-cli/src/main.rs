//! `secure-storage` operator CLI entry point.
//!
//! Startup sequence:
//! 1. Parse the command line.
//! 2. Load and validate [`Config`](config::Config) from environment variables.
//! 3. Initialise structured JSON logging on stderr.
//! 4. Open persistent (file) and session (in-process) backends.
//! 5. Run the subcommand and print its JSON output on stdout.

mod commands;
mod config;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use secure_storage::{FileStorage, MemoryStorage, SecureStorage};
use tracing::debug;

use commands::Cli;

fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Command line
    // -----------------------------------------------------------------------
    let cli = Cli::parse();

    // -----------------------------------------------------------------------
    // 2. Configuration
    // -----------------------------------------------------------------------
    let cfg = config::Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: storage CLI configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 3. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&cfg.log_level)?;
    debug!(version = env!("CARGO_PKG_VERSION"), path = %cfg.storage_path, "secure-storage starting");

    // -----------------------------------------------------------------------
    // 4. Backends
    // -----------------------------------------------------------------------
    let local = FileStorage::open(&cfg.storage_path)
        .with_context(|| format!("failed to open {}", cfg.storage_path))?;
    let mut store = SecureStorage::new(
        cfg.store_config(),
        Box::new(local),
        Box::new(MemoryStorage::new()),
    )?;

    // -----------------------------------------------------------------------
    // 5. Command
    // -----------------------------------------------------------------------
    let output = commands::run(&mut store, cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
