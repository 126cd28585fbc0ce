//! Telemetry initialisation for the storage CLI.
//!
//! Every subcommand prints exactly one JSON document on stdout, so scripts can
//! pipe it straight into `jq`. Log events therefore go to stderr, also as JSON
//! lines, and never carry stored values or key material.
//!
//! Log level comes from `RUST_LOG` if set, else `LOG_LEVEL` (default: `warn`).

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Initialise the tracing subscriber for the storage CLI.
///
/// # Errors
///
/// Returns an error if `log_level` is not a valid filter directive or the
/// subscriber has already been set.
pub fn init(log_level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter(log_level)?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise storage CLI tracing subscriber: {e}"))
}

fn filter(log_level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(log_level)
            .with_context(|| format!("LOG_LEVEL {log_level:?} is not a valid filter directive")),
    }
}
