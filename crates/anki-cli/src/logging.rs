//! Tracing subscriber setup

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::{CliError, Result};

/// Install a compact stderr subscriber.
///
/// `RUST_LOG` takes precedence over `level`, which may be a plain level
/// (`debug`) or any filter directive (`info,anki_sync::dry_run=warn`).
pub fn init(level: &str) -> Result<()> {
    let filter = filter(level)?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| CliError::config(format!("Failed to install logger: {}", e)))
}

fn filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| CliError::config(format!("Invalid log level {:?}: {}", level, e)))
}
