//! Version command implementation

use colored::Colorize;

use anki_connect::AnkiConnectClient;

use crate::config::Settings;
use crate::error::{CliError, Result};

/// Print the CLI version and the AnkiConnect API version.
///
/// Fails if AnkiConnect cannot be reached, after printing `unknown`.
pub fn run_version(settings: &Settings) -> Result<()> {
    println!("anki-sync {}", env!("CARGO_PKG_VERSION"));

    let client = AnkiConnectClient::connect(settings.anki_url.clone(), settings.timeout)?;

    match client.version() {
        Ok(version) => {
            println!("AnkiConnect API {}", version);
            Ok(())
        }
        Err(e) => {
            tracing::warn!(url = client.url(), error = %e, "AnkiConnect is not reachable");
            println!("AnkiConnect API {}", "unknown".yellow());
            Err(CliError::user(format!(
                "Could not reach AnkiConnect at {}",
                client.url()
            )))
        }
    }
}
