//! anki-sync CLI
//!
//! Declaratively syncs note models and decks into Anki through AnkiConnect.

mod cli;
mod commands;
mod config;
mod error;
mod interrupt;
mod logging;

use clap::Parser;
use colored::Colorize;

use anki_core::CancellationToken;

use cli::{Cli, Commands, GetResource};
use config::{FileConfig, Settings};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let (config_path, explicit) = config::config_path(&cli.global);
    let file = FileConfig::load(&config_path, explicit)?;
    let settings = Settings::resolve(&cli.global, &cli.sync_args(), file);

    logging::init(&settings.log_level)?;
    tracing::debug!(config = %config_path.display(), ?settings, "Resolved settings");

    match cli.command {
        Commands::Sync(_) => {
            let cancel = CancellationToken::new();
            interrupt::cancel_on_interrupt(cancel.clone());
            commands::run_sync(&settings, cancel)
        }
        Commands::Get {
            resource: GetResource::Model { name },
        } => commands::run_get_model(&settings, &name),
        Commands::Version => commands::run_version(&settings),
    }
}
