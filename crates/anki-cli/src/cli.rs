//! CLI argument parsing using clap derive
//!
//! Every setting can also come from an `ANKI_SYNC_*` environment variable or
//! the config file. Values left unset here are filled in by
//! [`Settings::resolve`](crate::config::Settings::resolve).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// anki-sync - Declaratively sync models and decks into Anki via AnkiConnect
#[derive(Parser, Debug)]
#[command(name = "anki-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalArgs {
    /// Config file (YAML, TOML or JSON) [default: anki-sync.yaml]
    #[arg(long, global = true, env = "ANKI_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// AnkiConnect URL [default: http://127.0.0.1:8765]
    #[arg(long, global = true, env = "ANKI_SYNC_ANKI_URL")]
    pub anki_url: Option<String>,

    /// Show what would change without writing anything
    #[arg(long, global = true, env = "ANKI_SYNC_DRY_RUN")]
    pub dry_run: bool,

    /// Log level or filter directive [default: info]
    #[arg(long, global = true, env = "ANKI_SYNC_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Request timeout in seconds [default: 10]
    #[arg(long, global = true, env = "ANKI_SYNC_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Sync models and decks into Anki
    ///
    /// Examples:
    ///   anki-sync sync --models models.yaml --decks decks/
    ///   anki-sync sync --decks decks/ --recursive --dry-run
    Sync(SyncArgs),

    /// Read resources from Anki
    Get {
        #[command(subcommand)]
        resource: GetResource,
    },

    /// Show the anki-sync and AnkiConnect versions
    Version,
}

/// Options of the `sync` command
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncArgs {
    /// Models document
    #[arg(long, env = "ANKI_SYNC_MODELS")]
    pub models: Option<PathBuf>,

    /// Deck document or directory of deck documents
    #[arg(long, env = "ANKI_SYNC_DECKS")]
    pub decks: Option<PathBuf>,

    /// Descend into subdirectories of the decks directory
    #[arg(long, env = "ANKI_SYNC_RECURSIVE")]
    pub recursive: bool,

    /// Concurrent note uploads per deck [default: number of CPUs]
    #[arg(long, env = "ANKI_SYNC_UPLOAD_PARALLELISM")]
    pub upload_parallelism: Option<usize>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum GetResource {
    /// Print a model's templates and styling as a models document
    Model {
        /// Model name
        #[arg(long)]
        name: String,
    },
}

impl Cli {
    /// Sync options, or their defaults for other commands
    pub fn sync_args(&self) -> SyncArgs {
        match &self.command {
            Commands::Sync(args) => args.clone(),
            _ => SyncArgs::default(),
        }
    }
}
