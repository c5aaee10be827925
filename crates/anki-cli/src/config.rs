//! Config file loading and settings resolution
//!
//! Precedence, highest first: command-line flag, `ANKI_SYNC_*` environment
//! variable (both handled by clap), config file, built-in default.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anki_core::{SyncOptions, default_parallelism};
use serde::Deserialize;

use crate::cli::{GlobalArgs, SyncArgs};
use crate::error::{CliError, Result};

/// Config file used when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "anki-sync.yaml";

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Contents of the config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub anki_url: Option<String>,
    pub dry_run: Option<bool>,
    pub log_level: Option<String>,
    pub models: Option<PathBuf>,
    pub decks: Option<PathBuf>,
    pub recursive: Option<bool>,
    pub upload_parallelism: Option<usize>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Load the config file at `path`.
    ///
    /// A missing file is only an error when it was asked for explicitly.
    pub fn load(path: &Path, explicit: bool) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound && !explicit => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(CliError::config(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };
        Self::parse(path, &content)
    }

    /// Parse `content` in the format given by the extension of `path`.
    ///
    /// Files without a recognised extension are read as YAML.
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let parsed = match extension.as_str() {
            "toml" => toml::from_str(content).map_err(|e| ("TOML", e.to_string())),
            "json" => serde_json::from_str(content).map_err(|e| ("JSON", e.to_string())),
            _ if content.trim().is_empty() => Ok(Self::default()),
            _ => serde_yaml::from_str(content).map_err(|e| ("YAML", e.to_string())),
        };

        parsed.map_err(|(format, message)| {
            CliError::config(format!(
                "Failed to parse {} as {}: {}",
                path.display(),
                format,
                message
            ))
        })
    }
}

/// Effective settings after merging flags, environment and config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub anki_url: String,
    pub dry_run: bool,
    pub log_level: String,
    pub timeout: Duration,
    pub models: Option<PathBuf>,
    pub decks: Option<PathBuf>,
    pub recursive: bool,
    pub upload_parallelism: usize,
}

impl Settings {
    pub fn resolve(global: &GlobalArgs, sync: &SyncArgs, file: FileConfig) -> Self {
        Self {
            anki_url: global
                .anki_url
                .clone()
                .or(file.anki_url)
                .unwrap_or_else(|| anki_connect::DEFAULT_URL.to_string()),
            dry_run: global.dry_run || file.dry_run.unwrap_or(false),
            log_level: global
                .log_level
                .clone()
                .or(file.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            timeout: Duration::from_secs(
                global
                    .timeout_secs
                    .or(file.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            models: sync.models.clone().or(file.models),
            decks: sync.decks.clone().or(file.decks),
            recursive: sync.recursive || file.recursive.unwrap_or(false),
            upload_parallelism: sync
                .upload_parallelism
                .or(file.upload_parallelism)
                .unwrap_or_else(default_parallelism),
        }
    }

    /// Everything `sync` needs, or a configuration error naming what is missing
    pub fn sync_plan(&self) -> Result<SyncPlan> {
        let models = self.models.clone().ok_or_else(|| {
            CliError::config("models path is not set (use --models, ANKI_SYNC_MODELS or `models`)")
        })?;
        let decks = self.decks.clone().ok_or_else(|| {
            CliError::config("decks path is not set (use --decks, ANKI_SYNC_DECKS or `decks`)")
        })?;
        if self.upload_parallelism == 0 {
            return Err(CliError::config("upload parallelism must be at least 1"));
        }

        Ok(SyncPlan {
            models,
            decks,
            recursive: self.recursive,
            options: SyncOptions {
                dry_run: self.dry_run,
                note_parallelism: self.upload_parallelism,
            },
        })
    }
}

/// Validated inputs of a sync run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    pub models: PathBuf,
    pub decks: PathBuf,
    pub recursive: bool,
    pub options: SyncOptions,
}

/// Config file path and whether it was chosen explicitly
pub fn config_path(global: &GlobalArgs) -> (PathBuf, bool) {
    match &global.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    }
}
