//! Loader for the models document and deck documents
//!
//! ```text
//! models.yaml            # { models: [...] }, fatal on any error
//! decks/
//!   geography.yaml       # one deck per file
//!   languages/
//!     spanish.yml        # only visited with `recursive`
//! ```
//!
//! A deck document that cannot be parsed is skipped and reported, so one bad
//! file does not block the rest of the collection. I/O failures are fatal.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::types::{Deck, Model, ModelsDocument};
use crate::{Error, Result};

/// A deck document that was found but could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of loading deck documents
#[derive(Debug, Clone, Default)]
pub struct LoadedDecks {
    /// Parsed decks, in path order
    pub decks: Vec<Deck>,
    /// Paths of the files the decks were parsed from
    pub parsed: Vec<PathBuf>,
    /// Files that were skipped because they failed to parse
    pub skipped: Vec<SkippedFile>,
}

/// Load the models document at `path`
pub fn load_models(path: &Path) -> Result<Vec<Model>> {
    let document: ModelsDocument = parse_yaml(path)?;
    tracing::debug!(path = %path.display(), count = document.models.len(), "Loaded models");
    Ok(document.models)
}

/// Load deck documents from a file or a directory
///
/// For a directory only its direct entries are read unless `recursive` is set.
/// Files without a `.yaml` or `.yml` extension are ignored.
pub fn load_decks(path: &Path, recursive: bool) -> Result<LoadedDecks> {
    let metadata = fs::metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Error::io(path, e)
        }
    })?;

    let files = if metadata.is_dir() {
        let mut files = Vec::new();
        collect_yaml_files(path, recursive, &mut files)?;
        files.sort();
        files
    } else if is_yaml(path) {
        vec![path.to_path_buf()]
    } else {
        Vec::new()
    };

    let mut loaded = LoadedDecks::default();
    for file in files {
        match parse_yaml::<Deck>(&file) {
            Ok(deck) => {
                loaded.decks.push(deck);
                loaded.parsed.push(file);
            }
            Err(Error::Parse { path, message }) => {
                tracing::warn!(path = %path.display(), error = %message, "Skipping unparsable deck file");
                loaded.skipped.push(SkippedFile {
                    path,
                    reason: message,
                });
            }
            Err(e) => return Err(e),
        }
    }

    Ok(loaded)
}

fn collect_yaml_files(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| Error::io(&path, e))?;

        if file_type.is_dir() {
            if recursive {
                collect_yaml_files(&path, recursive, out)?;
            }
        } else if is_yaml(&path) {
            out.push(path);
        }
    }

    Ok(())
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext.to_lowercase().as_str(), "yaml" | "yml"))
}

fn parse_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Error::io(path, e)
        }
    })?;

    serde_yaml::from_str(&content).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("deck.yaml", true)]
    #[case("deck.yml", true)]
    #[case("deck.YAML", true)]
    #[case("deck.toml", false)]
    #[case("README", false)]
    fn test_is_yaml(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_yaml(Path::new(name)), expected);
    }
}
