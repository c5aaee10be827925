//! Error types for anki-decl

use std::path::PathBuf;

/// Result type for anki-decl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or validating declarations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Declaration path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid declaration for {subject}: {message}")]
    Invalid { subject: String, message: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            subject: subject.into(),
            message: message.into(),
        }
    }
}
