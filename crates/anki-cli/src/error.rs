//! Error types for anki-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from the reconciliation engine
    #[error(transparent)]
    Core(#[from] anki_core::Error),

    /// Error loading declarations
    #[error(transparent)]
    Decl(#[from] anki_decl::Error),

    /// Error talking to AnkiConnect
    #[error(transparent)]
    Connect(#[from] anki_connect::Error),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
