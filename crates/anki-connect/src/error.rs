//! Error types for anki-connect

use anki_core::GatewayError;

/// Result type for AnkiConnect calls
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The HTTP client could not be built
    #[error("Failed to build HTTP client: {message}")]
    Client { message: String },

    /// The request did not reach AnkiConnect or the connection broke
    #[error("Request to {url} failed: {message}")]
    Http { url: String, message: String },

    /// AnkiConnect answered with a non-success HTTP status
    #[error("AnkiConnect returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request could not be encoded
    #[error("Failed to encode {action} request: {source}")]
    Encode {
        action: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The response was not a valid envelope or had an unexpected result
    #[error("Failed to decode {action} response: {source}")]
    Decode {
        action: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// AnkiConnect reported an error for the action
    #[error("anki error on {action}: {message}")]
    Remote {
        action: &'static str,
        message: String,
    },
}

impl From<Error> for GatewayError {
    fn from(err: Error) -> Self {
        match err {
            Error::Remote { action, message } => GatewayError::Remote {
                action: action.to_string(),
                message,
            },
            Error::Encode { .. } | Error::Decode { .. } => GatewayError::Protocol {
                message: err.to_string(),
            },
            Error::Client { .. } | Error::Http { .. } | Error::Status { .. } => {
                GatewayError::Transport {
                    message: err.to_string(),
                }
            }
        }
    }
}
