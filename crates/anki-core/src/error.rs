//! Error types for anki-core

use std::fmt;

use crate::gateway::{GatewayError, NoteQuery};

/// Result type for anki-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reconciling declarations against the remote collection
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A call to the remote collection failed
    #[error("{operation} {subject}: {source}")]
    Gateway {
        operation: &'static str,
        subject: String,
        #[source]
        source: GatewayError,
    },

    /// The identity lookup for a note matched more than one remote note
    #[error("Ambiguous note in deck {deck}: {query} matches {matches} notes")]
    AmbiguousNote {
        deck: String,
        query: NoteQuery,
        matches: usize,
    },

    /// A note was added but the follow-up lookup could not find it
    #[error("Note in deck {deck} not found after creation: {query}")]
    NoteMissingAfterCreate { deck: String, query: NoteQuery },

    /// A note has no value for its deck's primary field
    #[error("Note in deck {deck} has no value for primary field {field}")]
    MissingPrimaryField { deck: String, field: String },

    /// Worker count below one
    #[error("Invalid note upload parallelism: {value} (must be at least 1)")]
    InvalidParallelism { value: usize },

    /// A worker thread panicked
    #[error("Worker for {subject} panicked")]
    Panicked { subject: String },

    /// The run was cancelled before this unit of work started
    #[error("Sync cancelled")]
    Cancelled,

    /// Several independent units of work failed
    #[error(transparent)]
    Multiple(Failures),
}

impl Error {
    pub(crate) fn gateway(
        operation: &'static str,
        subject: impl Into<String>,
    ) -> impl FnOnce(GatewayError) -> Self {
        let subject = subject.into();
        move |source| Self::Gateway {
            operation,
            subject,
            source,
        }
    }

    /// Individual causes, flattening a composite error
    pub fn causes(&self) -> Vec<&Error> {
        match self {
            Error::Multiple(failures) => failures.iter().flat_map(Error::causes).collect(),
            other => vec![other],
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.causes().iter().any(|e| matches!(e, Error::Cancelled))
    }
}

/// Every error collected from independent branches of a run
#[derive(Debug)]
pub struct Failures(Vec<Error>);

impl Failures {
    pub fn new(errors: Vec<Error>) -> Self {
        Self(errors)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<Error> {
        self.0
    }
}

impl fmt::Display for Failures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failure(s):", self.0.len())?;
        for error in &self.0 {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for Failures {}
