//! Remote collection capabilities required by the engine
//!
//! The engine never talks to the network directly. Everything it needs from
//! the remote collection goes through [`RemoteGateway`]; `anki-connect`
//! provides the HTTP implementation and `anki-test-utils` an in-memory one.
//!
//! Every call is a blocking round trip. Implementations must be usable from
//! several worker threads at once.

use std::collections::BTreeMap;
use std::fmt;

use anki_decl::{CardTemplate, Model, Note};

/// Result type for gateway calls
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Failure of a single remote call. Never retried within a run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The request did not complete (connection, timeout, HTTP status)
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The remote application answered with an error message
    #[error("remote error on {action}: {message}")]
    Remote { action: String, message: String },

    /// The response could not be understood
    #[error("protocol error: {message}")]
    Protocol { message: String },
}

/// Identifier the remote collection assigns to a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(pub i64);

impl NoteId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity search key of a note: its primary field and that field's value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NoteQuery {
    pub field: String,
    pub value: String,
}

impl NoteQuery {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for NoteQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.value)
    }
}

/// Result of an identity lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteMatch {
    None,
    One(NoteId),
    Many(Vec<NoteId>),
}

impl NoteMatch {
    pub fn from_ids(mut ids: Vec<NoteId>) -> Self {
        match ids.len() {
            0 => NoteMatch::None,
            1 => NoteMatch::One(ids.remove(0)),
            _ => NoteMatch::Many(ids),
        }
    }
}

/// Capabilities the engine requires from the remote collection
pub trait RemoteGateway: Send + Sync {
    fn model_exists(&self, name: &str) -> GatewayResult<bool>;

    fn create_model(&self, model: &Model) -> GatewayResult<()>;

    /// Replace every template of the named model
    fn update_model_templates(&self, name: &str, templates: &[CardTemplate]) -> GatewayResult<()>;

    fn update_model_styling(&self, name: &str, css: &str) -> GatewayResult<()>;

    fn deck_exists(&self, name: &str) -> GatewayResult<bool>;

    fn create_deck(&self, name: &str) -> GatewayResult<()>;

    fn find_note(&self, deck: &str, query: &NoteQuery) -> GatewayResult<NoteMatch>;

    /// Add a note. The remote identifier is not returned; look it up afterwards.
    fn add_note(&self, deck: &str, model: &str, note: &Note) -> GatewayResult<()>;

    fn update_note_fields(&self, id: NoteId, fields: &BTreeMap<String, String>)
    -> GatewayResult<()>;

    fn update_note_tags(&self, id: NoteId, tags: &[String]) -> GatewayResult<()>;
}

impl<G: RemoteGateway + ?Sized> RemoteGateway for &G {
    fn model_exists(&self, name: &str) -> GatewayResult<bool> {
        (**self).model_exists(name)
    }

    fn create_model(&self, model: &Model) -> GatewayResult<()> {
        (**self).create_model(model)
    }

    fn update_model_templates(&self, name: &str, templates: &[CardTemplate]) -> GatewayResult<()> {
        (**self).update_model_templates(name, templates)
    }

    fn update_model_styling(&self, name: &str, css: &str) -> GatewayResult<()> {
        (**self).update_model_styling(name, css)
    }

    fn deck_exists(&self, name: &str) -> GatewayResult<bool> {
        (**self).deck_exists(name)
    }

    fn create_deck(&self, name: &str) -> GatewayResult<()> {
        (**self).create_deck(name)
    }

    fn find_note(&self, deck: &str, query: &NoteQuery) -> GatewayResult<NoteMatch> {
        (**self).find_note(deck, query)
    }

    fn add_note(&self, deck: &str, model: &str, note: &Note) -> GatewayResult<()> {
        (**self).add_note(deck, model, note)
    }

    fn update_note_fields(
        &self,
        id: NoteId,
        fields: &BTreeMap<String, String>,
    ) -> GatewayResult<()> {
        (**self).update_note_fields(id, fields)
    }

    fn update_note_tags(&self, id: NoteId, tags: &[String]) -> GatewayResult<()> {
        (**self).update_note_tags(id, tags)
    }
}
