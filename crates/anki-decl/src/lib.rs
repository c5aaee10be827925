//! Declarative model and deck documents for anki-sync.
//!
//! This crate owns the desired-state side of a sync run:
//!
//! - **types**: [`Model`], [`CardTemplate`], [`Deck`] and [`Note`] as they appear
//!   in the YAML documents an operator maintains
//! - **loader**: reading the models document and one or many deck documents
//!   from a file, a directory or a directory tree
//! - **validation**: the structural invariants a models document must satisfy
//!   before anything is sent to the remote collection
//!
//! ```text
//! models.yaml ──┐
//!               ├── loader ──> Vec<Model>, LoadedDecks ──> anki-core
//! decks/*.yaml ─┘
//! ```

pub mod error;
pub mod loader;
pub mod types;
pub mod validation;

pub use error::{Error, Result};
pub use loader::{LoadedDecks, SkippedFile, load_decks, load_models};
pub use types::{CardTemplate, Deck, Model, ModelsDocument, Note};
pub use validation::validate_models;
