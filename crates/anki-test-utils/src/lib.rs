//! Shared test utilities for the anki-sync workspace.
//!
//! This crate is a dev-dependency only and is never published.
//!
//! # Modules
//!
//! - [`fake`]: [`FakeAnki`], an in-memory remote collection with call
//!   recording, failure injection and concurrency instrumentation
//! - [`fixtures`]: declaration builders and [`DeclarationDir`] for on-disk
//!   documents

pub mod fake;
pub mod fixtures;

pub use fake::{Call, FakeAnki, Operation, StoredNote};
pub use fixtures::{DeclarationDir, basic_model, deck_with_notes, note};
