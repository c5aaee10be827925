//! Reconciliation of declarations against the remote collection
//!
//! This module provides:
//! - **model_syncer**: sequential, fail-fast model reconciliation
//! - **deck_syncer**: concurrent deck and note reconciliation
//! - **engine**: the `SyncEngine` running both in order
//! - **report**: outcomes returned from a run

mod deck_syncer;
mod engine;
mod model_syncer;
mod report;

pub use deck_syncer::{DeckSyncer, SYNC_TAG};
pub use engine::{SyncEngine, SyncOptions, default_parallelism};
pub use model_syncer::ModelSyncer;
pub use report::{DeckOutcome, ModelOutcome, NoteOutcome, Outcome, SyncSummary};
