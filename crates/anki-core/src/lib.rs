//! Reconciliation engine for anki-sync
//!
//! Given parsed [`Model`](anki_decl::Model) and [`Deck`](anki_decl::Deck)
//! declarations and a [`RemoteGateway`], the engine brings the remote
//! collection in line with the declarations:
//!
//! - **sync**: model and deck/note reconcilers and the [`SyncEngine`]
//! - **pool**: fixed-size worker pool used for note uploads
//! - **mode**: apply vs. dry-run decision events
//! - **aggregate**: thread-safe failure and outcome collection
//! - **gateway**: the capabilities required from the remote collection
//! - **cancel**: cooperative cancellation shared by every worker
//!
//! Models are reconciled first and sequentially; decks concurrently, one
//! thread per deck, with notes fanned out over a bounded pool per deck.

pub mod aggregate;
pub mod cancel;
pub mod error;
pub mod gateway;
pub mod mode;
pub mod pool;
pub mod sync;

pub use aggregate::{Accumulator, DeckRegistry, FailureCollector};
pub use cancel::CancellationToken;
pub use error::{Error, Failures, Result};
pub use gateway::{GatewayError, GatewayResult, NoteId, NoteMatch, NoteQuery, RemoteGateway};
pub use mode::RunMode;
pub use pool::WorkerPool;
pub use sync::{
    DeckOutcome, DeckSyncer, ModelOutcome, ModelSyncer, NoteOutcome, Outcome, SYNC_TAG,
    SyncEngine, SyncOptions, SyncSummary, default_parallelism,
};
