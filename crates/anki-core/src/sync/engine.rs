//! SyncEngine implementation
//!
//! The SyncEngine runs the model reconciler to completion and then the deck
//! reconciler. A model failure ends the run before any deck is touched.

use std::num::NonZeroUsize;
use std::thread;

use anki_decl::{Deck, Model};

use crate::cancel::CancellationToken;
use crate::gateway::RemoteGateway;
use crate::mode::RunMode;
use crate::{Error, Result};

use super::deck_syncer::DeckSyncer;
use super::model_syncer::ModelSyncer;
use super::report::SyncSummary;

/// Knobs a run is configured with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Project mutations instead of applying them
    pub dry_run: bool,
    /// Concurrent note uploads per deck, at least 1
    pub note_parallelism: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            note_parallelism: default_parallelism(),
        }
    }
}

impl SyncOptions {
    pub fn mode(&self) -> RunMode {
        RunMode::from_dry_run(self.dry_run)
    }

    pub fn validate(&self) -> Result<()> {
        if self.note_parallelism == 0 {
            return Err(Error::InvalidParallelism {
                value: self.note_parallelism,
            });
        }
        Ok(())
    }
}

/// Number of CPUs available to this process, or 1 if unknown
pub fn default_parallelism() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Reconciles declarations against a remote collection
pub struct SyncEngine<G> {
    gateway: G,
    options: SyncOptions,
    cancel: CancellationToken,
}

impl<G: RemoteGateway> SyncEngine<G> {
    /// Create an engine. Fails if `options` are invalid.
    pub fn new(gateway: G, options: SyncOptions, cancel: CancellationToken) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            gateway,
            options,
            cancel,
        })
    }

    /// Reconcile `models` and then `decks`.
    ///
    /// # Errors
    ///
    /// The first model failure is returned as is. Deck and note failures are
    /// all collected and returned together as [`Error::Multiple`].
    pub fn sync(&self, models: &[Model], decks: &[Deck]) -> Result<SyncSummary> {
        let mode = self.options.mode();
        tracing::info!(
            mode = %mode,
            models = models.len(),
            decks = decks.len(),
            note_parallelism = self.options.note_parallelism,
            "Starting sync"
        );

        let models = ModelSyncer::new(&self.gateway, mode, self.cancel.clone()).sync_all(models)?;

        let decks = DeckSyncer::new(
            &self.gateway,
            mode,
            self.options.note_parallelism,
            self.cancel.clone(),
        )
        .sync_all(decks)?;

        let summary = SyncSummary { models, decks };
        tracing::info!(
            models = summary.models.len(),
            decks = summary.decks.len(),
            notes = summary.note_count(),
            "Sync finished"
        );
        Ok(summary)
    }
}
