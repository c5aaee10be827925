//! Deck and note reconciliation
//!
//! Each deck is reconciled on its own scoped thread. Inside a deck, notes are
//! fanned out over a private [`WorkerPool`] of `note_parallelism` workers.
//! Failures of a deck or a note are collected and never stop their siblings.

use std::thread;

use anki_decl::{Deck, Note};

use crate::aggregate::{Accumulator, DeckRegistry, FailureCollector};
use crate::cancel::CancellationToken;
use crate::gateway::{NoteId, NoteMatch, NoteQuery, RemoteGateway};
use crate::mode::{self, Change, RunMode, Subject};
use crate::pool::WorkerPool;
use crate::{Error, Result};

use super::report::{DeckOutcome, NoteOutcome, Outcome};

/// Tag appended to every note this tool uploads
pub const SYNC_TAG: &str = "anki-sync";

/// Brings declared decks and their notes in line with the remote collection
pub struct DeckSyncer<'a, G: ?Sized> {
    gateway: &'a G,
    mode: RunMode,
    note_parallelism: usize,
    cancel: CancellationToken,
}

impl<'a, G: RemoteGateway + ?Sized> DeckSyncer<'a, G> {
    pub fn new(
        gateway: &'a G,
        mode: RunMode,
        note_parallelism: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            gateway,
            mode,
            note_parallelism,
            cancel,
        }
    }

    /// Reconcile all decks concurrently.
    ///
    /// Returns the outcome of every deck that succeeded, in declaration order,
    /// or one composite error holding every deck and note failure.
    pub fn sync_all(&self, decks: &[Deck]) -> Result<Vec<DeckOutcome>> {
        let failures = FailureCollector::new();
        let registry = DeckRegistry::new();

        let outcomes: Vec<Option<DeckOutcome>> = thread::scope(|s| {
            let handles: Vec<_> = decks
                .iter()
                .map(|deck| {
                    let failures = &failures;
                    let registry = &registry;
                    s.spawn(move || {
                        if registry.observe(&deck.name) {
                            tracing::warn!(
                                deck = %deck.name,
                                "Deck is declared more than once; each declaration is synced independently"
                            );
                        }
                        match self.sync_deck(deck, failures) {
                            Ok(outcome) => Some(outcome),
                            Err(e) => {
                                failures.record(e);
                                None
                            }
                        }
                    })
                })
                .collect();

            handles
                .into_iter()
                .zip(decks)
                .map(|(handle, deck)| {
                    handle.join().unwrap_or_else(|_| {
                        failures.record(Error::Panicked {
                            subject: format!("deck {}", deck.name),
                        });
                        None
                    })
                })
                .collect()
        });

        failures.into_result()?;
        Ok(outcomes.into_iter().flatten().collect())
    }

    /// Reconcile one deck and all of its notes.
    ///
    /// Note failures go to `failures`; the returned outcome lists only the
    /// notes that succeeded.
    pub fn sync_deck(&self, deck: &Deck, failures: &FailureCollector) -> Result<DeckOutcome> {
        self.cancel.check()?;

        let name = deck.name.as_str();
        let exists = self
            .gateway
            .deck_exists(name)
            .map_err(Error::gateway("look up deck", name))?;
        let outcome = Outcome::decide(exists, self.mode.is_dry_run());
        tracing::debug!(deck = name, exists, "Checked deck");

        if !exists {
            self.mode.announce(&Subject::Deck(name), &Change::Create);
            if !self.mode.is_dry_run() {
                self.gateway
                    .create_deck(name)
                    .map_err(Error::gateway("create deck", name))?;
            }
        }

        let notes = Accumulator::new();
        thread::scope(|s| {
            let pool = WorkerPool::start(s, self.note_parallelism, &self.cancel)?;
            tracing::debug!(deck = name, worker_count = pool.size(), "Launch worker pool");

            for note in &deck.notes {
                let notes = &notes;
                let submitted = pool.submit(Box::new(move || match self.sync_note(deck, note) {
                    Ok(outcome) => notes.push(outcome),
                    Err(e) => failures.record(e),
                }));
                if let Err(e) = submitted {
                    if !e.is_cancelled() {
                        failures.record(e);
                    }
                    break;
                }
            }

            pool.stop()
        })?;
        self.cancel.check()?;

        Ok(DeckOutcome {
            name: deck.name.clone(),
            outcome,
            notes: notes.into_inner(),
        })
    }

    /// Reconcile one note by identity lookup on the deck's primary field.
    pub fn sync_note(&self, deck: &Deck, declared: &Note) -> Result<NoteOutcome> {
        let note = declared.with_tag(SYNC_TAG);
        let value = note
            .field(&deck.primary_field)
            .ok_or_else(|| Error::MissingPrimaryField {
                deck: deck.name.clone(),
                field: deck.primary_field.clone(),
            })?;
        let query = NoteQuery::new(&deck.primary_field, value);

        let existing = self.lookup(deck, &query)?;
        let outcome = Outcome::decide(existing.is_some(), self.mode.is_dry_run());

        if self.mode.is_dry_run() {
            let subject = Subject::Note {
                deck: &deck.name,
                query: &query,
                id: existing,
            };
            if existing.is_none() {
                self.mode.announce(&subject, &Change::Create);
            }
            self.mode.announce(&subject, &Change::Tags(&note.tags));
            self.mode.announce(&subject, &Change::Fields(&note.fields));
            return Ok(NoteOutcome {
                deck: deck.name.clone(),
                query,
                id: existing,
                outcome,
            });
        }

        let id = match existing {
            Some(id) => id,
            None => {
                let subject = Subject::Note {
                    deck: &deck.name,
                    query: &query,
                    id: None,
                };
                self.mode.announce(&subject, &Change::Create);
                self.gateway
                    .add_note(&deck.name, &deck.model, &note)
                    .map_err(Error::gateway("add note to deck", note_subject(deck, &query)))?;

                let id = self.lookup(deck, &query)?.ok_or_else(|| {
                    Error::NoteMissingAfterCreate {
                        deck: deck.name.clone(),
                        query: query.clone(),
                    }
                })?;
                mode::note_created(&Subject::Note {
                    deck: &deck.name,
                    query: &query,
                    id: Some(id),
                });
                id
            }
        };

        let subject = Subject::Note {
            deck: &deck.name,
            query: &query,
            id: Some(id),
        };
        self.mode.announce(&subject, &Change::Tags(&note.tags));
        self.gateway
            .update_note_tags(id, &note.tags)
            .map_err(Error::gateway("update tags of note", note_subject(deck, &query)))?;

        self.mode.announce(&subject, &Change::Fields(&note.fields));
        self.gateway
            .update_note_fields(id, &note.fields)
            .map_err(Error::gateway("update fields of note", note_subject(deck, &query)))?;

        Ok(NoteOutcome {
            deck: deck.name.clone(),
            query,
            id: Some(id),
            outcome,
        })
    }

    fn lookup(&self, deck: &Deck, query: &NoteQuery) -> Result<Option<NoteId>> {
        let found = self
            .gateway
            .find_note(&deck.name, query)
            .map_err(Error::gateway("find note in deck", note_subject(deck, query)))?;

        match found {
            NoteMatch::None => Ok(None),
            NoteMatch::One(id) => Ok(Some(id)),
            NoteMatch::Many(ids) => Err(Error::AmbiguousNote {
                deck: deck.name.clone(),
                query: query.clone(),
                matches: ids.len(),
            }),
        }
    }
}

fn note_subject(deck: &Deck, query: &NoteQuery) -> String {
    format!("{} ({})", deck.name, query)
}
