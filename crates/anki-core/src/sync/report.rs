//! Outcomes returned by a sync run

use std::fmt;

use crate::gateway::{NoteId, NoteQuery};

/// Decision taken for one model, deck or note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Existed already; mutable parts were re-applied
    Unchanged,
    /// Did not exist and was created
    Created,
    /// Dry-run: would be created
    WouldCreate,
    /// Dry-run: exists and would be updated
    WouldUpdate,
}

impl Outcome {
    pub(crate) fn decide(exists: bool, dry_run: bool) -> Self {
        match (exists, dry_run) {
            (true, false) => Outcome::Unchanged,
            (false, false) => Outcome::Created,
            (false, true) => Outcome::WouldCreate,
            (true, true) => Outcome::WouldUpdate,
        }
    }

    pub fn is_projection(self) -> bool {
        matches!(self, Outcome::WouldCreate | Outcome::WouldUpdate)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Unchanged => "unchanged",
            Outcome::Created => "created",
            Outcome::WouldCreate => "would create",
            Outcome::WouldUpdate => "would update",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOutcome {
    pub name: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteOutcome {
    pub deck: String,
    pub query: NoteQuery,
    /// Remote identifier, unknown for notes that would be created
    pub id: Option<NoteId>,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckOutcome {
    pub name: String,
    pub outcome: Outcome,
    /// Notes that reconciled successfully, in completion order
    pub notes: Vec<NoteOutcome>,
}

/// Everything a successful run decided
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub models: Vec<ModelOutcome>,
    /// Decks in declaration order
    pub decks: Vec<DeckOutcome>,
}

impl SyncSummary {
    pub fn models_with(&self, outcome: Outcome) -> usize {
        self.models.iter().filter(|m| m.outcome == outcome).count()
    }

    pub fn decks_with(&self, outcome: Outcome) -> usize {
        self.decks.iter().filter(|d| d.outcome == outcome).count()
    }

    pub fn notes_with(&self, outcome: Outcome) -> usize {
        self.notes().filter(|n| n.outcome == outcome).count()
    }

    pub fn notes(&self) -> impl Iterator<Item = &NoteOutcome> {
        self.decks.iter().flat_map(|d| d.notes.iter())
    }

    pub fn note_count(&self) -> usize {
        self.notes().count()
    }

    /// Number of projected (not applied) decisions
    pub fn projections(&self) -> usize {
        self.models.iter().filter(|m| m.outcome.is_projection()).count()
            + self.decks.iter().filter(|d| d.outcome.is_projection()).count()
            + self.notes().filter(|n| n.outcome.is_projection()).count()
    }
}
