//! Run mode and decision events
//!
//! Every mutating decision is announced through [`RunMode::announce`]. In
//! [`RunMode::Apply`] the event is logged on the `anki_sync::apply` target
//! right before the remote call is made. In [`RunMode::DryRun`] the same
//! decision is logged on `anki_sync::dry_run` and the caller skips the call.
//! Reads always happen in both modes, so a preview reflects live remote state.

use std::collections::BTreeMap;
use std::fmt;

use anki_decl::CardTemplate;

use crate::gateway::{NoteId, NoteQuery};

/// Whether mutations are applied or only projected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Apply,
    DryRun,
}

impl RunMode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run { RunMode::DryRun } else { RunMode::Apply }
    }

    pub fn is_dry_run(self) -> bool {
        matches!(self, RunMode::DryRun)
    }

    /// Log a mutating decision on the path selected by this mode
    pub fn announce(self, subject: &Subject<'_>, change: &Change<'_>) {
        match self {
            RunMode::Apply => applied(subject, change),
            RunMode::DryRun => projected(subject, change),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Apply => write!(f, "apply"),
            RunMode::DryRun => write!(f, "dry-run"),
        }
    }
}

/// Entity a decision is about
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    Model(&'a str),
    Deck(&'a str),
    /// A note, identified by its deck and primary-field key
    Note {
        deck: &'a str,
        query: &'a NoteQuery,
        id: Option<NoteId>,
    },
}

impl Subject<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Subject::Model(_) => "model",
            Subject::Deck(_) => "deck",
            Subject::Note { .. } => "note",
        }
    }

    fn name(&self) -> &str {
        match self {
            Subject::Model(name) | Subject::Deck(name) => name,
            Subject::Note { deck, .. } => deck,
        }
    }

    fn note_id(&self) -> Option<i64> {
        match self {
            Subject::Note { id, .. } => id.map(NoteId::get),
            _ => None,
        }
    }

    fn primary_field(&self) -> Option<&str> {
        match self {
            Subject::Note { query, .. } => Some(&query.field),
            _ => None,
        }
    }

    fn key(&self) -> Option<&str> {
        match self {
            Subject::Note { query, .. } => Some(&query.value),
            _ => None,
        }
    }
}

/// A mutating change to the remote collection
#[derive(Debug, Clone, Copy)]
pub enum Change<'a> {
    Create,
    Template(&'a CardTemplate),
    Styling(&'a str),
    Fields(&'a BTreeMap<String, String>),
    Tags(&'a [String]),
}

impl Change<'_> {
    fn verb(&self) -> &'static str {
        match self {
            Change::Create => "create",
            Change::Template(_) => "update template",
            Change::Styling(_) => "update css",
            Change::Fields(_) => "update fields",
            Change::Tags(_) => "update tags",
        }
    }

    fn detail(&self) -> String {
        match self {
            Change::Create => String::new(),
            Change::Template(t) => format!("{} front={:?} back={:?}", t.name, t.front, t.back),
            Change::Styling(css) => format!("{:?}", css),
            Change::Fields(fields) => format!("{:?}", fields),
            Change::Tags(tags) => format!("{:?}", tags),
        }
    }
}

/// Log that a note was created and has been assigned `subject`'s id.
///
/// Only the apply path creates notes, so there is no projected counterpart.
pub fn note_created(subject: &Subject<'_>) {
    tracing::info!(
        target: "anki_sync::apply",
        entity = subject.kind(),
        name = subject.name(),
        primary_field = subject.primary_field(),
        key = subject.key(),
        note_id = subject.note_id(),
        "created {}",
        subject.kind()
    );
}

fn applied(subject: &Subject<'_>, change: &Change<'_>) {
    tracing::info!(
        target: "anki_sync::apply",
        entity = subject.kind(),
        name = subject.name(),
        primary_field = subject.primary_field(),
        key = subject.key(),
        note_id = subject.note_id(),
        detail = %change.detail(),
        "{} {}",
        change.verb(),
        subject.kind()
    );
}

fn projected(subject: &Subject<'_>, change: &Change<'_>) {
    tracing::info!(
        target: "anki_sync::dry_run",
        mode = "dry-run",
        entity = subject.kind(),
        name = subject.name(),
        primary_field = subject.primary_field(),
        key = subject.key(),
        note_id = subject.note_id(),
        detail = %change.detail(),
        "would {} {}",
        change.verb(),
        subject.kind()
    );
}
