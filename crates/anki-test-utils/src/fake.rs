//! [`FakeAnki`]: an in-memory remote collection for engine tests.
//!
//! Every gateway call is recorded in order. Failures can be injected per
//! operation and subject, lookups can be forced to be ambiguous, and note
//! operations can be slowed down to observe how many run at once per deck.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use anki_core::{GatewayError, GatewayResult, NoteId, NoteMatch, NoteQuery, RemoteGateway};
use anki_decl::{CardTemplate, Model, Note};

/// Gateway operation, used to filter recorded calls and target failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ModelExists,
    CreateModel,
    UpdateModelTemplates,
    UpdateModelStyling,
    DeckExists,
    CreateDeck,
    FindNote,
    AddNote,
    UpdateNoteFields,
    UpdateNoteTags,
}

impl Operation {
    /// Whether the operation changes remote state
    pub fn is_mutation(self) -> bool {
        !matches!(
            self,
            Operation::ModelExists | Operation::DeckExists | Operation::FindNote
        )
    }
}

/// One recorded gateway call with its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ModelExists(String),
    CreateModel(String),
    UpdateModelTemplates { model: String, templates: Vec<String> },
    UpdateModelStyling { model: String, css: String },
    DeckExists(String),
    CreateDeck(String),
    FindNote { deck: String, query: String },
    AddNote {
        deck: String,
        model: String,
        fields: BTreeMap<String, String>,
        tags: Vec<String>,
    },
    UpdateNoteFields { id: NoteId, fields: BTreeMap<String, String> },
    UpdateNoteTags { id: NoteId, tags: Vec<String> },
}

impl Call {
    pub fn operation(&self) -> Operation {
        match self {
            Call::ModelExists(_) => Operation::ModelExists,
            Call::CreateModel(_) => Operation::CreateModel,
            Call::UpdateModelTemplates { .. } => Operation::UpdateModelTemplates,
            Call::UpdateModelStyling { .. } => Operation::UpdateModelStyling,
            Call::DeckExists(_) => Operation::DeckExists,
            Call::CreateDeck(_) => Operation::CreateDeck,
            Call::FindNote { .. } => Operation::FindNote,
            Call::AddNote { .. } => Operation::AddNote,
            Call::UpdateNoteFields { .. } => Operation::UpdateNoteFields,
            Call::UpdateNoteTags { .. } => Operation::UpdateNoteTags,
        }
    }

    pub fn is_mutation(&self) -> bool {
        self.operation().is_mutation()
    }
}

/// A note as stored by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredNote {
    pub deck: String,
    pub model: String,
    pub fields: BTreeMap<String, String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    models: BTreeMap<String, Model>,
    decks: BTreeSet<String>,
    notes: BTreeMap<NoteId, StoredNote>,
    next_id: i64,
    calls: Vec<Call>,
    failures: HashSet<(Operation, String)>,
    ambiguous: HashSet<(String, String)>,
    lose_added_notes: bool,
}

#[derive(Debug, Default)]
struct Concurrency {
    current: HashMap<String, usize>,
    peak: HashMap<String, usize>,
}

/// In-memory [`RemoteGateway`]
#[derive(Debug, Default)]
pub struct FakeAnki {
    state: Mutex<State>,
    concurrency: Mutex<Concurrency>,
    latency: Mutex<Option<Duration>>,
}

impl FakeAnki {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ---- seeding ----

    pub fn add_model(&self, model: Model) {
        self.state().models.insert(model.name.clone(), model);
    }

    pub fn add_deck(&self, name: &str) {
        self.state().decks.insert(name.to_string());
    }

    /// Store a note directly, bypassing the call log
    pub fn insert_note(
        &self,
        deck: &str,
        model: &str,
        fields: BTreeMap<String, String>,
        tags: Vec<String>,
    ) -> NoteId {
        let mut state = self.state();
        state.decks.insert(deck.to_string());
        state.next_id += 1;
        let id = NoteId(state.next_id);
        state.notes.insert(
            id,
            StoredNote {
                deck: deck.to_string(),
                model: model.to_string(),
                fields,
                tags,
            },
        );
        id
    }

    /// Overwrite a stored note's fields to simulate drift made in the app
    pub fn set_note_fields(&self, id: NoteId, fields: BTreeMap<String, String>) {
        if let Some(note) = self.state().notes.get_mut(&id) {
            note.fields = fields;
        }
    }

    // ---- behaviour ----

    /// Make `operation` fail whenever its subject equals `subject`.
    ///
    /// The subject is the model name for model operations and the deck name
    /// for deck and note operations.
    pub fn fail_on(&self, operation: Operation, subject: &str) {
        self.state()
            .failures
            .insert((operation, subject.to_string()));
    }

    /// Make lookups of `query` in `deck` report two matches
    pub fn force_ambiguous(&self, deck: &str, query: &NoteQuery) {
        self.state()
            .ambiguous
            .insert((deck.to_string(), query.to_string()));
    }

    /// Accept `addNote` calls without storing the note
    pub fn lose_added_notes(&self) {
        self.state().lose_added_notes = true;
    }

    /// Delay every note operation by `latency`
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = Some(latency);
    }

    // ---- inspection ----

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn calls_of(&self, operation: Operation) -> Vec<Call> {
        self.state()
            .calls
            .iter()
            .filter(|c| c.operation() == operation)
            .cloned()
            .collect()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.state()
            .calls
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn model(&self, name: &str) -> Option<Model> {
        self.state().models.get(name).cloned()
    }

    pub fn has_deck(&self, name: &str) -> bool {
        self.state().decks.contains(name)
    }

    pub fn note(&self, id: NoteId) -> Option<StoredNote> {
        self.state().notes.get(&id).cloned()
    }

    pub fn notes_in(&self, deck: &str) -> Vec<(NoteId, StoredNote)> {
        self.state()
            .notes
            .iter()
            .filter(|(_, n)| n.deck == deck)
            .map(|(id, n)| (*id, n.clone()))
            .collect()
    }

    /// Highest number of note operations observed at once for `deck`
    pub fn peak_concurrency(&self, deck: &str) -> usize {
        self.concurrency
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .peak
            .get(deck)
            .copied()
            .unwrap_or(0)
    }

    // ---- internals ----

    fn record(&self, call: Call, subject: &str) -> GatewayResult<()> {
        let operation = call.operation();
        let mut state = self.state();
        state.calls.push(call);
        if state.failures.contains(&(operation, subject.to_string())) {
            return Err(GatewayError::Remote {
                action: format!("{:?}", operation),
                message: format!("injected failure for {}", subject),
            });
        }
        Ok(())
    }

    fn note_operation<T>(&self, deck: &str, op: impl FnOnce() -> T) -> T {
        {
            let mut c = self.concurrency.lock().unwrap_or_else(PoisonError::into_inner);
            let current = c.current.entry(deck.to_string()).or_insert(0);
            *current += 1;
            let now = *current;
            let peak = c.peak.entry(deck.to_string()).or_insert(0);
            *peak = (*peak).max(now);
        }

        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(latency) = latency {
            thread::sleep(latency);
        }
        let result = op();

        let mut c = self.concurrency.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = c.current.get_mut(deck) {
            *current -= 1;
        }
        result
    }

    fn deck_of(&self, id: NoteId) -> GatewayResult<String> {
        self.state()
            .notes
            .get(&id)
            .map(|n| n.deck.clone())
            .ok_or_else(|| GatewayError::Remote {
                action: "note".to_string(),
                message: format!("note was not found: {}", id),
            })
    }
}

impl RemoteGateway for FakeAnki {
    fn model_exists(&self, name: &str) -> GatewayResult<bool> {
        self.record(Call::ModelExists(name.to_string()), name)?;
        Ok(self.state().models.contains_key(name))
    }

    fn create_model(&self, model: &Model) -> GatewayResult<()> {
        self.record(Call::CreateModel(model.name.clone()), &model.name)?;
        let mut state = self.state();
        if state.models.contains_key(&model.name) {
            return Err(GatewayError::Remote {
                action: "createModel".to_string(),
                message: "Model name already exists".to_string(),
            });
        }
        state.models.insert(model.name.clone(), model.clone());
        Ok(())
    }

    fn update_model_templates(&self, name: &str, templates: &[CardTemplate]) -> GatewayResult<()> {
        self.record(
            Call::UpdateModelTemplates {
                model: name.to_string(),
                templates: templates.iter().map(|t| t.name.clone()).collect(),
            },
            name,
        )?;
        let mut state = self.state();
        let model = state.models.get_mut(name).ok_or_else(|| GatewayError::Remote {
            action: "updateModelTemplates".to_string(),
            message: format!("model was not found: {}", name),
        })?;
        model.card_templates = templates.to_vec();
        Ok(())
    }

    fn update_model_styling(&self, name: &str, css: &str) -> GatewayResult<()> {
        self.record(
            Call::UpdateModelStyling {
                model: name.to_string(),
                css: css.to_string(),
            },
            name,
        )?;
        let mut state = self.state();
        let model = state.models.get_mut(name).ok_or_else(|| GatewayError::Remote {
            action: "updateModelStyling".to_string(),
            message: format!("model was not found: {}", name),
        })?;
        model.css = css.to_string();
        Ok(())
    }

    fn deck_exists(&self, name: &str) -> GatewayResult<bool> {
        self.record(Call::DeckExists(name.to_string()), name)?;
        Ok(self.state().decks.contains(name))
    }

    fn create_deck(&self, name: &str) -> GatewayResult<()> {
        self.record(Call::CreateDeck(name.to_string()), name)?;
        self.state().decks.insert(name.to_string());
        Ok(())
    }

    fn find_note(&self, deck: &str, query: &NoteQuery) -> GatewayResult<NoteMatch> {
        self.note_operation(deck, || {
            self.record(
                Call::FindNote {
                    deck: deck.to_string(),
                    query: query.to_string(),
                },
                deck,
            )?;
            let state = self.state();
            if state
                .ambiguous
                .contains(&(deck.to_string(), query.to_string()))
            {
                return Ok(NoteMatch::Many(vec![NoteId(-1), NoteId(-2)]));
            }
            let ids = state
                .notes
                .iter()
                .filter(|(_, n)| {
                    n.deck == deck
                        && n.fields.get(&query.field).map(String::as_str) == Some(query.value.as_str())
                })
                .map(|(id, _)| *id)
                .collect();
            Ok(NoteMatch::from_ids(ids))
        })
    }

    fn add_note(&self, deck: &str, model: &str, note: &Note) -> GatewayResult<()> {
        self.note_operation(deck, || {
            self.record(
                Call::AddNote {
                    deck: deck.to_string(),
                    model: model.to_string(),
                    fields: note.fields.clone(),
                    tags: note.tags.clone(),
                },
                deck,
            )?;
            let mut state = self.state();
            if !state.decks.contains(deck) {
                return Err(GatewayError::Remote {
                    action: "addNote".to_string(),
                    message: format!("deck was not found: {}", deck),
                });
            }
            if !state.models.contains_key(model) {
                return Err(GatewayError::Remote {
                    action: "addNote".to_string(),
                    message: format!("model was not found: {}", model),
                });
            }
            if state.lose_added_notes {
                return Ok(());
            }
            state.next_id += 1;
            let id = NoteId(state.next_id);
            state.notes.insert(
                id,
                StoredNote {
                    deck: deck.to_string(),
                    model: model.to_string(),
                    fields: note.fields.clone(),
                    tags: note.tags.clone(),
                },
            );
            Ok(())
        })
    }

    fn update_note_fields(&self, id: NoteId, fields: &BTreeMap<String, String>) -> GatewayResult<()> {
        let deck = self.deck_of(id)?;
        self.note_operation(&deck, || {
            self.record(
                Call::UpdateNoteFields {
                    id,
                    fields: fields.clone(),
                },
                &deck,
            )?;
            if let Some(note) = self.state().notes.get_mut(&id) {
                note.fields.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Ok(())
        })
    }

    fn update_note_tags(&self, id: NoteId, tags: &[String]) -> GatewayResult<()> {
        let deck = self.deck_of(id)?;
        self.note_operation(&deck, || {
            self.record(
                Call::UpdateNoteTags {
                    id,
                    tags: tags.to_vec(),
                },
                &deck,
            )?;
            if let Some(note) = self.state().notes.get_mut(&id) {
                note.tags = tags.to_vec();
            }
            Ok(())
        })
    }
}
