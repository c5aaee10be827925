//! End-to-end scenarios
//!
//! Each test writes declaration documents to disk, loads them the way the CLI
//! does, and syncs them into the in-memory remote.

use std::fs;
use std::path::Path;

use anki_core::{CancellationToken, Error, NoteId, Outcome, SYNC_TAG, SyncEngine, SyncOptions};
use anki_decl::{load_decks, load_models, validate_models};
use anki_test_utils::{Call, FakeAnki, Operation};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const MODELS: &str = r#"
models:
  - name: Basic
    fields: [Front, Back]
    cardTemplates:
      - name: Card 1
        front: "{{Front}}"
        back: "{{FrontSide}}<hr id=answer>{{Back}}"
  - name: Cloze
    fields: [Text, Extra]
    isCloze: true
    css: ".cloze { font-weight: bold; }"
    cardTemplates:
      - name: Cloze
        front: "{{cloze:Text}}"
        back: "{{cloze:Text}}<br>{{Extra}}"
"#;

const TEST_DECK: &str = r#"
deck_name: Test::Deck
model_name: Basic
primary_field: Front
notes:
  - fields:
      Front: Q1
      Back: A1
    tags: []
"#;

const GEO_DECK: &str = r#"
deck_name: Geography
model_name: Basic
primary_field: Front
notes:
  - fields: { Front: Capital of France, Back: Paris }
    tags: [europe]
  - fields: { Front: Capital of Japan, Back: Tokyo }
    tags: [asia]
"#;

const CLOZE_DECK: &str = r#"
deck_name: Geography::Cloze
model_name: Cloze
primary_field: Text
notes:
  - fields: { Text: "{{c1::Paris}} is the capital of France", Extra: "" }
"#;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sync_dir(
    fake: &FakeAnki,
    root: &Path,
    recursive: bool,
    dry_run: bool,
) -> anki_core::Result<anki_core::SyncSummary> {
    let models = load_models(&root.join("models.yaml")).unwrap();
    validate_models(&models).unwrap();
    let decks = load_decks(&root.join("decks"), recursive).unwrap();

    let options = SyncOptions {
        dry_run,
        note_parallelism: 4,
    };
    SyncEngine::new(fake, options, CancellationToken::new())?.sync(&models, &decks.decks)
}

#[test]
fn test_basic_scenario_first_and_second_run() {
    let dir = TempDir::new().unwrap();
    let models = "models:\n  - name: Basic\n    fields: [Front, Back]\n    cardTemplates:\n      - { name: Card 1, front: \"{{Front}}\", back: \"{{Back}}\" }\n";
    write(dir.path(), "models.yaml", models);
    write(dir.path(), "decks/test.yaml", TEST_DECK);
    let fake = FakeAnki::new();

    sync_dir(&fake, dir.path(), false, false).unwrap();

    let mutations: Vec<Operation> = fake.mutations().iter().map(Call::operation).collect();
    assert_eq!(
        mutations,
        vec![
            Operation::CreateModel,
            Operation::UpdateModelTemplates,
            Operation::CreateDeck,
            Operation::AddNote,
            Operation::UpdateNoteTags,
            Operation::UpdateNoteFields,
        ]
    );

    let first_payloads: Vec<Call> = fake
        .mutations()
        .into_iter()
        .filter(|c| matches!(c.operation(), Operation::UpdateNoteTags | Operation::UpdateNoteFields))
        .collect();
    fake.clear_calls();

    sync_dir(&fake, dir.path(), false, false).unwrap();

    let second_payloads: Vec<Call> = fake
        .mutations()
        .into_iter()
        .filter(|c| matches!(c.operation(), Operation::UpdateNoteTags | Operation::UpdateNoteFields))
        .collect();
    assert_eq!(first_payloads, second_payloads);
    assert!(fake.calls_of(Operation::CreateModel).is_empty());
    assert!(fake.calls_of(Operation::CreateDeck).is_empty());
    assert!(fake.calls_of(Operation::AddNote).is_empty());
    assert_eq!(
        fake.calls_of(Operation::UpdateNoteTags),
        vec![Call::UpdateNoteTags {
            id: NoteId(1),
            tags: vec![SYNC_TAG.to_string()],
        }]
    );
}

#[test]
fn test_full_collection_converges() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "models.yaml", MODELS);
    write(dir.path(), "decks/geo.yaml", GEO_DECK);
    write(dir.path(), "decks/cloze.yml", CLOZE_DECK);
    let fake = FakeAnki::new();

    let summary = sync_dir(&fake, dir.path(), false, false).unwrap();

    assert_eq!(summary.models_with(Outcome::Created), 2);
    assert_eq!(summary.decks_with(Outcome::Created), 2);
    assert_eq!(summary.notes_with(Outcome::Created), 3);

    let cloze = fake.model("Cloze").unwrap();
    assert!(cloze.is_cloze);
    assert_eq!(cloze.css, ".cloze { font-weight: bold; }");

    let mut geo: Vec<Vec<String>> = fake
        .notes_in("Geography")
        .into_iter()
        .map(|(_, note)| note.tags)
        .collect();
    geo.sort();
    assert_eq!(
        geo,
        vec![
            vec!["asia".to_string(), SYNC_TAG.to_string()],
            vec!["europe".to_string(), SYNC_TAG.to_string()],
        ]
    );
}

#[test]
fn test_recursive_loading_and_skipped_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "models.yaml", MODELS);
    write(dir.path(), "decks/geo.yaml", GEO_DECK);
    write(dir.path(), "decks/nested/cloze.yaml", CLOZE_DECK);
    write(dir.path(), "decks/broken.yaml", "deck_name: [\n");
    write(dir.path(), "decks/README.md", "# not a deck\n");

    let flat = FakeAnki::new();
    let summary = sync_dir(&flat, dir.path(), false, false).unwrap();
    assert_eq!(summary.decks.len(), 1);
    assert!(!flat.has_deck("Geography::Cloze"));

    let deep = FakeAnki::new();
    let summary = sync_dir(&deep, dir.path(), true, false).unwrap();
    assert_eq!(summary.decks.len(), 2);
    assert!(deep.has_deck("Geography::Cloze"));
}

#[test]
fn test_preview_matches_later_apply() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "models.yaml", MODELS);
    write(dir.path(), "decks/geo.yaml", GEO_DECK);
    let fake = FakeAnki::new();

    let preview = sync_dir(&fake, dir.path(), false, true).unwrap();
    assert!(fake.mutations().is_empty());

    let applied = sync_dir(&fake, dir.path(), false, false).unwrap();

    assert_eq!(
        preview.notes_with(Outcome::WouldCreate),
        applied.notes_with(Outcome::Created)
    );
    assert_eq!(
        preview.models_with(Outcome::WouldCreate),
        applied.models_with(Outcome::Created)
    );
}

#[test]
fn test_failing_deck_is_isolated() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "models.yaml", MODELS);
    write(dir.path(), "decks/geo.yaml", GEO_DECK);
    write(dir.path(), "decks/test.yaml", TEST_DECK);
    let fake = FakeAnki::new();
    fake.fail_on(Operation::CreateDeck, "Test::Deck");

    let err = sync_dir(&fake, dir.path(), false, false).unwrap_err();

    assert!(matches!(err, Error::Multiple(_)));
    assert!(err.to_string().contains("create deck Test::Deck"));
    assert_eq!(fake.notes_in("Geography").len(), 2);
}

#[test]
fn test_invalid_models_document_is_rejected() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "models.yaml",
        "models:\n  - name: Basic\n    cardTemplates:\n      - { name: A, front: x, back: y }\n      - { name: A, front: x, back: y }\n",
    );

    let models = load_models(&dir.path().join("models.yaml")).unwrap();

    assert!(validate_models(&models).is_err());
}
