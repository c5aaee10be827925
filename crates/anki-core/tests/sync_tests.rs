//! Tests for the SyncEngine against the in-memory remote

use std::collections::BTreeMap;
use std::time::Duration;

use anki_core::{
    CancellationToken, Error, NoteId, NoteQuery, Outcome, SYNC_TAG, SyncEngine, SyncOptions,
};
use anki_decl::{Deck, Model};
use anki_test_utils::{Call, FakeAnki, Operation, basic_model, deck_with_notes, note};
use rstest::rstest;

fn engine(fake: &FakeAnki, dry_run: bool, note_parallelism: usize) -> SyncEngine<&FakeAnki> {
    let options = SyncOptions {
        dry_run,
        note_parallelism,
    };
    SyncEngine::new(fake, options, CancellationToken::new()).unwrap()
}

fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn scenario() -> (Vec<Model>, Vec<Deck>) {
    let mut model = basic_model();
    model.css.clear();

    let mut deck = Deck::new("Test::Deck", "Basic", "Front");
    deck.notes = vec![note(&[("Front", "Q1"), ("Back", "A1")], &[])];

    (vec![model], vec![deck])
}

mod scenario_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_run_creates_everything() {
        let fake = FakeAnki::new();
        let (models, decks) = scenario();

        let summary = engine(&fake, false, 2).sync(&models, &decks).unwrap();

        let declared = fields(&[("Front", "Q1"), ("Back", "A1")]);
        assert_eq!(
            fake.calls(),
            vec![
                Call::ModelExists("Basic".to_string()),
                Call::CreateModel("Basic".to_string()),
                Call::UpdateModelTemplates {
                    model: "Basic".to_string(),
                    templates: vec!["Card 1".to_string()],
                },
                Call::DeckExists("Test::Deck".to_string()),
                Call::CreateDeck("Test::Deck".to_string()),
                Call::FindNote {
                    deck: "Test::Deck".to_string(),
                    query: "Front:Q1".to_string(),
                },
                Call::AddNote {
                    deck: "Test::Deck".to_string(),
                    model: "Basic".to_string(),
                    fields: declared.clone(),
                    tags: vec![SYNC_TAG.to_string()],
                },
                Call::FindNote {
                    deck: "Test::Deck".to_string(),
                    query: "Front:Q1".to_string(),
                },
                Call::UpdateNoteTags {
                    id: NoteId(1),
                    tags: vec![SYNC_TAG.to_string()],
                },
                Call::UpdateNoteFields {
                    id: NoteId(1),
                    fields: declared,
                },
            ]
        );

        assert_eq!(summary.models_with(Outcome::Created), 1);
        assert_eq!(summary.decks_with(Outcome::Created), 1);
        assert_eq!(summary.notes_with(Outcome::Created), 1);
    }

    #[test]
    fn test_second_run_only_reapplies_tags_and_fields() {
        let fake = FakeAnki::new();
        let (models, decks) = scenario();
        engine(&fake, false, 2).sync(&models, &decks).unwrap();
        fake.clear_calls();

        let summary = engine(&fake, false, 2).sync(&models, &decks).unwrap();

        let operations: Vec<Operation> = fake.calls().iter().map(Call::operation).collect();
        assert_eq!(
            operations,
            vec![
                Operation::ModelExists,
                Operation::UpdateModelTemplates,
                Operation::DeckExists,
                Operation::FindNote,
                Operation::UpdateNoteTags,
                Operation::UpdateNoteFields,
            ]
        );
        assert_eq!(
            fake.calls_of(Operation::UpdateNoteTags),
            vec![Call::UpdateNoteTags {
                id: NoteId(1),
                tags: vec![SYNC_TAG.to_string()],
            }]
        );
        assert_eq!(summary.notes_with(Outcome::Unchanged), 1);
        assert_eq!(summary.models_with(Outcome::Unchanged), 1);
    }
}

mod model_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_styling_applied_when_css_present() {
        let fake = FakeAnki::new();
        let model = basic_model();

        engine(&fake, false, 1).sync(&[model.clone()], &[]).unwrap();

        assert_eq!(fake.model("Basic").unwrap().css, model.css);
        assert_eq!(fake.calls_of(Operation::UpdateModelStyling).len(), 1);
    }

    #[test]
    fn test_model_failure_aborts_before_decks() {
        let fake = FakeAnki::new();
        fake.fail_on(Operation::CreateModel, "Basic");

        let result = engine(&fake, false, 1).sync(&[basic_model()], &[deck_with_notes("Geo", 2)]);

        match result {
            Err(Error::Gateway { operation, subject, .. }) => {
                assert_eq!(operation, "create model");
                assert_eq!(subject, "Basic");
            }
            other => panic!("expected gateway error, got {:?}", other),
        }
        assert!(fake.calls_of(Operation::DeckExists).is_empty());
    }

    #[test]
    fn test_models_stop_at_first_failure() {
        let fake = FakeAnki::new();
        let mut second = basic_model();
        second.name = "Second".to_string();
        fake.fail_on(Operation::ModelExists, "Basic");

        let result = engine(&fake, false, 1).sync(&[basic_model(), second], &[]);

        assert!(result.is_err());
        assert_eq!(fake.calls(), vec![Call::ModelExists("Basic".to_string())]);
    }
}

mod dry_run_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dry_run_on_empty_remote_only_reads() {
        let fake = FakeAnki::new();
        let (models, decks) = scenario();

        let summary = engine(&fake, true, 2).sync(&models, &decks).unwrap();

        assert!(fake.mutations().is_empty(), "mutations: {:?}", fake.mutations());
        assert_eq!(fake.calls_of(Operation::FindNote).len(), 1);
        assert_eq!(summary.models_with(Outcome::WouldCreate), 1);
        assert_eq!(summary.decks_with(Outcome::WouldCreate), 1);
        assert_eq!(summary.notes_with(Outcome::WouldCreate), 1);
        assert_eq!(summary.projections(), 3);
    }

    #[test]
    fn test_dry_run_against_existing_state_reports_updates() {
        let fake = FakeAnki::new();
        let (models, decks) = scenario();
        engine(&fake, false, 2).sync(&models, &decks).unwrap();
        fake.clear_calls();

        let summary = engine(&fake, true, 2).sync(&models, &decks).unwrap();

        assert!(fake.mutations().is_empty());
        let note = summary.notes().next().unwrap();
        assert_eq!(note.outcome, Outcome::WouldUpdate);
        assert_eq!(note.id, Some(NoteId(1)));
    }
}

mod note_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ambiguous_note_is_rejected_without_updates() {
        let fake = FakeAnki::new();
        let deck = deck_with_notes("Geo", 2);
        fake.force_ambiguous("Geo", &NoteQuery::new("Front", "Q0"));

        let err = engine(&fake, false, 2)
            .sync(&[basic_model()], &[deck])
            .unwrap_err();

        let causes = err.causes();
        assert_eq!(causes.len(), 1);
        assert!(matches!(
            causes[0],
            Error::AmbiguousNote { matches: 2, .. }
        ));

        // only Q1 reached the update stage
        let tag_updates = fake.calls_of(Operation::UpdateNoteTags);
        assert_eq!(tag_updates.len(), 1);
        let notes = fake.notes_in("Geo");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].1.fields["Front"], "Q1");
    }

    #[test]
    fn test_created_note_converges_to_declaration() {
        let fake = FakeAnki::new();
        let mut deck = Deck::new("Geo", "Basic", "Front");
        deck.notes = vec![note(&[("Front", "Capital"), ("Back", "Paris")], &["europe"])];

        engine(&fake, false, 1).sync(&[basic_model()], &[deck]).unwrap();

        let (_, stored) = fake.notes_in("Geo").remove(0);
        assert_eq!(stored.fields, fields(&[("Front", "Capital"), ("Back", "Paris")]));
        assert_eq!(stored.tags, vec!["europe".to_string(), SYNC_TAG.to_string()]);
    }

    #[test]
    fn test_drifted_note_is_restored() {
        let fake = FakeAnki::new();
        let (models, decks) = scenario();
        engine(&fake, false, 1).sync(&models, &decks).unwrap();
        fake.set_note_fields(NoteId(1), fields(&[("Front", "Q1"), ("Back", "edited")]));

        engine(&fake, false, 1).sync(&models, &decks).unwrap();

        assert_eq!(
            fake.note(NoteId(1)).unwrap().fields,
            fields(&[("Front", "Q1"), ("Back", "A1")])
        );
    }

    #[test]
    fn test_missing_primary_field_fails_only_that_note() {
        let fake = FakeAnki::new();
        let mut deck = deck_with_notes("Geo", 1);
        deck.notes.push(note(&[("Back", "orphan")], &[]));

        let err = engine(&fake, false, 1)
            .sync(&[basic_model()], &[deck])
            .unwrap_err();

        assert!(matches!(
            err.causes()[..],
            [Error::MissingPrimaryField { .. }]
        ));
        assert_eq!(fake.notes_in("Geo").len(), 1);
    }

    #[test]
    fn test_note_missing_after_add_is_reported() {
        let fake = FakeAnki::new();
        fake.lose_added_notes();
        let (models, decks) = scenario();

        let err = engine(&fake, false, 1).sync(&models, &decks).unwrap_err();

        assert!(matches!(
            err.causes()[..],
            [Error::NoteMissingAfterCreate { .. }]
        ));
        assert_eq!(fake.calls_of(Operation::AddNote).len(), 1);
        assert_eq!(fake.calls_of(Operation::FindNote).len(), 2);
        assert!(fake.calls_of(Operation::UpdateNoteFields).is_empty());
    }
}

mod deck_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_failed_deck_does_not_block_other_decks() {
        let fake = FakeAnki::new();
        fake.fail_on(Operation::CreateDeck, "A");
        let decks = vec![deck_with_notes("A", 2), deck_with_notes("B", 2)];

        let err = engine(&fake, false, 2)
            .sync(&[basic_model()], &decks)
            .unwrap_err();

        assert!(err.to_string().contains("create deck A"), "got: {}", err);
        assert!(fake.has_deck("B"));
        assert_eq!(fake.notes_in("B").len(), 2);
        assert!(fake.notes_in("A").is_empty());
    }

    #[test]
    fn test_every_failure_is_reported() {
        let fake = FakeAnki::new();
        fake.fail_on(Operation::CreateDeck, "A");
        fake.fail_on(Operation::AddNote, "B");
        let decks = vec![deck_with_notes("A", 1), deck_with_notes("B", 3)];

        let err = engine(&fake, false, 2)
            .sync(&[basic_model()], &decks)
            .unwrap_err();

        assert_eq!(err.causes().len(), 4);
        assert!(err.to_string().starts_with("4 failure(s):"));
    }

    #[test]
    fn test_duplicate_decks_are_both_processed() {
        let fake = FakeAnki::new();
        let mut first = Deck::new("Geo", "Basic", "Front");
        first.notes = vec![note(&[("Front", "Q1")], &[])];
        let mut second = Deck::new("Geo", "Basic", "Front");
        second.notes = vec![note(&[("Front", "Q2")], &[])];

        let summary = engine(&fake, false, 1)
            .sync(&[basic_model()], &[first, second])
            .unwrap();

        assert_eq!(summary.decks.len(), 2);
        assert_eq!(fake.notes_in("Geo").len(), 2);
    }

    #[test]
    fn test_deck_outcomes_follow_declaration_order() {
        let fake = FakeAnki::new();
        let decks: Vec<Deck> = ["C", "A", "B"]
            .iter()
            .map(|name| deck_with_notes(name, 1))
            .collect();

        let summary = engine(&fake, false, 1).sync(&[basic_model()], &decks).unwrap();

        let names: Vec<&str> = summary.decks.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }
}

mod concurrency_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    #[case(1)]
    #[case(3)]
    fn test_note_parallelism_is_bounded(#[case] parallelism: usize) {
        let fake = FakeAnki::new();
        fake.set_latency(Duration::from_millis(5));
        let deck = deck_with_notes("Geo", 20);

        engine(&fake, false, parallelism)
            .sync(&[basic_model()], &[deck])
            .unwrap();

        let peak = fake.peak_concurrency("Geo");
        assert!(
            (1..=parallelism).contains(&peak),
            "peak {} with parallelism {}",
            peak,
            parallelism
        );
        assert_eq!(fake.notes_in("Geo").len(), 20);
    }

    #[test]
    fn test_zero_parallelism_is_rejected() {
        let fake = FakeAnki::new();
        let options = SyncOptions {
            dry_run: false,
            note_parallelism: 0,
        };

        let result = SyncEngine::new(&fake, options, CancellationToken::new());

        assert!(matches!(result, Err(Error::InvalidParallelism { value: 0 })));
    }

    #[test]
    fn test_cancelled_run_dispatches_nothing() {
        let fake = FakeAnki::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let engine = SyncEngine::new(&fake, SyncOptions::default(), cancel).unwrap();

        let err = engine
            .sync(&[basic_model()], &[deck_with_notes("Geo", 3)])
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_cancelled_decks_report_cancellation() {
        let fake = FakeAnki::new();
        let cancel = CancellationToken::new();
        let engine = SyncEngine::new(&fake, SyncOptions::default(), cancel.clone()).unwrap();
        engine.sync(&[basic_model()], &[]).unwrap();

        cancel.cancel();
        let err = engine
            .sync(&[], &[deck_with_notes("A", 2), deck_with_notes("B", 2)])
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(fake.calls_of(Operation::DeckExists).is_empty());
    }
}

mod event_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io;
    use std::sync::{Arc, Mutex};

    use anki_core::{DeckSyncer, RunMode};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Run `f` on this thread and return everything it logged
    fn capture(f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::INFO)
            .finish();

        tracing::subscriber::with_default(subscriber, f);
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_projected_note_events_name_the_note() {
        let fake = FakeAnki::new();
        let deck = deck_with_notes("Geo", 2);
        let syncer = DeckSyncer::new(&fake, RunMode::DryRun, 1, CancellationToken::new());

        let logs = capture(|| {
            for declared in &deck.notes {
                syncer.sync_note(&deck, declared).unwrap();
            }
        });

        for key in ["Q0", "Q1"] {
            let line = logs
                .lines()
                .find(|l| l.contains("would create note") && l.contains(&format!("key=\"{}\"", key)))
                .unwrap_or_else(|| panic!("no create event for {}:\n{}", key, logs));
            assert!(line.contains("primary_field=\"Front\""), "{}", line);
        }
        assert_eq!(
            logs.lines()
                .filter(|l| l.contains("would update tags note"))
                .count(),
            2
        );
    }

    #[test]
    fn test_created_note_event_carries_new_id() {
        let fake = FakeAnki::new();
        fake.add_model(basic_model());
        fake.add_deck("Geo");
        let deck = deck_with_notes("Geo", 1);
        let syncer = DeckSyncer::new(&fake, RunMode::Apply, 1, CancellationToken::new());

        let logs = capture(|| {
            syncer.sync_note(&deck, &deck.notes[0]).unwrap();
        });

        let created = logs
            .lines()
            .find(|l| l.contains("created note"))
            .unwrap_or_else(|| panic!("no created event:\n{}", logs));
        assert!(created.contains("note_id=1"), "{}", created);
        assert!(created.contains("key=\"Q0\""), "{}", created);
    }
}
