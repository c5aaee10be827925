//! Declaration builders and on-disk declaration directories.

use std::fs;
use std::path::{Path, PathBuf};

use anki_decl::{CardTemplate, Deck, Model, ModelsDocument, Note};
use tempfile::TempDir;

/// The `Basic` model: fields `[Front, Back]`, one template, some css.
pub fn basic_model() -> Model {
    let mut model = Model::new("Basic");
    model.fields = vec!["Front".to_string(), "Back".to_string()];
    model.css = ".card { font-family: arial; }".to_string();
    model.card_templates = vec![CardTemplate::new(
        "Card 1",
        "{{Front}}",
        "{{FrontSide}}<hr id=answer>{{Back}}",
    )];
    model
}

/// A note from `(field, value)` pairs and tags.
pub fn note(fields: &[(&str, &str)], tags: &[&str]) -> Note {
    Note {
        fields: fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

/// A `Basic` deck keyed on `Front` holding `count` notes `Q{i}` / `A{i}`.
pub fn deck_with_notes(name: &str, count: usize) -> Deck {
    let mut deck = Deck::new(name, "Basic", "Front");
    deck.notes = (0..count)
        .map(|i| {
            let front = format!("Q{i}");
            let back = format!("A{i}");
            note(&[("Front", front.as_str()), ("Back", back.as_str())], &[])
        })
        .collect();
    deck
}

/// A temporary directory holding a models document and deck documents.
///
/// # Example
///
/// ```rust,no_run
/// use anki_test_utils::fixtures::{DeclarationDir, basic_model, deck_with_notes};
///
/// let dir = DeclarationDir::new();
/// dir.write_models(&[basic_model()]);
/// dir.write_deck("geo.yaml", &deck_with_notes("Geo", 3));
/// ```
pub struct DeclarationDir {
    temp_dir: TempDir,
}

impl Default for DeclarationDir {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclarationDir {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("decks")).unwrap();
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn models_path(&self) -> PathBuf {
        self.root().join("models.yaml")
    }

    pub fn decks_dir(&self) -> PathBuf {
        self.root().join("decks")
    }

    pub fn write_models(&self, models: &[Model]) -> PathBuf {
        let document = ModelsDocument {
            models: models.to_vec(),
        };
        let path = self.models_path();
        fs::write(&path, serde_yaml::to_string(&document).unwrap()).unwrap();
        path
    }

    /// Write `deck` to `relative` under the decks directory, creating parents.
    pub fn write_deck(&self, relative: &str, deck: &Deck) -> PathBuf {
        self.write_raw(relative, &serde_yaml::to_string(deck).unwrap())
    }

    /// Write arbitrary content under the decks directory.
    pub fn write_raw(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.decks_dir().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }
}
