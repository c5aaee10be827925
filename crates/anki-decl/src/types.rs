//! Declaration types
//!
//! Field names follow the on-disk YAML documents. Unknown keys are rejected
//! so that a typo in a document surfaces as a parse failure instead of a
//! silently ignored setting.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level shape of the models document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelsDocument {
    #[serde(default)]
    pub models: Vec<Model>,
}

/// A note-type schema: fields, card templates and styling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Model {
    /// Unique model name, used as the remote identifier
    pub name: String,

    /// Field names in schema order
    #[serde(default)]
    pub fields: Vec<String>,

    /// Styling shared by all card templates
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub css: String,

    #[serde(default, rename = "isCloze", skip_serializing_if = "is_false")]
    pub is_cloze: bool,

    #[serde(default, rename = "cardTemplates")]
    pub card_templates: Vec<CardTemplate>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            css: String::new(),
            is_cloze: false,
            card_templates: Vec::new(),
        }
    }

    /// Templates ordered by name, for deterministic enumeration
    pub fn sorted_templates(&self) -> Vec<&CardTemplate> {
        let mut templates: Vec<&CardTemplate> = self.card_templates.iter().collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        templates
    }

    pub fn has_css(&self) -> bool {
        !self.css.is_empty()
    }
}

/// A named front/back template pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CardTemplate {
    pub name: String,
    pub front: String,
    pub back: String,
}

impl CardTemplate {
    pub fn new(name: impl Into<String>, front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            front: front.into(),
            back: back.into(),
        }
    }
}

/// A deck document: one deck, its model reference and its notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Deck {
    #[serde(rename = "deck_name")]
    pub name: String,

    /// Name of the model every note in this deck uses. Resolved remotely.
    #[serde(rename = "model_name")]
    pub model: String,

    /// Field whose value identifies a note across runs
    pub primary_field: String,

    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Deck {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        primary_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            primary_field: primary_field.into(),
            notes: Vec::new(),
        }
    }
}

/// One record of field values plus tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Note {
    #[serde(default)]
    pub fields: BTreeMap<String, String>,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl Note {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Returns a copy of this note with `tag` appended to its tags.
    ///
    /// The tag is appended even when already present, matching the payload
    /// that is sent to the remote collection.
    pub fn with_tag(&self, tag: &str) -> Note {
        let mut note = self.clone();
        note.tags.push(tag.to_string());
        note
    }
}
