//! AnkiConnect request/response envelope and action parameters
//!
//! Every call is a JSON POST of `{ "action", "version", "params"? }`. The
//! answer is `{ "result", "error" }` where a non-null `error` means the action
//! failed and `result` must be ignored.

use std::collections::{BTreeMap, HashMap};

use anki_decl::{CardTemplate, Model};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// AnkiConnect API version spoken by this client
pub const API_VERSION: u32 = 6;

#[derive(Debug, Serialize)]
pub struct Request<'a, P> {
    pub action: &'static str,
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<&'a P>,
}

impl<'a, P: Serialize> Request<'a, P> {
    pub fn new(action: &'static str, params: Option<&'a P>) -> Self {
        Self {
            action,
            version: API_VERSION,
            params,
        }
    }

    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|source| Error::Encode {
            action: self.action,
            source,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub result: serde_json::Value,
    #[serde(default)]
    pub error: Option<String>,
}

impl Response {
    pub fn decode(action: &'static str, body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|source| Error::Decode { action, source })
    }

    /// The typed result, or the remote error if one was reported
    pub fn into_result<T: DeserializeOwned>(self, action: &'static str) -> Result<T> {
        if let Some(message) = self.error {
            return Err(Error::Remote { action, message });
        }
        serde_json::from_value(self.result).map_err(|source| Error::Decode { action, source })
    }
}

// ---- action parameters ----

#[derive(Debug, Serialize)]
pub struct TemplateBody<'a> {
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    #[serde(rename = "Front")]
    pub front: &'a str,
    #[serde(rename = "Back")]
    pub back: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateModelParams<'a> {
    pub model_name: &'a str,
    pub in_order_fields: &'a [String],
    #[serde(skip_serializing_if = "str::is_empty")]
    pub css: &'a str,
    #[serde(skip_serializing_if = "is_false")]
    pub is_cloze: bool,
    pub card_templates: Vec<TemplateBody<'a>>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl<'a> CreateModelParams<'a> {
    pub fn from_model(model: &'a Model) -> Self {
        Self {
            model_name: &model.name,
            in_order_fields: &model.fields,
            css: &model.css,
            is_cloze: model.is_cloze,
            card_templates: model
                .card_templates
                .iter()
                .map(|t| TemplateBody {
                    name: Some(&t.name),
                    front: &t.front,
                    back: &t.back,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModelTemplatesUpdate<'a> {
    pub name: &'a str,
    pub templates: BTreeMap<&'a str, TemplateBody<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ModelStylingUpdate<'a> {
    pub name: &'a str,
    pub css: &'a str,
}

/// `{ "model": ... }` wrapper used by the model update actions
#[derive(Debug, Serialize)]
pub struct ModelParams<M> {
    pub model: M,
}

impl<'a> ModelTemplatesUpdate<'a> {
    pub fn new(name: &'a str, templates: &'a [CardTemplate]) -> Self {
        Self {
            name,
            templates: templates
                .iter()
                .map(|t| {
                    (
                        t.name.as_str(),
                        TemplateBody {
                            name: None,
                            front: &t.front,
                            back: &t.back,
                        },
                    )
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelNameParams<'a> {
    pub model_name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct DeckParams<'a> {
    pub deck: &'a str,
}

#[derive(Debug, Serialize)]
pub struct QueryParams<'a> {
    pub query: &'a str,
}

#[derive(Debug, Serialize)]
pub struct NoteParams<N> {
    pub note: N,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddNoteOptions {
    pub allow_duplicate: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote<'a> {
    pub deck_name: &'a str,
    pub model_name: &'a str,
    pub fields: &'a BTreeMap<String, String>,
    pub tags: &'a [String],
    pub options: AddNoteOptions,
}

#[derive(Debug, Serialize)]
pub struct NoteFieldsUpdate<'a> {
    pub id: i64,
    pub fields: &'a BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct NoteTagsUpdate<'a> {
    pub note: i64,
    pub tags: &'a [String],
}

// ---- results ----

#[derive(Debug, Deserialize)]
pub struct TemplateSides {
    #[serde(rename = "Front")]
    pub front: String,
    #[serde(rename = "Back")]
    pub back: String,
}

pub type ModelTemplatesResult = HashMap<String, TemplateSides>;

#[derive(Debug, Deserialize)]
pub struct ModelStylingResult {
    pub css: String,
}

/// Build a `findNotes` search for `field:value` restricted to `deck`.
///
/// `deck:` also matches subdecks in Anki, so children of `deck` are excluded
/// explicitly. Every term is matched literally.
pub fn note_search(deck: &str, field: &str, value: &str) -> String {
    let deck = escape(deck);
    format!(
        "\"deck:{deck}\" -\"deck:{deck}::*\" \"{}:{}\"",
        escape(field),
        escape(value)
    )
}

/// Escape quotes, backslashes and the `*` / `_` wildcards
fn escape(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '"' | '*' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
