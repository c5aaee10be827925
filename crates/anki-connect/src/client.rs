//! Blocking AnkiConnect client

use std::collections::BTreeMap;
use std::time::Duration;

use anki_core::{GatewayResult, NoteId, NoteMatch, NoteQuery, RemoteGateway};
use anki_decl::{CardTemplate, Model, Note};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Result;
use crate::protocol::{
    AddNoteOptions, CreateModelParams, DeckParams, ModelNameParams, ModelParams,
    ModelStylingResult, ModelStylingUpdate, ModelTemplatesResult, ModelTemplatesUpdate, NewNote,
    NoteFieldsUpdate, NoteParams, NoteTagsUpdate, QueryParams, Request, Response, note_search,
};
use crate::transport::{HttpTransport, ReqwestTransport};

/// Default AnkiConnect endpoint
pub const DEFAULT_URL: &str = "http://127.0.0.1:8765";

/// Client for one AnkiConnect endpoint
#[derive(Debug, Clone)]
pub struct AnkiConnectClient<T = ReqwestTransport> {
    url: String,
    transport: T,
}

impl AnkiConnectClient<ReqwestTransport> {
    /// Client over a fresh `reqwest` transport with the given request timeout
    pub fn connect(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self::new(url, ReqwestTransport::new(timeout)?))
    }
}

impl<T: HttpTransport> AnkiConnectClient<T> {
    pub fn new(url: impl Into<String>, transport: T) -> Self {
        Self {
            url: url.into(),
            transport,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn send<P: Serialize, R: DeserializeOwned>(
        &self,
        action: &'static str,
        params: Option<&P>,
    ) -> Result<R> {
        let body = Request::new(action, params).encode()?;
        tracing::trace!(action, body = %body, "AnkiConnect request");

        let raw = self.transport.post(&self.url, body)?;
        tracing::trace!(action, body = %raw, "AnkiConnect response");

        Response::decode(action, &raw)?.into_result(action)
    }

    fn invoke<P: Serialize, R: DeserializeOwned>(&self, action: &'static str, params: &P) -> Result<R> {
        self.send(action, Some(params))
    }

    fn invoke_bare<R: DeserializeOwned>(&self, action: &'static str) -> Result<R> {
        self.send::<(), R>(action, None)
    }

    /// AnkiConnect API version
    pub fn version(&self) -> Result<u32> {
        self.invoke_bare("version")
    }

    pub fn model_names(&self) -> Result<Vec<String>> {
        self.invoke_bare("modelNames")
    }

    pub fn deck_names(&self) -> Result<Vec<String>> {
        self.invoke_bare("deckNames")
    }

    /// Templates of a model, ordered by name
    pub fn model_templates(&self, name: &str) -> Result<Vec<CardTemplate>> {
        let result: ModelTemplatesResult =
            self.invoke("modelTemplates", &ModelNameParams { model_name: name })?;

        let mut templates: Vec<CardTemplate> = result
            .into_iter()
            .map(|(name, sides)| CardTemplate::new(name, sides.front, sides.back))
            .collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }

    pub fn model_styling(&self, name: &str) -> Result<String> {
        let result: ModelStylingResult =
            self.invoke("modelStyling", &ModelNameParams { model_name: name })?;
        Ok(result.css)
    }

    /// Fetch a model as a declaration: templates and styling, no fields
    pub fn fetch_model(&self, name: &str) -> Result<Model> {
        let mut model = Model::new(name);
        model.card_templates = self.model_templates(name)?;
        model.css = self.model_styling(name)?;
        Ok(model)
    }

    pub fn find_notes(&self, query: &str) -> Result<Vec<NoteId>> {
        let ids: Vec<i64> = self.invoke("findNotes", &QueryParams { query })?;
        Ok(ids.into_iter().map(NoteId).collect())
    }
}

impl<T: HttpTransport> RemoteGateway for AnkiConnectClient<T> {
    fn model_exists(&self, name: &str) -> GatewayResult<bool> {
        Ok(self.model_names()?.iter().any(|m| m == name))
    }

    fn create_model(&self, model: &Model) -> GatewayResult<()> {
        let _: serde_json::Value =
            self.invoke("createModel", &CreateModelParams::from_model(model))?;
        Ok(())
    }

    fn update_model_templates(&self, name: &str, templates: &[CardTemplate]) -> GatewayResult<()> {
        let params = ModelParams {
            model: ModelTemplatesUpdate::new(name, templates),
        };
        Ok(self.invoke("updateModelTemplates", &params)?)
    }

    fn update_model_styling(&self, name: &str, css: &str) -> GatewayResult<()> {
        let params = ModelParams {
            model: ModelStylingUpdate { name, css },
        };
        Ok(self.invoke("updateModelStyling", &params)?)
    }

    fn deck_exists(&self, name: &str) -> GatewayResult<bool> {
        Ok(self.deck_names()?.iter().any(|d| d == name))
    }

    fn create_deck(&self, name: &str) -> GatewayResult<()> {
        let _: serde_json::Value = self.invoke("createDeck", &DeckParams { deck: name })?;
        Ok(())
    }

    fn find_note(&self, deck: &str, query: &NoteQuery) -> GatewayResult<NoteMatch> {
        let search = note_search(deck, &query.field, &query.value);
        Ok(NoteMatch::from_ids(self.find_notes(&search)?))
    }

    fn add_note(&self, deck: &str, model: &str, note: &Note) -> GatewayResult<()> {
        let params = NoteParams {
            note: NewNote {
                deck_name: deck,
                model_name: model,
                fields: &note.fields,
                tags: &note.tags,
                options: AddNoteOptions {
                    allow_duplicate: false,
                },
            },
        };
        let _: serde_json::Value = self.invoke("addNote", &params)?;
        Ok(())
    }

    fn update_note_fields(&self, id: NoteId, fields: &BTreeMap<String, String>) -> GatewayResult<()> {
        let params = NoteParams {
            note: NoteFieldsUpdate {
                id: id.get(),
                fields,
            },
        };
        Ok(self.invoke("updateNoteFields", &params)?)
    }

    fn update_note_tags(&self, id: NoteId, tags: &[String]) -> GatewayResult<()> {
        let params = NoteTagsUpdate {
            note: id.get(),
            tags,
        };
        Ok(self.invoke("updateNoteTags", &params)?)
    }
}
