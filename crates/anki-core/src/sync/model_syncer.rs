//! Model reconciliation
//!
//! Models run sequentially and fail fast: decks reference models by name, so
//! nothing downstream can succeed once a model is missing.

use anki_decl::Model;

use crate::cancel::CancellationToken;
use crate::gateway::RemoteGateway;
use crate::mode::{Change, RunMode, Subject};
use crate::{Error, Result};

use super::report::{ModelOutcome, Outcome};

/// Brings declared models in line with the remote collection
pub struct ModelSyncer<'a, G: ?Sized> {
    gateway: &'a G,
    mode: RunMode,
    cancel: CancellationToken,
}

impl<'a, G: RemoteGateway + ?Sized> ModelSyncer<'a, G> {
    pub fn new(gateway: &'a G, mode: RunMode, cancel: CancellationToken) -> Self {
        Self {
            gateway,
            mode,
            cancel,
        }
    }

    /// Reconcile every model in order, stopping at the first failure.
    ///
    /// The cancellation token is checked before each model.
    pub fn sync_all(&self, models: &[Model]) -> Result<Vec<ModelOutcome>> {
        let mut outcomes = Vec::with_capacity(models.len());
        for model in models {
            self.cancel.check()?;
            outcomes.push(self.sync_model(model)?);
        }
        Ok(outcomes)
    }

    /// Reconcile a single model: create if absent, then templates, then styling
    pub fn sync_model(&self, model: &Model) -> Result<ModelOutcome> {
        let name = model.name.as_str();
        let subject = Subject::Model(name);

        let exists = self
            .gateway
            .model_exists(name)
            .map_err(Error::gateway("look up model", name))?;
        let outcome = Outcome::decide(exists, self.mode.is_dry_run());
        tracing::debug!(model = name, exists, "Checked model");

        if !exists {
            self.mode.announce(&subject, &Change::Create);
            if !self.mode.is_dry_run() {
                self.gateway
                    .create_model(model)
                    .map_err(Error::gateway("create model", name))?;
            }
        }

        for template in model.sorted_templates() {
            self.mode.announce(&subject, &Change::Template(template));
        }
        if !self.mode.is_dry_run() {
            self.gateway
                .update_model_templates(name, &model.card_templates)
                .map_err(Error::gateway("update templates of model", name))?;
        }

        if model.has_css() {
            self.mode.announce(&subject, &Change::Styling(&model.css));
            if !self.mode.is_dry_run() {
                self.gateway
                    .update_model_styling(name, &model.css)
                    .map_err(Error::gateway("update styling of model", name))?;
            }
        }

        Ok(ModelOutcome {
            name: model.name.clone(),
            outcome,
        })
    }
}
