//! Structural validation for the models document

use std::collections::HashSet;

use crate::types::Model;
use crate::{Error, Result};

/// Check the invariants every declared model must hold.
///
/// - the model name is non-empty
/// - card template names are unique within a model
///
/// Field sets and template bodies are not inspected.
pub fn validate_models(models: &[Model]) -> Result<()> {
    for (index, model) in models.iter().enumerate() {
        if model.name.trim().is_empty() {
            return Err(Error::invalid(
                format!("model #{}", index + 1),
                "model name must not be empty",
            ));
        }

        let mut seen = HashSet::new();
        for template in &model.card_templates {
            if !seen.insert(template.name.as_str()) {
                return Err(Error::invalid(
                    &model.name,
                    format!("duplicate card template name '{}'", template.name),
                ));
            }
        }
    }

    Ok(())
}
