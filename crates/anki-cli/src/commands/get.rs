//! Get command implementation

use anki_connect::{AnkiConnectClient, HttpTransport};
use anki_decl::ModelsDocument;

use crate::config::Settings;
use crate::error::{CliError, Result};

/// Print one remote model as a models document
pub fn run_get_model(settings: &Settings, name: &str) -> Result<()> {
    let client = AnkiConnectClient::connect(settings.anki_url.clone(), settings.timeout)?;
    print!("{}", render_model(&client, name)?);
    Ok(())
}

/// Fetch `name` and render it as a YAML models document
pub fn render_model<T: HttpTransport>(client: &AnkiConnectClient<T>, name: &str) -> Result<String> {
    let model = client.fetch_model(name)?;
    let document = ModelsDocument {
        models: vec![model],
    };
    serde_yaml::to_string(&document)
        .map_err(|e| CliError::user(format!("Failed to render model {}: {}", name, e)))
}
