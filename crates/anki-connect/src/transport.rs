//! HTTP transport.
//!
//! The client only needs "POST this JSON body, give me the response body".
//! That is abstracted behind [`HttpTransport`] so the envelope handling can be
//! exercised without a running AnkiConnect.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

use crate::{Error, Result};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends a JSON body and returns the response body.
pub trait HttpTransport: Send + Sync {
    fn post(&self, url: &str, body: String) -> Result<String>;
}

/// Blocking `reqwest` transport.
///
/// Idle connections are never reused; AnkiConnect drops pooled connections,
/// so every request opens a fresh one.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .user_agent(concat!("anki-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Client {
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn post(&self, url: &str, body: String) -> Result<String> {
        let http_error = |e: reqwest::Error| Error::Http {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(http_error)?;

        let status = response.status();
        let text = response.text().map_err(http_error)?;
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}
