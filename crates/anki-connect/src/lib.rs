//! AnkiConnect client for anki-sync
//!
//! [`AnkiConnectClient`] implements [`anki_core::RemoteGateway`] over the
//! AnkiConnect HTTP API (version 6). It also exposes the read-only queries
//! the CLI uses directly (`version`, `modelTemplates`, `modelStyling`).
//!
//! - **protocol**: request/response envelope and typed action parameters
//! - **transport**: [`HttpTransport`] and its blocking `reqwest` implementation
//! - **client**: the client itself

pub mod client;
pub mod error;
pub mod protocol;
pub mod transport;

pub use client::{AnkiConnectClient, DEFAULT_URL};
pub use error::{Error, Result};
pub use protocol::API_VERSION;
pub use transport::{DEFAULT_TIMEOUT, HttpTransport, ReqwestTransport};
