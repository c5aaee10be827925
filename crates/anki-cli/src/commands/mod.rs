//! Command implementations for anki-cli

pub mod get;
pub mod sync;
pub mod version;

pub use get::run_get_model;
pub use sync::run_sync;
pub use version::run_version;
