//! agentdesk-core
//!
//! Domain types, error taxonomy, configuration and the ingestion-side
//! transforms (PII redaction, token schemes, token-window chunking) shared by
//! every other crate in the workspace.

pub mod chunker;
pub mod config;
pub mod data_processor;
pub mod error;
pub mod redact;
pub mod tokenize;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
