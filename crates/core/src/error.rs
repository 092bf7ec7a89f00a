//! Error types for the CampusDesk domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external collaborator has its own error enum; none of them is
//! ever shown to a conversant verbatim.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all CampusDesk operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Record store error: {0}")]
    Records(#[from] RecordError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Error)]
pub enum ClassifierError {
    #[error("Classifier not configured: {0}")]
    NotConfigured(String),

    #[error("Model endpoint returned {status_code}: {message}")]
    Endpoint { status_code: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid classifier output: {0}")]
    InvalidOutput(String),

    #[error("Model version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read intents file at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse intents file: {0}")]
    Parse(String),

    #[error("Duplicate intent tag: {0}")]
    DuplicateTag(String),
}
