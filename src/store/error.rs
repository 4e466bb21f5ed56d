//! Store error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::{
    ValidationError,
    format_validation_errors,
};
use crate::types::RecordId;

/// Failure of a store operation. The store is unchanged after any of them.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Translation key '{key}' already exists")]
    DuplicateKey { key: String },

    #[error("Translation record '{id}' not found")]
    NotFound { id: RecordId },

    #[error(
        "Translation record '{id}' was modified by someone else (expected version {expected}, found {actual})"
    )]
    VersionConflict { id: RecordId, expected: u64, actual: u64 },

    #[error("Invalid {field}: {message}")]
    InvalidRecord { field: &'static str, message: String },

    #[error("Invalid language settings:\n{}", format_validation_errors(.0))]
    InvalidSettings(Vec<ValidationError>),

    #[error("Stored snapshot is inconsistent: {0}")]
    CorruptSnapshot(String),

    #[error("Failed to persist translation store: {0}")]
    Persistence(#[from] BackendError),
}

/// Errors raised by a persistence backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid snapshot JSON in '{}': {source}", path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Unavailable(String),
}
