//! Types for the key synchronizer.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::config::MatcherError;
use crate::store::StoreError;

/// Failure of a whole sync run. Per-file problems are only counted.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Source root '{}' is not readable: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    InvalidPattern(#[from] MatcherError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of one synchronization run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub inserted_count: usize,
    pub scanned_file_count: usize,
    /// Files that could not be decoded or parsed.
    pub skipped_file_count: usize,
    /// Distinct keys referenced by the source tree.
    pub discovered_key_count: usize,
    pub inserted_keys: Vec<String>,
    pub drifted_keys: Vec<KeyDrift>,
}

/// A stored record whose English text no longer matches the in-source fallback.
///
/// Drift is only reported; the stored text wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDrift {
    pub key: String,
    pub stored_en_text: String,
    pub source_fallback: String,
    /// `<path>:<line>` of the first usage.
    pub location: String,
}
