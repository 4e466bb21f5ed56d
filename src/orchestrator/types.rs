//! Types for the batch orchestrator.

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::provider::ProviderError;
use crate::store::StoreError;
use crate::types::RecordId;

/// Which records a batch considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchFilter {
    All,
    #[default]
    Untranslated,
    /// Records of `BatchRequest::category`.
    Category,
}

/// Parameters of a batch translation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchRequest {
    pub filter: BatchFilter,
    pub category: Option<String>,
    /// Defaults to `batch.defaultLimit`, capped at `batch.maxLimit`.
    pub limit: Option<usize>,
    /// Also re-translate records that already have Arabic text.
    pub force: bool,
}

impl BatchRequest {
    /// The first `limit` untranslated records.
    #[must_use]
    pub fn untranslated(limit: usize) -> Self {
        Self { limit: Some(limit), ..Self::default() }
    }

    /// Untranslated records of one category.
    #[must_use]
    pub fn category(category: impl Into<String>) -> Self {
        Self { filter: BatchFilter::Category, category: Some(category.into()), ..Self::default() }
    }
}

/// A candidate that was left untranslated, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRecord {
    /// Record that was skipped.
    pub id: RecordId,
    /// Key of the skipped record.
    pub key: String,
    /// Provider message, `empty translation` or `deleted`.
    pub reason: String,
}

/// Summary of a batch that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    /// Records whose Arabic text was written.
    pub translated_count: usize,
    pub skipped_count: usize,
    pub message: String,
    pub translated_keys: Vec<String>,
    /// Every skipped candidate, in processing order.
    pub skipped: Vec<SkippedRecord>,
}

/// Failure of a whole batch run.
#[derive(Error, Debug)]
pub enum BatchError {
    /// Provider failure that makes further calls pointless. Work done before
    /// the failure is kept.
    #[error(
        "{error} (stopped after translating {translated_count} and skipping {skipped_count} records)"
    )]
    Aborted { error: ProviderError, translated_count: usize, skipped_count: usize },

    #[error("Invalid batch request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure of a single-record translation.
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("The provider returned an empty translation for '{key}'")]
    EmptyResult { key: String },
}
