//! Core types used throughout the project.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
};
use uuid::Uuid;

/// Opaque record identifier, assigned on creation and never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// One localizable string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRecord {
    pub id: RecordId,
    /// Dotted-path identity, unique across the store (e.g. `admin.tours.title`).
    pub key: String,
    pub en_text: String,
    pub ar_text: Option<String>,
    pub category: Option<String>,
    pub context: Option<String>,
    /// Incremented on every content change.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TranslationRecord {
    /// Translated iff `ar_text` is present and not blank.
    #[must_use]
    pub fn is_translated(&self) -> bool {
        self.ar_text.as_deref().is_some_and(|text| !text.trim().is_empty())
    }

    /// `Translated` or `Untranslated`.
    #[must_use]
    pub fn status(&self) -> TranslationStatus {
        if self.is_translated() {
            TranslationStatus::Translated
        } else {
            TranslationStatus::Untranslated
        }
    }

    /// Content fields only; ignores id, version and timestamps.
    #[must_use]
    pub fn same_content(&self, other: &NewRecord) -> bool {
        self.key == other.key
            && self.en_text == other.en_text
            && self.ar_text == other.ar_text
            && self.category == other.category
            && self.context == other.context
    }
}

/// Derived from [`TranslationRecord::is_translated`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationStatus {
    Translated,
    Untranslated,
}

/// Fields for a record about to be created.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub key: String,
    pub en_text: String,
    #[serde(default)]
    pub ar_text: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

impl NewRecord {
    /// Record with only the required fields.
    #[must_use]
    pub fn new(key: impl Into<String>, en_text: impl Into<String>) -> Self {
        Self { key: key.into(), en_text: en_text.into(), ..Self::default() }
    }

    /// Sets the Arabic text.
    #[must_use]
    pub fn with_ar_text(mut self, ar_text: impl Into<String>) -> Self {
        self.ar_text = Some(ar_text.into());
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the translator context.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Partial update of a record.
///
/// For nullable fields, an absent JSON field leaves the value untouched while
/// an explicit `null` clears it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPatch {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub en_text: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub ar_text: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub context: Option<Option<String>>,
    /// Rejects the update when the stored version differs.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// Maps a present JSON value (including `null`) to `Some`.
fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Filters for listing records. Unset fields match everything.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<TranslationStatus>,
    /// Case-insensitive substring of key, English or Arabic text.
    #[serde(default)]
    pub search: Option<String>,
}

impl ListQuery {
    /// Whether `record` passes every set filter.
    #[must_use]
    pub fn matches(&self, record: &TranslationRecord) -> bool {
        if let Some(category) = &self.category
            && record.category.as_ref() != Some(category)
        {
            return false;
        }

        if let Some(status) = self.status
            && record.status() != status
        {
            return false;
        }

        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            let hit = [Some(record.key.as_str()), Some(record.en_text.as_str()), record.ar_text.as_deref()]
                .into_iter()
                .flatten()
                .any(|haystack| haystack.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        true
    }
}

/// Translation progress counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total: usize,
    pub translated: usize,
    pub untranslated: usize,
}
