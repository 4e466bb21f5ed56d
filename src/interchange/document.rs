//! Portable translation document and its validation.

use std::collections::HashMap;

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use serde_json::{
    Map,
    Value,
};

use crate::config::ValidationError;
use crate::settings::LanguageSettings;
use crate::store::StoreSnapshot;
use crate::types::NewRecord;

/// Only version understood by this build.
pub const FORMAT_VERSION: u64 = 1;

/// Export/import document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationDocument {
    pub format_version: u64,
    pub exported_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<LanguageSettings>,
    pub translations: Vec<DocumentEntry>,
}

/// One record of a document; ids, versions and timestamps are not exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEntry {
    pub key: String,
    pub en_text: String,
    #[serde(default)]
    pub ar_text: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

impl TranslationDocument {
    /// Document for a snapshot, entries in store order.
    #[must_use]
    pub fn from_snapshot(snapshot: &StoreSnapshot, exported_at: DateTime<Utc>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            exported_at,
            settings: Some(snapshot.settings.clone()),
            translations: snapshot
                .translations
                .iter()
                .map(|record| DocumentEntry {
                    key: record.key.clone(),
                    en_text: record.en_text.clone(),
                    ar_text: record.ar_text.clone(),
                    category: record.category.clone(),
                    context: record.context.clone(),
                })
                .collect(),
        }
    }
}

/// Content of a document that passed validation.
#[derive(Debug)]
pub(super) struct ValidatedDocument {
    pub(super) settings: Option<LanguageSettings>,
    pub(super) records: Vec<NewRecord>,
}

/// Checks shape, types, required fields, duplicate keys and settings.
///
/// Every problem is collected; the document is accepted only when there are none.
pub(super) fn validate_document(value: &Value) -> Result<ValidatedDocument, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let Some(object) = value.as_object() else {
        return Err(vec![ValidationError::new("$", "Expected a JSON object")]);
    };

    match object.get("formatVersion") {
        None => errors.push(ValidationError::new("formatVersion", "Missing field")),
        Some(version) => match version.as_u64() {
            Some(FORMAT_VERSION) => {}
            Some(other) => errors.push(ValidationError::new(
                "formatVersion",
                format!("Unsupported format version {other} (expected {FORMAT_VERSION})"),
            )),
            None => errors.push(ValidationError::new("formatVersion", "Expected an integer")),
        },
    }

    if let Some(exported_at) = object.get("exportedAt")
        && !exported_at.is_null()
        && !exported_at.is_string()
    {
        errors.push(ValidationError::new("exportedAt", "Expected a timestamp string"));
    }

    let settings = match object.get("settings") {
        None | Some(Value::Null) => None,
        Some(raw) => validate_settings(raw, &mut errors),
    };

    let records = match object.get("translations") {
        None => {
            errors.push(ValidationError::new("translations", "Missing field"));
            Vec::new()
        }
        Some(Value::Array(entries)) => validate_entries(entries, &mut errors),
        Some(_) => {
            errors.push(ValidationError::new("translations", "Expected an array"));
            Vec::new()
        }
    };

    if errors.is_empty() { Ok(ValidatedDocument { settings, records }) } else { Err(errors) }
}

/// Validates a `settings` block, prefixing paths with `settings.`.
fn validate_settings(raw: &Value, errors: &mut Vec<ValidationError>) -> Option<LanguageSettings> {
    let settings = match LanguageSettings::deserialize(raw) {
        Ok(settings) => settings,
        Err(e) => {
            errors.push(ValidationError::new("settings", e.to_string()));
            return None;
        }
    };

    if let Err(setting_errors) = settings.validate() {
        errors.extend(setting_errors.into_iter().map(|error| {
            ValidationError::new(format!("settings.{}", error.field_path), error.message)
        }));
        return None;
    }
    Some(settings)
}

/// Validates `translations[i]` and collects the records.
fn validate_entries(entries: &[Value], errors: &mut Vec<ValidationError>) -> Vec<NewRecord> {
    let mut records = Vec::with_capacity(entries.len());
    let mut first_index: HashMap<String, usize> = HashMap::new();

    for (index, entry) in entries.iter().enumerate() {
        let path = format!("translations[{index}]");
        let Some(entry) = entry.as_object() else {
            errors.push(ValidationError::new(path, "Expected an object"));
            continue;
        };

        let before = errors.len();
        let key = required_text(entry, &path, "key", errors);
        let en_text = required_text(entry, &path, "enText", errors);
        let ar_text = optional_text(entry, &path, "arText", errors);
        let category = optional_text(entry, &path, "category", errors);
        let context = optional_text(entry, &path, "context", errors);

        if let Some(key) = &key {
            let normalized = key.trim().to_string();
            if let Some(first) = first_index.get(&normalized) {
                errors.push(ValidationError::new(
                    format!("{path}.key"),
                    format!("Duplicate key '{normalized}' (first defined at translations[{first}])"),
                ));
            } else {
                first_index.insert(normalized, index);
            }
        }

        if errors.len() == before
            && let (Some(key), Some(en_text)) = (key, en_text)
        {
            records.push(NewRecord { key, en_text, ar_text, category, context });
        }
    }
    records
}

/// Non-blank string field; trimmed.
fn required_text(
    entry: &Map<String, Value>,
    path: &str,
    field: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    match entry.get(field) {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text.clone()),
        Some(Value::String(_)) => {
            errors.push(ValidationError::new(format!("{path}.{field}"), "Must not be blank"));
            None
        }
        None | Some(Value::Null) => {
            errors.push(ValidationError::new(format!("{path}.{field}"), "Missing field"));
            None
        }
        Some(_) => {
            errors.push(ValidationError::new(format!("{path}.{field}"), "Expected a string"));
            None
        }
    }
}

/// String or `null`; blank strings become `None`.
fn optional_text(
    entry: &Map<String, Value>,
    path: &str,
    field: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    match entry.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(_) => {
            errors.push(ValidationError::new(
                format!("{path}.{field}"),
                "Expected a string or null",
            ));
            None
        }
    }
}
