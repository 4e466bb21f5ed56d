//! Import/export of the whole store as a portable JSON document.

mod document;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use document::{
    DocumentEntry,
    FORMAT_VERSION,
    TranslationDocument,
};

use crate::config::{
    ValidationError,
    format_validation_errors,
};
use crate::store::{
    StoreError,
    TranslationStore,
    UpsertOutcome,
};

/// Failure of an import. Nothing is written in either case.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Malformed translation document:\n{}", format_validation_errors(.0))]
    MalformedDocument(Vec<ValidationError>),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Counts of an applied import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Keys that were not in the store.
    pub imported_count: usize,
    /// Keys already in the store, overwritten whether or not their content changed.
    pub updated_count: usize,
    /// Subset of `updated_count` whose content was already identical.
    pub unchanged_count: usize,
}

/// Snapshot of the store as a document.
pub async fn export(store: &TranslationStore) -> TranslationDocument {
    let snapshot = store.snapshot().await;
    let document = TranslationDocument::from_snapshot(&snapshot, Utc::now());
    tracing::debug!(records = document.translations.len(), "Exported translation document");
    document
}

/// Parses and imports a JSON document.
///
/// # Errors
/// `MalformedDocument` if the text is not JSON or fails validation; see [`import_value`].
pub async fn import_json(store: &TranslationStore, json: &str) -> Result<ImportReport, ImportError> {
    let value: Value = serde_json::from_str(json).map_err(|e| {
        ImportError::MalformedDocument(vec![ValidationError::new("$", format!("Invalid JSON: {e}"))])
    })?;
    import_value(store, &value).await
}

/// Imports a typed document.
///
/// # Errors
/// See [`import_value`].
pub async fn import_document(
    store: &TranslationStore,
    document: &TranslationDocument,
) -> Result<ImportReport, ImportError> {
    let value = serde_json::to_value(document).map_err(|e| {
        ImportError::MalformedDocument(vec![ValidationError::new("$", e.to_string())])
    })?;
    import_value(store, &value).await
}

/// Validates the whole document, then merges it in one store transaction.
///
/// Unknown keys are inserted; known keys get enText, arText, category and
/// context overwritten. A `settings` block replaces the current settings.
/// Nothing is written unless the whole document is valid.
///
/// # Errors
/// `MalformedDocument` listing every problem, or `Store` if the merge cannot
/// be persisted.
pub async fn import_value(
    store: &TranslationStore,
    value: &Value,
) -> Result<ImportReport, ImportError> {
    let validated = document::validate_document(value).map_err(|errors| {
        tracing::warn!(problems = errors.len(), "Rejected malformed translation document");
        ImportError::MalformedDocument(errors)
    })?;

    let report = store
        .transaction(|tx| {
            if let Some(settings) = validated.settings {
                tx.set_settings(settings)?;
            }

            let mut report = ImportReport::default();
            for record in validated.records {
                match tx.upsert(record)? {
                    UpsertOutcome::Inserted => report.imported_count += 1,
                    UpsertOutcome::Updated => report.updated_count += 1,
                    UpsertOutcome::Unchanged => {
                        report.updated_count += 1;
                        report.unchanged_count += 1;
                    }
                }
            }
            Ok::<_, ImportError>(report)
        })
        .await?;

    tracing::info!(
        imported = report.imported_count,
        updated = report.updated_count,
        unchanged = report.unchanged_count,
        "Imported translation document"
    );
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use serde_json::json;

    use super::*;
    use crate::settings::LanguageSettings;
    use crate::types::{
        NewRecord,
        TranslationRecord,
    };

    async fn seeded_store() -> TranslationStore {
        let store = TranslationStore::in_memory();
        store
            .create(
                NewRecord::new("home.greeting", "Hello")
                    .with_ar_text("مرحبا")
                    .with_category("home")
                    .with_context("Hero banner"),
            )
            .await
            .unwrap();
        store.create(NewRecord::new("tours.title", "Tours")).await.unwrap();
        store
    }

    fn malformed(result: std::result::Result<ImportReport, ImportError>) -> Vec<ValidationError> {
        match result {
            Err(ImportError::MalformedDocument(errors)) => errors,
            other => panic!("expected MalformedDocument, got {other:?}"),
        }
    }

    /// export → import: 同じストアに戻しても何も変わらない
    #[rstest]
    #[tokio::test]
    async fn round_trip_into_same_store_changes_nothing() {
        let store = seeded_store().await;
        let before = store.snapshot().await;

        let document = export(&store).await;
        let report = import_document(&store, &document).await.unwrap();

        assert_eq!(report, ImportReport { imported_count: 0, updated_count: 2, unchanged_count: 2 });
        assert_eq!(store.snapshot().await, before);
    }

    /// export → import: 空のストアに同じ内容が再現される
    #[rstest]
    #[tokio::test]
    async fn round_trip_into_empty_store() {
        let source = seeded_store().await;
        let json = serde_json::to_string(&export(&source).await).unwrap();
        let target = TranslationStore::in_memory();

        let report = import_json(&target, &json).await.unwrap();

        assert_eq!(report.imported_count, 2);
        assert_eq!(export(&target).await.translations, export(&source).await.translations);
    }

    #[rstest]
    #[tokio::test]
    async fn export_document_shape() {
        let store = seeded_store().await;

        let value = serde_json::to_value(export(&store).await).unwrap();

        assert_eq!(value["formatVersion"], json!(1));
        assert!(value["exportedAt"].is_string());
        assert_eq!(value["settings"]["rtlLanguages"], json!(["ar"]));
        assert_eq!(
            value["translations"][0],
            json!({
                "key": "home.greeting",
                "enText": "Hello",
                "arText": "مرحبا",
                "category": "home",
                "context": "Hero banner"
            })
        );
        assert_eq!(value["translations"][1]["arText"], Value::Null);
    }

    /// import: 既知のキーは上書き、未知のキーは追加
    #[rstest]
    #[tokio::test]
    async fn import_overwrites_known_keys() {
        let store = seeded_store().await;
        let original = store.find_by_key("home.greeting").await.unwrap();
        let document = json!({
            "formatVersion": 1,
            "translations": [
                {"key": "home.greeting", "enText": "Welcome", "arText": null, "category": "landing"},
                {"key": "hotels.title", "enText": "Hotels", "arText": "الفنادق"}
            ]
        });

        let report = import_value(&store, &document).await.unwrap();

        assert_eq!(report, ImportReport { imported_count: 1, updated_count: 1, unchanged_count: 0 });
        let updated = store.find_by_key("home.greeting").await.unwrap();
        assert_that!(
            updated,
            all![
                field!(TranslationRecord.en_text, eq("Welcome")),
                field!(TranslationRecord.ar_text, none()),
                field!(TranslationRecord.category, some(eq("landing"))),
                field!(TranslationRecord.context, none())
            ]
        );
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.version, original.version + 1);
        // 文書にないキーはそのまま
        assert!(store.find_by_key("tours.title").await.is_some());
    }

    /// import: 問題をすべて列挙し、何も書き込まない
    #[rstest]
    #[tokio::test]
    async fn malformed_document_lists_every_problem_and_writes_nothing() {
        let store = seeded_store().await;
        let before = store.snapshot().await;
        let document = json!({
            "formatVersion": 1,
            "translations": [
                {"key": "ok.key", "enText": "Fine"},
                {"key": "  ", "enText": "No key"},
                {"key": "no.text", "enText": ""},
                {"key": "ok.key", "enText": "Again"},
                {"key": "bad.types", "enText": "Text", "arText": 5},
                "not an object"
            ]
        });

        let errors = malformed(import_value(&store, &document).await);

        assert_that!(
            errors,
            elements_are![
                field!(ValidationError.field_path, eq("translations[1].key")),
                field!(ValidationError.field_path, eq("translations[2].enText")),
                all![
                    field!(ValidationError.field_path, eq("translations[3].key")),
                    field!(ValidationError.message, contains_substring("Duplicate key 'ok.key'"))
                ],
                field!(ValidationError.field_path, eq("translations[4].arText")),
                field!(ValidationError.field_path, eq("translations[5]"))
            ]
        );
        assert_eq!(store.snapshot().await, before);
    }

    #[rstest]
    #[case::unsupported_version(json!({"formatVersion": 2, "translations": []}), "formatVersion")]
    #[case::missing_version(json!({"translations": []}), "formatVersion")]
    #[case::missing_translations(json!({"formatVersion": 1}), "translations")]
    #[case::translations_not_array(json!({"formatVersion": 1, "translations": {}}), "translations")]
    #[case::not_an_object(json!([1, 2]), "$")]
    #[case::bad_exported_at(json!({"formatVersion": 1, "exportedAt": 5, "translations": []}), "exportedAt")]
    #[tokio::test]
    async fn document_shape_errors(#[case] document: Value, #[case] expected_path: &str) {
        let store = TranslationStore::in_memory();

        let errors = malformed(import_value(&store, &document).await);

        assert_that!(errors, elements_are![field!(ValidationError.field_path, eq(expected_path))]);
    }

    #[rstest]
    #[tokio::test]
    async fn invalid_json_is_malformed() {
        let store = TranslationStore::in_memory();

        let errors = malformed(import_json(&store, "{ \"formatVersion\": 1,").await);

        assert_that!(
            errors,
            elements_are![all![
                field!(ValidationError.field_path, eq("$")),
                field!(ValidationError.message, starts_with("Invalid JSON"))
            ]]
        );
    }

    /// import: settings ブロックがあれば置き換える
    #[rstest]
    #[tokio::test]
    async fn settings_block_replaces_settings() {
        let store = TranslationStore::in_memory();
        let document = json!({
            "formatVersion": 1,
            "settings": {"defaultLanguage": "ar", "availableLanguages": ["ar", "en"], "rtlLanguages": ["ar"]},
            "translations": []
        });

        import_value(&store, &document).await.unwrap();

        assert_that!(store.settings().await.default_language, eq("ar"));
    }

    #[rstest]
    #[tokio::test]
    async fn invalid_settings_are_reported_with_prefix() {
        let store = TranslationStore::in_memory();
        let document = json!({
            "formatVersion": 1,
            "settings": {"defaultLanguage": "fr", "availableLanguages": ["en"], "rtlLanguages": []},
            "translations": [{"key": "a", "enText": "A"}]
        });

        let errors = malformed(import_value(&store, &document).await);

        assert_that!(
            errors,
            elements_are![field!(ValidationError.field_path, eq("settings.defaultLanguage"))]
        );
        assert_eq!(store.settings().await, LanguageSettings::default());
        assert_eq!(store.stats().await.total, 0);
    }
}
