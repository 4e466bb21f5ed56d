//! Translation store: the single source of truth for translation records.
//!
//! 全ての変更は状態のコピーに適用され、バックエンドへの永続化に成功した後に
//! 初めて公開される。永続化に失敗した場合、ストアは変更されない。

mod backend;
mod error;

use std::collections::{
    BTreeSet,
    HashSet,
};
use std::sync::Arc;

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use tokio::sync::RwLock;

pub use backend::{
    JsonFileBackend,
    MemoryBackend,
    StoreBackend,
};
pub use error::{
    BackendError,
    StoreError,
};

use crate::settings::LanguageSettings;
use crate::types::{
    ListQuery,
    NewRecord,
    RecordId,
    RecordPatch,
    StoreStats,
    TranslationRecord,
};

/// Whole persisted state of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSnapshot {
    pub settings: LanguageSettings,
    /// Records in creation order.
    pub translations: Vec<TranslationRecord>,
}

impl StoreSnapshot {
    /// Checks the invariants a loaded snapshot must satisfy.
    fn check_consistency(&self) -> Result<(), StoreError> {
        self.settings.validate().map_err(StoreError::InvalidSettings)?;

        let mut keys = HashSet::new();
        let mut ids = HashSet::new();
        for record in &self.translations {
            if !keys.insert(record.key.as_str()) {
                return Err(StoreError::CorruptSnapshot(format!(
                    "duplicate key '{}'",
                    record.key
                )));
            }
            if !ids.insert(record.id) {
                return Err(StoreError::CorruptSnapshot(format!("duplicate id '{}'", record.id)));
            }
            if record.en_text.trim().is_empty() {
                return Err(StoreError::CorruptSnapshot(format!(
                    "record '{}' has a blank enText",
                    record.key
                )));
            }
        }
        Ok(())
    }
}

/// Result of [`StoreTransaction::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The key was new.
    Inserted,
    /// The key existed and its content changed; version bumped.
    Updated,
    /// The key existed with identical content; version kept.
    Unchanged,
}

/// Mutable view over a working copy of the store state.
///
/// Obtained through [`TranslationStore::transaction`]; nothing is visible to other
/// readers until the closure returns `Ok` and the copy has been persisted.
#[derive(Debug)]
pub struct StoreTransaction<'a> {
    state: &'a mut StoreSnapshot,
    now: DateTime<Utc>,
    dirty: bool,
}

impl StoreTransaction<'_> {
    /// 作業コピーのレコード（作成順）
    #[must_use]
    pub fn records(&self) -> &[TranslationRecord] {
        &self.state.translations
    }

    /// 作業コピーの言語設定
    #[must_use]
    pub fn settings(&self) -> &LanguageSettings {
        &self.state.settings
    }

    /// Exact match on the normalized key.
    #[must_use]
    pub fn find_by_key(&self, key: &str) -> Option<&TranslationRecord> {
        self.state.translations.iter().find(|record| record.key == key)
    }

    /// Index of a record, or `NotFound`.
    fn position(&self, id: RecordId) -> Result<usize, StoreError> {
        self.state
            .translations
            .iter()
            .position(|record| record.id == id)
            .ok_or(StoreError::NotFound { id })
    }

    /// Mutable access to a record, or `NotFound`.
    fn record_mut(&mut self, id: RecordId) -> Result<&mut TranslationRecord, StoreError> {
        self.state
            .translations
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(StoreError::NotFound { id })
    }

    /// # Errors
    /// `InvalidRecord` for a blank key or enText, `DuplicateKey` if the key exists.
    pub fn create(&mut self, new: NewRecord) -> Result<TranslationRecord, StoreError> {
        let new = normalize(new)?;
        if self.find_by_key(&new.key).is_some() {
            return Err(StoreError::DuplicateKey { key: new.key });
        }

        let record = TranslationRecord {
            id: RecordId::new(),
            key: new.key,
            en_text: new.en_text,
            ar_text: new.ar_text,
            category: new.category,
            context: new.context,
            version: 1,
            created_at: self.now,
            updated_at: self.now,
        };
        self.state.translations.push(record.clone());
        self.dirty = true;
        Ok(record)
    }

    /// # Errors
    /// `NotFound`, `VersionConflict`, `InvalidRecord` or `DuplicateKey`.
    pub fn update(
        &mut self,
        id: RecordId,
        patch: RecordPatch,
    ) -> Result<TranslationRecord, StoreError> {
        let current = self.record_mut(id)?.clone();

        if let Some(expected) = patch.expected_version
            && expected != current.version
        {
            return Err(StoreError::VersionConflict { id, expected, actual: current.version });
        }

        let candidate = normalize(NewRecord {
            key: patch.key.unwrap_or_else(|| current.key.clone()),
            en_text: patch.en_text.unwrap_or_else(|| current.en_text.clone()),
            ar_text: patch.ar_text.unwrap_or_else(|| current.ar_text.clone()),
            category: patch.category.unwrap_or_else(|| current.category.clone()),
            context: patch.context.unwrap_or_else(|| current.context.clone()),
        })?;

        if candidate.key != current.key
            && self.state.translations.iter().any(|other| other.id != id && other.key == candidate.key)
        {
            return Err(StoreError::DuplicateKey { key: candidate.key });
        }

        Ok(self.overwrite(id, candidate)?.1)
    }

    /// Replaces the content fields of a record, bumping the version only on change.
    fn overwrite(
        &mut self,
        id: RecordId,
        content: NewRecord,
    ) -> Result<(bool, TranslationRecord), StoreError> {
        let now = self.now;
        let record = self.record_mut(id)?;
        if record.same_content(&content) {
            return Ok((false, record.clone()));
        }

        record.key = content.key;
        record.en_text = content.en_text;
        record.ar_text = content.ar_text;
        record.category = content.category;
        record.context = content.context;
        record.version += 1;
        record.updated_at = now;
        let updated = record.clone();
        self.dirty = true;
        Ok((true, updated))
    }

    /// Writes `arText` only.
    ///
    /// # Errors
    /// `NotFound` if the record is gone.
    pub fn set_ar_text(
        &mut self,
        id: RecordId,
        ar_text: String,
    ) -> Result<TranslationRecord, StoreError> {
        let mut content = NewRecord::from(&*self.record_mut(id)?);
        content.ar_text = Some(ar_text);
        Ok(self.overwrite(id, normalize(content)?)?.1)
    }

    /// # Errors
    /// `NotFound` if the record is unknown.
    pub fn delete(&mut self, id: RecordId) -> Result<TranslationRecord, StoreError> {
        let index = self.position(id)?;
        let removed = self.state.translations.remove(index);
        self.dirty = true;
        Ok(removed)
    }

    /// Inserts an unknown key, or overwrites the content of a known one.
    ///
    /// # Errors
    /// `InvalidRecord` for a blank key or enText.
    pub fn upsert(&mut self, new: NewRecord) -> Result<UpsertOutcome, StoreError> {
        let new = normalize(new)?;
        let Some(existing) = self.find_by_key(&new.key).map(|record| record.id) else {
            self.create(new)?;
            return Ok(UpsertOutcome::Inserted);
        };

        let (changed, _) = self.overwrite(existing, new)?;
        Ok(if changed { UpsertOutcome::Updated } else { UpsertOutcome::Unchanged })
    }

    /// # Errors
    /// `InvalidSettings` listing every violated rule.
    pub fn set_settings(&mut self, settings: LanguageSettings) -> Result<(), StoreError> {
        settings.validate().map_err(StoreError::InvalidSettings)?;
        if self.state.settings != settings {
            self.state.settings = settings;
            self.dirty = true;
        }
        Ok(())
    }
}

impl From<&TranslationRecord> for NewRecord {
    fn from(record: &TranslationRecord) -> Self {
        Self {
            key: record.key.clone(),
            en_text: record.en_text.clone(),
            ar_text: record.ar_text.clone(),
            category: record.category.clone(),
            context: record.context.clone(),
        }
    }
}

/// Trims the key, rejects blank required fields and drops blank optional ones.
fn normalize(new: NewRecord) -> Result<NewRecord, StoreError> {
    let key = new.key.trim().to_string();
    if key.is_empty() {
        return Err(StoreError::InvalidRecord {
            field: "key",
            message: "must not be blank".to_string(),
        });
    }
    if new.en_text.trim().is_empty() {
        return Err(StoreError::InvalidRecord {
            field: "enText",
            message: format!("must not be blank (key '{key}')"),
        });
    }

    Ok(NewRecord {
        key,
        en_text: new.en_text,
        ar_text: new.ar_text,
        category: new.category.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
        context: new.context.filter(|c| !c.trim().is_empty()),
    })
}

/// Shared handle to the translation store.
#[derive(Clone)]
pub struct TranslationStore {
    state: Arc<RwLock<StoreSnapshot>>,
    backend: Arc<dyn StoreBackend>,
}

impl std::fmt::Debug for TranslationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationStore").field("backend", &self.backend).finish_non_exhaustive()
    }
}

impl TranslationStore {
    /// Opens the store, loading the last snapshot from the backend if any.
    ///
    /// # Errors
    /// `Persistence` if the backend fails, `CorruptSnapshot` / `InvalidSettings`
    /// if the loaded snapshot breaks an invariant.
    pub async fn open(backend: Arc<dyn StoreBackend>) -> Result<Self, StoreError> {
        let snapshot = backend.load().await?.unwrap_or_default();
        snapshot.check_consistency()?;

        tracing::debug!(
            records = snapshot.translations.len(),
            backend = ?backend,
            "Translation store opened"
        );
        Ok(Self { state: Arc::new(RwLock::new(snapshot)), backend })
    }

    /// Empty store on a fresh [`MemoryBackend`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreSnapshot::default())),
            backend: Arc::new(MemoryBackend::new()),
        }
    }

    /// Runs `operation` against a working copy and commits it atomically.
    ///
    /// The copy is persisted once, and only if the operation changed something.
    /// If the operation fails or the backend rejects the snapshot, the visible
    /// state is left untouched.
    ///
    /// # Errors
    /// Whatever `operation` returns, or `Persistence` converted into `E`.
    pub async fn transaction<T, E, F>(&self, operation: F) -> Result<T, E>
    where
        F: FnOnce(&mut StoreTransaction<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut guard = self.state.write().await;
        let mut working = guard.clone();

        let mut transaction = StoreTransaction { state: &mut working, now: Utc::now(), dirty: false };
        let value = operation(&mut transaction)?;
        let dirty = transaction.dirty;

        if dirty {
            self.backend.save(&working).await.map_err(|e| E::from(StoreError::from(e)))?;
            *guard = working;
        }
        Ok(value)
    }

    /// Records matching `query`, in creation order.
    pub async fn list(&self, query: &ListQuery) -> Vec<TranslationRecord> {
        let state = self.state.read().await;
        state.translations.iter().filter(|record| query.matches(record)).cloned().collect()
    }

    /// # Errors
    /// `NotFound` if the id is unknown.
    pub async fn get(&self, id: RecordId) -> Result<TranslationRecord, StoreError> {
        let state = self.state.read().await;
        state
            .translations
            .iter()
            .find(|record| record.id == id)
            .cloned()
            .ok_or(StoreError::NotFound { id })
    }

    /// キーでレコードを検索
    pub async fn find_by_key(&self, key: &str) -> Option<TranslationRecord> {
        let state = self.state.read().await;
        state.translations.iter().find(|record| record.key == key).cloned()
    }

    /// # Errors
    /// `InvalidRecord`, `DuplicateKey` or `Persistence`.
    pub async fn create(&self, new: NewRecord) -> Result<TranslationRecord, StoreError> {
        self.transaction(|tx| tx.create(new)).await
    }

    /// # Errors
    /// `NotFound`, `VersionConflict`, `InvalidRecord`, `DuplicateKey` or `Persistence`.
    pub async fn update(
        &self,
        id: RecordId,
        patch: RecordPatch,
    ) -> Result<TranslationRecord, StoreError> {
        self.transaction(|tx| tx.update(id, patch)).await
    }

    /// # Errors
    /// `NotFound` or `Persistence`.
    pub async fn delete(&self, id: RecordId) -> Result<TranslationRecord, StoreError> {
        self.transaction(|tx| tx.delete(id)).await
    }

    /// # Errors
    /// `NotFound` or `Persistence`.
    pub async fn set_ar_text(
        &self,
        id: RecordId,
        ar_text: String,
    ) -> Result<TranslationRecord, StoreError> {
        self.transaction(|tx| tx.set_ar_text(id, ar_text)).await
    }

    /// Inserts the candidates whose key is not stored yet; existing keys are left alone.
    ///
    /// # Errors
    /// `InvalidRecord` or `Persistence`; on error nothing is inserted.
    pub async fn insert_missing(
        &self,
        candidates: Vec<NewRecord>,
    ) -> Result<Vec<TranslationRecord>, StoreError> {
        self.transaction(|tx| {
            let mut inserted = Vec::new();
            for candidate in candidates {
                if tx.find_by_key(candidate.key.trim()).is_none() {
                    inserted.push(tx.create(candidate)?);
                }
            }
            Ok(inserted)
        })
        .await
    }

    /// Distinct non-empty categories, sorted.
    pub async fn categories(&self) -> Vec<String> {
        let state = self.state.read().await;
        state
            .translations
            .iter()
            .filter_map(|record| record.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Counts over the whole store.
    pub async fn stats(&self) -> StoreStats {
        let state = self.state.read().await;
        let total = state.translations.len();
        let translated = state.translations.iter().filter(|record| record.is_translated()).count();
        StoreStats { total, translated, untranslated: total - translated }
    }

    /// Consistent copy of the whole state.
    pub async fn snapshot(&self) -> StoreSnapshot {
        self.state.read().await.clone()
    }

    /// 現在の言語設定
    pub async fn settings(&self) -> LanguageSettings {
        self.state.read().await.settings.clone()
    }

    /// # Errors
    /// `InvalidSettings` or `Persistence`.
    pub async fn update_settings(
        &self,
        settings: LanguageSettings,
    ) -> Result<LanguageSettings, StoreError> {
        self.transaction(|tx| {
            tx.set_settings(settings)?;
            Ok(tx.settings().clone())
        })
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::atomic::{
        AtomicBool,
        Ordering,
    };

    use async_trait::async_trait;
    use googletest::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use tempfile::TempDir;

    use super::*;
    use crate::types::TranslationStatus;

    /// Backend whose `save` can be switched to fail.
    #[derive(Debug, Default)]
    struct FlakyBackend {
        failing: AtomicBool,
    }

    #[async_trait]
    impl StoreBackend for FlakyBackend {
        async fn load(&self) -> std::result::Result<Option<StoreSnapshot>, BackendError> {
            Ok(None)
        }

        async fn save(&self, _snapshot: &StoreSnapshot) -> std::result::Result<(), BackendError> {
            if self.failing.load(Ordering::SeqCst) {
                Err(BackendError::Unavailable("disk full".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[fixture]
    fn store() -> TranslationStore {
        TranslationStore::in_memory()
    }

    /// create: 作成したレコードがバージョン 1 で一覧に現れる
    #[rstest]
    #[tokio::test]
    async fn create_then_list(store: TranslationStore) {
        let created = store
            .create(NewRecord::new("admin.tours.title", "Tours").with_category("admin"))
            .await
            .unwrap();

        assert_that!(created.version, eq(1));
        assert_that!(created.ar_text, none());
        let listed = store.list(&ListQuery::default()).await;
        assert_that!(listed, elements_are![eq(&created)]);
    }

    /// create: 同じキーの二重作成は DuplicateKey
    #[rstest]
    #[tokio::test]
    async fn create_rejects_duplicate_key(store: TranslationStore) {
        store.create(NewRecord::new("common.save", "Save")).await.unwrap();

        let result = store.create(NewRecord::new(" common.save ", "Save again")).await;

        assert!(matches!(result, Err(StoreError::DuplicateKey { ref key }) if key == "common.save"));
        assert_that!(store.stats().await.total, eq(1));
    }

    #[rstest]
    #[case::blank_key("  ", "Save", "key")]
    #[case::blank_en_text("common.save", " \n", "enText")]
    #[tokio::test]
    async fn create_rejects_blank_required_fields(
        store: TranslationStore,
        #[case] key: &str,
        #[case] en_text: &str,
        #[case] expected_field: &str,
    ) {
        let result = store.create(NewRecord::new(key, en_text)).await;

        assert!(
            matches!(result, Err(StoreError::InvalidRecord { field, .. }) if field == expected_field)
        );
    }

    /// create: 空白のみの category / context は未設定として保存される
    #[rstest]
    #[tokio::test]
    async fn create_normalizes_blank_optional_fields(store: TranslationStore) {
        let created = store
            .create(NewRecord::new("common.save", "Save").with_category("  ").with_context(""))
            .await
            .unwrap();

        assert_that!(created.category, none());
        assert_that!(created.context, none());
        assert_that!(store.categories().await, is_empty());
    }

    /// delete: 二回目の削除は NotFound
    #[rstest]
    #[tokio::test]
    async fn delete_twice_reports_not_found(store: TranslationStore) {
        let created = store.create(NewRecord::new("common.cancel", "Cancel")).await.unwrap();

        let removed = store.delete(created.id).await.unwrap();
        let second = store.delete(created.id).await;

        assert_that!(removed.key, eq("common.cancel"));
        assert!(matches!(second, Err(StoreError::NotFound { id }) if id == created.id));
        assert!(matches!(store.get(created.id).await, Err(StoreError::NotFound { .. })));
    }

    /// update: 変更があればバージョンが上がり、null で arText を消せる
    #[rstest]
    #[tokio::test]
    async fn update_bumps_version_and_clears_nullable(store: TranslationStore) {
        let created = store
            .create(NewRecord::new("common.save", "Save").with_ar_text("حفظ"))
            .await
            .unwrap();

        let patch: RecordPatch = serde_json::from_str(r#"{"arText": null}"#).unwrap();
        let updated = store.update(created.id, patch).await.unwrap();

        assert_that!(updated.ar_text, none());
        assert_that!(updated.version, eq(2));
        assert_that!(updated.en_text, eq("Save"));
        assert_that!(updated.id, eq(created.id));
    }

    /// update: 内容が同じならバージョンは変わらない
    #[rstest]
    #[tokio::test]
    async fn update_without_changes_keeps_version(store: TranslationStore) {
        let created = store.create(NewRecord::new("common.save", "Save")).await.unwrap();

        let patch = RecordPatch { en_text: Some("Save".to_string()), ..RecordPatch::default() };
        let updated = store.update(created.id, patch).await.unwrap();

        assert_eq!(updated, created);
    }

    /// update: 古い expectedVersion は VersionConflict
    #[rstest]
    #[tokio::test]
    async fn update_with_stale_version_conflicts(store: TranslationStore) {
        let created = store.create(NewRecord::new("common.save", "Save")).await.unwrap();
        let first = RecordPatch {
            en_text: Some("Save changes".to_string()),
            expected_version: Some(1),
            ..RecordPatch::default()
        };
        store.update(created.id, first).await.unwrap();

        let stale = RecordPatch {
            en_text: Some("Store".to_string()),
            expected_version: Some(1),
            ..RecordPatch::default()
        };
        let result = store.update(created.id, stale).await;

        assert!(matches!(
            result,
            Err(StoreError::VersionConflict { expected: 1, actual: 2, .. })
        ));
        assert_that!(store.get(created.id).await.unwrap().en_text, eq("Save changes"));
    }

    /// update: 既存キーへのリネームは DuplicateKey
    #[rstest]
    #[tokio::test]
    async fn update_rename_to_existing_key_fails(store: TranslationStore) {
        store.create(NewRecord::new("common.save", "Save")).await.unwrap();
        let other = store.create(NewRecord::new("common.cancel", "Cancel")).await.unwrap();

        let patch = RecordPatch { key: Some("common.save".to_string()), ..RecordPatch::default() };
        let result = store.update(other.id, patch).await;

        assert!(matches!(result, Err(StoreError::DuplicateKey { .. })));
    }

    #[rstest]
    #[tokio::test]
    async fn update_unknown_id_is_not_found(store: TranslationStore) {
        let result = store.update(RecordId::new(), RecordPatch::default()).await;

        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    /// categories: 重複なしでソートされる
    #[rstest]
    #[tokio::test]
    async fn categories_are_distinct_and_sorted(store: TranslationStore) {
        for (key, category) in [("tours.a", "tours"), ("admin.a", "admin"), ("tours.b", "tours")] {
            store.create(NewRecord::new(key, "Text").with_category(category)).await.unwrap();
        }
        store.create(NewRecord::new("misc", "Text")).await.unwrap();

        assert_that!(store.categories().await, elements_are![eq("admin"), eq("tours")]);
    }

    /// stats / list: 翻訳済みの判定は空白を無視する
    #[rstest]
    #[tokio::test]
    async fn stats_and_status_filter(store: TranslationStore) {
        store.create(NewRecord::new("a", "A").with_ar_text("أ")).await.unwrap();
        store.create(NewRecord::new("b", "B").with_ar_text("   ")).await.unwrap();
        store.create(NewRecord::new("c", "C")).await.unwrap();

        assert_eq!(store.stats().await, StoreStats { total: 3, translated: 1, untranslated: 2 });
        let untranslated = store
            .list(&ListQuery { status: Some(TranslationStatus::Untranslated), ..ListQuery::default() })
            .await;
        assert_that!(
            untranslated,
            elements_are![field!(TranslationRecord.key, eq("b")), field!(TranslationRecord.key, eq("c"))]
        );
    }

    /// insert_missing: 既存キーは変更しない
    #[rstest]
    #[tokio::test]
    async fn insert_missing_skips_existing_keys(store: TranslationStore) {
        let existing =
            store.create(NewRecord::new("common.save", "Save").with_ar_text("حفظ")).await.unwrap();

        let inserted = store
            .insert_missing(vec![
                NewRecord::new("common.save", "Different"),
                NewRecord::new("common.cancel", "Cancel"),
            ])
            .await
            .unwrap();

        assert_that!(inserted, elements_are![field!(TranslationRecord.key, eq("common.cancel"))]);
        assert_eq!(store.get(existing.id).await.unwrap(), existing);
    }

    /// transaction: 永続化に失敗したら状態は変わらない
    #[rstest]
    #[tokio::test]
    async fn failed_persist_leaves_store_unchanged() {
        let backend = Arc::new(FlakyBackend::default());
        let store = TranslationStore::open(backend.clone()).await.unwrap();
        let created = store.create(NewRecord::new("common.save", "Save")).await.unwrap();

        backend.failing.store(true, Ordering::SeqCst);
        let create = store.create(NewRecord::new("common.cancel", "Cancel")).await;
        let update = store.set_ar_text(created.id, "حفظ".to_string()).await;

        assert!(matches!(create, Err(StoreError::Persistence(_))));
        assert!(matches!(update, Err(StoreError::Persistence(_))));
        let snapshot = store.snapshot().await;
        assert_that!(snapshot.translations, elements_are![eq(&created)]);
    }

    /// transaction: クロージャが失敗したら途中の変更も破棄される
    #[rstest]
    #[tokio::test]
    async fn failed_transaction_discards_partial_changes(store: TranslationStore) {
        let result: std::result::Result<(), StoreError> = store
            .transaction(|tx| {
                tx.create(NewRecord::new("first", "First"))?;
                tx.create(NewRecord::new("first", "Again"))?;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(StoreError::DuplicateKey { .. })));
        assert_that!(store.stats().await.total, eq(0));
    }

    /// upsert: 同一内容ならバージョンもタイムスタンプも維持される
    #[rstest]
    #[tokio::test]
    async fn upsert_reports_outcomes(store: TranslationStore) {
        let created = store.create(NewRecord::new("common.save", "Save")).await.unwrap();

        let outcomes: std::result::Result<Vec<UpsertOutcome>, StoreError> = store
            .transaction(|tx| {
                Ok(vec![
                    tx.upsert(NewRecord::new("common.save", "Save"))?,
                    tx.upsert(NewRecord::new("common.cancel", "Cancel"))?,
                ])
            })
            .await;

        assert_that!(
            outcomes.unwrap(),
            elements_are![eq(&UpsertOutcome::Unchanged), eq(&UpsertOutcome::Inserted)]
        );
        assert_eq!(store.get(created.id).await.unwrap(), created);
    }

    /// update_settings: 不正な設定は拒否され、現在の設定が残る
    #[rstest]
    #[tokio::test]
    async fn update_settings_validates(store: TranslationStore) {
        let invalid = LanguageSettings {
            default_language: "fr".to_string(),
            ..LanguageSettings::default()
        };

        let result = store.update_settings(invalid).await;

        assert!(matches!(result, Err(StoreError::InvalidSettings(ref errors)) if errors.len() == 1));
        assert_eq!(store.settings().await, LanguageSettings::default());
    }

    /// open: JSON ファイルに保存した内容を再度開ける
    #[rstest]
    #[tokio::test]
    async fn reopen_from_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store/translations.json");

        let store = TranslationStore::open(Arc::new(JsonFileBackend::new(&path))).await.unwrap();
        let created = store.create(NewRecord::new("common.save", "Save")).await.unwrap();
        drop(store);

        let reopened = TranslationStore::open(Arc::new(JsonFileBackend::new(&path))).await.unwrap();

        assert_eq!(reopened.get(created.id).await.unwrap(), created);
    }

    /// open: 重複キーを含むスナップショットは拒否される
    #[rstest]
    #[tokio::test]
    async fn open_rejects_inconsistent_snapshot() {
        let now = Utc::now();
        let record = TranslationRecord {
            id: RecordId::new(),
            key: "dup".to_string(),
            en_text: "Dup".to_string(),
            ar_text: None,
            category: None,
            context: None,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        let second = TranslationRecord { id: RecordId::new(), ..record.clone() };
        let backend = MemoryBackend::with_snapshot(StoreSnapshot {
            settings: LanguageSettings::default(),
            translations: vec![record, second],
        });

        let result = TranslationStore::open(Arc::new(backend)).await;

        assert!(matches!(result, Err(StoreError::CorruptSnapshot(_))));
    }
}
