//! Admin command surface shared by the HTTP API and the CLI.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::config::{
    AdminSettings,
    ConfigManager,
    ValidationError,
};
use crate::interchange::{
    self,
    ImportError,
    ImportReport,
    TranslationDocument,
};
use crate::orchestrator::{
    BatchError,
    BatchOrchestrator,
    BatchOutcome,
    BatchRequest,
    TranslateError,
};
use crate::provider::{
    ProviderError,
    ProviderSetupError,
    RecoveryAction,
    TranslationProvider,
};
use crate::settings::LanguageSettings;
use crate::store::{
    JsonFileBackend,
    StoreError,
    TranslationStore,
};
use crate::sync::{
    KeySynchronizer,
    SyncError,
    SyncReport,
};
use crate::types::{
    ListQuery,
    NewRecord,
    RecordId,
    RecordPatch,
    StoreStats,
    TranslationRecord,
};

/// Any failure of an admin command.
#[derive(Error, Debug)]
pub enum AdminError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    ProviderSetup(#[from] ProviderSetupError),

    #[error("The provider returned an empty translation for '{key}'")]
    EmptyTranslation { key: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<TranslateError> for AdminError {
    fn from(error: TranslateError) -> Self {
        match error {
            TranslateError::Store(e) => Self::Store(e),
            TranslateError::Provider(e) => Self::Provider(e),
            TranslateError::EmptyResult { key } => Self::EmptyTranslation { key },
        }
    }
}

/// Codes of store failures, wherever they are nested.
const fn store_code(error: &StoreError) -> &'static str {
    match error {
        StoreError::DuplicateKey { .. } => "duplicateKey",
        StoreError::NotFound { .. } => "notFound",
        StoreError::VersionConflict { .. } => "versionConflict",
        StoreError::InvalidRecord { .. } => "invalidRecord",
        StoreError::InvalidSettings(_) => "invalidSettings",
        StoreError::CorruptSnapshot(_) | StoreError::Persistence(_) => "persistence",
    }
}

impl AdminError {
    /// Stable machine-readable code; presentation layers branch on this, never on messages.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Store(e)
            | Self::Sync(SyncError::Store(e))
            | Self::Batch(BatchError::Store(e))
            | Self::Import(ImportError::Store(e)) => store_code(e),
            Self::Sync(SyncError::SourceUnavailable { .. }) => "sourceUnavailable",
            Self::Sync(SyncError::InvalidPattern(_)) => "invalidPattern",
            Self::Provider(e) | Self::Batch(BatchError::Aborted { error: e, .. }) => e.kind.code(),
            Self::Batch(BatchError::InvalidRequest(_)) | Self::InvalidRequest(_) => "invalidRequest",
            Self::Import(ImportError::MalformedDocument(_)) => "malformedDocument",
            Self::ProviderSetup(ProviderSetupError::MissingApiKey { .. }) => "invalidCredentials",
            Self::ProviderSetup(ProviderSetupError::HttpClient(_)) | Self::EmptyTranslation { .. } => {
                "unknown"
            }
        }
    }

    /// The provider failure behind this error, if any.
    #[must_use]
    pub const fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            Self::Provider(e) | Self::Batch(BatchError::Aborted { error: e, .. }) => Some(e),
            _ => None,
        }
    }

    /// Recovery hint for provider and setup failures.
    #[must_use]
    pub fn recovery(&self) -> Option<RecoveryAction> {
        match self {
            Self::ProviderSetup(ProviderSetupError::MissingApiKey { .. }) => {
                Some(RecoveryAction::FixConfiguration)
            }
            Self::EmptyTranslation { .. } => Some(RecoveryAction::Retry),
            _ => self.provider_error().map(|e| e.kind.recovery()),
        }
    }

    /// `(translated, skipped)` reached before a batch was aborted.
    #[must_use]
    pub const fn batch_progress(&self) -> Option<(usize, usize)> {
        match self {
            Self::Batch(BatchError::Aborted { translated_count, skipped_count, .. }) => {
                Some((*translated_count, *skipped_count))
            }
            _ => None,
        }
    }

    /// Field-level problems, for validation failures.
    #[must_use]
    pub fn details(&self) -> Option<&[ValidationError]> {
        match self {
            Self::Import(ImportError::MalformedDocument(errors))
            | Self::Store(StoreError::InvalidSettings(errors)) => Some(errors),
            _ => None,
        }
    }
}

/// Facade over the store, synchronizer, orchestrator and import/export.
#[derive(Debug, Clone)]
pub struct AdminService {
    store: TranslationStore,
    synchronizer: KeySynchronizer,
    orchestrator: BatchOrchestrator,
}

impl AdminService {
    /// Opens the JSON store configured for the workspace.
    ///
    /// # Errors
    /// `Store` if the snapshot cannot be loaded, `Sync(InvalidPattern)` for bad globs.
    pub async fn open(
        config: &ConfigManager,
        provider: Arc<dyn TranslationProvider>,
    ) -> Result<Self, AdminError> {
        let store_path = config.store_path();
        tracing::debug!(store_path = %store_path.display(), "Opening translation store");
        let store = TranslationStore::open(Arc::new(JsonFileBackend::new(store_path))).await?;
        Self::with_store(store, config.source_root(), config.get_settings(), provider)
    }

    /// # Errors
    /// `Sync(InvalidPattern)` if the include or exclude globs do not compile.
    pub fn with_store(
        store: TranslationStore,
        source_root: PathBuf,
        settings: &AdminSettings,
        provider: Arc<dyn TranslationProvider>,
    ) -> Result<Self, AdminError> {
        let synchronizer = KeySynchronizer::new(store.clone(), source_root, settings)?;
        let orchestrator = BatchOrchestrator::new(store.clone(), provider, settings.batch);
        Ok(Self { store, synchronizer, orchestrator })
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &TranslationStore {
        &self.store
    }

    /// Records matching `query`, in creation order.
    pub async fn list(&self, query: &ListQuery) -> Vec<TranslationRecord> {
        self.store.list(query).await
    }

    /// # Errors
    /// `Store(NotFound)`.
    pub async fn get(&self, id: RecordId) -> Result<TranslationRecord, AdminError> {
        Ok(self.store.get(id).await?)
    }

    /// # Errors
    /// `Store` on invalid or duplicate records.
    pub async fn create(&self, new: NewRecord) -> Result<TranslationRecord, AdminError> {
        Ok(self.store.create(new).await?)
    }

    /// # Errors
    /// `Store` on unknown ids, conflicts or invalid content.
    pub async fn update(
        &self,
        id: RecordId,
        patch: RecordPatch,
    ) -> Result<TranslationRecord, AdminError> {
        Ok(self.store.update(id, patch).await?)
    }

    /// # Errors
    /// `Store(NotFound)`.
    pub async fn delete(&self, id: RecordId) -> Result<TranslationRecord, AdminError> {
        Ok(self.store.delete(id).await?)
    }

    /// Distinct categories, sorted.
    pub async fn categories(&self) -> Vec<String> {
        self.store.categories().await
    }

    /// Translation progress.
    pub async fn stats(&self) -> StoreStats {
        self.store.stats().await
    }

    /// # Errors
    /// `Sync`.
    pub async fn sync(&self) -> Result<SyncReport, AdminError> {
        Ok(self.synchronizer.sync().await?)
    }

    /// # Errors
    /// `Batch`.
    pub async fn batch_translate(&self, request: &BatchRequest) -> Result<BatchOutcome, AdminError> {
        Ok(self.orchestrator.batch_translate(request).await?)
    }

    /// # Errors
    /// `Store(NotFound)`, `Provider` or `EmptyTranslation`.
    pub async fn translate_one(&self, id: RecordId) -> Result<TranslationRecord, AdminError> {
        Ok(self.orchestrator.translate_one(id).await?)
    }

    /// # Errors
    /// `Provider`.
    pub async fn preview_translation(
        &self,
        text: &str,
        context: Option<&str>,
    ) -> Result<String, AdminError> {
        Ok(self.orchestrator.preview_translation(text, context).await?)
    }

    /// Translates without persisting; one result per text.
    pub async fn preview_batch(&self, texts: &[String]) -> Vec<Result<String, ProviderError>> {
        self.orchestrator.preview_batch(texts).await
    }

    /// Whole store as a document.
    pub async fn export(&self) -> TranslationDocument {
        interchange::export(&self.store).await
    }

    /// # Errors
    /// `Import`.
    pub async fn import_json(&self, json: &str) -> Result<ImportReport, AdminError> {
        Ok(interchange::import_json(&self.store, json).await?)
    }

    /// # Errors
    /// `Import`.
    pub async fn import_value(&self, value: &Value) -> Result<ImportReport, AdminError> {
        Ok(interchange::import_value(&self.store, value).await?)
    }

    /// Current language settings.
    pub async fn settings(&self) -> LanguageSettings {
        self.store.settings().await
    }

    /// # Errors
    /// `Store(InvalidSettings)` listing every violated rule.
    pub async fn update_settings(
        &self,
        settings: LanguageSettings,
    ) -> Result<LanguageSettings, AdminError> {
        Ok(self.store.update_settings(settings).await?)
    }
}
