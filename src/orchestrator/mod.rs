//! Batch orchestrator: drives the provider over store records.
//!
//! プロバイダ呼び出しは逐次実行する。中断系エラーは次の呼び出しの前に効く。

mod types;

use std::sync::Arc;

pub use types::{
    BatchError,
    BatchFilter,
    BatchOutcome,
    BatchRequest,
    SkippedRecord,
    TranslateError,
};

use crate::config::BatchConfig;
use crate::provider::{
    ProviderError,
    TranslationProvider,
};
use crate::store::{
    StoreError,
    TranslationStore,
};
use crate::types::{
    ListQuery,
    RecordId,
    TranslationRecord,
};

/// Runs the provider over store records, one call at a time.
///
/// Cheap to clone; clones share the store and provider.
#[derive(Debug, Clone)]
pub struct BatchOrchestrator {
    /// 翻訳結果の書き込み先
    store: TranslationStore,
    /// 翻訳プロバイダ
    provider: Arc<dyn TranslationProvider>,
    /// Default and maximum batch sizes.
    limits: BatchConfig,
}

impl BatchOrchestrator {
    /// Creates an orchestrator bound to a store and a provider.
    #[must_use]
    pub fn new(
        store: TranslationStore,
        provider: Arc<dyn TranslationProvider>,
        limits: BatchConfig,
    ) -> Self {
        Self { store, provider, limits }
    }

    /// Effective limit of a request.
    fn resolve_limit(&self, request: &BatchRequest) -> Result<usize, BatchError> {
        let requested = request.limit.unwrap_or(self.limits.default_limit);
        if requested == 0 {
            return Err(BatchError::InvalidRequest("limit must be at least 1".to_string()));
        }
        if requested > self.limits.max_limit {
            tracing::debug!(requested, max = self.limits.max_limit, "Capping batch limit");
        }
        Ok(requested.min(self.limits.max_limit))
    }

    /// Records a request would process, in creation order.
    ///
    /// # Errors
    /// `InvalidRequest` for a zero limit or a category filter without category.
    pub async fn candidates(
        &self,
        request: &BatchRequest,
    ) -> Result<Vec<TranslationRecord>, BatchError> {
        let limit = self.resolve_limit(request)?;

        let query = match request.filter {
            BatchFilter::All | BatchFilter::Untranslated => ListQuery::default(),
            BatchFilter::Category => {
                let category = request
                    .category
                    .as_deref()
                    .map(str::trim)
                    .filter(|category| !category.is_empty())
                    .ok_or_else(|| {
                        BatchError::InvalidRequest(
                            "filter 'category' requires a category".to_string(),
                        )
                    })?;
                ListQuery { category: Some(category.to_string()), ..ListQuery::default() }
            }
        };

        Ok(self
            .store
            .list(&query)
            .await
            .into_iter()
            .filter(|record| request.force || !record.is_translated())
            .take(limit)
            .collect())
    }

    /// Translates up to `limit` candidates, one provider call at a time.
    ///
    /// Each success is persisted immediately (`arText` only). Quota, rate limit
    /// and credential failures stop the run; anything else skips the record.
    ///
    /// # Errors
    /// `Aborted` with the counts reached so far, `InvalidRequest`, or `Store`
    /// if a translation cannot be persisted.
    pub async fn batch_translate(&self, request: &BatchRequest) -> Result<BatchOutcome, BatchError> {
        let candidates = self.candidates(request).await?;
        tracing::debug!(
            provider = self.provider.provider_name(),
            candidates = candidates.len(),
            filter = ?request.filter,
            force = request.force,
            "Starting batch translation"
        );

        let mut translated_keys = Vec::new();
        let mut skipped = Vec::new();
        for record in &candidates {
            let reason = match self.provider.translate(&record.en_text, record.context.as_deref()).await {
                Ok(text) if text.trim().is_empty() => "The provider returned an empty translation".to_string(),
                Ok(text) => match self.store.set_ar_text(record.id, text).await {
                    Ok(updated) => {
                        translated_keys.push(updated.key);
                        continue;
                    }
                    Err(StoreError::NotFound { .. }) => "The record was deleted during the batch".to_string(),
                    Err(e) => return Err(e.into()),
                },
                Err(error) if error.aborts_batch() => {
                    tracing::warn!(
                        kind = error.kind.code(),
                        translated = translated_keys.len(),
                        skipped = skipped.len(),
                        "Batch translation aborted"
                    );
                    return Err(BatchError::Aborted {
                        error,
                        translated_count: translated_keys.len(),
                        skipped_count: skipped.len(),
                    });
                }
                Err(error) => error.message,
            };

            tracing::debug!(key = %record.key, %reason, "Skipping record");
            skipped.push(SkippedRecord { id: record.id, key: record.key.clone(), reason });
        }

        let outcome = BatchOutcome {
            translated_count: translated_keys.len(),
            skipped_count: skipped.len(),
            message: summary_message(candidates.len(), translated_keys.len(), skipped.len()),
            translated_keys,
            skipped,
        };
        tracing::info!(
            translated = outcome.translated_count,
            skipped = outcome.skipped_count,
            "Batch translation finished"
        );
        Ok(outcome)
    }

    /// Translates one record and stores the result.
    ///
    /// # Errors
    /// `Store(NotFound)` for an unknown id, `Provider` for any provider failure,
    /// `EmptyResult` if the provider returned nothing.
    pub async fn translate_one(&self, id: RecordId) -> Result<TranslationRecord, TranslateError> {
        let record = self.store.get(id).await?;
        let text = self.provider.translate(&record.en_text, record.context.as_deref()).await?;
        if text.trim().is_empty() {
            return Err(TranslateError::EmptyResult { key: record.key });
        }

        let updated = self.store.set_ar_text(id, text).await?;
        tracing::debug!(key = %updated.key, "Record translated");
        Ok(updated)
    }

    /// Translates without touching the store.
    ///
    /// # Errors
    /// A classified `ProviderError`.
    pub async fn preview_translation(
        &self,
        text: &str,
        context: Option<&str>,
    ) -> Result<String, ProviderError> {
        self.provider.translate(text, context).await
    }

    /// Translates several texts without touching the store; see
    /// [`TranslationProvider::translate_batch`].
    pub async fn preview_batch(&self, texts: &[String]) -> Vec<Result<String, ProviderError>> {
        self.provider.translate_batch(texts).await
    }
}

/// Human-readable summary of a finished batch.
fn summary_message(candidates: usize, translated: usize, skipped: usize) -> String {
    match (candidates, skipped) {
        (0, _) => "Nothing to translate".to_string(),
        (_, 0) => format!("Translated {translated} of {candidates} records"),
        _ => format!("Translated {translated} of {candidates} records, skipped {skipped}"),
    }
}
