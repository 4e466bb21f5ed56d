//! Deterministic, network-free translator.

use std::collections::HashMap;
use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::error::ProviderError;
use super::translator::TranslationProvider;

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append the target locale: "Save" → "Save_ar"
    Suffix,

    /// Predefined `enText → translation` pairs; unmapped texts fall back to `Suffix`.
    Mappings(HashMap<String, String>),

    /// Every call fails with the given error.
    Fail(ProviderError),

    /// The n-th call returns the n-th result; calls past the end use `Suffix`.
    Script(Vec<Result<String, ProviderError>>),
}

/// Translator for tests and offline runs. Records every call.
#[derive(Debug)]
pub struct MockTranslator {
    mode: MockMode,
    target_language: String,
    calls: AtomicUsize,
    requests: Mutex<Vec<MockRequest>>,
}

/// A call received by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRequest {
    pub text: String,
    pub context: Option<String>,
}

impl MockTranslator {
    /// Mock translating into `ar`.
    #[must_use]
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            target_language: "ar".to_string(),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Target locale used by `Suffix`.
    #[must_use]
    pub fn with_target_language(mut self, target_language: impl Into<String>) -> Self {
        self.target_language = target_language.into();
        self
    }

    /// Shorthand for `Mappings`.
    #[must_use]
    pub fn with_mappings<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self::new(MockMode::Mappings(
            pairs.into_iter().map(|(en, ar)| (en.to_string(), ar.to_string())).collect(),
        ))
    }

    /// Number of provider calls made so far; blank inputs are not counted.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 受け取ったリクエスト（呼び出し順）
    pub async fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().await.clone()
    }

    /// `Save` → `Save_ar`
    fn suffix(&self, text: &str) -> String {
        format!("{text}_{}", self.target_language)
    }
}

#[async_trait]
impl TranslationProvider for MockTranslator {
    fn provider_name(&self) -> &'static str {
        "mock"
    }

    async fn translate(&self, text: &str, context: Option<&str>) -> Result<String, ProviderError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let call_index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .await
            .push(MockRequest { text: text.to_string(), context: context.map(ToString::to_string) });

        match &self.mode {
            MockMode::Suffix => Ok(self.suffix(text)),
            MockMode::Mappings(map) => Ok(map.get(text).cloned().unwrap_or_else(|| self.suffix(text))),
            MockMode::Fail(error) => Err(error.clone()),
            MockMode::Script(results) => {
                results.get(call_index).cloned().unwrap_or_else(|| Ok(self.suffix(text)))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    use super::*;
    use crate::provider::ProviderErrorKind;

    #[rstest]
    #[tokio::test]
    async fn suffix_mode_appends_target_language() {
        let mock = MockTranslator::new(MockMode::Suffix);

        assert_that!(mock.translate("Save", None).await, ok(eq("Save_ar")));
        assert_eq!(mock.call_count(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn mappings_mode_falls_back_to_suffix() {
        let mock = MockTranslator::with_mappings([("Hello", "مرحبا")]);

        assert_that!(mock.translate("Hello", None).await, ok(eq("مرحبا")));
        assert_that!(mock.translate("Bye", None).await, ok(eq("Bye_ar")));
    }

    #[rstest]
    #[tokio::test]
    async fn blank_input_is_not_a_call() {
        let mock = MockTranslator::new(MockMode::Fail(ProviderError::unknown()));

        assert_that!(mock.translate(" ", None).await, ok(eq("")));
        assert_eq!(mock.call_count(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn records_requests_with_context() {
        let mock = MockTranslator::new(MockMode::Suffix);

        mock.translate("Book now", Some("Button")).await.unwrap();

        assert_eq!(
            mock.requests().await,
            vec![MockRequest { text: "Book now".to_string(), context: Some("Button".to_string()) }]
        );
    }

    /// translate_batch: 中断系エラーの後は呼び出さず、残りには同じエラーを返す
    #[rstest]
    #[tokio::test]
    async fn batch_stops_after_aborting_error() {
        let mock = MockTranslator::new(MockMode::Script(vec![
            Ok("أ".to_string()),
            Err(ProviderError::unknown()),
            Err(ProviderError::rate_limited("slow down", Some(3))),
            Ok("never".to_string()),
        ]));
        let texts: Vec<String> = ["A", "B", "C", "D"].into_iter().map(String::from).collect();

        let results = mock.translate_batch(&texts).await;

        assert_eq!(results.len(), 4);
        assert_that!(results[0], ok(eq("أ")));
        assert_eq!(results[1].as_ref().unwrap_err().kind, ProviderErrorKind::Unknown);
        assert_eq!(results[2].as_ref().unwrap_err().kind, ProviderErrorKind::RateLimited);
        assert_eq!(results[3], results[2]);
        assert_eq!(mock.call_count(), 3);
    }
}
