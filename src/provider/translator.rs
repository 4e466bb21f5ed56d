//! Translation provider trait.

use std::fmt;

use async_trait::async_trait;

use super::error::ProviderError;

/// A machine-translation backend translating from the configured source
/// language into the configured target language.
#[async_trait]
pub trait TranslationProvider: Send + Sync + fmt::Debug {
    /// Short name used in logs (`google`, `openAi`, `mock`).
    fn provider_name(&self) -> &'static str;

    /// Translates one text. `context` is a free-text hint for the translator;
    /// providers without a context channel ignore it.
    ///
    /// Blank input yields an empty string without contacting the provider.
    ///
    /// # Errors
    /// A classified `ProviderError`.
    async fn translate(&self, text: &str, context: Option<&str>) -> Result<String, ProviderError>;

    /// Translates texts one by one, in order.
    ///
    /// Returns one result per text. After the first error that aborts a batch no
    /// further calls are made and every remaining text gets a copy of that error;
    /// other errors are kept in place and processing goes on.
    async fn translate_batch(&self, texts: &[String]) -> Vec<Result<String, ProviderError>> {
        let mut results = Vec::with_capacity(texts.len());
        let mut aborted: Option<ProviderError> = None;
        for text in texts {
            if let Some(error) = &aborted {
                results.push(Err(error.clone()));
                continue;
            }
            let result = self.translate(text, None).await;
            if let Err(error) = &result
                && error.aborts_batch()
            {
                aborted = Some(error.clone());
            }
            results.push(result);
        }
        results
    }
}
