//! Google Translate API v2 provider.
//!
//! The API key is sent as the `key` query parameter. Obtain a key from
//! <https://console.cloud.google.com/>.

use async_trait::async_trait;
use serde_json::{
    Value,
    json,
};

use super::ProviderSetupError;
use super::error::{
    ProviderError,
    classify_http_failure,
    classify_transport,
};
use super::http_client;
use super::translator::TranslationProvider;
use crate::config::ProviderConfig;

/// Google Cloud Translation v2 endpoint.
const DEFAULT_BASE_URL: &str = "https://translation.googleapis.com/language/translate/v2";

/// Google Cloud Translation (v2) with an API key query parameter.
#[derive(Clone)]
pub struct GoogleTranslateProvider {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
    source_language: String,
    target_language: String,
}

impl GoogleTranslateProvider {
    /// # Errors
    /// `MissingApiKey` for a blank key, `HttpClient` if the client cannot be built.
    pub fn new(api_key: String, config: &ProviderConfig) -> Result<Self, ProviderSetupError> {
        if api_key.trim().is_empty() {
            return Err(ProviderSetupError::MissingApiKey {
                variable: config.api_key_variable().to_string(),
            });
        }

        Ok(Self {
            api_key,
            client: http_client(config)?,
            base_url: config.base_url.clone().unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
        })
    }

    /// 翻訳リクエストの本文
    fn request_body(&self, text: &str) -> Value {
        json!({
            "q": [text],
            "source": self.source_language,
            "target": self.target_language,
            "format": "text"
        })
    }
}

/// `data.translations[0].translatedText`
fn parse_translation(json: &Value) -> Option<String> {
    json.pointer("/data/translations/0/translatedText")
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

impl std::fmt::Debug for GoogleTranslateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTranslateProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("source_language", &self.source_language)
            .field("target_language", &self.target_language)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TranslationProvider for GoogleTranslateProvider {
    fn provider_name(&self) -> &'static str {
        "google"
    }

    async fn translate(&self, text: &str, _context: Option<&str>) -> Result<String, ProviderError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let response = self
            .client
            .post(&self.base_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&self.request_body(text))
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        if !response.status().is_success() {
            return Err(classify_http_failure(response).await);
        }

        let json: Value = response.json().await.map_err(|e| classify_transport(&e))?;
        parse_translation(&json).ok_or_else(|| {
            tracing::warn!("Google Translate response has no 'data.translations[0].translatedText'");
            ProviderError::unknown()
        })
    }
}
