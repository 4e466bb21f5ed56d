//! OpenAI chat-completions provider.

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

/// OpenAI API base.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Chat model used when `provider.model` is unset.
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI-compatible chat-completions translator.
#[derive(Clone)]
pub struct OpenAiProvider {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
    model: String,
    source_language: String,
    target_language: String,
}

impl OpenAiProvider {
    /// # Errors
    /// `MissingApiKey` for a blank key, `HttpClient` if the client cannot be built.
    pub fn new(api_key: String, config: &ProviderConfig) -> Result<Self, ProviderSetupError> {
        if api_key.trim().is_empty() {
            return Err(ProviderSetupError::MissingApiKey {
                variable: config.api_key_variable().to_string(),
            });
        }

        let base_url = config.base_url.clone().unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            api_key,
            client: http_client(config)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
        })
    }

    /// Chat request; the context goes into the system prompt.
    fn request_body(&self, text: &str, context: Option<&str>) -> Value {
        let mut instructions = format!(
            "You are a professional translator for a travel booking website. \
             Translate the user's text from '{}' to '{}'. \
             Keep placeholders such as {{{{name}}}} unchanged. Reply with the translation only.",
            self.source_language, self.target_language
        );
        if let Some(context) = context.map(str::trim).filter(|context| !context.is_empty()) {
            instructions.push_str("\nContext: ");
            instructions.push_str(context);
        }

        json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                {"role": "system", "content": instructions},
                {"role": "user", "content": text}
            ]
        })
    }
}

/// `choices[0].message.content`, trimmed.
fn parse_completion(json: &Value) -> Option<String> {
    json.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(|content| content.trim().to_string())
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TranslationProvider for OpenAiProvider {
    fn provider_name(&self) -> &'static str {
        "openAi"
    }

    async fn translate(&self, text: &str, context: Option<&str>) -> Result<String, ProviderError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(text, context))
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        if !response.status().is_success() {
            return Err(classify_http_failure(response).await);
        }

        let json: Value = response.json().await.map_err(|e| classify_transport(&e))?;
        parse_completion(&json).ok_or_else(|| {
            tracing::warn!("OpenAI response has no 'choices[0].message.content'");
            ProviderError::unknown()
        })
    }
}
