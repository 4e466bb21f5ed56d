//! Machine-translation provider adapters.

mod error;
mod google;
mod mock;
mod openai;
mod translator;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

pub use error::{
    ProviderError,
    ProviderErrorKind,
    RecoveryAction,
    classify_response,
    classify_transport,
};
pub use google::GoogleTranslateProvider;
pub use mock::{
    MockMode,
    MockRequest,
    MockTranslator,
};
pub use openai::OpenAiProvider;
pub use translator::TranslationProvider;

use crate::config::{
    ProviderConfig,
    ProviderKind,
};

/// Failure to construct a provider.
#[derive(Error, Debug)]
pub enum ProviderSetupError {
    #[error("Translation API key not found: set the '{variable}' environment variable")]
    MissingApiKey { variable: String },

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// HTTP client with the configured timeout.
fn http_client(config: &ProviderConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()
}

/// Builds the configured provider, reading its API key from the environment.
///
/// # Errors
/// `MissingApiKey` when the key variable is unset or blank.
pub fn build_provider(
    config: &ProviderConfig,
) -> Result<Arc<dyn TranslationProvider>, ProviderSetupError> {
    let api_key = match config.kind {
        ProviderKind::Mock => None,
        ProviderKind::Google | ProviderKind::OpenAi => std::env::var(config.api_key_variable()).ok(),
    };
    provider_with_key(config, api_key)
}

/// Builds the configured provider with an explicit API key.
///
/// # Errors
/// `MissingApiKey` when a network provider gets no key.
pub fn provider_with_key(
    config: &ProviderConfig,
    api_key: Option<String>,
) -> Result<Arc<dyn TranslationProvider>, ProviderSetupError> {
    let provider: Arc<dyn TranslationProvider> = match config.kind {
        ProviderKind::Mock => Arc::new(
            MockTranslator::new(MockMode::Suffix).with_target_language(&config.target_language),
        ),
        ProviderKind::Google => {
            Arc::new(GoogleTranslateProvider::new(require_key(config, api_key)?, config)?)
        }
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(require_key(config, api_key)?, config)?),
    };

    tracing::debug!(provider = provider.provider_name(), "Translation provider ready");
    Ok(provider)
}

/// Rejects a missing or blank API key.
fn require_key(
    config: &ProviderConfig,
    api_key: Option<String>,
) -> Result<String, ProviderSetupError> {
    api_key.filter(|key| !key.trim().is_empty()).ok_or_else(|| ProviderSetupError::MissingApiKey {
        variable: config.api_key_variable().to_string(),
    })
}
