use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::settings::is_valid_locale_code;

/// One violated rule, addressed by its JSON path.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Configuration error in '{field_path}': {message}")]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "includePatterns[0]")
    pub field_path: String,
    /// 人間向けのメッセージ
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error.
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

/// Failure to load or validate the workspace configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to read {}: {source}", .path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `line` and `column` point into the configuration file.
    #[error("Failed to parse {} at line {line}, column {column}: {source}", .path.display())]
    ParseError {
        path: PathBuf,
        line: usize,
        column: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Renders validation errors as a numbered list.
pub(crate) fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `.translation-admin.json` の内容
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminSettings {
    /// UI source tree scanned by the key synchronizer, relative to the workspace root.
    pub source_root: String,

    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,

    /// Callee names treated as translation lookups (`t("key")`, `i18n.t("key")`).
    pub translation_functions: Vec<String>,

    /// Snapshot file of the translation store, relative to the workspace root.
    pub store_path: String,

    pub provider: ProviderConfig,
    pub batch: BatchConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Which machine-translation backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ProviderKind {
    #[default]
    Google,
    OpenAi,
    /// Deterministic offline translator (appends the target locale).
    Mock,
}

/// Machine-translation provider selection and connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Environment variable holding the API key. Keys never live in the config file.
    ///
    /// Defaults per provider: `GOOGLE_TRANSLATE_API_KEY`, `OPENAI_API_KEY`.
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    /// Model name, only used by chat-completion providers.
    pub model: Option<String>,
    pub timeout_secs: u64,
    pub source_language: String,
    pub target_language: String,
}

impl ProviderConfig {
    /// Environment variable the API key is read from.
    #[must_use]
    pub fn api_key_variable(&self) -> &str {
        match (&self.api_key_env, self.kind) {
            (Some(name), _) => name,
            (None, ProviderKind::OpenAi) => "OPENAI_API_KEY",
            (None, ProviderKind::Google | ProviderKind::Mock) => "GOOGLE_TRANSLATE_API_KEY",
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            api_key_env: None,
            base_url: None,
            model: None,
            timeout_secs: 30,
            source_language: "en".to_string(),
            target_language: "ar".to_string(),
        }
    }
}

/// Batch size limits.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchConfig {
    /// Limit used when a batch request does not specify one.
    pub default_limit: usize,
    /// Upper bound applied to every batch request.
    pub max_limit: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { default_limit: 25, max_limit: 200 }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Listen address, e.g. `127.0.0.1:8080`.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "127.0.0.1:8080".to_string() }
    }
}

/// ログ出力の設定
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// Directory for daily-rotated log files. Stderr only when unset.
    pub directory: Option<String>,
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub filter: Option<String>,
}

impl AdminSettings {
    /// # Errors
    /// - Required field is empty
    /// - Invalid glob pattern
    /// - Inconsistent batch limits
    /// - Invalid locale code or bind address
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.source_root.trim().is_empty() {
            errors.push(ValidationError::new(
                "sourceRoot",
                "The source root cannot be empty. Example: \"src\"",
            ));
        }

        if self.include_patterns.is_empty() {
            errors.push(ValidationError::new(
                "includePatterns",
                "At least one pattern is required. Example: [\"**/*.{js,ts,tsx}\"]",
            ));
        }

        for (index, pattern) in self.include_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("includePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        for (index, pattern) in self.exclude_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("excludePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        if self.translation_functions.is_empty() {
            errors.push(ValidationError::new(
                "translationFunctions",
                "At least one function name is required. Example: [\"t\"]",
            ));
        }

        for (index, name) in self.translation_functions.iter().enumerate() {
            if name.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("translationFunctions[{index}]"),
                    "The function name cannot be empty",
                ));
            }
        }

        if self.store_path.trim().is_empty() {
            errors.push(ValidationError::new(
                "storePath",
                "The store path cannot be empty. Example: \".translation-admin/translations.json\"",
            ));
        }

        if self.provider.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "provider.timeoutSecs",
                "The timeout must be at least 1 second",
            ));
        }

        if self.provider.api_key_env.as_ref().is_some_and(|name| name.trim().is_empty()) {
            errors.push(ValidationError::new(
                "provider.apiKeyEnv",
                "The environment variable name cannot be empty",
            ));
        }

        for (field, code) in [
            ("provider.sourceLanguage", &self.provider.source_language),
            ("provider.targetLanguage", &self.provider.target_language),
        ] {
            if !is_valid_locale_code(code) {
                errors.push(ValidationError::new(field, format!("Invalid locale code '{code}'")));
            }
        }

        if self.batch.default_limit == 0 {
            errors.push(ValidationError::new(
                "batch.defaultLimit",
                "The default limit must be at least 1",
            ));
        }

        if self.batch.default_limit > self.batch.max_limit {
            errors.push(ValidationError::new(
                "batch.defaultLimit",
                format!(
                    "The default limit ({}) cannot exceed maxLimit ({})",
                    self.batch.default_limit, self.batch.max_limit
                ),
            ));
        }

        if self.server.bind.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new(
                "server.bind",
                format!("Invalid socket address '{}'. Example: \"127.0.0.1:8080\"", self.server.bind),
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            source_root: "src".to_string(),
            include_patterns: vec!["**/*.{js,jsx,ts,tsx}".to_string()],
            exclude_patterns: vec![
                "node_modules/**".to_string(),
                "dist/**".to_string(),
                "build/**".to_string(),
            ],
            translation_functions: vec!["t".to_string()],
            store_path: ".translation-admin/translations.json".to_string(),
            provider: ProviderConfig::default(),
            batch: BatchConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
