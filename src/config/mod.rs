//! Workspace configuration (`.translation-admin.json`).
mod loader;
mod manager;
mod matcher;
mod types;

pub use manager::ConfigManager;
pub use matcher::{
    FileMatcher,
    MatcherError,
};
pub(crate) use types::format_validation_errors;
pub use types::{
    AdminSettings,
    BatchConfig,
    ConfigError,
    LoggingConfig,
    ProviderConfig,
    ProviderKind,
    ServerConfig,
    ValidationError,
};
