//! translation-admin
//!
//! バイリンガル (en/ar) 管理画面向けの翻訳キーストア、ソースコードからのキー同期、機械翻訳パイプライン

pub mod api;
pub mod config;
pub mod interchange;
pub mod logging;
pub mod orchestrator;
pub mod provider;
pub mod service;
pub mod settings;
pub mod store;
pub mod sync;
pub mod types;

pub use service::{
    AdminError,
    AdminService,
};
