//! tracing の初期化

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

/// Filter used when neither `RUST_LOG` nor `logging.filter` is set.
const DEFAULT_FILTER: &str = "info,translation_admin=debug";

/// `RUST_LOG` を優先し、なければ設定値、最後にデフォルトを使う
fn build_filter(configured: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        configured
            .and_then(|directive| EnvFilter::try_new(directive).ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
    })
}

/// Installs the global subscriber: stderr always, plus a daily file under
/// `logging.directory` when set.
///
/// The returned guard flushes the file writer on drop and must outlive the program.
pub fn init(config: &LoggingConfig, workspace_root: Option<&Path>) -> Option<WorkerGuard> {
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match config.directory.as_deref() {
        Some(directory) => {
            let directory = match workspace_root {
                Some(root) => root.join(directory),
                None => directory.into(),
            };
            let appender = tracing_appender::rolling::daily(directory, "translation-admin.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let result = tracing_subscriber::registry()
        .with(build_filter(config.filter.as_deref()))
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    if let Err(error) = result {
        tracing::debug!("Tracing subscriber already installed: {error}");
    }

    guard
}
