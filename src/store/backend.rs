//! Persistence backends for the translation store.

use std::fmt;
use std::path::{
    Path,
    PathBuf,
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::StoreSnapshot;
use super::error::BackendError;

/// Loads and saves whole store snapshots.
#[async_trait]
pub trait StoreBackend: Send + Sync + fmt::Debug {
    /// Returns `None` when nothing has been stored yet.
    async fn load(&self) -> Result<Option<StoreSnapshot>, BackendError>;

    async fn save(&self, snapshot: &StoreSnapshot) -> Result<(), BackendError>;
}

/// Keeps the last saved snapshot in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    snapshot: Mutex<Option<StoreSnapshot>>,
}

impl MemoryBackend {
    /// 空のバックエンド
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that loads `snapshot`.
    #[must_use]
    pub fn with_snapshot(snapshot: StoreSnapshot) -> Self {
        Self { snapshot: Mutex::new(Some(snapshot)) }
    }

    /// Last snapshot handed to `save`.
    pub async fn saved(&self) -> Option<StoreSnapshot> {
        self.snapshot.lock().await.clone()
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn load(&self) -> Result<Option<StoreSnapshot>, BackendError> {
        Ok(self.snapshot.lock().await.clone())
    }

    async fn save(&self, snapshot: &StoreSnapshot) -> Result<(), BackendError> {
        *self.snapshot.lock().await = Some(snapshot.clone());
        Ok(())
    }
}

/// Pretty-printed JSON snapshot on disk.
///
/// Writes go to a sibling temporary file first and are renamed into place,
/// so a crash mid-write never leaves a truncated snapshot behind.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Backend writing to `path`; the file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tags an I/O error with the snapshot path.
    fn io_error(&self, source: std::io::Error) -> BackendError {
        BackendError::Io { path: self.path.clone(), source }
    }
}

#[async_trait]
impl StoreBackend for JsonFileBackend {
    async fn load(&self) -> Result<Option<StoreSnapshot>, BackendError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Store file not found, starting empty");
                return Ok(None);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let snapshot = serde_json::from_str(&content)
            .map_err(|source| BackendError::Serialization { path: self.path.clone(), source })?;
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &StoreSnapshot) -> Result<(), BackendError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| self.io_error(e))?;
        }

        let content = serde_json::to_string_pretty(snapshot)
            .map_err(|source| BackendError::Serialization { path: self.path.clone(), source })?;

        let mut temp_path = self.path.clone().into_os_string();
        temp_path.push(".tmp");
        let temp_path = PathBuf::from(temp_path);

        tokio::fs::write(&temp_path, content).await.map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&temp_path, &self.path).await.map_err(|e| self.io_error(e))?;

        tracing::debug!(
            path = %self.path.display(),
            records = snapshot.translations.len(),
            "Store snapshot saved"
        );
        Ok(())
    }
}
