//! Key synchronizer: keeps the store in step with the keys the admin UI uses.
//!
//! ソースツリーを走査して翻訳キーを抽出し、ストアに存在しないキーだけを
//! スタブとして追加する。既存レコードは決して変更しない。

mod extractor;
mod source;
mod types;

use std::collections::HashMap;
use std::path::{
    Path,
    PathBuf,
};

use ignore::WalkBuilder;

pub use extractor::{
    ExtractError,
    KeyReference,
    extract_key_references,
    humanize_key,
    key_category,
};
pub use source::ProgrammingLanguage;
pub use types::{
    KeyDrift,
    SyncError,
    SyncReport,
};

use crate::config::{
    AdminSettings,
    FileMatcher,
};
use crate::store::TranslationStore;
use crate::types::NewRecord;

/// Keys referenced by one file.
#[derive(Debug)]
enum FileScan {
    Parsed { path: String, references: Vec<KeyReference> },
    Skipped,
}

/// A key referenced by the source tree.
#[derive(Debug)]
struct DiscoveredKey {
    key: String,
    /// `<path>:<line>` of the first usage.
    first_usage: String,
    /// First in-source fallback and where it was found.
    fallback: Option<(String, String)>,
}

impl DiscoveredKey {
    /// Stub record for a key that is not stored yet.
    fn stub(&self) -> NewRecord {
        let en_text = self
            .fallback
            .as_ref()
            .map_or_else(|| humanize_key(&self.key), |(fallback, _)| fallback.clone());

        let mut stub = NewRecord::new(self.key.clone(), en_text)
            .with_context(format!("Found in {}", self.first_usage));
        stub.category = key_category(&self.key).map(ToString::to_string);
        stub
    }
}

/// Scans the UI source tree and inserts stub records for unknown keys.
#[derive(Debug, Clone)]
pub struct KeySynchronizer {
    store: TranslationStore,
    matcher: FileMatcher,
    functions: Vec<String>,
}

impl KeySynchronizer {
    /// # Errors
    /// `InvalidPattern` if the include or exclude globs do not compile.
    pub fn new(
        store: TranslationStore,
        source_root: PathBuf,
        settings: &AdminSettings,
    ) -> Result<Self, SyncError> {
        let matcher = FileMatcher::new(source_root, settings)?;
        Ok(Self { store, matcher, functions: settings.translation_functions.clone() })
    }

    /// Runs one synchronization pass.
    ///
    /// Unreadable or unparsable files are skipped and counted. Re-running
    /// without source changes inserts nothing.
    ///
    /// # Errors
    /// `SourceUnavailable` if the source root cannot be read, `Store` if the
    /// insert cannot be persisted.
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        let source_root = self.matcher.source_root();
        tracing::debug!(source_root = %source_root.display(), "Synchronizing translation keys");

        let metadata = tokio::fs::metadata(source_root).await.map_err(|source| {
            SyncError::SourceUnavailable { path: source_root.to_path_buf(), source }
        })?;
        if !metadata.is_dir() {
            return Err(SyncError::SourceUnavailable {
                path: source_root.to_path_buf(),
                source: std::io::Error::other("not a directory"),
            });
        }

        let files = self.find_source_files();
        let futures: Vec<_> = files.iter().map(|file| self.scan_file(file)).collect();
        let scans = futures::future::join_all(futures).await;

        let mut report = SyncReport { scanned_file_count: files.len(), ..SyncReport::default() };
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut discovered: Vec<DiscoveredKey> = Vec::new();
        for scan in scans {
            let FileScan::Parsed { path, references } = scan else {
                report.skipped_file_count += 1;
                continue;
            };
            for reference in references {
                let location = format!("{path}:{}", reference.line);
                let fallback = reference
                    .fallback
                    .filter(|fallback| !fallback.trim().is_empty())
                    .map(|fallback| (fallback, location.clone()));

                if let Some(&position) = index.get(&reference.key) {
                    if let Some(existing) = discovered.get_mut(position)
                        && existing.fallback.is_none()
                    {
                        existing.fallback = fallback;
                    }
                    continue;
                }
                index.insert(reference.key.clone(), discovered.len());
                discovered.push(DiscoveredKey { key: reference.key, first_usage: location, fallback });
            }
        }
        report.discovered_key_count = discovered.len();

        let (inserted_keys, drifted_keys) = self
            .store
            .transaction(|tx| {
                let mut inserted = Vec::new();
                let mut drifted = Vec::new();
                for key in &discovered {
                    match tx.find_by_key(&key.key) {
                        Some(existing) => {
                            if let Some((fallback, location)) = &key.fallback
                                && *fallback != existing.en_text
                            {
                                drifted.push(KeyDrift {
                                    key: existing.key.clone(),
                                    stored_en_text: existing.en_text.clone(),
                                    source_fallback: fallback.clone(),
                                    location: location.clone(),
                                });
                            }
                        }
                        None => inserted.push(tx.create(key.stub())?.key),
                    }
                }
                Ok::<_, SyncError>((inserted, drifted))
            })
            .await?;

        for drift in &drifted_keys {
            tracing::warn!(
                key = %drift.key,
                location = %drift.location,
                "Source fallback differs from stored English text"
            );
        }

        report.inserted_count = inserted_keys.len();
        report.inserted_keys = inserted_keys;
        report.drifted_keys = drifted_keys;

        tracing::info!(
            scanned = report.scanned_file_count,
            skipped = report.skipped_file_count,
            discovered = report.discovered_key_count,
            inserted = report.inserted_count,
            drifted = report.drifted_keys.len(),
            "Translation key sync finished"
        );
        Ok(report)
    }

    /// ソースファイルを検索（パス順）
    fn find_source_files(&self) -> Vec<PathBuf> {
        let source_root = self.matcher.source_root();
        let mut found_files = Vec::new();

        for result in WalkBuilder::new(source_root)
            .hidden(false)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .require_git(false)
            .follow_links(false)
            .build()
        {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(?err, "Failed to read directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            if self.matcher.is_source_file(path) && ProgrammingLanguage::from_path(path).is_some() {
                found_files.push(path.to_path_buf());
            }
        }

        found_files.sort();
        found_files
    }

    /// 単一ファイルを読み込んでキーを抽出
    async fn scan_file(&self, file_path: &Path) -> FileScan {
        let Some(language) = ProgrammingLanguage::from_path(file_path) else {
            return FileScan::Skipped;
        };

        let bytes = match tokio::fs::read(file_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %file_path.display(), error = %e, "Failed to read source file");
                return FileScan::Skipped;
            }
        };
        let Ok(content) = String::from_utf8(bytes) else {
            tracing::warn!(path = %file_path.display(), "Source file is not valid UTF-8");
            return FileScan::Skipped;
        };

        let references = match extract_key_references(
            &content,
            &language.tree_sitter_language(),
            &self.functions,
        ) {
            Ok(references) => references,
            Err(e) => {
                tracing::warn!(path = %file_path.display(), error = %e, "Skipping unparsable source file");
                return FileScan::Skipped;
            }
        };

        FileScan::Parsed { path: self.display_path(file_path), references }
    }

    /// Path relative to the source root, `/`-separated.
    fn display_path(&self, file_path: &Path) -> String {
        let relative = file_path.strip_prefix(self.matcher.source_root()).unwrap_or(file_path);
        relative.to_string_lossy().replace('\\', "/")
    }
}
