//! 設定ファイルの読み込み関数

use std::path::Path;

use super::{
    AdminSettings,
    ConfigError,
};

/// 設定ファイル名
pub(super) const CONFIG_FILE_NAME: &str = ".translation-admin.json";

/// ワークスペースから設定を読み込む
///
/// # Returns
/// - `Ok(Some(settings))`: 設定ファイルが見つかり、読み込みに成功
/// - `Ok(None)`: 設定ファイルが見つからない、または空
/// - `Err(ConfigError)`: ファイル読み込みまたはパースエラー（パスと位置付き）
///
/// # Errors
/// - ファイル読み込みエラー
/// - JSON パースエラー
pub(super) fn load_from_workspace(
    workspace_root: &Path,
) -> Result<Option<AdminSettings>, ConfigError> {
    let config_path = workspace_root.join(CONFIG_FILE_NAME);

    let content = match std::fs::read_to_string(&config_path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("Configuration file not found: {:?}", config_path);
            return Ok(None);
        }
        Err(source) => return Err(ConfigError::IoError { path: config_path, source }),
    };

    // 空ファイルはデフォルト設定として扱う
    if content.trim().is_empty() {
        tracing::debug!("Configuration file is empty: {:?}", config_path);
        return Ok(None);
    }

    tracing::debug!("Loading configuration from: {:?}", config_path);
    serde_json::from_str(&content).map(Some).map_err(|source| ConfigError::ParseError {
        line: source.line(),
        column: source.column(),
        path: config_path,
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use std::fs;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;
    use crate::config::ProviderKind;

    fn workspace_with(content: &str) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), content).unwrap();
        temp_dir
    }

    /// `load_from_workspace`: 指定したフィールドだけ上書きされる
    #[rstest]
    fn test_load_from_workspace_with_partial_config() {
        let temp_dir = workspace_with(
            r#"{"sourceRoot": "admin/src", "batch": {"defaultLimit": 10}, "provider": {"kind": "openAi"}}"#,
        );

        let settings = load_from_workspace(temp_dir.path()).unwrap().unwrap();

        assert_eq!(settings.source_root, "admin/src");
        assert_eq!(settings.batch.default_limit, 10);
        assert_eq!(settings.batch.max_limit, 200);
        assert_eq!(settings.provider.kind, ProviderKind::OpenAi);
        assert_eq!(settings.provider.api_key_variable(), "OPENAI_API_KEY");
    }

    /// `load_from_workspace`: ファイルがない、または空ならデフォルト
    #[rstest]
    #[case::missing(None)]
    #[case::empty(Some(""))]
    #[case::whitespace(Some("  \n"))]
    fn test_load_from_workspace_without_content(#[case] content: Option<&str>) {
        let temp_dir = match content {
            Some(content) => workspace_with(content),
            None => TempDir::new().unwrap(),
        };

        let result = load_from_workspace(temp_dir.path()).unwrap();

        assert!(result.is_none());
    }

    /// `load_from_workspace`: パースエラーはファイルと位置を示す
    #[rstest]
    fn test_load_from_workspace_reports_parse_position() {
        let temp_dir = workspace_with("{\n  \"sourceRoot\": \"src\",\n  \"batch\": nope\n}");

        let error = load_from_workspace(temp_dir.path()).unwrap_err();

        let ConfigError::ParseError { path, line, .. } = &error else {
            panic!("expected ParseError, got {error:?}");
        };
        assert_eq!(path, &temp_dir.path().join(CONFIG_FILE_NAME));
        assert_eq!(*line, 3);
        assert!(error.to_string().contains(CONFIG_FILE_NAME));
    }

    /// `load_from_workspace`: 型が違うフィールドもパースエラー
    #[rstest]
    fn test_load_from_workspace_wrong_type() {
        let temp_dir = workspace_with(r#"{"includePatterns": "**/*.ts"}"#);

        let result = load_from_workspace(temp_dir.path());

        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }
}
