//! ワークスペース全体を通した管理フローのテスト

#![allow(clippy::unwrap_used)]
#![allow(clippy::indexing_slicing)]
#![allow(missing_docs)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{
    Request,
    StatusCode,
    header,
};
use pretty_assertions::assert_eq;
use serde_json::{
    Value,
    json,
};
use tempfile::TempDir;
use tower::ServiceExt;
use translation_admin::AdminService;
use translation_admin::api;
use translation_admin::config::ConfigManager;
use translation_admin::orchestrator::BatchRequest;
use translation_admin::provider::{
    self,
    MockTranslator,
};
use translation_admin::types::{
    ListQuery,
    NewRecord,
};

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        ".translation-admin.json",
        r#"{ "provider": { "kind": "mock" }, "batch": { "defaultLimit": 10, "maxLimit": 50 } }"#,
    );
    write(
        dir.path(),
        "src/pages/Tours.tsx",
        r#"
export function Tours() {
  const { t } = useTranslation();
  return <h1 title={t("admin.tours.subtitle", "All tours")}>{t("admin.tours.title")}</h1>;
}
"#,
    );
    write(dir.path(), "src/components/Save.jsx", r#"const label = i18n.t("common.save", { defaultValue: "Save" });"#);
    dir
}

async fn open(root: &Path) -> AdminService {
    let mut config = ConfigManager::new();
    config.load_settings(Some(root.to_path_buf())).unwrap();
    let provider = provider::build_provider(&config.get_settings().provider).unwrap();
    AdminService::open(&config, provider).await.unwrap()
}

#[tokio::test]
async fn sync_translate_and_reopen() {
    let dir = workspace();
    let service = open(dir.path()).await;

    let report = service.sync().await.unwrap();
    assert_eq!(report.inserted_count, 3);
    assert_eq!(report.scanned_file_count, 2);

    let outcome = service.batch_translate(&BatchRequest::default()).await.unwrap();
    assert_eq!(outcome.translated_count, 3);

    // 再オープンしても内容が残る
    let reopened = open(dir.path()).await;
    let records = reopened.list(&ListQuery::default()).await;
    let mut pairs: Vec<(String, Option<String>)> =
        records.into_iter().map(|r| (r.en_text, r.ar_text)).collect();
    pairs.sort();
    assert_eq!(
        pairs,
        vec![
            ("All tours".to_string(), Some("All tours_ar".to_string())),
            ("Save".to_string(), Some("Save_ar".to_string())),
            ("Title".to_string(), Some("Title_ar".to_string())),
        ]
    );

    assert_eq!(reopened.sync().await.unwrap().inserted_count, 0);
    assert_eq!(reopened.categories().await, vec!["admin".to_string(), "common".to_string()]);
}

#[tokio::test]
async fn export_then_import_into_fresh_workspace() {
    let source = workspace();
    let service = open(source.path()).await;
    service.sync().await.unwrap();
    service.batch_translate(&BatchRequest::untranslated(2)).await.unwrap();
    let document = service.export().await;

    let target = tempfile::tempdir().unwrap();
    let fresh = open(target.path()).await;
    let json = serde_json::to_string(&document).unwrap();
    let report = fresh.import_json(&json).await.unwrap();

    assert_eq!(report.imported_count, 3);
    assert_eq!(fresh.stats().await, service.stats().await);
    assert_eq!(fresh.export().await.translations, document.translations);
}

async fn call(service: AdminService, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = api::router(service).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn http_flow_translates_one_record() {
    let dir = workspace();
    let service = open(dir.path()).await;

    let (status, report) = call(service.clone(), "POST", "/api/sync", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["insertedCount"], 3);

    let (_, records) =
        call(service.clone(), "GET", "/api/translations?search=common.save", Value::Null).await;
    let id = records[0]["id"].as_str().unwrap().to_string();

    let (status, record) =
        call(service.clone(), "POST", &format!("/api/translations/{id}/translate"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["arText"], "Save_ar");
    assert_eq!(record["version"], 2);

    let (_, stats) = call(service, "GET", "/api/stats", Value::Null).await;
    assert_eq!(stats, json!({ "total": 3, "translated": 1, "untranslated": 2 }));
}

#[tokio::test]
async fn mappings_translate_scenario() {
    let dir = workspace();
    let mut config = ConfigManager::new();
    config.load_settings(Some(dir.path().to_path_buf())).unwrap();
    let service = AdminService::open(
        &config,
        Arc::new(MockTranslator::with_mappings([("Hello", "مرحبا")])),
    )
    .await
    .unwrap();

    let created = service.create(NewRecord::new("common.hello", "Hello")).await.unwrap();
    let translated = service.translate_one(created.id).await.unwrap();

    assert_eq!(translated.ar_text.as_deref(), Some("مرحبا"));
    assert!(translated.is_translated());
}
