//! Route handlers. Each one delegates to `AdminService` and serializes the result.

use axum::Json;
use axum::extract::{
    Path,
    Query,
    State,
};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{
    Deserialize,
    Serialize,
};
use serde_json::{
    Value,
    json,
};

use super::error::ApiError;
use crate::interchange::{
    ImportReport,
    TranslationDocument,
};
use crate::orchestrator::{
    BatchOutcome,
    BatchRequest,
};
use crate::service::{
    AdminError,
    AdminService,
};
use crate::settings::LanguageSettings;
use crate::sync::SyncReport;
use crate::types::{
    ListQuery,
    NewRecord,
    RecordId,
    RecordPatch,
    StoreStats,
    TranslationRecord,
};

/// JSON body or an error response.
type ApiResult<T> = Result<Json<T>, ApiError>;

/// Path segment to a record id; malformed ids are `invalidRequest`.
fn parse_id(raw: &str) -> Result<RecordId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError(AdminError::InvalidRequest(format!("'{raw}' is not a valid record id"))))
}

/// GET /health
pub(super) async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "translation-admin",
    }))
}

/// GET /api/translations
pub(super) async fn list_translations(
    State(service): State<AdminService>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<TranslationRecord>> {
    Json(service.list(&query).await)
}

/// POST /api/translations
pub(super) async fn create_translation(
    State(service): State<AdminService>,
    Json(new): Json<NewRecord>,
) -> Result<(StatusCode, Json<TranslationRecord>), ApiError> {
    let record = service.create(new).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/translations/{id}
pub(super) async fn get_translation(
    State(service): State<AdminService>,
    Path(id): Path<String>,
) -> ApiResult<TranslationRecord> {
    Ok(Json(service.get(parse_id(&id)?).await?))
}

/// PATCH /api/translations/{id}
pub(super) async fn update_translation(
    State(service): State<AdminService>,
    Path(id): Path<String>,
    Json(patch): Json<RecordPatch>,
) -> ApiResult<TranslationRecord> {
    Ok(Json(service.update(parse_id(&id)?, patch).await?))
}

/// DELETE /api/translations/{id}
pub(super) async fn delete_translation(
    State(service): State<AdminService>,
    Path(id): Path<String>,
) -> ApiResult<TranslationRecord> {
    Ok(Json(service.delete(parse_id(&id)?).await?))
}

/// POST /api/translations/{id}/translate
pub(super) async fn translate_translation(
    State(service): State<AdminService>,
    Path(id): Path<String>,
) -> ApiResult<TranslationRecord> {
    Ok(Json(service.translate_one(parse_id(&id)?).await?))
}

/// GET /api/categories
pub(super) async fn categories(State(service): State<AdminService>) -> Json<Vec<String>> {
    Json(service.categories().await)
}

/// GET /api/stats
pub(super) async fn stats(State(service): State<AdminService>) -> Json<StoreStats> {
    Json(service.stats().await)
}

/// POST /api/sync
pub(super) async fn sync(State(service): State<AdminService>) -> ApiResult<SyncReport> {
    Ok(Json(service.sync().await?))
}

/// POST /api/batch-translate
pub(super) async fn batch_translate(
    State(service): State<AdminService>,
    Json(request): Json<BatchRequest>,
) -> ApiResult<BatchOutcome> {
    Ok(Json(service.batch_translate(&request).await?))
}

/// `{text, context?}` for one string, `{texts}` for several.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum PreviewRequest {
    Batch { texts: Vec<String> },
    Single { text: String, context: Option<String> },
}

/// One entry of a `{texts}` preview, in request order.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum PreviewItem {
    Translated { translation: String },
    Failed { error: PreviewFailure },
}

/// Error entry of a preview result.
#[derive(Debug, Serialize)]
struct PreviewFailure {
    code: &'static str,
    message: String,
}

/// POST /api/translate
pub(super) async fn preview(
    State(service): State<AdminService>,
    Json(request): Json<PreviewRequest>,
) -> ApiResult<Value> {
    match request {
        PreviewRequest::Single { text, context } => {
            let translation = service.preview_translation(&text, context.as_deref()).await?;
            Ok(Json(json!({ "translation": translation })))
        }
        PreviewRequest::Batch { texts } => {
            let results: Vec<PreviewItem> = service
                .preview_batch(&texts)
                .await
                .into_iter()
                .map(|result| match result {
                    Ok(translation) => PreviewItem::Translated { translation },
                    Err(error) => PreviewItem::Failed {
                        error: PreviewFailure { code: error.kind.code(), message: error.message },
                    },
                })
                .collect();
            Ok(Json(json!({ "results": results })))
        }
    }
}

/// GET /api/export
pub(super) async fn export(State(service): State<AdminService>) -> Json<TranslationDocument> {
    Json(service.export().await)
}

/// Takes the raw body so malformed JSON is reported as `malformedDocument`.
pub(super) async fn import(
    State(service): State<AdminService>,
    body: String,
) -> ApiResult<ImportReport> {
    Ok(Json(service.import_json(&body).await?))
}

/// GET /api/settings
pub(super) async fn get_settings(State(service): State<AdminService>) -> Json<LanguageSettings> {
    Json(service.settings().await)
}

/// PUT /api/settings
pub(super) async fn put_settings(
    State(service): State<AdminService>,
    Json(settings): Json<LanguageSettings>,
) -> ApiResult<LanguageSettings> {
    Ok(Json(service.update_settings(settings).await?))
}
