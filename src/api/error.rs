//! HTTP mapping of admin errors.

use axum::Json;
use axum::http::{
    HeaderValue,
    StatusCode,
    header,
};
use axum::response::{
    IntoResponse,
    Response,
};
use serde::Serialize;

use crate::config::ValidationError;
use crate::provider::RecoveryAction;
use crate::service::AdminError;

/// Error half of every handler result.
#[derive(Debug)]
pub struct ApiError(pub AdminError);

impl From<AdminError> for ApiError {
    fn from(error: AdminError) -> Self {
        Self(error)
    }
}

/// `error` object of a failed response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    recovery: Option<RecoveryAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    translated_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skipped_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a [ValidationError]>,
}

/// `{"error": ...}`
#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

/// Status code for a stable error code.
pub(super) fn status_for(code: &str) -> StatusCode {
    match code {
        "notFound" => StatusCode::NOT_FOUND,
        "duplicateKey" | "versionConflict" => StatusCode::CONFLICT,
        "invalidRecord" | "invalidSettings" | "invalidRequest" | "invalidPattern" => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        "malformedDocument" => StatusCode::BAD_REQUEST,
        "sourceUnavailable" => StatusCode::SERVICE_UNAVAILABLE,
        "rateLimited" => StatusCode::TOO_MANY_REQUESTS,
        "quotaExceeded" => StatusCode::PAYMENT_REQUIRED,
        "invalidCredentials" | "unknown" => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = &self.0;
        let code = error.code();
        let status = status_for(code);
        let retry_after_secs = error.provider_error().and_then(|e| e.retry_after_secs);
        let progress = error.batch_progress();

        if status.is_server_error() {
            tracing::warn!(code, "Request failed: {error}");
        } else {
            tracing::debug!(code, "Request rejected: {error}");
        }

        let body = ErrorEnvelope {
            error: ErrorBody {
                code,
                message: error.to_string(),
                recovery: error.recovery(),
                retry_after_secs,
                translated_count: progress.map(|(translated, _)| translated),
                skipped_count: progress.map(|(_, skipped)| skipped),
                details: error.details(),
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after_secs {
            response.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
