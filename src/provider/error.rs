//! Provider error taxonomy and the normalization of provider-native failures.
//!
//! プロバイダ固有のエラー形式はこのモジュールの外に漏らさない。

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Message shown for `Unknown`; provider text is not passed through.
const UNKNOWN_MESSAGE: &str = "The translation service failed unexpectedly. Please try again.";

/// Closed set of translation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProviderErrorKind {
    /// Daily or monthly quota used up.
    QuotaExceeded,
    /// Too many requests; see `retry_after_secs`.
    RateLimited,
    /// Missing, invalid or unauthorized API key.
    InvalidCredentials,
    /// Anything else, including transport errors and timeouts.
    Unknown,
}

impl ProviderErrorKind {
    /// Whether the remaining items of a batch should be abandoned.
    #[must_use]
    pub const fn aborts_batch(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// What the operator should do about this kind.
    #[must_use]
    pub const fn recovery(self) -> RecoveryAction {
        match self {
            Self::QuotaExceeded => RecoveryAction::UpgradePlan,
            Self::RateLimited => RecoveryAction::Wait,
            Self::InvalidCredentials => RecoveryAction::FixConfiguration,
            Self::Unknown => RecoveryAction::Retry,
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::QuotaExceeded => "quotaExceeded",
            Self::RateLimited => "rateLimited",
            Self::InvalidCredentials => "invalidCredentials",
            Self::Unknown => "unknown",
        }
    }

    /// Message used when the provider body has none.
    const fn default_message(self) -> &'static str {
        match self {
            Self::QuotaExceeded => "The translation quota for this account has been used up.",
            Self::RateLimited => "Too many translation requests. Please wait and try again.",
            Self::InvalidCredentials => "The translation API key was rejected.",
            Self::Unknown => UNKNOWN_MESSAGE,
        }
    }
}

/// What the operator can do about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RecoveryAction {
    /// Retry after the rate limit window.
    Wait,
    /// Check the API key configuration.
    FixConfiguration,
    /// Nothing to do until the quota is raised or resets.
    UpgradePlan,
    /// Transient failure; trying again may succeed.
    Retry,
}

/// A classified provider failure. Provider-native details never leave the adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderError {
    /// 分類結果
    pub kind: ProviderErrorKind,
    /// Provider message, or a generic one for `Unknown`.
    pub message: String,
    /// Seconds from `Retry-After`, for `RateLimited` only.
    pub retry_after_secs: Option<u64>,
}

impl ProviderError {
    /// `QuotaExceeded` with the provider's message.
    #[must_use]
    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self { kind: ProviderErrorKind::QuotaExceeded, message: message.into(), retry_after_secs: None }
    }

    /// `RateLimited`, optionally with the `Retry-After` delay.
    #[must_use]
    pub fn rate_limited(message: impl Into<String>, retry_after_secs: Option<u64>) -> Self {
        Self { kind: ProviderErrorKind::RateLimited, message: message.into(), retry_after_secs }
    }

    /// `InvalidCredentials` with the provider's message.
    #[must_use]
    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::InvalidCredentials,
            message: message.into(),
            retry_after_secs: None,
        }
    }

    /// Generic failure; the provider detail is only logged.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            kind: ProviderErrorKind::Unknown,
            message: UNKNOWN_MESSAGE.to_string(),
            retry_after_secs: None,
        }
    }

    /// See [`ProviderErrorKind::aborts_batch`].
    #[must_use]
    pub const fn aborts_batch(&self) -> bool {
        self.kind.aborts_batch()
    }
}

/// Maps an unsuccessful provider HTTP response to the taxonomy.
///
/// Recognizes Google (`error.errors[].reason`, `error.details[].reason`,
/// `error.status`), OpenAI (`error.type`, `error.code`) and DeepL-style
/// (status 456) bodies. Explicit reasons win over the status code.
#[must_use]
pub fn classify_response(status: u16, retry_after: Option<&str>, body: &str) -> ProviderError {
    let json = serde_json::from_str::<Value>(body).ok();
    let reasons = json.as_ref().map(error_reasons).unwrap_or_default();
    let message = json.as_ref().and_then(error_message);

    let kind = kind_from_reasons(&reasons).unwrap_or_else(|| kind_from_status(status));
    tracing::debug!(status, ?reasons, ?kind, "Classified provider error response");

    if kind == ProviderErrorKind::Unknown {
        tracing::warn!(status, body = %truncate(body, 500), "Unrecognized provider error");
        return ProviderError::unknown();
    }

    let message = message
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| kind.default_message().to_string());
    let retry_after_secs = if kind == ProviderErrorKind::RateLimited {
        retry_after.and_then(|value| value.trim().parse::<u64>().ok())
    } else {
        None
    };

    ProviderError { kind, message, retry_after_secs }
}

/// Reads status, `Retry-After` and body of a failed response and classifies them.
pub(super) async fn classify_http_failure(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string);
    let body = response.text().await.unwrap_or_default();
    classify_response(status, retry_after.as_deref(), &body)
}

/// Connection failures, timeouts and undecodable bodies.
#[must_use]
pub fn classify_transport(error: &reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        tracing::warn!(%error, "Translation request timed out");
    } else {
        tracing::warn!(%error, "Translation request failed");
    }
    ProviderError::unknown()
}

/// Lower-cased reason tokens found in the body.
fn error_reasons(json: &Value) -> Vec<String> {
    let mut reasons = Vec::new();
    let Some(error) = json.get("error") else {
        return reasons;
    };

    for list in ["errors", "details"] {
        if let Some(items) = error.get(list).and_then(Value::as_array) {
            reasons.extend(
                items
                    .iter()
                    .filter_map(|item| item.get("reason").and_then(Value::as_str))
                    .map(str::to_lowercase),
            );
        }
    }

    for field in ["status", "type", "code"] {
        if let Some(value) = error.get(field).and_then(Value::as_str) {
            reasons.push(value.to_lowercase());
        }
    }
    reasons
}

/// `error.message` of a JSON error body.
fn error_message(json: &Value) -> Option<String> {
    json.get("error")
        .and_then(|error| error.get("message").or_else(|| error.as_str().map(|_| error)))
        .or_else(|| json.get("message"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

/// Maps provider reason codes to a kind.
fn kind_from_reasons(reasons: &[String]) -> Option<ProviderErrorKind> {
    /// Google `reason`s, OpenAI `code`s, and their equivalents.
    const QUOTA: &[&str] = &[
        "quotaexceeded",
        "dailylimitexceeded",
        "dailylimitexceededunreg",
        "insufficient_quota",
        "billing_hard_limit_reached",
        "billingnotenabled",
        "quota_exceeded",
    ];
    /// レート制限
    const RATE: &[&str] = &[
        "ratelimitexceeded",
        "userratelimitexceeded",
        "rate_limit_exceeded",
        "requests",
        "tokens",
    ];
    /// 認証エラー
    const CREDENTIALS: &[&str] = &[
        "keyinvalid",
        "api_key_invalid",
        "keyexpired",
        "invalid_api_key",
        "authentication_error",
        "unauthenticated",
        "permission_denied",
        "forbidden",
        "accessnotconfigured",
    ];

    let has = |table: &[&str]| reasons.iter().any(|reason| table.contains(&reason.as_str()));
    if has(QUOTA) {
        Some(ProviderErrorKind::QuotaExceeded)
    } else if has(RATE) {
        Some(ProviderErrorKind::RateLimited)
    } else if has(CREDENTIALS) {
        Some(ProviderErrorKind::InvalidCredentials)
    } else {
        None
    }
}

/// 状態コードのみによる分類
const fn kind_from_status(status: u16) -> ProviderErrorKind {
    match status {
        402 | 456 => ProviderErrorKind::QuotaExceeded,
        429 => ProviderErrorKind::RateLimited,
        401 | 403 => ProviderErrorKind::InvalidCredentials,
        _ => ProviderErrorKind::Unknown,
    }
}

/// Cuts `text` at a char boundary.
fn truncate(text: &str, max_chars: usize) -> &str {
    text.char_indices().nth(max_chars).map_or(text, |(index, _)| text.get(..index).unwrap_or(text))
}
