//! The HTTP facade's single error-to-status mapping point: the facade is
//! the only place that maps error kinds to HTTP status codes. Business
//! crates never produce an HTTP status themselves, only a
//! [`remind_core::RemindError`] kind.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use remind_core::RemindError;
use serde::Serialize;

/// `{status: "error", error, detail}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub error: String,
    pub detail: String,
}

/// Thin wrapper so handlers can return `Result<Json<T>, ApiError>` and get
/// the status/body mapping for free via `IntoResponse`.
pub struct ApiError(pub RemindError);

impl From<RemindError> for ApiError {
    fn from(err: RemindError) -> Self {
        ApiError(err)
    }
}

fn status_for(err: &RemindError) -> StatusCode {
    match err {
        RemindError::InputError(_) => StatusCode::BAD_REQUEST,
        RemindError::NotFound(_) => StatusCode::NOT_FOUND,
        RemindError::RetrievalUnavailable(_) => StatusCode::BAD_GATEWAY,
        RemindError::NarrationUnavailable(_) => StatusCode::BAD_GATEWAY,
        RemindError::ComposeFailed(_) => StatusCode::BAD_GATEWAY,
        RemindError::TtsUnavailable(_) => StatusCode::BAD_GATEWAY,
        RemindError::LipSyncUnavailable(_) => StatusCode::BAD_GATEWAY,
        RemindError::ExternalUnavailable(_) => StatusCode::BAD_GATEWAY,
        RemindError::QuotaExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
        RemindError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        RemindError::InvariantViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(kind = self.0.kind(), error = %self.0, "invariant violation surfaced to facade");
        } else {
            tracing::warn!(kind = self.0.kind(), error = %self.0, "request failed");
        }
        let body = ErrorBody {
            status: "error",
            error: self.0.kind().to_string(),
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
