//! Error-to-HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so route handlers can return `Result<T, vidforge_common::Error>`.
pub struct AppError(vidforge_common::Error);

impl From<vidforge_common::Error> for AppError {
    fn from(e: vidforge_common::Error) -> Self {
        Self(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "Job failed");
        } else {
            tracing::warn!(status = %status, error = %self.0, "Rejected request");
        }

        let body = json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
