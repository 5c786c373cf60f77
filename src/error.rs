use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

use crate::proxy::upstream::UpstreamError;

/// Errors the proxy reports to the browser.
///
/// Every variant renders as `{"detail": "..."}` so the admin UI can always
/// read `body.detail` regardless of which layer rejected the request.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("API_URL or API_KEY is not configured")]
    UpstreamNotConfigured,

    #[error("Invalid JSON")]
    InvalidJson,

    #[error("Invalid query parameters")]
    InvalidQuery,

    #[error("Invalid multipart data")]
    InvalidMultipart,

    #[error("No file provided")]
    NoFileProvided,

    #[error("File too large. Maximum size is 5MB")]
    FileTooLarge,

    #[error("Invalid file type. Allowed: JPEG, PNG, GIF, WebP")]
    InvalidFileType,

    #[error("Request timeout")]
    UpstreamTimeout,

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UpstreamNotConfigured | AppError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::InvalidJson
            | AppError::InvalidQuery
            | AppError::InvalidMultipart
            | AppError::NoFileProvided => StatusCode::BAD_REQUEST,
            AppError::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::InvalidFileType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Timeout => AppError::UpstreamTimeout,
            UpstreamError::Transport(_) => AppError::Internal,
        }
    }
}

// Implement alias for Result to simplify usage
pub type AppResult<T> = Result<T, AppError>;
