// API endpoint handlers

pub mod pr;
pub mod upload;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::error::AppError;
use crate::proxy::upstream::{UpstreamError, UpstreamResponse};

/// Fallback `detail` for upstream error bodies the proxy cannot read.
pub(crate) const UNKNOWN_ERROR: &str = "Unknown error";

/// Convert an upstream transport failure into the proxy's own error,
/// logging it on the way.
pub(crate) fn upstream_failure(err: UpstreamError) -> AppError {
    match &err {
        UpstreamError::Timeout => warn!("upstream request timed out"),
        UpstreamError::Transport(e) => error!("upstream request failed: {}", e),
    }
    AppError::from(err)
}

/// Relay an upstream reply, forcing `success_status` on success.
///
/// The success body is re-parsed as JSON only to guarantee the proxy
/// emits valid JSON; the fields themselves are never inspected, so
/// upstream schema changes do not require a proxy release.
pub(crate) fn relay_json(
    response: UpstreamResponse,
    success_status: StatusCode,
    fallback: &str,
) -> Result<Response, AppError> {
    if !response.status.is_success() {
        return Ok(relay_error(&response, fallback));
    }

    let value: Value = serde_json::from_slice(&response.body).map_err(|e| {
        error!("upstream returned a non-JSON success body: {}", e);
        AppError::Internal
    })?;
    Ok((success_status, Json(value)).into_response())
}

/// Relay an upstream error response verbatim, status and body.
pub(crate) fn relay_error(response: &UpstreamResponse, fallback: &str) -> Response {
    let body = serde_json::from_slice::<Value>(&response.body)
        .unwrap_or_else(|_| json!({ "detail": fallback }));
    (response.status, Json(body)).into_response()
}
