// PR bubble CRUD handlers
//
// Pure pass-through routes: bodies cross as raw JSON values and are
// never inspected. Validation lives upstream; the proxy's job is the
// API key and nothing else.

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::{relay_error, relay_json, upstream_failure, UNKNOWN_ERROR};
use crate::error::{AppError, AppResult};
use crate::proxy::server::AppState;

/// Filters accepted by the list route and forwarded verbatim.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

fn forwarded_query(query: &ListQuery) -> Option<String> {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    if let Some(status) = &query.status {
        serializer.append_pair("status", status);
    }
    if let Some(page) = &query.page {
        serializer.append_pair("page", page);
    }
    if let Some(limit) = &query.limit {
        serializer.append_pair("limit", limit);
    }
    let encoded = serializer.finish();
    (!encoded.is_empty()).then_some(encoded)
}

fn parse_json(body: &Bytes) -> AppResult<Value> {
    serde_json::from_slice(body).map_err(|_| AppError::InvalidJson)
}

/// GET /api/pr
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> AppResult<Response> {
    let auth = state.upstream_auth()?;
    // A repeated filter key trips the extractor; keep the error in the
    // `detail` shape instead of axum's plain-text rejection.
    let Query(query) = query.map_err(|e| {
        warn!("rejecting list query: {}", e);
        AppError::InvalidQuery
    })?;
    let query_string = forwarded_query(&query);

    let response = state
        .upstream
        .send(auth, Method::GET, "/api/pr", query_string.as_deref(), None)
        .await
        .map_err(upstream_failure)?;
    relay_json(response, StatusCode::OK, UNKNOWN_ERROR)
}

/// POST /api/pr
pub async fn create(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let auth = state.upstream_auth()?;
    let payload = parse_json(&body)?;

    let response = state
        .upstream
        .send(auth, Method::POST, "/api/pr", None, Some(&payload))
        .await
        .map_err(upstream_failure)?;
    relay_json(response, StatusCode::CREATED, UNKNOWN_ERROR)
}

/// GET /api/pr/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let auth = state.upstream_auth()?;

    let response = state
        .upstream
        .send(auth, Method::GET, &format!("/api/pr/{}", id), None, None)
        .await
        .map_err(upstream_failure)?;
    relay_json(response, StatusCode::OK, UNKNOWN_ERROR)
}

/// PUT /api/pr/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<Response> {
    let auth = state.upstream_auth()?;
    let payload = parse_json(&body)?;

    let response = state
        .upstream
        .send(
            auth,
            Method::PUT,
            &format!("/api/pr/{}", id),
            None,
            Some(&payload),
        )
        .await
        .map_err(upstream_failure)?;
    relay_json(response, StatusCode::OK, UNKNOWN_ERROR)
}

/// DELETE /api/pr/:id
pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Response> {
    let auth = state.upstream_auth()?;

    let response = state
        .upstream
        .send(auth, Method::DELETE, &format!("/api/pr/{}", id), None, None)
        .await
        .map_err(upstream_failure)?;

    if response.status.is_success() {
        // The admin UI only cares that the deletion went through.
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(relay_error(&response, UNKNOWN_ERROR))
}

/// POST /api/pr/:id/duplicate
pub async fn duplicate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let auth = state.upstream_auth()?;

    let response = state
        .upstream
        .send(
            auth,
            Method::POST,
            &format!("/api/pr/{}/duplicate", id),
            None,
            None,
        )
        .await
        .map_err(upstream_failure)?;
    relay_json(response, StatusCode::CREATED, UNKNOWN_ERROR)
}

/// GET /api/pr/:id/stats
pub async fn stats(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Response> {
    let auth = state.upstream_auth()?;

    let response = state
        .upstream
        .send(
            auth,
            Method::GET,
            &format!("/api/pr/{}/stats", id),
            None,
            None,
        )
        .await
        .map_err(upstream_failure)?;
    relay_json(response, StatusCode::OK, UNKNOWN_ERROR)
}
