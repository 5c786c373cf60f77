//! Shared test harness: a scripted mock upstream plus a real proxy
//! wired to it over loopback.
//!
//! The mock stores bubbles as raw JSON and records every request it
//! sees, so tests can assert both what the proxy relays and what it
//! actually sent upstream (headers, query strings, bodies).

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, Multipart, Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use url::Url;

use pr_bubble_admin::client::ApiClient;
use pr_bubble_admin::config::AppConfig;
use pr_bubble_admin::models::{PrBubbleCreate, PrStatus, TagType};
use pr_bubble_admin::proxy::ProxyServer;

pub const TEST_API_KEY: &str = "test-secret-key";

/// One request as the mock upstream saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub api_key: Option<String>,
    pub body: Option<Value>,
}

/// One multipart file as the mock upstream received it.
#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub field_name: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub size: usize,
}

#[derive(Default)]
pub struct UpstreamState {
    bubbles: Mutex<HashMap<String, Value>>,
    requests: Mutex<Vec<RecordedRequest>>,
    uploads: Mutex<Vec<UploadRecord>>,
    next_id: AtomicU64,
}

fn record(
    state: &UpstreamState,
    method: &str,
    path: String,
    query: Option<String>,
    headers: &HeaderMap,
    body: Option<Value>,
) {
    let api_key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path,
        query,
        api_key,
        body,
    });
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": "PR bubble not found" })),
    )
        .into_response()
}

async fn list_pr(
    State(state): State<Arc<UpstreamState>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    record(&state, "GET", "/api/pr".into(), query.clone(), &headers, None);

    let mut status_filter = None;
    let mut page = 1u64;
    let mut limit = 20u64;
    if let Some(qs) = &query {
        for (key, value) in url::form_urlencoded::parse(qs.as_bytes()) {
            match key.as_ref() {
                "status" => status_filter = Some(value.to_string()),
                "page" => page = value.parse().unwrap_or(1),
                "limit" => limit = value.parse().unwrap_or(20),
                _ => {}
            }
        }
    }

    let bubbles = state.bubbles.lock().unwrap();
    let mut items: Vec<Value> = bubbles
        .values()
        .filter(|bubble| match &status_filter {
            Some(status) => bubble["status"] == status.as_str(),
            None => true,
        })
        .cloned()
        .collect();
    items.sort_by(|a, b| a["id"].as_str().cmp(&b["id"].as_str()));
    let total = items.len();

    Json(json!({ "items": items, "total": total, "page": page, "limit": limit })).into_response()
}

async fn create_pr(
    State(state): State<Arc<UpstreamState>>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    record(
        &state,
        "POST",
        "/api/pr".into(),
        None,
        &headers,
        Some(body.clone()),
    );

    // Sentinel the tests use to script a validation failure.
    if body["title"] == "reject" {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": "title rejected" })),
        )
            .into_response();
    }

    let id = format!("pr-{}", state.next_id.fetch_add(1, Ordering::SeqCst));
    let now = json!(Utc::now().to_rfc3339());
    if let Some(obj) = body.as_object_mut() {
        obj.insert("id".into(), json!(id.clone()));
        obj.insert("view_count".into(), json!(0));
        obj.insert("click_count".into(), json!(0));
        obj.insert("created_at".into(), now.clone());
        obj.insert("updated_at".into(), now);
    }
    state.bubbles.lock().unwrap().insert(id, body.clone());

    Json(body).into_response()
}

async fn get_pr(
    State(state): State<Arc<UpstreamState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    record(&state, "GET", format!("/api/pr/{}", id), None, &headers, None);

    if id == "slow" {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
    if id == "boom" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }
    if id == "garbled" {
        return (StatusCode::OK, "ok but not json").into_response();
    }

    match state.bubbles.lock().unwrap().get(&id) {
        Some(bubble) => Json(bubble.clone()).into_response(),
        None => not_found(),
    }
}

async fn update_pr(
    State(state): State<Arc<UpstreamState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(patch): Json<Value>,
) -> Response {
    record(
        &state,
        "PUT",
        format!("/api/pr/{}", id),
        None,
        &headers,
        Some(patch.clone()),
    );

    let mut bubbles = state.bubbles.lock().unwrap();
    let Some(stored) = bubbles.get_mut(&id) else {
        return not_found();
    };
    // Shallow merge: absent keys stay, explicit nulls overwrite.
    if let (Some(obj), Some(patch_obj)) = (stored.as_object_mut(), patch.as_object()) {
        for (key, value) in patch_obj {
            obj.insert(key.clone(), value.clone());
        }
        obj.insert("updated_at".into(), json!(Utc::now().to_rfc3339()));
    }
    Json(stored.clone()).into_response()
}

async fn delete_pr(
    State(state): State<Arc<UpstreamState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    record(
        &state,
        "DELETE",
        format!("/api/pr/{}", id),
        None,
        &headers,
        None,
    );

    match state.bubbles.lock().unwrap().remove(&id) {
        Some(_) => Json(json!({ "detail": "PR bubble deleted" })).into_response(),
        None => not_found(),
    }
}

async fn duplicate_pr(
    State(state): State<Arc<UpstreamState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    record(
        &state,
        "POST",
        format!("/api/pr/{}/duplicate", id),
        None,
        &headers,
        None,
    );

    if id == "slow" {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }

    let copy_id = format!("pr-{}", state.next_id.fetch_add(1, Ordering::SeqCst));
    let mut bubbles = state.bubbles.lock().unwrap();
    let Some(source) = bubbles.get(&id).cloned() else {
        return not_found();
    };

    let mut copy = source;
    if let Some(obj) = copy.as_object_mut() {
        let now = json!(Utc::now().to_rfc3339());
        obj.insert("id".into(), json!(copy_id.clone()));
        obj.insert("status".into(), json!("draft"));
        obj.insert("view_count".into(), json!(0));
        obj.insert("click_count".into(), json!(0));
        obj.insert("created_at".into(), now.clone());
        obj.insert("updated_at".into(), now);
    }
    bubbles.insert(copy_id.clone(), copy.clone());

    Json(copy).into_response()
}

async fn pr_stats(
    State(state): State<Arc<UpstreamState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    record(
        &state,
        "GET",
        format!("/api/pr/{}/stats", id),
        None,
        &headers,
        None,
    );

    let bubbles = state.bubbles.lock().unwrap();
    let Some(bubble) = bubbles.get(&id) else {
        return not_found();
    };

    let views = bubble["view_count"].as_u64().unwrap_or(0);
    let clicks = bubble["click_count"].as_u64().unwrap_or(0);
    let ctr = if views == 0 {
        0.0
    } else {
        clicks as f64 / views as f64 * 100.0
    };

    Json(json!({
        "id": bubble["id"],
        "title": bubble["title"],
        "view_count": views,
        "click_count": clicks,
        "ctr": ctr,
        "created_at": bubble["created_at"],
        "start_date": bubble["start_date"],
        "end_date": bubble["end_date"],
        "status": bubble["status"],
    }))
    .into_response()
}

async fn upload_image(
    State(state): State<Arc<UpstreamState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    record(
        &state,
        "POST",
        "/api/upload/image".into(),
        None,
        &headers,
        None,
    );

    let mut first_file: Option<UploadRecord> = None;
    while let Some(field) = multipart.next_field().await.unwrap() {
        let field_name = field.name().unwrap_or_default().to_string();
        let Some(file_name) = field.file_name().map(str::to_string) else {
            let _ = field.text().await;
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.unwrap();

        let upload = UploadRecord {
            field_name,
            file_name,
            content_type,
            size: data.len(),
        };
        state.uploads.lock().unwrap().push(upload.clone());
        if first_file.is_none() {
            first_file = Some(upload);
        }
    }

    match first_file {
        // Sentinel for a storage failure with a non-JSON body.
        Some(file) if file.file_name == "fail.png" => {
            (StatusCode::INSUFFICIENT_STORAGE, "disk full").into_response()
        }
        Some(file) => Json(json!({
            "url": format!("https://cdn.example.test/uploads/{}", file.file_name)
        }))
        .into_response(),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "file field required" })),
        )
            .into_response(),
    }
}

/// The fake PR API the proxy talks to during tests.
pub struct MockUpstream {
    pub addr: SocketAddr,
    state: Arc<UpstreamState>,
}

impl MockUpstream {
    pub async fn spawn() -> Self {
        let state = Arc::new(UpstreamState::default());

        let app = Router::new()
            .route("/api/pr", get(list_pr).post(create_pr))
            .route("/api/pr/:id", get(get_pr).put(update_pr).delete(delete_pr))
            .route("/api/pr/:id/duplicate", post(duplicate_pr))
            .route("/api/pr/:id/stats", get(pr_stats))
            .route("/api/upload/image", post(upload_image))
            .layer(DefaultBodyLimit::max(64 * 1024 * 1024))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock upstream");
        let addr = listener.local_addr().expect("mock upstream address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    pub fn uploads(&self) -> Vec<UploadRecord> {
        self.state.uploads.lock().unwrap().clone()
    }

    /// Plant a bubble without going through the API, e.g. to control the
    /// engagement counters the create route zeroes.
    pub fn seed_bubble(&self, id: &str, value: Value) {
        self.state
            .bubbles
            .lock()
            .unwrap()
            .insert(id.to_string(), value);
    }
}

/// A real `ProxyServer` on an ephemeral port, torn down on drop.
pub struct TestProxy {
    pub base_url: String,
    server: Option<ProxyServer>,
}

impl TestProxy {
    /// Proxy fully wired to `upstream` with a generous timeout.
    pub async fn spawn(upstream: &MockUpstream) -> Self {
        Self::spawn_with(
            Some(upstream.base_url()),
            Some(TEST_API_KEY.to_string()),
            Duration::from_secs(5),
        )
        .await
    }

    pub async fn spawn_with(
        api_url: Option<String>,
        api_key: Option<String>,
        request_timeout: Duration,
    ) -> Self {
        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            api_url: api_url.map(|u| Url::parse(&u).expect("valid upstream URL")),
            api_key,
            request_timeout,
        };

        let (server, _handle) = ProxyServer::start(Arc::new(config))
            .await
            .expect("proxy failed to start");
        let base_url = format!("http://{}", server.local_addr());

        Self {
            base_url,
            server: Some(server),
        }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url).expect("api client")
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        if let Some(server) = self.server.take() {
            server.stop();
        }
    }
}

/// A complete, valid creation payload.
pub fn sample_create(title: &str) -> PrBubbleCreate {
    PrBubbleCreate {
        title: title.to_string(),
        description: "Season opener promo".into(),
        image_url: "https://cdn.example.test/uploads/cover.png".into(),
        link_url: "https://shop.example.test/sale".into(),
        tag_type: TagType::Predefined,
        tag_text: "NEW".into(),
        tag_color: "#ff6b00".into(),
        start_date: "2025-06-01T00:00:00Z".parse().unwrap(),
        end_date: "2025-06-30T23:59:59Z".parse().unwrap(),
        priority: Some(10),
        status: PrStatus::Active,
        utm_campaign: Some("summer_sale".into()),
    }
}

/// A full stored bubble, shaped exactly like the upstream would return it.
pub fn sample_bubble_value(id: &str, status: &str, views: u64, clicks: u64) -> Value {
    json!({
        "id": id,
        "title": "Seeded bubble",
        "description": "Planted by the test harness",
        "image_url": "https://cdn.example.test/uploads/seeded.png",
        "link_url": "https://shop.example.test/seeded",
        "tag_type": "custom",
        "tag_text": "SALE",
        "tag_color": "#00b900",
        "start_date": "2025-05-01T00:00:00Z",
        "end_date": "2025-05-31T23:59:59Z",
        "priority": null,
        "status": status,
        "utm_campaign": null,
        "view_count": views,
        "click_count": clicks,
        "created_at": "2025-04-20T12:00:00Z",
        "updated_at": "2025-04-21T08:30:00Z",
    })
}
