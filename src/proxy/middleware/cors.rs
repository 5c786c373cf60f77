use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

/// Permissive CORS for the admin UI dev server.
///
/// In production the UI is served from the same origin as this proxy, so
/// the browser never sends a cross-origin request. During development the
/// UI runs on its own port and needs the preflight answered.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}
