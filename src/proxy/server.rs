use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::proxy::middleware;
use crate::proxy::upstream::{UpstreamAuth, UpstreamClient};

/// Axum application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub upstream: Arc<UpstreamClient>,
}

impl AppState {
    /// Upstream coordinates, or the 500 every `/api` route answers when
    /// the deployment is missing its credentials. Checked before any
    /// request body is touched so a misconfigured box fails identically
    /// on every route.
    pub fn upstream_auth(&self) -> AppResult<UpstreamAuth<'_>> {
        match (&self.config.api_url, &self.config.api_key) {
            (Some(base_url), Some(api_key)) => Ok(UpstreamAuth { base_url, api_key }),
            _ => Err(AppError::UpstreamNotConfigured),
        }
    }
}

/// Proxy server instance
pub struct ProxyServer {
    shutdown_tx: Option<oneshot::Sender<()>>,
    local_addr: SocketAddr,
}

impl ProxyServer {
    /// Start the proxy server
    pub async fn start(
        config: Arc<AppConfig>,
    ) -> anyhow::Result<(Self, tokio::task::JoinHandle<()>)> {
        let upstream = UpstreamClient::new(config.request_timeout)
            .context("failed to build upstream HTTP client")?;

        let state = AppState {
            config: config.clone(),
            upstream: Arc::new(upstream),
        };

        let app = router(state);

        // Bind address
        let addr = config.bind_address();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind address {}", addr))?;
        let local_addr = listener
            .local_addr()
            .context("failed to read bound address")?;

        info!("PR bubble admin proxy started at http://{}", local_addr);

        // Create shutdown channel
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let server = Self {
            shutdown_tx: Some(shutdown_tx),
            local_addr,
        };

        // Start server in new task
        let handle = tokio::spawn(async move {
            use hyper::server::conn::http1;
            use hyper_util::rt::TokioIo;
            use hyper_util::service::TowerToHyperService;

            loop {
                tokio::select! {
                    res = listener.accept() => {
                        match res {
                            Ok((stream, _)) => {
                                let io = TokioIo::new(stream);
                                let service = TowerToHyperService::new(app.clone());

                                tokio::task::spawn(async move {
                                    if let Err(err) = http1::Builder::new()
                                        .serve_connection(io, service)
                                        .await
                                    {
                                        debug!("Connection handling finished or errored: {:?}", err);
                                    }
                                });
                            }
                            Err(e) => {
                                error!("Failed to accept connection: {:?}", e);
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        info!("PR bubble admin proxy stopped listening");
                        break;
                    }
                }
            }
        });

        Ok((server, handle))
    }

    /// Address actually bound. Differs from the configured one when the
    /// port was 0 (ephemeral), which the integration tests rely on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop server
    pub fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn router(state: AppState) -> Router {
    use crate::proxy::handlers;

    Router::new()
        .route(
            "/api/pr",
            get(handlers::pr::list).post(handlers::pr::create),
        )
        .route(
            "/api/pr/:id",
            get(handlers::pr::get_by_id)
                .put(handlers::pr::update)
                .delete(handlers::pr::remove),
        )
        .route("/api/pr/:id/duplicate", post(handlers::pr::duplicate))
        .route("/api/pr/:id/stats", get(handlers::pr::stats))
        .route("/api/upload/image", post(handlers::upload::image))
        .route("/healthz", get(health_check_handler))
        .layer(DefaultBodyLimit::max(100 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(middleware::cors_layer())
        .with_state(state)
}

/// Health check handler
async fn health_check_handler() -> Response {
    Json(serde_json::json!({
        "status": "ok"
    }))
    .into_response()
}
