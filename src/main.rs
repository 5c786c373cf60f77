use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use pr_bubble_admin::config::AppConfig;
use pr_bubble_admin::logger;
use pr_bubble_admin::proxy::ProxyServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A .env file is optional, real deployments set the environment directly.
    dotenvy::dotenv().ok();

    logger::init();

    let config = Arc::new(AppConfig::from_env());
    if config.api_url.is_none() || config.api_key.is_none() {
        warn!("API_URL or API_KEY is not configured, /api routes will answer 500 until both are set");
    }

    let (server, handle) = ProxyServer::start(config).await?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("shutdown signal received");

    server.stop();
    handle.await.context("server task failed")?;

    Ok(())
}
