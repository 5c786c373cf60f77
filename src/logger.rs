use std::env;
use std::fs;
use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log directory, taken from `LOG_DIR`. `None` means console-only logging.
fn log_dir_from_env() -> Option<PathBuf> {
    let dir = PathBuf::from(env::var("LOG_DIR").ok().filter(|v| !v.is_empty())?);
    if !dir.exists() {
        if let Err(e) = fs::create_dir_all(&dir) {
            eprintln!("Failed to create log directory {}: {}", dir.display(), e);
            return None;
        }
    }
    Some(dir)
}

/// Initialize logger system
pub fn init() {
    // Capture log macro logs
    let _ = tracing_log::LogTracer::init();

    // Console output layer
    let console_layer = fmt::Layer::new()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    // Filter layer (default to INFO and above)
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir_from_env() {
        Some(log_dir) => {
            // File appender with daily rolling
            let file_appender = tracing_appender::rolling::daily(&log_dir, "pr-bubble-admin.log");
            let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

            // File output layer (disable ANSI formatting)
            let file_layer = fmt::Layer::new()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_level(true);

            // use try_init to avoid crash on re-initialization
            let _ = tracing_subscriber::registry()
                .with(filter_layer)
                .with(console_layer)
                .with(file_layer)
                .try_init();

            // Leak _guard so the non-blocking writer keeps flushing until exit
            std::mem::forget(_guard);

            info!("Logger initialized (console + {})", log_dir.display());
        }
        None => {
            let _ = tracing_subscriber::registry()
                .with(filter_layer)
                .with(console_layer)
                .try_init();

            info!("Logger initialized (console only)");
        }
    }
}
