//! Session Calculator Server
//!
//! Entry point for the server-rendered calculator.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use dotenvy::dotenv;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use session_calculator::config::{AppConfig, LogFormat};
use session_calculator::server::start_server;

#[tokio::main]
async fn main() {
    // Load .env (if present) before reading configuration
    let _ = dotenv();

    let config = match AppConfig::load() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(config.log.format);

    if let Err(e) = start_server(config).await {
        tracing::error!(name: "server.failed", error = %format!("{e:#}"), "Server failed");
        std::process::exit(1);
    }
}

/// Initialize tracing (M-LOG-STRUCTURED)
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json().with_target(true)).init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).init(),
    }
}
