//! # fgate-api binary entry point
//!
//! Starts the Axum HTTP server. Binds to a configurable port (default 8080).

use std::sync::Arc;

use fgate_api::catalog::{self, Catalog, MemoryCatalog, PgCatalog};
use fgate_api::state::{AppConfig, AppState};
use fgate_gateway::{GatewayConfig, HttpGateway};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing. FGATE_LOG_FORMAT=json switches to JSON lines.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("FGATE_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {e}");
        e
    })?;
    tracing::info!(?config, "configuration loaded");

    let gateway_config = GatewayConfig::from_env()?;
    tracing::info!(address = %gateway_config.address, "storage gateway configured");
    let gateway = HttpGateway::new(&gateway_config)?;

    // Database is optional; absent means in-memory catalog only.
    let catalog: Arc<dyn Catalog> = match catalog::init_pool().await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })? {
        Some(pool) => Arc::new(PgCatalog::new(pool)),
        None => Arc::new(MemoryCatalog::new()),
    };

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let port = config.port;
    let state = AppState::new(config, catalog, Arc::new(gateway))?;
    let app = fgate_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("fgate API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
