//! Storage gateway stub server for local development.

use std::net::SocketAddr;

use fgate_gateway_stub::{router, StubState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("GATEWAY_STUB_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(6002);

    let app = router(StubState::new());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("fgate-gateway-stub listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await
}
