//! # fgate-api: Axum API service for fgate
//!
//! Front-end over a content-addressable storage gateway: clients upload a
//! file, fgate pushes it into the gateway's hot set, requests long-term
//! commitment, waits for confirmation and only then records it. Recorded
//! files can be listed and streamed back.
//!
//! ## API Surface
//!
//! | Method | Path                     | Module                 |
//! |--------|--------------------------|------------------------|
//! | GET    | `/files`                 | [`routes::files`]      |
//! | POST   | `/files`                 | [`routes::files`]      |
//! | GET    | `/download/{content_id}` | [`routes::download`]   |
//! | GET    | `/health/liveness`       | crate root             |
//! | GET    | `/health/readiness`      | crate root             |
//! | GET    | `/metrics`               | crate root             |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → DefaultBodyLimit → Handler
//! ```

pub mod catalog;
pub mod download;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod upload;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, StatusCode};
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};
use fgate_gateway::timeout::bounded;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes and `/metrics` are mounted outside the request metrics
/// and body-limit layers.
pub fn app(state: AppState) -> Router {
    let metrics = state.metrics.clone();

    let api = Router::new()
        .merge(routes::files::router())
        .merge(routes::download::router())
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(metrics))
        .with_state(state.clone());

    let probes = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(prometheus_metrics))
        .with_state(state);

    Router::new().merge(probes).merge(api)
}

/// Liveness probe. Always 200 while the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe over the catalog and the gateway.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Err(e) = state.catalog.ping().await {
        tracing::warn!("Catalog health check failed: {e}");
        return (StatusCode::SERVICE_UNAVAILABLE, "catalog unreachable".to_string())
            .into_response();
    }

    let probe = bounded(
        "health",
        state.config.gateway_timeout,
        state.gateway.health(),
    )
    .await;
    if let Err(e) = probe {
        tracing::warn!("Gateway health check failed: {e}");
        return (StatusCode::SERVICE_UNAVAILABLE, format!("gateway unreachable: {e}"))
            .into_response();
    }

    (StatusCode::OK, "ready".to_string()).into_response()
}

/// `GET /metrics`: Prometheus scrape endpoint.
///
/// Refreshes the catalog gauge, then encodes every registered metric in
/// Prometheus text exposition format.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.catalog.count_files().await {
        Ok(count) => state.metrics.files_total().set(count as f64),
        Err(e) => tracing::warn!("Catalog count failed during scrape: {e}"),
    }

    match state.metrics.gather_and_encode() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("{e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}
