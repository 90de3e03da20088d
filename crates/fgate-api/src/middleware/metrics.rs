//! # Prometheus Metrics
//!
//! HTTP-level metrics (request counts, latency, errors) are recorded in
//! middleware. Upload and download outcomes are counted by the handlers.
//! The `fgate_files_total` gauge is refreshed from the catalog on each
//! `/metrics` scrape (pull model).

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use prometheus::core::Collector;
use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Shared metrics state backed by a Prometheus registry.
#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,

    // -- HTTP middleware metrics (push model) --
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    http_errors_total: IntCounterVec,

    // -- Orchestrator outcomes (push model, recorded by handlers) --
    uploads_total: IntCounterVec,
    downloads_total: IntCounterVec,

    // -- Catalog gauge (pull model, updated on /metrics scrape) --
    files_total: Gauge,
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics")
            .field("requests", &self.requests())
            .field("errors", &self.errors())
            .finish()
    }
}

impl ApiMetrics {
    /// Create a new metrics instance with a fresh Prometheus registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("fgate_http_requests_total", "Total HTTP requests"),
            &["method", "status"],
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "fgate_http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
            ]),
            &["method"],
        )?;

        let http_errors_total = IntCounterVec::new(
            Opts::new("fgate_http_errors_total", "Total HTTP errors (4xx and 5xx)"),
            &["method", "status"],
        )?;

        let uploads_total = IntCounterVec::new(
            Opts::new("fgate_uploads_total", "Upload attempts by outcome"),
            &["outcome"],
        )?;

        let downloads_total = IntCounterVec::new(
            Opts::new("fgate_downloads_total", "Download attempts by outcome"),
            &["outcome"],
        )?;

        let files_total = Gauge::new("fgate_files_total", "Files recorded in the catalog")?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_errors_total.clone()))?;
        registry.register(Box::new(uploads_total.clone()))?;
        registry.register(Box::new(downloads_total.clone()))?;
        registry.register(Box::new(files_total.clone()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                registry,
                http_requests_total,
                http_request_duration_seconds,
                http_errors_total,
                uploads_total,
                downloads_total,
                files_total,
            }),
        })
    }

    /// Return current total request count (sum across all labels).
    pub fn requests(&self) -> u64 {
        sum_counter(&self.inner.http_requests_total)
    }

    /// Return current total error count (sum across all labels).
    pub fn errors(&self) -> u64 {
        sum_counter(&self.inner.http_errors_total)
    }

    /// Current count for one upload outcome.
    pub fn uploads(&self, outcome: &str) -> u64 {
        self.inner.uploads_total.with_label_values(&[outcome]).get()
    }

    /// Current count for one download outcome.
    pub fn downloads(&self, outcome: &str) -> u64 {
        self.inner.downloads_total.with_label_values(&[outcome]).get()
    }

    /// Record an HTTP request (called by the middleware).
    fn record_request(&self, method: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[method, &status_str])
            .inc();

        self.inner
            .http_request_duration_seconds
            .with_label_values(&[method])
            .observe(duration_secs);

        if status >= 400 {
            self.inner
                .http_errors_total
                .with_label_values(&[method, &status_str])
                .inc();
        }
    }

    /// Count an upload outcome
    /// (`committed`, `duplicate`, `invalid`, `gateway_error`, `internal`).
    pub fn record_upload(&self, outcome: &str) {
        self.inner.uploads_total.with_label_values(&[outcome]).inc();
    }

    /// Count a download outcome
    /// (`started`, `not_found`, `inconsistent`, `gateway_error`, `internal`).
    pub fn record_download(&self, outcome: &str) {
        self.inner.downloads_total.with_label_values(&[outcome]).inc();
    }

    /// Access the catalog size gauge for updating.
    pub fn files_total(&self) -> &Gauge {
        &self.inner.files_total
    }

    /// Gather all metrics and encode to Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer)
            .map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

fn sum_counter(vec: &IntCounterVec) -> u64 {
    let mut total = 0u64;
    for mf in &vec.collect() {
        for m in mf.get_metric() {
            total += m.get_counter().get_value() as u64;
        }
    }
    total
}

/// Middleware that records HTTP request metrics via Prometheus.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        let duration = start.elapsed().as_secs_f64();
        m.record_request(&method, response.status().as_u16(), duration);
    }

    response
}
