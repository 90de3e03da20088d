//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Architecture
//!
//! AppState holds:
//! - **Catalog**: persistence for namespaces and uploaded files
//!   (in-memory or Postgres, see [`crate::catalog`])
//! - **Gateway**: the [`StorageGateway`] capability
//! - **Uploader / Downloader**: the orchestrators built over both
//! - **Metrics**: the Prometheus registry shared with the middleware

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use fgate_gateway::StorageGateway;

use crate::catalog::Catalog;
use crate::download::Downloader;
use crate::middleware::metrics::ApiMetrics;
use crate::upload::{UploadSettings, Uploader};

/// Default request body limit: 1 GiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Directory holding staged and committed local copies.
    pub upload_dir: PathBuf,
    /// Request body limit for uploads.
    pub max_upload_bytes: usize,
    /// Keep the staged copy when the gateway rejects an upload.
    pub retain_failed_staging: bool,
    /// Number of `info` checks before an upload is reported unconfirmed.
    pub commit_poll_attempts: u32,
    /// Delay between `info` checks.
    pub commit_poll_interval: Duration,
    /// Upper bound applied to each gateway call.
    pub gateway_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            upload_dir: PathBuf::from("./uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            retain_failed_staging: true,
            commit_poll_attempts: 10,
            commit_poll_interval: Duration::from_millis(500),
            gateway_timeout: Duration::from_secs(30),
        }
    }
}

/// Invalid environment configuration.
#[derive(Debug, thiserror::Error)]
#[error("invalid value for {var}: \"{value}\" ({expected})")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// [`AppConfig::default`] for anything unset.
    ///
    /// Variables: `PORT`, `FGATE_UPLOAD_DIR`, `FGATE_MAX_UPLOAD_BYTES`,
    /// `FGATE_RETAIN_FAILED_STAGING`, `FGATE_COMMIT_POLL_ATTEMPTS`,
    /// `FGATE_COMMIT_POLL_INTERVAL_MS`, `GATEWAY_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            port: env_parse("PORT", defaults.port, "a port number")?,
            upload_dir: std::env::var("FGATE_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes: env_positive(
                "FGATE_MAX_UPLOAD_BYTES",
                defaults.max_upload_bytes,
            )?,
            retain_failed_staging: env_parse(
                "FGATE_RETAIN_FAILED_STAGING",
                defaults.retain_failed_staging,
                "true or false",
            )?,
            commit_poll_attempts: env_positive(
                "FGATE_COMMIT_POLL_ATTEMPTS",
                defaults.commit_poll_attempts,
            )?,
            commit_poll_interval: Duration::from_millis(env_parse(
                "FGATE_COMMIT_POLL_INTERVAL_MS",
                500u64,
                "milliseconds",
            )?),
            gateway_timeout: Duration::from_secs(env_positive("GATEWAY_TIMEOUT_SECS", 30u64)?),
        })
    }

    /// Orchestrator settings derived from this configuration.
    pub fn upload_settings(&self) -> UploadSettings {
        UploadSettings {
            upload_dir: self.upload_dir.clone(),
            retain_failed_staging: self.retain_failed_staging,
            commit_poll_attempts: self.commit_poll_attempts,
            commit_poll_interval: self.commit_poll_interval,
            gateway_timeout: self.gateway_timeout,
        }
    }
}

fn env_parse<T: std::str::FromStr>(
    var: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError {
            var,
            value: raw,
            expected,
        }),
        Err(_) => Ok(default),
    }
}

fn env_positive<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let value = env_parse(var, default, "a positive integer")?;
    if value <= T::default() {
        return Err(ConfigError {
            var,
            value: std::env::var(var).unwrap_or_default(),
            expected: "a positive integer",
        });
    }
    Ok(value)
}

/// Shared application state.
///
/// Cheaply cloneable; all clones share the same catalog, gateway client,
/// orchestrators and metrics.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn Catalog>,
    pub gateway: Arc<dyn StorageGateway>,
    pub uploader: Arc<Uploader>,
    pub downloader: Arc<Downloader>,
    pub metrics: ApiMetrics,
    pub config: Arc<AppConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wire the orchestrators over a catalog and gateway.
    ///
    /// # Errors
    ///
    /// Returns the registry error if a metric cannot be registered.
    pub fn new(
        config: AppConfig,
        catalog: Arc<dyn Catalog>,
        gateway: Arc<dyn StorageGateway>,
    ) -> Result<Self, prometheus::Error> {
        let uploader = Uploader::new(
            Arc::clone(&catalog),
            Arc::clone(&gateway),
            config.upload_settings(),
        );
        let downloader = Downloader::new(
            Arc::clone(&catalog),
            Arc::clone(&gateway),
            config.gateway_timeout,
        );
        Ok(Self {
            catalog,
            gateway,
            uploader: Arc::new(uploader),
            downloader: Arc::new(downloader),
            metrics: ApiMetrics::new()?,
            config: Arc::new(config),
        })
    }
}
