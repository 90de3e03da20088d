//! Gateway client error types.

/// Errors from storage gateway calls.
///
/// Callers treat these as opaque: the orchestrators pass the rendered
/// message through without interpreting the variant.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Gateway returned a non-2xx status.
    #[error("gateway {endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Response decoded but carried a value fgate refuses (e.g. a malformed content id).
    #[error("invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
    /// Call did not complete within the configured bound.
    #[error("gateway {endpoint} timed out after {millis}ms")]
    Timeout { endpoint: String, millis: u64 },
    /// Reading the local upload stream failed mid-transfer.
    #[error("upload stream error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}
