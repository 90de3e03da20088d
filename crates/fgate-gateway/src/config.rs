//! Gateway client configuration.
//!
//! Configures the gateway base URL and the per-call time bound. Defaults
//! point to a gateway on localhost. Override via environment variables or
//! explicit construction for staging/testing.

use url::Url;

/// Configuration for connecting to the storage gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the gateway API.
    /// Default: <http://127.0.0.1:6002>
    pub address: Url,
    /// Upper bound for a single gateway call, in seconds.
    pub timeout_secs: u64,
    /// TCP connect timeout, in seconds.
    pub connect_timeout_secs: u64,
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `GATEWAY_ADDRESS` (default: `http://127.0.0.1:6002`)
    /// - `GATEWAY_TIMEOUT_SECS` (default: 30)
    /// - `GATEWAY_CONNECT_TIMEOUT_SECS` (default: 5)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            address: env_url("GATEWAY_ADDRESS", "http://127.0.0.1:6002")?,
            timeout_secs: env_secs("GATEWAY_TIMEOUT_SECS", 30)?,
            connect_timeout_secs: env_secs("GATEWAY_CONNECT_TIMEOUT_SECS", 5)?,
        })
    }

    /// Create a configuration pointing to a local mock server (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the localhost URL cannot be parsed.
    pub fn local_mock(port: u16) -> Result<Self, ConfigError> {
        let address = Url::parse(&format!("http://127.0.0.1:{port}"))
            .map_err(|e| ConfigError::InvalidUrl("localhost".to_string(), e.to_string()))?;
        Ok(Self {
            address,
            timeout_secs: 5,
            connect_timeout_secs: 1,
        })
    }

    /// The per-call bound as a [`std::time::Duration`].
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

fn env_secs(var: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(0) | Err(_) => Err(ConfigError::InvalidDuration(var.to_string(), raw)),
            Ok(secs) => Ok(secs),
        },
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid duration for {0}: \"{1}\" (expected a positive number of seconds)")]
    InvalidDuration(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_mock_builds_valid_config() {
        let cfg = GatewayConfig::local_mock(9000).unwrap();
        assert_eq!(cfg.address.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(cfg.timeout_secs, 5);
        assert_eq!(cfg.timeout(), std::time::Duration::from_secs(5));
    }

    #[test]
    fn env_url_uses_default_when_var_absent() {
        let url = env_url("NONEXISTENT_VAR_FGATE_1", "https://example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn env_url_rejects_invalid_url() {
        std::env::set_var("TEST_BAD_URL_FGATE_GW", "not a url");
        let result = env_url("TEST_BAD_URL_FGATE_GW", "https://example.com");
        std::env::remove_var("TEST_BAD_URL_FGATE_GW");
        assert!(result.is_err());
    }

    #[test]
    fn env_secs_rejects_zero_and_garbage() {
        std::env::set_var("TEST_SECS_ZERO_FGATE_GW", "0");
        assert!(env_secs("TEST_SECS_ZERO_FGATE_GW", 30).is_err());
        std::env::set_var("TEST_SECS_ZERO_FGATE_GW", "soon");
        assert!(env_secs("TEST_SECS_ZERO_FGATE_GW", 30).is_err());
        std::env::remove_var("TEST_SECS_ZERO_FGATE_GW");
        assert_eq!(env_secs("TEST_SECS_ZERO_FGATE_GW", 30).unwrap(), 30);
    }
}
