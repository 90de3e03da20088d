//! Bounded gateway calls.
//!
//! The gateway API has no deadline of its own, so every call the
//! orchestrators make goes through [`bounded`]. A call that exceeds the
//! bound is abandoned and reported as [`GatewayError::Timeout`]; it is not
//! re-issued.

use std::future::Future;
use std::time::Duration;

use crate::error::GatewayError;

/// Await `fut`, failing with [`GatewayError::Timeout`] after `bound`.
pub async fn bounded<T, F>(endpoint: &str, bound: Duration, fut: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    match tokio::time::timeout(bound, fut).await {
        Ok(result) => result,
        Err(_) => {
            let millis = u64::try_from(bound.as_millis()).unwrap_or(u64::MAX);
            tracing::warn!(endpoint, millis, "gateway call exceeded time bound");
            Err(GatewayError::Timeout {
                endpoint: endpoint.to_string(),
                millis,
            })
        }
    }
}
