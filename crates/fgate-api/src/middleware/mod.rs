//! # Middleware Stack
//!
//! Tower middleware for the API layer:
//! - [`metrics`]: Prometheus request metrics and the upload/download
//!   outcome counters recorded by the route handlers.

pub mod metrics;
