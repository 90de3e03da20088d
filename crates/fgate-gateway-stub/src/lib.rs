//! # fgate-gateway-stub
//!
//! In-memory implementation of the storage gateway endpoints that
//! `fgate-gateway`'s `HttpGateway` calls. Content identifiers are derived
//! from a SHA-256 of the content, so re-adding the same bytes yields the
//! same identifier.
//!
//! Used as a standalone development server (see `main.rs`) and as a
//! library by end-to-end tests that bind it to an ephemeral port.
//!
//! Storage is in-memory (DashMap) with no persistence; data is lost on
//! restart.

pub mod routes;
pub mod store;

pub use routes::{content_id, router};
pub use store::StubState;
