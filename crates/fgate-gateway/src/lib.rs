//! # fgate-gateway -- Storage gateway capability
//!
//! The storage network is reached through a file-system gateway exposing
//! five operations:
//!
//! | Operation            | Purpose                                          |
//! |----------------------|--------------------------------------------------|
//! | `create_file_system` | new namespace + credential                       |
//! | `add_to_hot_set`     | stream bytes into the hot set, get a content id  |
//! | `commit`             | request long-term commitment of a content id     |
//! | `info`               | report commitment status of a content id         |
//! | `get`                | stream the bytes of a content id back            |
//!
//! ## Architecture
//!
//! [`StorageGateway`] is the seam the API orchestrators depend on.
//! [`HttpGateway`] is the production implementation over the gateway's
//! HTTP API; tests substitute in-process implementations. The client
//! performs no retries: every call is single-shot and callers bound it
//! with [`timeout::bounded`].

pub mod config;
pub mod error;
pub mod http;
pub mod timeout;
pub mod types;

pub use config::{ConfigError, GatewayConfig};
pub use error::GatewayError;
pub use http::HttpGateway;
pub use types::{ContentInfo, CreatedFileSystem};

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use fgate_core::{ContentId, FileSystemToken};
use futures::Stream;

/// Bytes flowing back from the gateway.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, GatewayError>> + Send>>;

/// Bytes flowing into the gateway, typically read from a staged file.
pub type UploadStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// Capability interface to the storage gateway.
///
/// Implementations must be `Send + Sync` so they can be shared across
/// request handlers behind an `Arc`.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Create a namespace and return its identifier and credential.
    async fn create_file_system(&self) -> Result<CreatedFileSystem, GatewayError>;

    /// Stream `data` into the namespace's hot set.
    async fn add_to_hot_set(
        &self,
        data: UploadStream,
        token: &FileSystemToken,
    ) -> Result<ContentId, GatewayError>;

    /// Request long-term commitment of staged content.
    async fn commit(&self, cid: &ContentId, token: &FileSystemToken) -> Result<(), GatewayError>;

    /// Query the commitment status of content.
    async fn info(&self, cid: &ContentId, token: &FileSystemToken)
        -> Result<ContentInfo, GatewayError>;

    /// Retrieve content as an incremental byte stream.
    async fn get(&self, cid: &ContentId, token: &FileSystemToken)
        -> Result<ByteStream, GatewayError>;

    /// Probe gateway reachability.
    async fn health(&self) -> Result<(), GatewayError>;
}
