//! # Download Orchestration
//!
//! Resolves a content id to its catalog record and namespace credential,
//! then hands back the gateway's byte stream untouched. The catalog is
//! consulted first so unknown content never reaches the gateway.

use std::sync::Arc;
use std::time::Duration;

use fgate_core::{ContentId, FileRecord};
use fgate_gateway::timeout::bounded;
use fgate_gateway::{ByteStream, GatewayError, StorageGateway};

use crate::catalog::{Catalog, CatalogError};

/// Why a download could not start.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// No file record exists for the content id.
    #[error("no file with content id {0}")]
    NotFound(String),

    /// The record references a namespace the catalog does not hold.
    #[error("inconsistent catalog state: {0}")]
    InconsistentState(String),

    /// The gateway refused or failed the retrieval.
    #[error("gateway error: {0}")]
    Gateway(String),

    /// Catalog lookup failed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<GatewayError> for DownloadError {
    fn from(err: GatewayError) -> Self {
        Self::Gateway(err.to_string())
    }
}

impl From<CatalogError> for DownloadError {
    fn from(err: CatalogError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A retrieval in progress: the record plus its unread byte stream.
pub struct Download {
    pub record: FileRecord,
    pub stream: ByteStream,
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

/// Download orchestrator.
pub struct Downloader {
    catalog: Arc<dyn Catalog>,
    gateway: Arc<dyn StorageGateway>,
    gateway_timeout: Duration,
}

impl Downloader {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        gateway: Arc<dyn StorageGateway>,
        gateway_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            gateway,
            gateway_timeout,
        }
    }

    /// Start streaming the content recorded under `content_id`.
    ///
    /// The time bound covers the gateway accepting the request; the body
    /// itself streams for as long as the caller keeps reading.
    pub async fn download(&self, content_id: &ContentId) -> Result<Download, DownloadError> {
        let record = self
            .catalog
            .file_by_content_id(content_id)
            .await?
            .ok_or_else(|| DownloadError::NotFound(content_id.to_string()))?;

        let namespace = self
            .catalog
            .file_system(&record.file_system_id)
            .await?
            .ok_or_else(|| {
                DownloadError::InconsistentState(format!(
                    "file {} references missing file system {}",
                    record.content_id, record.file_system_id
                ))
            })?;

        let stream = bounded(
            "get",
            self.gateway_timeout,
            self.gateway.get(content_id, &namespace.token),
        )
        .await?;

        tracing::info!(
            content_id = %record.content_id,
            file_name = %record.file_name,
            file_system_id = %record.file_system_id,
            size_bytes = record.size_bytes,
            "download started"
        );
        Ok(Download { record, stream })
    }
}
