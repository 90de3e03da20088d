//! # Upload/Commit Orchestration
//!
//! Drives one upload from client bytes to a persisted [`FileRecord`]:
//!
//! ```text
//! stage locally → resolve default namespace → add to hot set
//!   → commit → confirm via info → move into place → persist record
//! ```
//!
//! A record is written only after the gateway confirms commitment. Any
//! failure before that leaves the catalog untouched. Every gateway call
//! is single-shot and bounded by [`UploadSettings::gateway_timeout`].
//!
//! ## Local layout
//!
//! ```text
//! <upload_dir>/.staging/<uuid>.part       while bytes arrive
//! <upload_dir>/.staging/<uuid>            staged, awaiting the gateway
//! <upload_dir>/<content id>/<file name>   committed
//! ```
//!
//! Staging paths never embed the client's name, so any name the sanitizer
//! accepts can be staged.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use fgate_core::record::truncate_to_seconds;
use fgate_core::{
    sanitize_file_name, CommitStatus, ContentId, FileName, FileRecord, FileSystemRecord,
    FileSystemToken,
};
use fgate_gateway::timeout::bounded;
use fgate_gateway::{GatewayError, StorageGateway};
use futures::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::catalog::{Catalog, CatalogError};

/// Subdirectory of the upload directory that holds in-flight uploads.
pub const STAGING_DIR: &str = ".staging";

/// Settings the orchestrator needs from [`crate::state::AppConfig`].
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub upload_dir: PathBuf,
    pub retain_failed_staging: bool,
    pub commit_poll_attempts: u32,
    pub commit_poll_interval: Duration,
    pub gateway_timeout: Duration,
}

/// Why an upload did not produce a record.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The name or bytes supplied by the client could not be staged.
    /// No gateway call was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The gateway failed or did not confirm commitment.
    #[error("gateway error: {0}")]
    Gateway(String),

    /// Local persistence failed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<GatewayError> for UploadError {
    fn from(err: GatewayError) -> Self {
        Self::Gateway(err.to_string())
    }
}

impl From<CatalogError> for UploadError {
    fn from(err: CatalogError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Successful upload result.
#[derive(Debug, Clone)]
pub enum UploadOutcome {
    /// A new record was persisted.
    Committed(FileRecord),
    /// The gateway returned a content id that was already recorded; the
    /// existing record is returned and nothing new was written.
    AlreadyStored(FileRecord),
}

impl UploadOutcome {
    pub fn record(&self) -> &FileRecord {
        match self {
            Self::Committed(r) | Self::AlreadyStored(r) => r,
        }
    }

    pub fn into_record(self) -> FileRecord {
        match self {
            Self::Committed(r) | Self::AlreadyStored(r) => r,
        }
    }

    /// Confirmation shown to the user.
    pub fn message(&self) -> String {
        format!("'{}' uploaded to Filecoin.", self.record().file_name)
    }
}

/// Removes a partially written file unless disarmed.
struct PartGuard {
    path: PathBuf,
    armed: bool,
}

impl PartGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PartGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// A fully written upload waiting for the gateway.
#[derive(Debug)]
struct StagedFile {
    path: PathBuf,
    name: FileName,
    size_bytes: u64,
}

/// Upload/commit orchestrator.
pub struct Uploader {
    catalog: Arc<dyn Catalog>,
    gateway: Arc<dyn StorageGateway>,
    settings: UploadSettings,
    /// Serializes default-namespace creation within this process.
    namespace_lock: tokio::sync::Mutex<()>,
}

impl Uploader {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        gateway: Arc<dyn StorageGateway>,
        settings: UploadSettings,
    ) -> Self {
        Self {
            catalog,
            gateway,
            settings,
            namespace_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &UploadSettings {
        &self.settings
    }

    fn staging_dir(&self) -> PathBuf {
        self.settings.upload_dir.join(STAGING_DIR)
    }

    /// Upload a file that already exists on local disk.
    pub async fn upload_path(
        &self,
        local_path: &Path,
        original_name: &str,
    ) -> Result<UploadOutcome, UploadError> {
        let file = tokio::fs::File::open(local_path).await.map_err(|e| {
            UploadError::InvalidInput(format!("cannot read {}: {e}", local_path.display()))
        })?;
        self.upload_stream(original_name, ReaderStream::new(file))
            .await
    }

    /// Upload bytes arriving as a stream, such as a multipart field.
    pub async fn upload_stream<S, E>(
        &self,
        original_name: &str,
        body: S,
    ) -> Result<UploadOutcome, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        tokio::fs::create_dir_all(self.staging_dir())
            .await
            .map_err(|e| UploadError::InvalidInput(format!("cannot prepare staging area: {e}")))?;

        let name = sanitize_file_name(original_name)
            .map_err(|e| UploadError::InvalidInput(e.to_string()))?;

        let staged = self.stage(name, body).await?;
        tracing::info!(
            file_name = %staged.name,
            size_bytes = staged.size_bytes,
            "upload staged"
        );

        match self.push(&staged).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                if self.settings.retain_failed_staging {
                    tracing::warn!(
                        file_name = %staged.name,
                        staged_path = %staged.path.display(),
                        error = %err,
                        "upload failed, staged copy retained"
                    );
                } else {
                    let _ = tokio::fs::remove_file(&staged.path).await;
                    tracing::warn!(file_name = %staged.name, error = %err, "upload failed");
                }
                Err(err)
            }
        }
    }

    /// Write the incoming bytes to the staging area.
    async fn stage<S, E>(&self, name: FileName, body: S) -> Result<StagedFile, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        let id = Uuid::new_v4();
        let mut part = PartGuard::new(self.staging_dir().join(format!("{id}.part")));
        let staging_error = |e: std::io::Error| UploadError::InvalidInput(format!("staging failed: {e}"));

        let mut file = tokio::fs::File::create(&part.path)
            .await
            .map_err(staging_error)?;
        let mut size_bytes = 0u64;
        futures::pin_mut!(body);
        while let Some(chunk) = body.next().await {
            let chunk = chunk
                .map_err(|e| UploadError::InvalidInput(format!("upload interrupted: {e}")))?;
            file.write_all(&chunk).await.map_err(staging_error)?;
            size_bytes += chunk.len() as u64;
        }
        file.flush().await.map_err(staging_error)?;
        drop(file);

        let path = self.staging_dir().join(id.to_string());
        tokio::fs::rename(&part.path, &path)
            .await
            .map_err(staging_error)?;
        part.disarm();

        Ok(StagedFile {
            path,
            name,
            size_bytes,
        })
    }

    /// Gateway half of the upload: everything after staging.
    async fn push(&self, staged: &StagedFile) -> Result<UploadOutcome, UploadError> {
        let timeout = self.settings.gateway_timeout;
        let namespace = self.default_file_system().await?;

        let data = tokio::fs::File::open(&staged.path)
            .await
            .map_err(|e| UploadError::Internal(format!("cannot reopen staged file: {e}")))?;
        let content_id = bounded(
            "add_to_hot_set",
            timeout,
            self.gateway
                .add_to_hot_set(Box::pin(ReaderStream::new(data)), &namespace.token),
        )
        .await?;
        tracing::info!(
            content_id = %content_id,
            file_name = %staged.name,
            file_system_id = %namespace.id,
            "added to hot set"
        );

        if let Some(existing) = self.catalog.file_by_content_id(&content_id).await? {
            let _ = tokio::fs::remove_file(&staged.path).await;
            tracing::info!(content_id = %content_id, "content already stored");
            return Ok(UploadOutcome::AlreadyStored(existing));
        }

        bounded(
            "commit",
            timeout,
            self.gateway.commit(&content_id, &namespace.token),
        )
        .await?;
        self.confirm_commit(&content_id, &namespace.token).await?;

        let storage_path = self.settings.upload_dir.join(content_id.as_str());
        tokio::fs::create_dir_all(&storage_path)
            .await
            .map_err(|e| UploadError::Internal(format!("cannot create {}: {e}", storage_path.display())))?;
        let final_path = storage_path.join(staged.name.as_str());
        tokio::fs::rename(&staged.path, &final_path)
            .await
            .map_err(|e| UploadError::Internal(format!("cannot move staged file: {e}")))?;

        let record = FileRecord {
            storage_path,
            file_name: staged.name.clone(),
            uploaded_at: truncate_to_seconds(Utc::now()),
            size_bytes: staged.size_bytes,
            content_id,
            file_system_id: namespace.id,
        };

        match self.catalog.insert_file(&record).await {
            Ok(()) => {
                tracing::info!(
                    content_id = %record.content_id,
                    file_name = %record.file_name,
                    file_system_id = %record.file_system_id,
                    size_bytes = record.size_bytes,
                    "upload committed"
                );
                Ok(UploadOutcome::Committed(record))
            }
            Err(CatalogError::Conflict(_)) => {
                // A concurrent upload of the same bytes won the insert.
                let existing = self
                    .catalog
                    .file_by_content_id(&record.content_id)
                    .await?
                    .ok_or_else(|| {
                        UploadError::Internal(format!(
                            "conflicting record for {} disappeared",
                            record.content_id
                        ))
                    })?;
                if existing.file_name != record.file_name {
                    let _ = tokio::fs::remove_file(&final_path).await;
                }
                Ok(UploadOutcome::AlreadyStored(existing))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve the default namespace, creating it through the gateway on
    /// first use.
    async fn default_file_system(&self) -> Result<FileSystemRecord, UploadError> {
        if let Some(existing) = self.catalog.default_file_system().await? {
            return Ok(existing);
        }

        let _guard = self.namespace_lock.lock().await;
        if let Some(existing) = self.catalog.default_file_system().await? {
            return Ok(existing);
        }

        let created = bounded(
            "create_file_system",
            self.settings.gateway_timeout,
            self.gateway.create_file_system(),
        )
        .await?;
        let record = FileSystemRecord::new_default(created.id, created.token);

        match self.catalog.insert_file_system(&record).await {
            Ok(()) => {
                tracing::info!(file_system_id = %record.id, "default file system created");
                Ok(record)
            }
            Err(CatalogError::Conflict(_)) => {
                // Another process created the default first; use theirs.
                tracing::warn!(
                    file_system_id = %record.id,
                    "default file system already created elsewhere, discarding new namespace"
                );
                self.catalog.default_file_system().await?.ok_or_else(|| {
                    UploadError::Internal("default file system conflict without a default".into())
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Poll `info` until the gateway confirms commitment.
    ///
    /// Only [`CommitStatus::Committed`] confirms. `commit` is never re-issued.
    async fn confirm_commit(
        &self,
        content_id: &ContentId,
        token: &FileSystemToken,
    ) -> Result<(), UploadError> {
        let attempts = self.settings.commit_poll_attempts.max(1);
        let mut last = CommitStatus::Unknown;
        for attempt in 1..=attempts {
            let info = bounded(
                "info",
                self.settings.gateway_timeout,
                self.gateway.info(content_id, token),
            )
            .await?;
            match info.status {
                CommitStatus::Committed => return Ok(()),
                CommitStatus::Failed => {
                    return Err(UploadError::Gateway(format!(
                        "commitment of {content_id} failed: {}",
                        info.message.as_deref().unwrap_or("no reason given")
                    )));
                }
                status => last = status,
            }
            tracing::debug!(content_id = %content_id, attempt, status = %last, "commitment pending");
            if attempt < attempts {
                tokio::time::sleep(self.settings.commit_poll_interval).await;
            }
        }
        Err(UploadError::Gateway(format!(
            "commitment of {content_id} not confirmed after {attempts} checks (last status: {last})"
        )))
    }
}
