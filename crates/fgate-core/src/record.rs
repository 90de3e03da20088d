//! # Persisted Records
//!
//! The two record types owned by the catalog: one gateway namespace per
//! [`FileSystemRecord`] and one committed upload per [`FileRecord`].

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{ContentId, FileSystemId, FileSystemToken};
use crate::sanitize::FileName;

/// A gateway namespace and the credential scoping calls to it.
///
/// At most one record in a catalog has `is_default = true`. Records are
/// created lazily by the first upload and never deleted.
#[derive(Debug, Clone)]
pub struct FileSystemRecord {
    pub id: FileSystemId,
    pub token: FileSystemToken,
    pub created_at: DateTime<Utc>,
    pub is_default: bool,
}

impl FileSystemRecord {
    /// Build the default namespace record for a freshly created gateway namespace.
    pub fn new_default(id: FileSystemId, token: FileSystemToken) -> Self {
        Self {
            id,
            token,
            created_at: truncate_to_seconds(Utc::now()),
            is_default: true,
        }
    }
}

/// Metadata for one upload whose commitment the gateway confirmed.
///
/// Written once, never mutated. `content_id` is unique across the catalog
/// and `file_system_id` always references an existing [`FileSystemRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Directory holding the local copy.
    pub storage_path: PathBuf,
    pub file_name: FileName,
    pub uploaded_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub content_id: ContentId,
    pub file_system_id: FileSystemId,
}

impl FileRecord {
    /// Full path of the local copy.
    pub fn local_path(&self) -> PathBuf {
        self.storage_path.join(self.file_name.as_str())
    }
}

/// Commitment state reported by the gateway's `info` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitStatus {
    /// Accepted into the hot set; long-term commitment still in progress.
    Pending,
    /// Commitment confirmed.
    Committed,
    /// The gateway gave up on the commitment.
    Failed,
    /// Forward-compatible catch-all. Never treated as confirmation.
    #[serde(other)]
    Unknown,
}

impl CommitStatus {
    /// Whether this status confirms the upload.
    pub fn is_committed(self) -> bool {
        matches!(self, Self::Committed)
    }

    /// Whether polling further can change the outcome.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::Failed)
    }

    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Committed => "committed",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for CommitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timestamps are stored at second precision.
pub fn truncate_to_seconds(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(ts.timestamp(), 0).unwrap_or(ts)
}
