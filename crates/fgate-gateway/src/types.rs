//! # Gateway Wire Types
//!
//! JSON shapes exchanged with the gateway. Identifier fields decode
//! straight into the validated newtypes from [`fgate_core`], so a malformed
//! content id is rejected at the client boundary.

use fgate_core::{CommitStatus, ContentId, FileSystemId, FileSystemToken};
use serde::{Deserialize, Serialize};

/// Header carrying the namespace credential on scoped calls.
pub const TOKEN_HEADER: &str = "x-ffs-token";

/// Response of `POST /ffs/create`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedFileSystem {
    pub id: FileSystemId,
    pub token: FileSystemToken,
}

/// Response of `POST /ffs/hot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddedContent {
    pub cid: ContentId,
}

/// Response of `GET /ffs/info/{cid}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentInfo {
    pub cid: ContentId,
    pub status: CommitStatus,
    /// Free-form detail, typically set when `status` is `failed`.
    #[serde(default)]
    pub message: Option<String>,
}
