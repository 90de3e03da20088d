//! In-memory storage backend using DashMap.
//!
//! Namespaces are keyed by credential; content and commitment status are
//! keyed by `(namespace id, cid)` so the same bytes added to two
//! namespaces are tracked separately.

use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use fgate_core::CommitStatus;

/// `(namespace id, cid)`.
pub type ContentKey = (String, String);

/// Inner storage holding all DashMaps.
struct Inner {
    namespaces: DashMap<String, String>,
    content: DashMap<ContentKey, Bytes>,
    status: DashMap<ContentKey, CommitStatus>,
    commit_outcome: CommitStatus,
}

/// Shared stub state.
///
/// Cheaply cloneable via `Arc`; all clones share the same data.
#[derive(Clone)]
pub struct StubState {
    inner: Arc<Inner>,
}

impl StubState {
    /// Stub whose `push` marks content committed.
    pub fn new() -> Self {
        Self::with_commit_outcome(CommitStatus::Committed)
    }

    /// Stub whose `push` leaves content in `outcome` (e.g. `Pending` or `Failed`).
    pub fn with_commit_outcome(commit_outcome: CommitStatus) -> Self {
        Self {
            inner: Arc::new(Inner {
                namespaces: DashMap::new(),
                content: DashMap::new(),
                status: DashMap::new(),
                commit_outcome,
            }),
        }
    }

    pub fn namespaces(&self) -> &DashMap<String, String> {
        &self.inner.namespaces
    }

    pub fn content(&self) -> &DashMap<ContentKey, Bytes> {
        &self.inner.content
    }

    pub fn status(&self) -> &DashMap<ContentKey, CommitStatus> {
        &self.inner.status
    }

    pub fn commit_outcome(&self) -> CommitStatus {
        self.inner.commit_outcome
    }

    /// Resolve a credential to its namespace id.
    pub fn namespace_for(&self, token: &str) -> Option<String> {
        self.inner.namespaces.get(token).map(|id| id.clone())
    }
}

impl Default for StubState {
    fn default() -> Self {
        Self::new()
    }
}
