//! # Catalog Persistence
//!
//! The catalog owns the lifetimes of [`FileSystemRecord`] and [`FileRecord`].
//! Two implementations share the [`Catalog`] trait:
//!
//! - [`MemoryCatalog`]: in-process stores, used when `DATABASE_URL` is unset
//!   and throughout the test suites.
//! - [`PgCatalog`]: Postgres via SQLx with embedded migrations.
//!
//! ## Invariants enforced here
//!
//! - At most one file-system record is the default.
//! - `content_id` is unique across file records.
//! - Every file record references an existing file-system record.
//!
//! Violations surface as [`CatalogError::Conflict`] or
//! [`CatalogError::MissingFileSystem`]; callers decide how to recover.

pub mod memory;
pub mod postgres;

pub use memory::MemoryCatalog;
pub use postgres::{init_pool, PgCatalog};

use async_trait::async_trait;
use fgate_core::{ContentId, FileRecord, FileSystemId, FileSystemRecord};

/// Errors from catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A file record referenced an unknown namespace.
    #[error("file system {0} does not exist")]
    MissingFileSystem(FileSystemId),

    /// A stored row failed validation on the way out.
    #[error("corrupt catalog row: {0}")]
    Corrupt(String),

    /// Database driver error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence interface for namespaces and uploaded files.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// The default namespace, if one has been created.
    async fn default_file_system(&self) -> Result<Option<FileSystemRecord>, CatalogError>;

    /// Persist a namespace record.
    async fn insert_file_system(&self, record: &FileSystemRecord) -> Result<(), CatalogError>;

    /// Look up a namespace by identifier.
    async fn file_system(
        &self,
        id: &FileSystemId,
    ) -> Result<Option<FileSystemRecord>, CatalogError>;

    /// Persist a file record. Records are write-once.
    async fn insert_file(&self, record: &FileRecord) -> Result<(), CatalogError>;

    /// Look up a file record by content identifier.
    async fn file_by_content_id(
        &self,
        content_id: &ContentId,
    ) -> Result<Option<FileRecord>, CatalogError>;

    /// All file records, newest first.
    async fn list_files(&self) -> Result<Vec<FileRecord>, CatalogError>;

    /// Number of file records.
    async fn count_files(&self) -> Result<u64, CatalogError>;

    /// Check the backing store is reachable.
    async fn ping(&self) -> Result<(), CatalogError>;
}
