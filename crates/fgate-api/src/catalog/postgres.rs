//! Postgres catalog.
//!
//! Operates on the `file_systems` and `files` tables created by the
//! embedded migrations under `migrations/`. The single-default rule is a
//! partial unique index, `content_id` is the primary key of `files`, and
//! `files.file_system_id` is a foreign key, so every catalog invariant is
//! also held by the database.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fgate_core::{ContentId, FileName, FileRecord, FileSystemId, FileSystemRecord, FileSystemToken};
use sqlx::postgres::{PgPool, PgPoolOptions};

use super::{Catalog, CatalogError};

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set, running in-memory only mode. \
                 The catalog will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Catalog backed by a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map constraint violations onto catalog errors.
fn classify(err: sqlx::Error, file_system_id: Option<&FileSystemId>) -> CatalogError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return CatalogError::Conflict(db.message().to_string());
        }
        if db.is_foreign_key_violation() {
            if let Some(id) = file_system_id {
                return CatalogError::MissingFileSystem(id.clone());
            }
        }
    }
    CatalogError::Database(err)
}

#[async_trait]
impl Catalog for PgCatalog {
    async fn default_file_system(&self) -> Result<Option<FileSystemRecord>, CatalogError> {
        let row = sqlx::query_as::<_, FileSystemRow>(
            "SELECT id, token, created_at, is_default FROM file_systems WHERE is_default",
        )
        .fetch_optional(&self.pool)
        .await?;
        row.map(FileSystemRow::into_record).transpose()
    }

    async fn insert_file_system(&self, record: &FileSystemRecord) -> Result<(), CatalogError> {
        sqlx::query(
            "INSERT INTO file_systems (id, token, created_at, is_default) VALUES ($1, $2, $3, $4)",
        )
        .bind(record.id.as_str())
        .bind(record.token.expose())
        .bind(record.created_at)
        .bind(record.is_default)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, None))?;
        Ok(())
    }

    async fn file_system(
        &self,
        id: &FileSystemId,
    ) -> Result<Option<FileSystemRecord>, CatalogError> {
        let row = sqlx::query_as::<_, FileSystemRow>(
            "SELECT id, token, created_at, is_default FROM file_systems WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(FileSystemRow::into_record).transpose()
    }

    async fn insert_file(&self, record: &FileRecord) -> Result<(), CatalogError> {
        let size = i64::try_from(record.size_bytes)
            .map_err(|_| CatalogError::Corrupt(format!("size {} out of range", record.size_bytes)))?;
        sqlx::query(
            "INSERT INTO files (content_id, storage_path, file_name, uploaded_at, size_bytes, file_system_id)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.content_id.as_str())
        .bind(record.storage_path.to_string_lossy().as_ref())
        .bind(record.file_name.as_str())
        .bind(record.uploaded_at)
        .bind(size)
        .bind(record.file_system_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, Some(&record.file_system_id)))?;
        Ok(())
    }

    async fn file_by_content_id(
        &self,
        content_id: &ContentId,
    ) -> Result<Option<FileRecord>, CatalogError> {
        let row = sqlx::query_as::<_, FileRow>(
            "SELECT content_id, storage_path, file_name, uploaded_at, size_bytes, file_system_id
             FROM files WHERE content_id = $1",
        )
        .bind(content_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(FileRow::into_record).transpose()
    }

    async fn list_files(&self) -> Result<Vec<FileRecord>, CatalogError> {
        let rows = sqlx::query_as::<_, FileRow>(
            "SELECT content_id, storage_path, file_name, uploaded_at, size_bytes, file_system_id
             FROM files ORDER BY uploaded_at DESC, content_id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(FileRow::into_record).collect()
    }

    async fn count_files(&self) -> Result<u64, CatalogError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM files")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct FileSystemRow {
    id: String,
    token: String,
    created_at: DateTime<Utc>,
    is_default: bool,
}

impl FileSystemRow {
    fn into_record(self) -> Result<FileSystemRecord, CatalogError> {
        Ok(FileSystemRecord {
            id: FileSystemId::new(self.id).map_err(|e| CatalogError::Corrupt(e.to_string()))?,
            token: FileSystemToken::new(self.token)
                .map_err(|e| CatalogError::Corrupt(e.to_string()))?,
            created_at: self.created_at,
            is_default: self.is_default,
        })
    }
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct FileRow {
    content_id: String,
    storage_path: String,
    file_name: String,
    uploaded_at: DateTime<Utc>,
    size_bytes: i64,
    file_system_id: String,
}

impl FileRow {
    fn into_record(self) -> Result<FileRecord, CatalogError> {
        let corrupt = |e: fgate_core::ValidationError| CatalogError::Corrupt(e.to_string());
        Ok(FileRecord {
            content_id: ContentId::new(self.content_id).map_err(corrupt)?,
            storage_path: PathBuf::from(self.storage_path),
            file_name: FileName::from_stored(&self.file_name).map_err(corrupt)?,
            uploaded_at: self.uploaded_at,
            size_bytes: u64::try_from(self.size_bytes)
                .map_err(|_| CatalogError::Corrupt(format!("negative size {}", self.size_bytes)))?,
            file_system_id: FileSystemId::new(self.file_system_id).map_err(corrupt)?,
        })
    }
}
