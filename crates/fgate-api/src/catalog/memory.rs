//! In-memory catalog.
//!
//! Backed by [`Store`], a cloneable map behind a `parking_lot::RwLock`.
//! Uniqueness checks and the write they guard run under one write lock, so
//! two racing inserts cannot both pass the check.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use fgate_core::{ContentId, FileRecord, FileSystemId, FileSystemRecord};
use parking_lot::RwLock;

use super::{Catalog, CatalogError};

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not `tokio::sync`)
/// because the lock is never held across `.await` points.
#[derive(Debug)]
pub struct Store<K, V> {
    data: Arc<RwLock<HashMap<K, V>>>,
}

impl<K, V> Clone for Store<K, V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Store<K, V> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Retrieve a record by key.
    pub fn get(&self, key: &K) -> Option<V> {
        self.data.read().get(key).cloned()
    }

    /// First record matching `pred`.
    pub fn find(&self, pred: impl Fn(&V) -> bool) -> Option<V> {
        self.data.read().values().find(|v| pred(v)).cloned()
    }

    /// List all records, in no particular order.
    pub fn list(&self) -> Vec<V> {
        self.data.read().values().cloned().collect()
    }

    /// Insert `value` only if `check` accepts the current contents.
    ///
    /// The check and the insert run under a single write lock.
    pub fn insert_checked<E>(
        &self,
        key: K,
        value: V,
        check: impl FnOnce(&HashMap<K, V>) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut guard = self.data.write();
        check(&guard)?;
        guard.insert(key, value);
        Ok(())
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for Store<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Catalog ------------------------------------------------------------------

/// Catalog held entirely in process memory. Contents are lost on restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    file_systems: Store<FileSystemId, FileSystemRecord>,
    files: Store<ContentId, FileRecord>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn default_file_system(&self) -> Result<Option<FileSystemRecord>, CatalogError> {
        Ok(self.file_systems.find(|fs| fs.is_default))
    }

    async fn insert_file_system(&self, record: &FileSystemRecord) -> Result<(), CatalogError> {
        self.file_systems
            .insert_checked(record.id.clone(), record.clone(), |existing| {
                if existing.contains_key(&record.id) {
                    return Err(CatalogError::Conflict(format!(
                        "file system {} already exists",
                        record.id
                    )));
                }
                if record.is_default && existing.values().any(|fs| fs.is_default) {
                    return Err(CatalogError::Conflict(
                        "a default file system already exists".into(),
                    ));
                }
                Ok(())
            })
    }

    async fn file_system(
        &self,
        id: &FileSystemId,
    ) -> Result<Option<FileSystemRecord>, CatalogError> {
        Ok(self.file_systems.get(id))
    }

    async fn insert_file(&self, record: &FileRecord) -> Result<(), CatalogError> {
        if self.file_systems.get(&record.file_system_id).is_none() {
            return Err(CatalogError::MissingFileSystem(
                record.file_system_id.clone(),
            ));
        }
        self.files
            .insert_checked(record.content_id.clone(), record.clone(), |existing| {
                if existing.contains_key(&record.content_id) {
                    return Err(CatalogError::Conflict(format!(
                        "content {} already recorded",
                        record.content_id
                    )));
                }
                Ok(())
            })
    }

    async fn file_by_content_id(
        &self,
        content_id: &ContentId,
    ) -> Result<Option<FileRecord>, CatalogError> {
        Ok(self.files.get(content_id))
    }

    async fn list_files(&self) -> Result<Vec<FileRecord>, CatalogError> {
        let mut files = self.files.list();
        files.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| a.content_id.cmp(&b.content_id))
        });
        Ok(files)
    }

    async fn count_files(&self) -> Result<u64, CatalogError> {
        Ok(self.files.len() as u64)
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        Ok(())
    }
}
