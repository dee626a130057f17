//! File system record store
//!
//! Persists one collection as a JSON document on disk. The document is loaded into a
//! [`MemoryRecordStore`] on open; changes stay in memory until [`FileSystemRecordStore::save`]
//! writes them back.
//!
//! ## Durability
//!
//! `save` writes to a sibling temporary file and renames it over the target, so a crash
//! mid-write leaves the previous document intact.

use super::{RecordStore, StorageError, memory::MemoryRecord, memory::MemoryRecordStore};
use crate::models::{Collection, FieldDescriptor, RecordId};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Record store persisted as a JSON collection file
#[derive(Debug, Clone)]
pub struct FileSystemRecordStore {
    path: PathBuf,
    store: MemoryRecordStore,
}

impl FileSystemRecordStore {
    /// Open an existing collection file
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use record_csv_import::storage::filesystem::FileSystemRecordStore;
    ///
    /// # async fn run() -> Result<(), record_csv_import::StorageError> {
    /// let store = FileSystemRecordStore::open("/workspace/fruit.json").await?;
    /// store.save().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let content = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::FileNotFound(path.display().to_string())
            } else {
                StorageError::IoError(format!("Failed to read file {}: {}", path.display(), e))
            }
        })?;

        let collection: Collection = serde_json::from_slice(&content).map_err(|e| {
            StorageError::SerializationError(format!(
                "Failed to parse collection {}: {}",
                path.display(),
                e
            ))
        })?;

        info!(
            "Loaded collection '{}' with {} records from {}",
            collection.name,
            collection.records.len(),
            path.display()
        );

        Ok(Self {
            path,
            store: MemoryRecordStore::new(collection),
        })
    }

    /// Wrap a new collection that will be written to `path` on the first save
    pub fn create(path: impl AsRef<Path>, collection: Collection) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            store: MemoryRecordStore::new(collection),
        }
    }

    pub fn with_seed_empty_block(mut self, seed: bool) -> Self {
        self.store = self.store.with_seed_empty_block(seed);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clone of the current collection state
    pub fn snapshot(&self) -> Result<Collection, StorageError> {
        self.store.snapshot()
    }

    /// Write the collection back to its file
    pub async fn save(&self) -> Result<(), StorageError> {
        let collection = self.store.snapshot()?;
        let content = serde_json::to_vec_pretty(&collection).map_err(|e| {
            StorageError::SerializationError(format!("Failed to serialize collection: {}", e))
        })?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::IoError(format!(
                    "Failed to create directory for {}: {}",
                    self.path.display(),
                    e
                ))
            })?;
        }

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, &content).await.map_err(|e| {
            StorageError::IoError(format!("Failed to write file {}: {}", tmp_path.display(), e))
        })?;
        fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            StorageError::IoError(format!(
                "Failed to replace file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        info!(
            "Saved collection '{}' ({} records) to {}",
            collection.name,
            collection.records.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[async_trait(?Send)]
impl RecordStore for FileSystemRecordStore {
    type Record = MemoryRecord;

    async fn fields(&self) -> Result<Vec<FieldDescriptor>, StorageError> {
        self.store.fields().await
    }

    async fn list_records(&self) -> Result<Vec<MemoryRecord>, StorageError> {
        self.store.list_records().await
    }

    async fn create_record(&self, title: &str) -> Result<Option<RecordId>, StorageError> {
        self.store.create_record(title).await
    }

    async fn fetch_record(&self, id: &RecordId) -> Result<Option<MemoryRecord>, StorageError> {
        self.store.fetch_record(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StoredRecord;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_file() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let temp = TempDir::new().unwrap();
            let result = FileSystemRecordStore::open(temp.path().join("missing.json")).await;
            assert!(matches!(result, Err(StorageError::FileNotFound(_))));
        });
    }

    #[test]
    fn test_save_creates_parent_and_leaves_no_temp_file() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let temp = TempDir::new().unwrap();
            let path = temp.path().join("nested/dir/fruit.json");
            let store = FileSystemRecordStore::create(
                &path,
                Collection::new("Fruit").with_record(StoredRecord::new("Apple")),
            );
            store.save().await.unwrap();

            assert!(path.exists());
            assert!(!temp.path().join("nested/dir/fruit.json.tmp").exists());
        });
    }
}
