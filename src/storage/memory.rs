//! In-memory record store
//!
//! Keeps one [`Collection`] behind a shared lock. Record handles point back into the
//! shared collection, so writes through a handle are visible to every other handle and
//! to [`MemoryRecordStore::snapshot`].

use super::{RecordHandle, RecordStore, StorageError};
use crate::models::{Collection, ContentBlock, FieldDescriptor, RecordId, StoredRecord};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Record store backed by an in-process collection
#[derive(Debug, Clone)]
pub struct MemoryRecordStore {
    inner: Arc<Mutex<Collection>>,
    seed_empty_block: bool,
}

impl MemoryRecordStore {
    /// Create a store over the given collection
    ///
    /// New records get one empty content block so that a mapped body column has
    /// somewhere to land. Use [`with_seed_empty_block`](Self::with_seed_empty_block)
    /// to create bare records instead.
    pub fn new(collection: Collection) -> Self {
        Self {
            inner: Arc::new(Mutex::new(collection)),
            seed_empty_block: true,
        }
    }

    pub fn with_seed_empty_block(mut self, seed: bool) -> Self {
        self.seed_empty_block = seed;
        self
    }

    /// Clone of the current collection state
    pub fn snapshot(&self) -> Result<Collection, StorageError> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collection>, StorageError> {
        self.inner
            .lock()
            .map_err(|_| StorageError::BackendError("Collection lock poisoned".to_string()))
    }

    fn handle(&self, id: RecordId) -> MemoryRecord {
        MemoryRecord {
            id,
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait(?Send)]
impl RecordStore for MemoryRecordStore {
    type Record = MemoryRecord;

    async fn fields(&self) -> Result<Vec<FieldDescriptor>, StorageError> {
        Ok(self.lock()?.fields.clone())
    }

    async fn list_records(&self) -> Result<Vec<MemoryRecord>, StorageError> {
        let ids: Vec<RecordId> = self.lock()?.records.iter().map(|r| r.id).collect();
        Ok(ids.into_iter().map(|id| self.handle(id)).collect())
    }

    async fn create_record(&self, title: &str) -> Result<Option<RecordId>, StorageError> {
        if title.trim().is_empty() {
            return Ok(None);
        }

        let mut record = StoredRecord::new(title);
        if self.seed_empty_block {
            record = record.with_block("");
        }
        let id = record.id;

        let mut collection = self.lock()?;
        collection.records.push(record);
        debug!("Created record {} in collection {}", id, collection.name);
        Ok(Some(id))
    }

    async fn fetch_record(&self, id: &RecordId) -> Result<Option<MemoryRecord>, StorageError> {
        let exists = self.lock()?.record(id).is_some();
        Ok(exists.then(|| self.handle(*id)))
    }
}

/// Handle to a record of a [`MemoryRecordStore`]
#[derive(Debug, Clone)]
pub struct MemoryRecord {
    id: RecordId,
    inner: Arc<Mutex<Collection>>,
}

impl MemoryRecord {
    // Getters have no error channel, so a poisoned lock is read through.
    fn read<T>(&self, f: impl FnOnce(&Collection) -> T) -> T {
        let guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&guard)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collection>, StorageError> {
        self.inner
            .lock()
            .map_err(|_| StorageError::BackendError("Collection lock poisoned".to_string()))
    }
}

#[async_trait(?Send)]
impl RecordHandle for MemoryRecord {
    fn id(&self) -> RecordId {
        self.id
    }

    fn title(&self) -> String {
        self.read(|c| c.record(&self.id).map(|r| r.title.clone()).unwrap_or_default())
    }

    fn property_text(&self, label_or_id: &str) -> Option<String> {
        self.read(|c| {
            let field = c.resolve_field(label_or_id)?;
            c.record(&self.id)?.properties.get(&field.id).cloned()
        })
    }

    async fn set_property_text(
        &self,
        label_or_id: &str,
        value: &str,
    ) -> Result<bool, StorageError> {
        let mut collection = self.lock()?;
        let Some(field_id) = collection.resolve_field(label_or_id).map(|f| f.id.clone()) else {
            return Ok(false);
        };
        let record = collection
            .record_mut(&self.id)
            .ok_or(StorageError::RecordNotFound(self.id))?;
        record.properties.insert(field_id, value.to_string());
        Ok(true)
    }

    async fn content_blocks(&self) -> Result<Vec<ContentBlock>, StorageError> {
        let collection = self.lock()?;
        let record = collection
            .record(&self.id)
            .ok_or(StorageError::RecordNotFound(self.id))?;
        Ok(record.blocks.clone())
    }

    async fn replace_block_text(
        &self,
        block: &ContentBlock,
        text: &str,
    ) -> Result<(), StorageError> {
        let mut collection = self.lock()?;
        let record = collection
            .record_mut(&self.id)
            .ok_or(StorageError::RecordNotFound(self.id))?;
        let target = record
            .blocks
            .iter_mut()
            .find(|b| b.id == block.id)
            .ok_or(StorageError::BlockNotFound(block.id))?;
        target.text = text.to_string();
        Ok(())
    }
}
