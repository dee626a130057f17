//! Record store abstraction
//!
//! Defines the traits the import core uses to read and write records, and the bundled
//! implementations:
//! - MemoryRecordStore: in-process collection (tests, embedding)
//! - FileSystemRecordStore: collection persisted as a JSON file (native apps, CLI)
//!
//! Hosts with their own record storage implement [`RecordStore`] and [`RecordHandle`].

use async_trait::async_trait;

use crate::models::{ContentBlock, FieldDescriptor, RecordId};

/// Error type for record store operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("Record not found: {0}")]
    RecordNotFound(RecordId),
    #[error("Content block not found: {0}")]
    BlockNotFound(uuid::Uuid),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

/// Trait for record stores
///
/// Implementations own persistence. Timeouts, retries and isolation between concurrent
/// callers are the store's concern; the reconciler issues its calls sequentially.
#[async_trait(?Send)]
pub trait RecordStore {
    /// Handle type for records of this store
    type Record: RecordHandle + Clone;

    /// Field descriptors of the target collection
    async fn fields(&self) -> Result<Vec<FieldDescriptor>, StorageError>;

    /// Every record currently in the collection, in store order
    async fn list_records(&self) -> Result<Vec<Self::Record>, StorageError>;

    /// Create a record with the given title
    ///
    /// Returns `None` when the store declines to create the record.
    async fn create_record(&self, title: &str) -> Result<Option<RecordId>, StorageError>;

    /// Fetch a record by id, `None` if it is unavailable
    async fn fetch_record(&self, id: &RecordId) -> Result<Option<Self::Record>, StorageError>;
}

/// Trait for a handle to one record of a [`RecordStore`]
#[async_trait(?Send)]
pub trait RecordHandle {
    fn id(&self) -> RecordId;

    /// Current title of the record
    fn title(&self) -> String;

    /// Text value of a property, looked up by label and then by field id
    fn property_text(&self, label_or_id: &str) -> Option<String>;

    /// Set a property's text value, looked up by label and then by field id
    ///
    /// Returns `false` if the record has no such property.
    async fn set_property_text(&self, label_or_id: &str, value: &str)
    -> Result<bool, StorageError>;

    /// Content blocks of the record, in document order
    async fn content_blocks(&self) -> Result<Vec<ContentBlock>, StorageError>;

    /// Replace the text of one content block
    async fn replace_block_text(&self, block: &ContentBlock, text: &str)
    -> Result<(), StorageError>;
}

pub mod memory;

#[cfg(feature = "native-fs")]
pub mod filesystem;

pub use memory::{MemoryRecord, MemoryRecordStore};
