//! Record CSV Import - CSV import into record collections
//!
//! Provides:
//! - CSV parsing into a header row and data rows
//! - Column mapping (title, body, properties) with smart defaults from header names
//! - Reconciliation against existing records: deduplication key, create vs update,
//!   last row wins for duplicate keys within a file
//! - Record store abstraction with in-memory and JSON file backends
//! - CSV export of tables and collections

pub mod export;
pub mod import;
pub mod models;
pub mod storage;
pub mod validation;

#[cfg(feature = "cli")]
pub mod cli;

// Re-export commonly used types
#[cfg(feature = "native-fs")]
pub use storage::filesystem::FileSystemRecordStore;
pub use storage::{MemoryRecordStore, RecordHandle, RecordStore, StorageError};

pub use export::{CSVExporter, ExportError, ExportResult};
pub use import::{
    CSVImporter, ColumnMapping, DedupKeySelector, ImportConfig, ImportError, ImportResult,
    MappingTarget, ParsedTable, Reconciler, infer_mapping, parse_csv, reconcile,
};
pub use validation::{MappingValidationError, validate_mapping};

// Re-export models
pub use models::{Collection, ContentBlock, FieldDescriptor, FieldType, RecordId, StoredRecord};
