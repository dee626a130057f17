//! Models module
//!
//! Defines the collection, field and record structures shared by the record stores,
//! the reconciler and the CSV exporter.

pub mod field;
pub mod record;

pub use field::{FieldDescriptor, FieldType, TITLE_FIELD_ID};
pub use record::{Collection, ContentBlock, RecordId, StoredRecord};
