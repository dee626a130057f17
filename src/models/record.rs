//! Record and collection models used by the bundled record stores

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::field::FieldDescriptor;

/// Identifier of a record in a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub Uuid);

impl RecordId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One block of a record's content (a paragraph / line item)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub id: Uuid,
    #[serde(default)]
    pub text: String,
}

impl ContentBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
        }
    }
}

/// A record as persisted by the bundled stores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    pub title: String,
    /// Property values keyed by field id
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
}

impl StoredRecord {
    /// Create a record with a title and no properties or content
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            title: title.into(),
            properties: BTreeMap::new(),
            blocks: Vec::new(),
        }
    }

    pub fn with_property(mut self, field_id: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(field_id.into(), value.into());
        self
    }

    pub fn with_block(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(ContentBlock::new(text));
        self
    }
}

/// A named collection of records sharing one set of fields
///
/// # Example
///
/// ```rust
/// use record_csv_import::models::{Collection, FieldDescriptor, FieldType};
///
/// let collection = Collection::new("Fruit")
///     .with_field(FieldDescriptor::new("qty", "Quantity", FieldType::Number));
/// assert_eq!(collection.resolve_field("Quantity").map(|f| f.id.as_str()), Some("qty"));
/// assert_eq!(collection.resolve_field("qty").map(|f| f.id.as_str()), Some("qty"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Collection {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub records: Vec<StoredRecord>,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_record(mut self, record: StoredRecord) -> Self {
        self.records.push(record);
        self
    }

    /// Find a field by label, falling back to its id
    pub fn resolve_field(&self, label_or_id: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|f| f.label == label_or_id)
            .or_else(|| self.fields.iter().find(|f| f.id == label_or_id))
    }

    pub fn record(&self, id: &RecordId) -> Option<&StoredRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn record_mut(&mut self, id: &RecordId) -> Option<&mut StoredRecord> {
        self.records.iter_mut().find(|r| &r.id == id)
    }
}
