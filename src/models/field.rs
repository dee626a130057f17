//! Field descriptor model
//!
//! Field descriptors are owned by the record store. The import core only reads them to
//! resolve property labels, infer column mappings and offer deduplication keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the built-in title field present on every collection
pub const TITLE_FIELD_ID: &str = "title";

/// Value type of a collection field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    #[serde(alias = "Text", alias = "TEXT")]
    Text,
    #[serde(alias = "Number", alias = "NUMBER")]
    Number,
    /// Any other store-specific type (choice, date, user, ...)
    #[serde(untagged)]
    Other(String),
}

impl FieldType {
    /// Whether values of this type can serve as a deduplication key
    pub fn is_keyable(&self) -> bool {
        matches!(self, FieldType::Text | FieldType::Number)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Text => write!(f, "text"),
            FieldType::Number => write!(f, "number"),
            FieldType::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Describes one field of a collection
///
/// # Example
///
/// ```rust
/// use record_csv_import::models::{FieldDescriptor, FieldType};
///
/// let field = FieldDescriptor::new("qty", "Quantity", FieldType::Number);
/// assert!(field.active);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Stable field identifier
    pub id: String,
    /// Human readable label
    pub label: String,
    /// Inactive fields are hidden from mapping and deduplication choices
    #[serde(default = "default_true")]
    pub active: bool,
    /// Value type
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
}

fn default_true() -> bool {
    true
}

impl FieldDescriptor {
    /// Create an active field descriptor
    pub fn new(id: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            active: true,
            field_type,
        }
    }

    /// Mark the field as inactive
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Whether this is the collection's built-in title field
    pub fn is_title(&self) -> bool {
        self.id == TITLE_FIELD_ID
    }
}
