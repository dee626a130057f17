//! Import functionality
//!
//! Turns CSV text into records of a collection:
//! - `csv`: parse raw text into a header row and data rows
//! - `mapping`: assign each column a target (title, body, property or discard)
//! - `reconcile`: match rows against existing records and create or update them
//! - `config`: user choices (dedup key, mapping overrides) for one run

pub mod config;
pub mod csv;
pub mod mapping;
pub mod reconcile;

use serde::Serialize;
use std::fmt;

use crate::storage::StorageError;
use crate::validation::mapping::MappingValidationError;

/// One data row: column-aligned text fields, possibly shorter or longer than the header row
pub type Row = Vec<String>;

/// Header row and data rows extracted from a CSV document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedTable {
    /// Column names, trimmed, in column order
    pub headers: Vec<String>,
    /// Data rows in document order, untrimmed
    pub rows: Vec<Row>,
}

impl ParsedTable {
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Field `idx` of `row`, or the empty string when the row is too short
pub fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

/// Counts produced by one import run
///
/// Rows collapsed into a later row with the same deduplication key are not counted,
/// so `created + updated + skipped` can be smaller than the number of data rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportResult {
    /// Records created
    pub created: usize,
    /// Existing records updated
    pub updated: usize,
    /// Rows rejected: blank title or failed record creation
    pub skipped: usize,
}

impl fmt::Display for ImportResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Created: {}, Updated: {}, Skipped: {}",
            self.created, self.updated, self.skipped
        )
    }
}

/// Error during import
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The column mapping is unusable; nothing was written
    #[error("Validation error: {0}")]
    Validation(#[from] MappingValidationError),
    /// The record store failed; rows applied before the failure stay applied
    #[error(transparent)]
    Store(#[from] StorageError),
}

// Re-export for convenience
pub use config::{ConfigError, ImportConfig, ImportConfigBuilder};
pub use self::csv::{CSVImporter, parse_csv};
pub use mapping::{
    ColumnMapping, ColumnRoles, DedupKeySelector, MappingTarget, PropertyColumn,
    dedup_key_options, infer_mapping, property_options,
};
pub use reconcile::{ImportPlan, PlannedAction, PlannedRow, Reconciler, RowKey, reconcile};
