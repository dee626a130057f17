//! Export functionality
//!
//! Provides exporters for:
//! - CSV (tables and whole collections, readable by the CSV importer)

pub mod csv;

/// Result of an export operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    /// Exported content
    pub content: String,
    /// Format identifier
    pub format: String,
}

/// Error during export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("IO error: {0}")]
    IoError(String),
}

// Re-export for convenience
pub use self::csv::CSVExporter;
