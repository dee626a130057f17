//! CLI error type

use std::path::PathBuf;

use crate::export::ExportError;
use crate::import::{ConfigError, ImportError};
use crate::storage::StorageError;

/// Errors surfaced by `csv-import` commands
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Failed to read {0}: {1}")]
    FileReadError(PathBuf, String),
    #[error("Failed to write {0}: {1}")]
    FileWriteError(PathBuf, String),
    #[error("Import error: {0}")]
    ImportError(#[from] ImportError),
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
    #[error("Export error: {0}")]
    ExportError(#[from] ExportError),
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),
}
