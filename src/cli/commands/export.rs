//! Export command implementation

use std::path::PathBuf;

use crate::cli::error::CliError;
use crate::export::CSVExporter;
use crate::storage::filesystem::FileSystemRecordStore;

/// Arguments for the `export` command
pub struct ExportArgs {
    /// Collection file to export
    pub store: PathBuf,
    /// Output CSV file; stdout when absent
    pub output: Option<PathBuf>,
}

/// Handle the `export` command
pub async fn handle_export(args: &ExportArgs) -> Result<(), CliError> {
    let store = FileSystemRecordStore::open(&args.store).await?;
    let collection = store.snapshot()?;
    let result = CSVExporter::new().export_collection(&collection)?;

    match &args.output {
        Some(path) => tokio::fs::write(path, result.content.as_bytes())
            .await
            .map_err(|e| CliError::FileWriteError(path.clone(), e.to_string()))?,
        None => print!("{}", result.content),
    }
    Ok(())
}
