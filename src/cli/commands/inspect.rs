//! Inspect command implementation

use std::path::PathBuf;

use super::load_input;
use crate::cli::error::CliError;
use crate::cli::output::format_inspect_output;
use crate::import::{ImportConfig, dedup_key_options, parse_csv};
use crate::storage::RecordStore;
use crate::storage::filesystem::FileSystemRecordStore;

/// Arguments for the `inspect` command
pub struct InspectArgs {
    /// CSV file, or `-` for stdin
    pub input: String,
    /// Collection file whose fields drive mapping inference
    pub store: Option<PathBuf>,
    /// Optional configuration with mapping overrides
    pub config: Option<ImportConfig>,
}

/// Handle the `inspect` command
pub async fn handle_inspect(args: &InspectArgs) -> Result<(), CliError> {
    let content = load_input(&args.input)?;
    let table = parse_csv(&content);

    let fields = match &args.store {
        Some(path) => FileSystemRecordStore::open(path).await?.fields().await?,
        None => Vec::new(),
    };

    let config = args.config.clone().unwrap_or_default();
    let mapping = config.resolve_mapping(&table.headers, &fields)?;
    let dedup_options = if args.store.is_some() {
        dedup_key_options(&fields)
    } else {
        Vec::new()
    };

    print!(
        "{}",
        format_inspect_output(&table, &mapping, &dedup_options, &fields)
    );
    Ok(())
}
