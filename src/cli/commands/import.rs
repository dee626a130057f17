//! Import command implementation

use std::path::PathBuf;
use tracing::{info, warn};

use super::load_input;
use crate::cli::error::CliError;
use crate::cli::output::{format_mapping, format_plan_output, format_result_output};
use crate::import::{DedupKeySelector, ImportConfig, MappingTarget, Reconciler, parse_csv};
use crate::storage::RecordStore;
use crate::storage::filesystem::FileSystemRecordStore;
use crate::validation::check_mapping;

/// Arguments for the `import` command
pub struct ImportArgs {
    /// CSV file, or `-` for stdin
    pub input: String,
    /// Collection file to import into
    pub store: PathBuf,
    /// Configuration loaded from `--config`, if any
    pub config: Option<ImportConfig>,
    /// `--dedup` value, overrides the configuration
    pub dedup: Option<String>,
    /// `--map COLUMN=TARGET` overrides
    pub mappings: Vec<String>,
    /// Plan only, write nothing
    pub dry_run: bool,
    /// Print the result as JSON
    pub json: bool,
}

/// Parse a `COLUMN=TARGET` override
pub fn parse_mapping_override(value: &str) -> Result<(String, MappingTarget), CliError> {
    let (column, target) = value.rsplit_once('=').ok_or_else(|| {
        CliError::InvalidArgument(format!(
            "Invalid mapping '{}': expected COLUMN=TARGET",
            value
        ))
    })?;
    if column.trim().is_empty() {
        return Err(CliError::InvalidArgument(format!(
            "Invalid mapping '{}': column name is empty",
            value
        )));
    }
    Ok((column.trim().to_string(), MappingTarget::from(target)))
}

/// Merge command-line overrides into the loaded configuration
pub fn effective_config(args: &ImportArgs) -> Result<ImportConfig, CliError> {
    let mut config = args.config.clone().unwrap_or_default();
    if let Some(dedup) = &args.dedup {
        config.dedup = DedupKeySelector::from(dedup.as_str());
    }
    for value in &args.mappings {
        let (column, target) = parse_mapping_override(value)?;
        config.mapping.insert(column, target);
    }
    Ok(config)
}

/// Handle the `import` command
pub async fn handle_import(args: &ImportArgs) -> Result<(), CliError> {
    let content = load_input(&args.input)?;
    let table = parse_csv(&content);
    if table.is_empty() {
        return Err(CliError::InvalidArgument(
            "CSV file is empty or has no data rows".to_string(),
        ));
    }
    info!(
        "Parsed {} headers and {} rows from {}",
        table.headers.len(),
        table.rows.len(),
        args.input
    );

    let config = effective_config(args)?;
    let store = FileSystemRecordStore::open(&args.store)
        .await?
        .with_seed_empty_block(config.seed_empty_block);

    let fields = store.fields().await?;
    let mapping = config.resolve_mapping(&table.headers, &fields)?;
    let dedup_key = config.resolve_dedup(&fields);

    for message in check_mapping(&mapping, &table.headers, &fields).messages() {
        warn!("{}", message);
    }
    eprint!("{}", format_mapping(&table.headers, &mapping));

    let reconciler = Reconciler::new(&store);
    let plan = reconciler.plan(&table, &mapping, &dedup_key).await?;

    if args.dry_run {
        print!("{}", format_plan_output(&plan));
        return Ok(());
    }

    // Rows applied before a store failure are kept, so save either way.
    let outcome = reconciler.apply(plan).await;
    store.save().await?;
    let result = outcome?;

    println!("{}", format_result_output(&result, args.json));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mapping_override() {
        let (column, target) = parse_mapping_override("Product Name=title").unwrap();
        assert_eq!(column, "Product Name");
        assert_eq!(target, MappingTarget::Title);

        let (column, target) = parse_mapping_override("a=b=Quantity").unwrap();
        assert_eq!(column, "a=b");
        assert_eq!(target, MappingTarget::Property("Quantity".to_string()));

        let (column, target) = parse_mapping_override("Notes=property:Content").unwrap();
        assert_eq!(column, "Notes");
        assert_eq!(target, MappingTarget::Property("Content".to_string()));

        assert!(parse_mapping_override("no-equals").is_err());
        assert!(parse_mapping_override("=title").is_err());
    }

    #[test]
    fn test_effective_config_overrides() {
        let args = ImportArgs {
            input: "-".to_string(),
            store: PathBuf::from("store.json"),
            config: Some(
                ImportConfig::builder()
                    .map_column("Notes", MappingTarget::Discard)
                    .build(),
            ),
            dedup: Some("none".to_string()),
            mappings: vec!["Notes=body".to_string()],
            dry_run: false,
            json: false,
        };

        let config = effective_config(&args).unwrap();
        assert_eq!(config.dedup, DedupKeySelector::None);
        assert_eq!(config.mapping.get("Notes"), Some(&MappingTarget::Body));
    }
}
