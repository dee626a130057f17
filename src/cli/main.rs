//! csv-import: import CSV files into record collections

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use record_csv_import::cli::commands::export::{ExportArgs, handle_export};
use record_csv_import::cli::commands::import::{ImportArgs, handle_import};
use record_csv_import::cli::commands::inspect::{InspectArgs, handle_inspect};
use record_csv_import::import::ImportConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "csv-import", version, about = "Import CSV files into record collections")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show headers, row count and the inferred column mapping of a CSV file
    Inspect {
        /// CSV file, or - for stdin
        input: String,
        /// Collection file whose fields drive mapping inference
        #[arg(long)]
        store: Option<PathBuf>,
        /// TOML configuration with mapping overrides
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Import a CSV file into a collection
    Import {
        /// CSV file, or - for stdin
        input: String,
        /// Collection file to import into
        #[arg(long)]
        store: PathBuf,
        /// Deduplicate by: title, none, or a field id/label (property:<field> when it clashes)
        #[arg(long)]
        dedup: Option<String>,
        /// Column override, e.g. --map "Product Name=title" or --map "Notes=property:Content" (repeatable)
        #[arg(long = "map", value_name = "COLUMN=TARGET")]
        mappings: Vec<String>,
        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Show what would be created or updated without writing
        #[arg(long)]
        dry_run: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export a collection as CSV
    Export {
        /// Collection file to export
        #[arg(long)]
        store: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Option<ImportConfig>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = ImportConfig::from_toml_str(&content)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    Ok(Some(config))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async {
        match cli.command {
            Commands::Inspect {
                input,
                store,
                config,
            } => {
                let args = InspectArgs {
                    input,
                    store,
                    config: load_config(config.as_ref())?,
                };
                handle_inspect(&args).await?;
            }
            Commands::Import {
                input,
                store,
                dedup,
                mappings,
                config,
                dry_run,
                json,
            } => {
                let args = ImportArgs {
                    input,
                    store,
                    config: load_config(config.as_ref())?,
                    dedup,
                    mappings,
                    dry_run,
                    json,
                };
                handle_import(&args).await?;
            }
            Commands::Export { store, output } => {
                handle_export(&ExportArgs { store, output }).await?;
            }
        }
        Ok::<(), anyhow::Error>(())
    })
}
