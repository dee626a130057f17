//! CLI command implementations

pub mod export;
pub mod import;
pub mod inspect;

use crate::cli::error::CliError;
use std::io::Read;
use std::path::PathBuf;

/// Load input content from file or stdin
pub(crate) fn load_input(input: &str) -> Result<String, CliError> {
    if input == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .map_err(|e| CliError::InvalidArgument(format!("Failed to read stdin: {}", e)))?;
        Ok(content)
    } else {
        let path = PathBuf::from(input);
        std::fs::read_to_string(&path).map_err(|e| CliError::FileReadError(path, e.to_string()))
    }
}
