//! Import configuration
//!
//! Carries the choices a user makes before an import runs: the deduplication key,
//! per-column overrides on top of the inferred mapping, and store options.
//!
//! ```toml
//! dedup = "sku"
//! seed_empty_block = true
//!
//! [mapping]
//! "Product Name" = "title"
//! Notes = "body"
//! Internal = "discard"
//! Qty = "Quantity"
//! Summary = "property:content"
//! ```
//!
//! `property:` forces a property target when a field is named like a keyword.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::mapping::{ColumnMapping, DedupKeySelector, MappingTarget, infer_mapping};
use crate::models::FieldDescriptor;

/// Errors raised while loading or applying an import configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A mapping override names a column that is not in the header row
    #[error("Unknown column in mapping: {0}")]
    UnknownColumn(String),

    /// Configuration file could not be parsed
    #[cfg(feature = "toml")]
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for one import run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Deduplication key: "title", "none", or a field id or label
    pub dedup: DedupKeySelector,
    /// Give newly created records an empty content block so body text can be written
    pub seed_empty_block: bool,
    /// Header name to target overrides, applied on top of the inferred mapping
    pub mapping: BTreeMap<String, MappingTarget>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            dedup: DedupKeySelector::ByTitle,
            seed_empty_block: true,
            mapping: BTreeMap::new(),
        }
    }
}

impl ImportConfig {
    /// Create a new builder for ImportConfig
    pub fn builder() -> ImportConfigBuilder {
        ImportConfigBuilder::default()
    }

    /// Parse a TOML configuration document
    #[cfg(feature = "toml")]
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Inferred mapping for `headers`, with this configuration's overrides applied
    ///
    /// Override keys match headers case-insensitively. Property targets may name a
    /// field by id or by label.
    pub fn resolve_mapping(
        &self,
        headers: &[String],
        fields: &[FieldDescriptor],
    ) -> Result<ColumnMapping, ConfigError> {
        let mut mapping = infer_mapping(headers, fields);

        for (column, target) in &self.mapping {
            let idx = headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(column.trim()))
                .ok_or_else(|| ConfigError::UnknownColumn(column.clone()))?;

            let target = match target {
                MappingTarget::Property(name) => {
                    MappingTarget::Property(resolve_field_id(name, fields))
                }
                other => other.clone(),
            };
            mapping.set(idx, target);
        }

        Ok(mapping)
    }

    /// Deduplication key with a property named by label resolved to its field id
    pub fn resolve_dedup(&self, fields: &[FieldDescriptor]) -> DedupKeySelector {
        match &self.dedup {
            DedupKeySelector::ByProperty(name) => {
                DedupKeySelector::ByProperty(resolve_field_id(name, fields))
            }
            other => other.clone(),
        }
    }
}

fn resolve_field_id(name: &str, fields: &[FieldDescriptor]) -> String {
    if fields.iter().any(|f| f.id == name) {
        return name.to_string();
    }
    fields
        .iter()
        .find(|f| f.label.eq_ignore_ascii_case(name))
        .map(|f| f.id.clone())
        .unwrap_or_else(|| name.to_string())
}

/// Builder for ImportConfig
#[derive(Debug, Default)]
pub struct ImportConfigBuilder {
    dedup: Option<DedupKeySelector>,
    seed_empty_block: Option<bool>,
    mapping: BTreeMap<String, MappingTarget>,
}

impl ImportConfigBuilder {
    pub fn dedup(mut self, dedup: DedupKeySelector) -> Self {
        self.dedup = Some(dedup);
        self
    }

    pub fn seed_empty_block(mut self, seed: bool) -> Self {
        self.seed_empty_block = Some(seed);
        self
    }

    /// Override the target of the column with header `column`
    pub fn map_column(mut self, column: impl Into<String>, target: MappingTarget) -> Self {
        self.mapping.insert(column.into(), target);
        self
    }

    pub fn build(self) -> ImportConfig {
        let defaults = ImportConfig::default();
        ImportConfig {
            dedup: self.dedup.unwrap_or(defaults.dedup),
            seed_empty_block: self.seed_empty_block.unwrap_or(defaults.seed_empty_block),
            mapping: self.mapping,
        }
    }
}
