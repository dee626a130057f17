//! Validation functionality
//!
//! Provides validation logic for:
//! - Column mappings (title/body cardinality, unknown properties)

pub mod mapping;

pub use mapping::{MappingValidationError, MappingWarnings, check_mapping, validate_mapping};
