//! Column mapping validation
//!
//! Hard rules (checked before any record is touched):
//! - exactly one column maps to the title
//! - at most one column maps to the body
//!
//! Soft findings (reported, never fatal): property targets the collection does not
//! know, and mapped columns beyond the header row.

use crate::import::mapping::{ColumnMapping, MappingTarget};
use crate::models::FieldDescriptor;

/// Mapping rule violation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingValidationError {
    #[error("At least one column must be mapped to Title")]
    MissingTitle,
    #[error("Only one column can be mapped to Title (columns {0:?})")]
    MultipleTitles(Vec<usize>),
    #[error("Only one column can be mapped to Body (columns {0:?})")]
    MultipleBodies(Vec<usize>),
}

/// Check the hard mapping rules
pub fn validate_mapping(mapping: &ColumnMapping) -> Result<(), MappingValidationError> {
    let titles = mapping.columns_for(&MappingTarget::Title);
    match titles.len() {
        0 => return Err(MappingValidationError::MissingTitle),
        1 => {}
        _ => return Err(MappingValidationError::MultipleTitles(titles)),
    }

    let bodies = mapping.columns_for(&MappingTarget::Body);
    if bodies.len() > 1 {
        return Err(MappingValidationError::MultipleBodies(bodies));
    }

    Ok(())
}

/// Non-fatal findings about a mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingWarnings {
    /// (column, property id) pairs naming no field of the collection
    pub unknown_properties: Vec<(usize, String)>,
    /// Mapped columns with no header; their values read as empty
    pub columns_out_of_range: Vec<usize>,
}

impl MappingWarnings {
    pub fn is_empty(&self) -> bool {
        self.unknown_properties.is_empty() && self.columns_out_of_range.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        for (idx, id) in &self.unknown_properties {
            messages.push(format!(
                "Column {} maps to unknown property '{}'; it will be matched by id only",
                idx, id
            ));
        }
        for idx in &self.columns_out_of_range {
            messages.push(format!("Column {} has no header; its values are empty", idx));
        }
        messages
    }
}

/// Collect soft findings for a mapping against the headers and fields it will be used with
pub fn check_mapping(
    mapping: &ColumnMapping,
    headers: &[String],
    fields: &[FieldDescriptor],
) -> MappingWarnings {
    let mut warnings = MappingWarnings::default();

    for (idx, target) in mapping.iter() {
        if matches!(target, MappingTarget::Discard) {
            continue;
        }
        if idx >= headers.len() {
            warnings.columns_out_of_range.push(idx);
        }
        if let MappingTarget::Property(id) = target
            && !fields.iter().any(|f| &f.id == id)
        {
            warnings.unknown_properties.push((idx, id.clone()));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldType;

    #[test]
    fn test_exactly_one_title() {
        let none = ColumnMapping::new().with(0, MappingTarget::Discard);
        assert_eq!(validate_mapping(&none), Err(MappingValidationError::MissingTitle));

        let two = ColumnMapping::new()
            .with(0, MappingTarget::Title)
            .with(2, MappingTarget::Title);
        assert_eq!(
            validate_mapping(&two),
            Err(MappingValidationError::MultipleTitles(vec![0, 2]))
        );

        let one = ColumnMapping::new().with(1, MappingTarget::Title);
        assert!(validate_mapping(&one).is_ok());
    }

    #[test]
    fn test_at_most_one_body() {
        let mapping = ColumnMapping::new()
            .with(0, MappingTarget::Title)
            .with(1, MappingTarget::Body)
            .with(2, MappingTarget::Body);
        assert_eq!(
            validate_mapping(&mapping),
            Err(MappingValidationError::MultipleBodies(vec![1, 2]))
        );
    }

    #[test]
    fn test_error_messages() {
        assert!(
            MappingValidationError::MissingTitle
                .to_string()
                .contains("must be mapped to Title")
        );
    }

    #[test]
    fn test_check_mapping_warnings() {
        let headers = vec!["title".to_string(), "qty".to_string()];
        let fields = vec![FieldDescriptor::new("qty", "Quantity", FieldType::Number)];
        let mapping = ColumnMapping::new()
            .with(0, MappingTarget::Title)
            .with(1, MappingTarget::Property("qty".to_string()))
            .with(3, MappingTarget::Property("colour".to_string()))
            .with(4, MappingTarget::Discard);

        let warnings = check_mapping(&mapping, &headers, &fields);
        assert_eq!(warnings.unknown_properties, vec![(3, "colour".to_string())]);
        assert_eq!(warnings.columns_out_of_range, vec![3]);
        assert_eq!(warnings.messages().len(), 2);
    }
}
