//! Column mapping
//!
//! A [`ColumnMapping`] assigns every CSV column a [`MappingTarget`]; a
//! [`DedupKeySelector`] decides how rows are matched against existing records.
//! Both are plain values built up by the caller (dialog, config file, CLI flags) and
//! handed to the reconciler once.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::models::FieldDescriptor;
use crate::validation::mapping::{MappingValidationError, validate_mapping};

/// Prefix that forces a target string to name a property, e.g. `property:content`
pub const PROPERTY_TARGET_PREFIX: &str = "property:";

/// Split off [`PROPERTY_TARGET_PREFIX`], matched case-insensitively
fn strip_property_prefix(value: &str) -> Option<&str> {
    let prefix = value.get(..PROPERTY_TARGET_PREFIX.len())?;
    prefix
        .eq_ignore_ascii_case(PROPERTY_TARGET_PREFIX)
        .then(|| value[PROPERTY_TARGET_PREFIX.len()..].trim())
}

/// Where the values of one column go
///
/// As a string: `title`, `body` (or `content`), `discard`, `property:<field>`, or a bare
/// field id or label. A bare name that collides with a keyword reads as the keyword.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MappingTarget {
    Title,
    Body,
    Discard,
    /// A collection property, by field id
    Property(String),
}

impl From<&str> for MappingTarget {
    fn from(value: &str) -> Self {
        let value = value.trim();
        if let Some(name) = strip_property_prefix(value) {
            return if name.is_empty() {
                MappingTarget::Discard
            } else {
                MappingTarget::Property(name.to_string())
            };
        }
        match value.to_lowercase().as_str() {
            "title" => MappingTarget::Title,
            "body" | "content" => MappingTarget::Body,
            "discard" | "" => MappingTarget::Discard,
            _ => MappingTarget::Property(value.to_string()),
        }
    }
}

impl From<String> for MappingTarget {
    fn from(value: String) -> Self {
        MappingTarget::from(value.as_str())
    }
}

impl From<MappingTarget> for String {
    fn from(target: MappingTarget) -> Self {
        target.to_string()
    }
}

impl fmt::Display for MappingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingTarget::Title => write!(f, "title"),
            MappingTarget::Body => write!(f, "body"),
            MappingTarget::Discard => write!(f, "discard"),
            MappingTarget::Property(id) => write!(f, "{}{}", PROPERTY_TARGET_PREFIX, id),
        }
    }
}

/// Column index to target assignment
///
/// Columns without an entry are discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    targets: BTreeMap<usize, MappingTarget>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set`](Self::set)
    pub fn with(mut self, column: usize, target: MappingTarget) -> Self {
        self.set(column, target);
        self
    }

    /// Assign a target to a column, replacing any previous assignment
    pub fn set(&mut self, column: usize, target: MappingTarget) {
        self.targets.insert(column, target);
    }

    pub fn get(&self, column: usize) -> Option<&MappingTarget> {
        self.targets.get(&column)
    }

    /// Assignments in column order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &MappingTarget)> {
        self.targets.iter().map(|(idx, target)| (*idx, target))
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Columns assigned to `target`, in column order
    pub fn columns_for(&self, target: &MappingTarget) -> Vec<usize> {
        self.iter()
            .filter(|(_, t)| *t == target)
            .map(|(idx, _)| idx)
            .collect()
    }
}

impl FromIterator<(usize, MappingTarget)> for ColumnMapping {
    fn from_iter<I: IntoIterator<Item = (usize, MappingTarget)>>(iter: I) -> Self {
        Self {
            targets: iter.into_iter().collect(),
        }
    }
}

/// How incoming rows are matched against existing records
///
/// As a string: `none`, `title`, `property:<field>`, or a bare field id or label.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DedupKeySelector {
    /// Every row creates a new record
    None,
    /// Match on the record title
    #[default]
    ByTitle,
    /// Match on the text of a property, by field id
    ByProperty(String),
}

impl From<&str> for DedupKeySelector {
    fn from(value: &str) -> Self {
        let value = value.trim();
        if let Some(name) = strip_property_prefix(value)
            && !name.is_empty()
        {
            return DedupKeySelector::ByProperty(name.to_string());
        }
        match value.to_lowercase().as_str() {
            "none" | "__none__" => DedupKeySelector::None,
            "title" | "__title__" => DedupKeySelector::ByTitle,
            _ => DedupKeySelector::ByProperty(value.to_string()),
        }
    }
}

impl From<String> for DedupKeySelector {
    fn from(value: String) -> Self {
        DedupKeySelector::from(value.as_str())
    }
}

impl From<DedupKeySelector> for String {
    fn from(selector: DedupKeySelector) -> Self {
        selector.to_string()
    }
}

impl fmt::Display for DedupKeySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DedupKeySelector::None => write!(f, "none"),
            DedupKeySelector::ByTitle => write!(f, "title"),
            DedupKeySelector::ByProperty(id) => write!(f, "{}{}", PROPERTY_TARGET_PREFIX, id),
        }
    }
}

/// A column feeding a property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyColumn {
    pub idx: usize,
    pub property_id: String,
    /// Field label, or the id when the collection has no such field
    pub property_label: String,
}

/// Column roles extracted from a validated mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRoles {
    pub title_idx: usize,
    pub body_idx: Option<usize>,
    pub properties: Vec<PropertyColumn>,
}

impl ColumnRoles {
    /// Validate `mapping` and split it into title, body and property columns
    pub fn resolve(
        mapping: &ColumnMapping,
        fields: &[FieldDescriptor],
    ) -> Result<Self, MappingValidationError> {
        validate_mapping(mapping)?;

        let fields_by_id: HashMap<&str, &FieldDescriptor> =
            fields.iter().map(|f| (f.id.as_str(), f)).collect();

        let mut title_idx = None;
        let mut body_idx = None;
        let mut properties = Vec::new();

        for (idx, target) in mapping.iter() {
            match target {
                MappingTarget::Title => title_idx = Some(idx),
                MappingTarget::Body => body_idx = Some(idx),
                MappingTarget::Discard => {}
                MappingTarget::Property(property_id) => {
                    let property_label = fields_by_id
                        .get(property_id.as_str())
                        .map(|f| f.label.clone())
                        .unwrap_or_else(|| property_id.clone());
                    properties.push(PropertyColumn {
                        idx,
                        property_id: property_id.clone(),
                        property_label,
                    });
                }
            }
        }

        let title_idx = title_idx.ok_or(MappingValidationError::MissingTitle)?;
        Ok(Self {
            title_idx,
            body_idx,
            properties,
        })
    }

    /// The column feeding `property_id`, if any
    pub fn property_column(&self, property_id: &str) -> Option<&PropertyColumn> {
        self.properties.iter().find(|p| p.property_id == property_id)
    }
}

const PROPERTY_PREFIX: &str = "property_";

/// Guess a mapping from header names
///
/// Only active fields are considered, matched case-insensitively by label or id:
/// - `title` / `name` map to the title
/// - `body` / `description` / `content` map to the body
/// - `property_<x>` maps to the field named `x`
/// - any other header naming a field maps to that field
/// - everything else is discarded
///
/// The result is not guaranteed to be valid; several columns may be guessed as title.
pub fn infer_mapping(headers: &[String], fields: &[FieldDescriptor]) -> ColumnMapping {
    let mut fields_by_name: HashMap<String, &FieldDescriptor> = HashMap::new();
    for field in fields.iter().filter(|f| f.active) {
        fields_by_name.insert(field.label.to_lowercase(), field);
        fields_by_name.insert(field.id.to_lowercase(), field);
    }

    let property_or_discard = |name: &str| match fields_by_name.get(name) {
        Some(field) => MappingTarget::Property(field.id.clone()),
        None => MappingTarget::Discard,
    };

    headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let header = header.to_lowercase();
            let target = match header.as_str() {
                "title" | "name" => MappingTarget::Title,
                "body" | "description" | "content" => MappingTarget::Body,
                _ => match header.strip_prefix(PROPERTY_PREFIX) {
                    Some(name) => property_or_discard(name),
                    None => property_or_discard(&header),
                },
            };
            (idx, target)
        })
        .collect()
}

/// Fields a column can be mapped to: active, excluding the built-in title field
pub fn property_options(fields: &[FieldDescriptor]) -> Vec<&FieldDescriptor> {
    fields.iter().filter(|f| f.active && !f.is_title()).collect()
}

/// Deduplication choices for a collection
///
/// Title first, then no deduplication, then every active text or number field.
pub fn dedup_key_options(fields: &[FieldDescriptor]) -> Vec<DedupKeySelector> {
    let mut options = vec![DedupKeySelector::ByTitle, DedupKeySelector::None];
    options.extend(
        fields
            .iter()
            .filter(|f| f.active && !f.is_title() && f.field_type.is_keyable())
            .map(|f| DedupKeySelector::ByProperty(f.id.clone())),
    );
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldType;

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("title", "Title", FieldType::Text),
            FieldDescriptor::new("qty", "Quantity", FieldType::Number),
            FieldDescriptor::new("sku", "SKU", FieldType::Text),
            FieldDescriptor::new("status", "Status", FieldType::Other("choice".to_string())),
            FieldDescriptor::new("old", "Legacy", FieldType::Text).inactive(),
        ]
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn test_infer_mapping_smart_defaults() {
        let mapping = infer_mapping(
            &headers(&["Name", "Description", "property_quantity", "sku", "Legacy", "other"]),
            &fields(),
        );

        assert_eq!(mapping.get(0), Some(&MappingTarget::Title));
        assert_eq!(mapping.get(1), Some(&MappingTarget::Body));
        assert_eq!(mapping.get(2), Some(&MappingTarget::Property("qty".to_string())));
        assert_eq!(mapping.get(3), Some(&MappingTarget::Property("sku".to_string())));
        assert_eq!(mapping.get(4), Some(&MappingTarget::Discard));
        assert_eq!(mapping.get(5), Some(&MappingTarget::Discard));
    }

    #[test]
    fn test_infer_mapping_unknown_property_prefix_discarded() {
        let mapping = infer_mapping(&headers(&["title", "property_colour"]), &fields());
        assert_eq!(mapping.get(1), Some(&MappingTarget::Discard));
    }

    #[test]
    fn test_infer_mapping_is_total() {
        let mapping = infer_mapping(&headers(&["title", "name", "", "content"]), &[]);
        assert_eq!(mapping.len(), 4);
        assert_eq!(mapping.columns_for(&MappingTarget::Title), vec![0, 1]);
        assert_eq!(mapping.get(2), Some(&MappingTarget::Discard));
    }

    #[test]
    fn test_resolve_roles_label_fallback() {
        let mapping = ColumnMapping::new()
            .with(0, MappingTarget::Title)
            .with(1, MappingTarget::Property("qty".to_string()))
            .with(2, MappingTarget::Property("colour".to_string()))
            .with(3, MappingTarget::Body);

        let roles = ColumnRoles::resolve(&mapping, &fields()).unwrap();
        assert_eq!(roles.title_idx, 0);
        assert_eq!(roles.body_idx, Some(3));
        assert_eq!(roles.properties[0].property_label, "Quantity");
        assert_eq!(roles.properties[1].property_label, "colour");
        assert_eq!(roles.property_column("colour").map(|p| p.idx), Some(2));
    }

    #[test]
    fn test_resolve_roles_requires_title() {
        let mapping = ColumnMapping::new().with(0, MappingTarget::Body);
        assert!(matches!(
            ColumnRoles::resolve(&mapping, &fields()),
            Err(MappingValidationError::MissingTitle)
        ));
    }

    #[test]
    fn test_property_options() {
        let fields = fields();
        let ids: Vec<&str> = property_options(&fields).iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["qty", "sku", "status"]);
    }

    #[test]
    fn test_dedup_key_options() {
        assert_eq!(
            dedup_key_options(&fields()),
            vec![
                DedupKeySelector::ByTitle,
                DedupKeySelector::None,
                DedupKeySelector::ByProperty("qty".to_string()),
                DedupKeySelector::ByProperty("sku".to_string()),
            ]
        );
    }

    #[test]
    fn test_target_and_selector_from_str() {
        assert_eq!(MappingTarget::from("Title"), MappingTarget::Title);
        assert_eq!(MappingTarget::from("content"), MappingTarget::Body);
        assert_eq!(MappingTarget::from("skip"), MappingTarget::Property("skip".to_string()));
        assert_eq!(DedupKeySelector::from("__none__"), DedupKeySelector::None);
        assert_eq!(DedupKeySelector::from("TITLE"), DedupKeySelector::ByTitle);
        assert_eq!(
            DedupKeySelector::from(" sku "),
            DedupKeySelector::ByProperty("sku".to_string())
        );
    }

    #[test]
    fn test_property_prefix_wins_over_keywords() {
        assert_eq!(
            MappingTarget::from("property:Content"),
            MappingTarget::Property("Content".to_string())
        );
        assert_eq!(
            MappingTarget::from(" PROPERTY: title "),
            MappingTarget::Property("title".to_string())
        );
        assert_eq!(MappingTarget::from("property:"), MappingTarget::Discard);
        assert_eq!(
            DedupKeySelector::from("property:none"),
            DedupKeySelector::ByProperty("none".to_string())
        );
    }

    #[test]
    fn test_string_form_round_trips() {
        for target in [
            MappingTarget::Title,
            MappingTarget::Body,
            MappingTarget::Discard,
            MappingTarget::Property("title".to_string()),
            MappingTarget::Property("content".to_string()),
        ] {
            let json = serde_json::to_string(&target).unwrap();
            assert_eq!(serde_json::from_str::<MappingTarget>(&json).unwrap(), target);
        }
        assert_eq!(
            serde_json::to_string(&MappingTarget::Property("title".to_string())).unwrap(),
            "\"property:title\""
        );

        for selector in [
            DedupKeySelector::None,
            DedupKeySelector::ByTitle,
            DedupKeySelector::ByProperty("none".to_string()),
        ] {
            let json = serde_json::to_string(&selector).unwrap();
            assert_eq!(serde_json::from_str::<DedupKeySelector>(&json).unwrap(), selector);
        }
    }
}
