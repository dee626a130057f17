//! Output formatting for CLI

use crate::import::{
    ColumnMapping, DedupKeySelector, ImportPlan, ImportResult, MappingTarget, ParsedTable,
    PlannedAction,
};
use crate::models::FieldDescriptor;

/// Format the column mapping, one line per header
pub fn format_mapping(headers: &[String], mapping: &ColumnMapping) -> String {
    let mut output = String::new();
    output.push_str("Column Mappings:\n");
    for (idx, header) in headers.iter().enumerate() {
        let target = mapping.get(idx).unwrap_or(&MappingTarget::Discard);
        output.push_str(&format!("  {:>3}  {} → {}\n", idx, header, target));
    }
    output
}

/// Format a parsed table summary with its inferred mapping
pub fn format_inspect_output(
    table: &ParsedTable,
    mapping: &ColumnMapping,
    dedup_options: &[DedupKeySelector],
    fields: &[FieldDescriptor],
) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n✅ Parsed {} column(s), {} row{} to import\n\n",
        table.headers.len(),
        table.rows.len(),
        if table.rows.len() == 1 { "" } else { "s" }
    ));
    output.push_str(&format_mapping(&table.headers, mapping));

    if !dedup_options.is_empty() {
        output.push_str("\nDeduplicate By:\n");
        for option in dedup_options {
            let label = match option {
                DedupKeySelector::ByTitle => "Title".to_string(),
                DedupKeySelector::None => "None (always create new)".to_string(),
                DedupKeySelector::ByProperty(id) => fields
                    .iter()
                    .find(|f| &f.id == id)
                    .map(|f| f.label.clone())
                    .unwrap_or_else(|| id.clone()),
            };
            output.push_str(&format!("  - {} ({})\n", label, option));
        }
    }

    output
}

/// Format a dry-run plan
pub fn format_plan_output<R>(plan: &ImportPlan<'_, R>) -> String {
    let mut output = String::new();
    output.push_str(&format!("\nDry run (deduplicate by {}):\n", plan.dedup_key));

    for row in &plan.rows {
        let action = match row.action {
            PlannedAction::Create => "create",
            PlannedAction::Update(_) => "update",
        };
        output.push_str(&format!("  row {:>4}: {} '{}'\n", row.row_index + 1, action, row.title));
    }

    if plan.superseded > 0 {
        output.push_str(&format!(
            "\n⚠️  {} row(s) superseded by later rows with the same key\n",
            plan.superseded
        ));
    }

    output.push_str(&format!("\nWould apply: {}\n", plan.preview()));
    output
}

/// Format an import result
pub fn format_result_output(result: &ImportResult, json: bool) -> String {
    if json {
        return serde_json::to_string(result).unwrap_or_else(|_| result.to_string());
    }
    format!("\n✅ Import Complete\n{}\n", result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mapping() {
        let headers = vec!["title".to_string(), "qty".to_string(), "notes".to_string()];
        let mapping = ColumnMapping::new()
            .with(0, MappingTarget::Title)
            .with(1, MappingTarget::Property("qty".to_string()));

        let output = format_mapping(&headers, &mapping);
        assert!(output.contains("title → title"));
        assert!(output.contains("qty → property:qty"));
        assert!(output.contains("notes → discard"));
    }

    #[test]
    fn test_format_result_json() {
        let result = ImportResult {
            created: 1,
            updated: 2,
            skipped: 3,
        };
        assert_eq!(
            format_result_output(&result, true),
            r#"{"created":1,"updated":2,"skipped":3}"#
        );
        assert!(format_result_output(&result, false).contains("Created: 1, Updated: 2, Skipped: 3"));
    }
}
