//! CSV exporter
//!
//! Quotes a field only when it contains a comma, a double quote or a line break;
//! embedded quotes are doubled. Output lines end with `\n`. Rows may be ragged.

use super::{ExportError, ExportResult};
use crate::import::ParsedTable;
use crate::models::Collection;
use csv::{QuoteStyle, Terminator, WriterBuilder};

/// CSV exporter
#[derive(Debug, Clone, Copy, Default)]
pub struct CSVExporter;

impl CSVExporter {
    pub fn new() -> Self {
        Self
    }

    /// Render a table: header line, then one line per row
    ///
    /// # Example
    ///
    /// ```rust
    /// use record_csv_import::export::CSVExporter;
    /// use record_csv_import::import::ParsedTable;
    ///
    /// let table = ParsedTable::new(
    ///     vec!["title".to_string()],
    ///     vec![vec!["Apple, red".to_string()]],
    /// );
    /// let result = CSVExporter::new().export(&table).unwrap();
    /// assert_eq!(result.content, "title\n\"Apple, red\"\n");
    /// ```
    pub fn export(&self, table: &ParsedTable) -> Result<ExportResult, ExportError> {
        let mut writer = WriterBuilder::new()
            .flexible(true)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer
            .write_record(&table.headers)
            .map_err(|e| ExportError::SerializationError(e.to_string()))?;
        for row in &table.rows {
            writer
                .write_record(row)
                .map_err(|e| ExportError::SerializationError(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ExportError::IoError(e.to_string()))?;
        let content =
            String::from_utf8(bytes).map_err(|e| ExportError::SerializationError(e.to_string()))?;

        Ok(ExportResult {
            content,
            format: "csv".to_string(),
        })
    }

    /// Render every record of a collection
    ///
    /// Columns are `title`, `body` (text of the first content block), then the label of
    /// every active field other than the built-in title.
    pub fn export_collection(&self, collection: &Collection) -> Result<ExportResult, ExportError> {
        self.export(&collection_table(collection))
    }
}

/// Tabulate a collection the way [`CSVExporter::export_collection`] renders it
pub fn collection_table(collection: &Collection) -> ParsedTable {
    let fields: Vec<_> = collection
        .fields
        .iter()
        .filter(|f| f.active && !f.is_title())
        .collect();

    let mut headers = vec!["title".to_string(), "body".to_string()];
    headers.extend(fields.iter().map(|f| f.label.clone()));

    let rows = collection
        .records
        .iter()
        .map(|record| {
            let mut row = vec![
                record.title.clone(),
                record
                    .blocks
                    .first()
                    .map(|b| b.text.clone())
                    .unwrap_or_default(),
            ];
            row.extend(
                fields
                    .iter()
                    .map(|f| record.properties.get(&f.id).cloned().unwrap_or_default()),
            );
            row
        })
        .collect();

    ParsedTable::new(headers, rows)
}
