//! CSV parser
//!
//! Single pass over the input with a quoted/unquoted state. Malformed input never
//! fails: unbalanced quotes run to the end of the text, ragged rows are kept as-is,
//! and lines whose fields are all blank are dropped.

use super::{ParsedTable, Row};
use tracing::debug;

/// CSV importer
#[derive(Debug, Clone, Copy, Default)]
pub struct CSVImporter;

impl CSVImporter {
    /// Create a new CSV importer
    pub fn new() -> Self {
        Self
    }

    /// Parse CSV text into headers and rows
    ///
    /// # Example
    ///
    /// ```rust
    /// use record_csv_import::import::CSVImporter;
    ///
    /// let table = CSVImporter::new().parse("name , qty\n\"Apple, red\",5\n");
    /// assert_eq!(table.headers, vec!["name", "qty"]);
    /// assert_eq!(table.rows, vec![vec!["Apple, red".to_string(), "5".to_string()]]);
    /// ```
    pub fn parse(&self, text: &str) -> ParsedTable {
        parse_csv(text)
    }
}

/// Parse CSV text into headers and rows
pub fn parse_csv(text: &str) -> ParsedTable {
    let mut lines: Vec<Row> = Vec::new();
    let mut current_line: Row = Vec::new();
    let mut current_field = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    current_field.push('"');
                }
                '"' => in_quotes = false,
                _ => current_field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => current_line.push(std::mem::take(&mut current_field)),
            '\n' => finish_line(&mut lines, &mut current_line, &mut current_field),
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                finish_line(&mut lines, &mut current_line, &mut current_field);
            }
            // bare carriage return
            '\r' => {}
            _ => current_field.push(c),
        }
    }

    if !current_field.is_empty() || !current_line.is_empty() {
        finish_line(&mut lines, &mut current_line, &mut current_field);
    }

    let mut lines = lines.into_iter();
    let Some(header_line) = lines.next() else {
        return ParsedTable::default();
    };

    let headers: Vec<String> = header_line.iter().map(|h| h.trim().to_string()).collect();
    let rows: Vec<Row> = lines.collect();

    debug!("Parsed CSV: {} columns, {} rows", headers.len(), rows.len());
    ParsedTable { headers, rows }
}

fn finish_line(lines: &mut Vec<Row>, line: &mut Row, field: &mut String) {
    line.push(std::mem::take(field));
    let line = std::mem::take(line);
    if line.iter().any(|f| !f.trim().is_empty()) {
        lines.push(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> Row {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_parse_simple() {
        let table = parse_csv("title,qty\nApple,5\nBanana,\n");
        assert_eq!(table.headers, vec!["title", "qty"]);
        assert_eq!(table.rows, vec![row(&["Apple", "5"]), row(&["Banana", ""])]);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_csv(""), ParsedTable::default());
        assert_eq!(parse_csv("\n\n , \n"), ParsedTable::default());
    }

    #[test]
    fn test_headers_trimmed_rows_untrimmed() {
        let table = parse_csv("  title , body \n  Apple , red \n");
        assert_eq!(table.headers, vec!["title", "body"]);
        assert_eq!(table.rows, vec![row(&["  Apple ", " red "])]);
    }

    #[test]
    fn test_blank_lines_dropped() {
        let table = parse_csv("title,qty\nApple,5\n , ,\n\nBanana,6\n");
        assert_eq!(table.rows, vec![row(&["Apple", "5"]), row(&["Banana", "6"])]);
    }

    #[test]
    fn test_crlf_terminators() {
        let table = parse_csv("title,qty\r\nApple,5\r\nBanana,6");
        assert_eq!(table.headers, vec!["title", "qty"]);
        assert_eq!(table.rows, vec![row(&["Apple", "5"]), row(&["Banana", "6"])]);
    }

    #[test]
    fn test_bare_carriage_return_dropped() {
        let table = parse_csv("title\nApp\rle\n");
        assert_eq!(table.rows, vec![row(&["Apple"])]);
    }

    #[test]
    fn test_quoted_fields() {
        let table = parse_csv("title,body\n\"Apple, red\",\"He said \"\"hi\"\"\nbye\"\n");
        assert_eq!(
            table.rows,
            vec![row(&["Apple, red", "He said \"hi\"\nbye"])]
        );
    }

    #[test]
    fn test_quote_mid_field_enters_quoted_mode() {
        let table = parse_csv("title\nab\"c,d\"e\n");
        assert_eq!(table.rows, vec![row(&["abc,de"])]);
    }

    #[test]
    fn test_unterminated_quote_runs_to_end() {
        let table = parse_csv("title,body\nApple,\"never closed\nstill body");
        assert_eq!(
            table.rows,
            vec![row(&["Apple", "never closed\nstill body"])]
        );
    }

    #[test]
    fn test_ragged_rows_kept() {
        let table = parse_csv("a,b,c\n1\n1,2,3,4\n");
        assert_eq!(table.rows, vec![row(&["1"]), row(&["1", "2", "3", "4"])]);
    }

    #[test]
    fn test_trailing_comma_at_end_of_input() {
        let table = parse_csv("a,b\nx,");
        assert_eq!(table.rows, vec![row(&["x", ""])]);
    }

    #[test]
    fn test_header_only() {
        let table = parse_csv("title,qty\n");
        assert_eq!(table.headers, vec!["title", "qty"]);
        assert!(table.is_empty());
    }
}
