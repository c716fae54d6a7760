//! CSV record building
//!
//! Streaming CSV assembly for export artifacts: UTF-8 BOM preamble,
//! deterministic header, RFC-4180 quoting, and a guard against
//! spreadsheet formula injection. Row-to-record conversion goes through
//! the [`RecordFormatter`] seam so the domain layer can supply its own.

use crate::storage::Entry;

/// Byte-order mark written before the header so spreadsheet tools decode
/// the artifact as UTF-8.
pub const UTF8_BOM: &str = "\u{feff}";

/// Fixed columns preceding the discovered meta columns
pub const FIXED_COLUMNS: [&str; 4] = ["entry_id", "form_id", "status", "date_created"];

/// Converts one entry into CSV cell values
pub trait RecordFormatter: Send + Sync {
    /// Produce one cell per column: the fixed columns first, then one per
    /// discovered meta key (empty string when the entry lacks the key).
    fn format(&self, entry: &Entry, meta_columns: &[String]) -> Vec<String>;
}

/// Formatter used when the domain layer does not supply one
pub struct DefaultFormatter;

impl RecordFormatter for DefaultFormatter {
    fn format(&self, entry: &Entry, meta_columns: &[String]) -> Vec<String> {
        let mut cells = Vec::with_capacity(FIXED_COLUMNS.len() + meta_columns.len());
        cells.push(entry.id.to_string());
        cells.push(entry.form_id.to_string());
        cells.push(entry.status.clone());
        cells.push(entry.created_at.to_rfc3339());
        for column in meta_columns {
            cells.push(entry.meta.get(column).cloned().unwrap_or_default());
        }
        cells
    }
}

/// Header record: fixed columns followed by the sorted meta columns.
pub fn header_record(meta_columns: &[String]) -> String {
    let mut cells: Vec<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
    cells.extend(meta_columns.iter().cloned());
    encode_record(&cells)
}

/// Encode one record as a CRLF-terminated CSV line.
pub fn encode_record(cells: &[String]) -> String {
    let mut line = String::new();
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        line.push_str(&escape_cell(cell));
    }
    line.push_str("\r\n");
    line
}

/// Quote a cell when needed and defang leading formula characters.
fn escape_cell(cell: &str) -> String {
    // Leading =, +, - or @ is executed as a formula by spreadsheet
    // applications; prefix a quote character to neutralize it.
    let defanged = if cell.starts_with(['=', '+', '-', '@']) {
        format!("'{}", cell)
    } else {
        cell.to_string()
    };

    if defanged.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", defanged.replace('"', "\"\""))
    } else {
        defanged
    }
}
