//! Table windows: the slice of document text between a section header and the next one.

use regex::Regex;
use tracing::debug;

use crate::error::{ExtractionError, RuleError};
use crate::rules::build_regex;

/// A located table window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableWindow {
    /// Header plus body; the search scope for the section's fields.
    pub text: String,
    /// Text matched by the table header.
    pub header: String,
    /// Text between the header and the next table header.
    pub body: String,
}

/// A compiled window pattern for one section.
#[derive(Debug, Clone)]
pub struct TableWindowPattern {
    table_header: String,
    regex: Regex,
}

impl TableWindowPattern {
    /// Compile `document_start (table: (table_header)(desired_values)) (next_table_header)`.
    ///
    /// The document-start fragment is expected to consume everything up to the
    /// table header (e.g. end with `.*`); the body wildcard is greedy.
    pub fn new(
        document_start: &str,
        table_header: &str,
        next_table_header: &str,
    ) -> Result<Self, RuleError> {
        let source = format!(
            "{document_start}(?<table>(?<table_header>{table_header})(?<desired_values>.*))(?<next_table_header>{next_table_header})"
        );
        let regex = build_regex(&source, &format!("table window [{table_header}]"))?;
        Ok(Self {
            table_header: table_header.to_string(),
            regex,
        })
    }

    /// The full window regex source.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn find(&self, content: &str) -> Result<TableWindow, ExtractionError> {
        let not_found = || ExtractionError::TableNotFound {
            header: self.table_header.clone(),
            content: content.to_string(),
        };
        let caps = self.regex.captures(content).ok_or_else(not_found)?;
        let table = caps.name("table").ok_or_else(not_found)?;

        let window = TableWindow {
            text: table.as_str().to_string(),
            header: caps
                .name("table_header")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            body: caps
                .name("desired_values")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        };
        debug!(
            "Table window [{}] located ({} chars)",
            self.table_header,
            window.text.len()
        );
        Ok(window)
    }
}

/// Locate one table window in `content`.
pub fn find_table_window(
    content: &str,
    document_start: &str,
    table_header: &str,
    next_table_header: &str,
) -> crate::Result<TableWindow> {
    let pattern = TableWindowPattern::new(document_start, table_header, next_table_header)?;
    Ok(pattern.find(content)?)
}
