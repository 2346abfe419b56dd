use serde::{Deserialize, Serialize};
use std::fmt;

/// A grid of header and row strings as produced by document extraction.
///
/// Rows may be shorter or longer than the header; lookups past the end of a
/// row read as empty cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    /// Page (PDF) or sheet (spreadsheet) index.
    pub page: usize,
    /// Ordinal of this table on its page.
    #[serde(default)]
    pub table: usize,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(page: usize, header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { page, table: 0, header, rows }
    }

    /// Convenience constructor for string literals.
    pub fn from_strs(page: usize, header: &[&str], rows: &[&[&str]]) -> Self {
        Self::new(
            page,
            header.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    pub fn with_table_index(mut self, table: usize) -> Self {
        self.table = table;
        self
    }

    /// Number of columns, counting ragged rows.
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0)
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn row_is_blank(&self, row: usize) -> bool {
        self.rows
            .get(row)
            .map_or(true, |r| r.iter().all(|c| c.trim().is_empty()))
    }

    pub fn source(&self, row: usize) -> SourceRef {
        SourceRef { page: self.page, table: self.table, row }
    }
}

/// Where a transaction came from: page/sheet, table on that page, row in that table.
///
/// Ordering is document order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SourceRef {
    pub page: usize,
    pub table: usize,
    pub row: usize,
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {} table {} row {}", self.page, self.table, self.row)
    }
}
