//! Decides whether a raw table is a transaction ledger.

use ledgerline_core::RawTable;
use serde::Serialize;
use std::fmt;

use crate::config::NormalizeConfig;
use crate::fields::{is_blank, normalize_label, parse_date};
use crate::mapping::{map_columns, AmountEncoding, ColumnRole};
use crate::vocabulary::{AMOUNT_HEADER_KEYWORDS, DATE_HEADER_KEYWORDS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    EmptyHeader,
    TooFewRows { rows: usize, min: usize },
    MissingDateHeader,
    MissingAmountHeader,
    /// Keywords appear, but no column maps to a date or an amount role.
    UnmappedColumns,
    NoDateColumn,
}

impl RejectReason {
    pub fn code(self) -> &'static str {
        match self {
            RejectReason::EmptyHeader => "EMPTY_HEADER",
            RejectReason::TooFewRows { .. } => "TOO_FEW_ROWS",
            RejectReason::MissingDateHeader => "MISSING_DATE_HEADER",
            RejectReason::MissingAmountHeader => "MISSING_AMOUNT_HEADER",
            RejectReason::UnmappedColumns => "UNMAPPED_COLUMNS",
            RejectReason::NoDateColumn => "NO_DATE_COLUMN",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::TooFewRows { rows, min } => {
                write!(f, "{}: {rows} rows, need {min}", self.code())
            }
            other => write!(f, "{}", other.code()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Accept,
    Reject(RejectReason),
}

impl Classification {
    pub fn is_accept(self) -> bool {
        matches!(self, Classification::Accept)
    }
}

/// Run the ledger heuristics in order; the first failing check names the
/// rejection.
pub fn classify(table: &RawTable, config: &NormalizeConfig) -> Classification {
    let labels: Vec<String> = table.header.iter().map(|h| normalize_label(h)).collect();
    if labels.iter().all(String::is_empty) {
        return Classification::Reject(RejectReason::EmptyHeader);
    }

    let rows = (0..table.rows.len()).filter(|&r| !table.row_is_blank(r)).count();
    let min = config.classifier.min_rows;
    if rows < min {
        return Classification::Reject(RejectReason::TooFewRows { rows, min });
    }

    let has_keyword = |keywords: &[&str]| {
        labels
            .iter()
            .any(|label| keywords.iter().any(|k| label.contains(k)))
    };
    if !has_keyword(DATE_HEADER_KEYWORDS) {
        return Classification::Reject(RejectReason::MissingDateHeader);
    }
    if !has_keyword(AMOUNT_HEADER_KEYWORDS) {
        return Classification::Reject(RejectReason::MissingAmountHeader);
    }

    // Keywords match inside words ("TransDate"); the mapper needs whole ones.
    let mapping = map_columns(&table.header, &config.vocabulary);
    if mapping.column_for(ColumnRole::Date).is_none() || mapping.encoding() == AmountEncoding::Missing {
        return Classification::Reject(RejectReason::UnmappedColumns);
    }

    if !has_date_column(table, config) {
        return Classification::Reject(RejectReason::NoDateColumn);
    }

    Classification::Accept
}

/// Whether some column's sampled cells mostly parse as dates.
fn has_date_column(table: &RawTable, config: &NormalizeConfig) -> bool {
    let sample = table.rows.len().min(config.classifier.date_sample_rows);
    let day_first = config.dates.day_first;

    (0..table.width()).any(|col| {
        let (filled, dates) = (0..sample)
            .map(|row| table.cell(row, col))
            .filter(|cell| !is_blank(cell))
            .fold((0usize, 0usize), |(filled, dates), cell| {
                let parsed = usize::from(parse_date(cell, day_first).is_ok());
                (filled + 1, dates + parsed)
            });
        dates > 0 && dates as f64 >= filled as f64 * config.classifier.date_column_ratio
    })
}
