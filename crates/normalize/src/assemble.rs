//! Turns one table row into one transaction, or a reason it could not.

use ledgerline_core::{DebitCredit, Money, RawTable, Transaction};
use serde::Serialize;
use std::fmt;

use crate::config::NormalizeConfig;
use crate::fields::{is_blank, normalize_label, parse_amount, parse_date, parse_indicator, parse_text};
use crate::mapping::{AmountEncoding, ColumnMapping, ColumnRole};

/// Why a row produced no accepted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DropReason {
    BlankRow,
    SummaryRow,
    /// Description-only row folded into the previous transaction.
    Continuation,
    NoDate,
    NoAmount,
    AmbiguousDebitCredit,
    UnparseableDate,
    UnparseableAmount,
    ImplausibleValue,
}

impl DropReason {
    pub fn code(self) -> &'static str {
        match self {
            DropReason::BlankRow => "BLANK_ROW",
            DropReason::SummaryRow => "SUMMARY_ROW",
            DropReason::Continuation => "CONTINUATION",
            DropReason::NoDate => "NO_DATE",
            DropReason::NoAmount => "NO_AMOUNT",
            DropReason::AmbiguousDebitCredit => "AMBIGUOUS_DEBIT_CREDIT",
            DropReason::UnparseableDate => "UNPARSEABLE_DATE",
            DropReason::UnparseableAmount => "UNPARSEABLE_AMOUNT",
            DropReason::ImplausibleValue => "IMPLAUSIBLE_VALUE",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

pub fn assemble(
    table: &RawTable,
    mapping: &ColumnMapping,
    row: usize,
    config: &NormalizeConfig,
) -> Result<Transaction, DropReason> {
    if table.row_is_blank(row) {
        return Err(DropReason::BlankRow);
    }
    if is_summary_row(table, mapping, row, &config.assemble.summary_keywords) {
        return Err(DropReason::SummaryRow);
    }

    let date_col = mapping.column_for(ColumnRole::Date).ok_or(DropReason::NoDate)?;
    let date_cell = table.cell(row, date_col);
    if is_blank(date_cell) {
        return Err(DropReason::NoDate);
    }
    let date = parse_date(date_cell, config.dates.day_first)
        .map_err(|_| DropReason::UnparseableDate)?;

    let amount = resolve_amount(table, row, mapping)?;

    let description = mapping
        .column_for(ColumnRole::Description)
        .map(|col| parse_text(table.cell(row, col)))
        .unwrap_or_default();
    let balance = mapping
        .column_for(ColumnRole::Balance)
        .and_then(|col| parse_amount(table.cell(row, col)).ok());
    let reference = mapping
        .column_for(ColumnRole::Reference)
        .map(|col| parse_text(table.cell(row, col)))
        .filter(|r| !r.is_empty());

    let tx = Transaction::new(date.date, description, amount, table.source(row))
        .map_err(|_| DropReason::NoAmount)?
        .with_balance(balance)
        .with_reference(reference)
        .with_date_ambiguous(date.ambiguous);
    Ok(tx)
}

fn resolve_amount(
    table: &RawTable,
    row: usize,
    mapping: &ColumnMapping,
) -> Result<Money, DropReason> {
    // A blank or zero cell reads as "no value".
    let read = |col: Option<usize>| -> Result<Option<Money>, DropReason> {
        let Some(col) = col else { return Ok(None) };
        let cell = table.cell(row, col);
        if is_blank(cell) {
            return Ok(None);
        }
        parse_amount(cell)
            .map(|m| Some(m).filter(|m| !m.is_zero()))
            .map_err(|_| DropReason::UnparseableAmount)
    };

    match mapping.encoding() {
        AmountEncoding::Split { debit, credit } => match (read(debit)?, read(credit)?) {
            (Some(_), Some(_)) => Err(DropReason::AmbiguousDebitCredit),
            (Some(d), None) => Ok(-d.abs()),
            (None, Some(c)) => Ok(c.abs()),
            (None, None) => Err(DropReason::NoAmount),
        },
        AmountEncoding::Single(col) => {
            let amount = read(Some(col))?.ok_or(DropReason::NoAmount)?;
            // A marker column overrides whatever sign the amount cell carried.
            let marker = mapping
                .column_for(ColumnRole::Indicator)
                .and_then(|col| parse_indicator(table.cell(row, col)));
            Ok(match marker {
                Some(DebitCredit::Debit) => -amount.abs(),
                Some(DebitCredit::Credit) => amount.abs(),
                None => amount,
            })
        }
        AmountEncoding::Missing => Err(DropReason::NoAmount),
    }
}

fn is_summary_row(
    table: &RawTable,
    mapping: &ColumnMapping,
    row: usize,
    keywords: &[String],
) -> bool {
    let text = match mapping.column_for(ColumnRole::Description) {
        Some(col) => table.cell(row, col).to_string(),
        None => table
            .rows
            .get(row)
            .and_then(|cells| cells.iter().find(|c| !is_blank(c)))
            .cloned()
            .unwrap_or_default(),
    };
    let label = normalize_label(&text);
    if label.is_empty() {
        return false;
    }
    keywords.iter().any(|k| {
        let k = normalize_label(k);
        label == k || (k.contains(' ') && label.starts_with(&format!("{k} ")))
    })
}

/// Description text of a row that only continues the line above it: no
/// date, no amounts, some description.
fn continuation_text(table: &RawTable, mapping: &ColumnMapping, row: usize) -> Option<String> {
    let blank = |role: ColumnRole| {
        mapping
            .column_for(role)
            .map_or(true, |col| is_blank(table.cell(row, col)))
    };
    let amounts_blank = [
        ColumnRole::Debit,
        ColumnRole::Credit,
        ColumnRole::Amount,
        ColumnRole::Balance,
        ColumnRole::Indicator,
    ]
    .into_iter()
    .all(blank);
    if !blank(ColumnRole::Date) || !amounts_blank {
        return None;
    }
    let col = mapping.column_for(ColumnRole::Description)?;
    let text = parse_text(table.cell(row, col));
    (!text.is_empty()).then_some(text)
}

/// Per-table assembly output, in row order.
#[derive(Debug, Default)]
pub struct Assembled {
    pub transactions: Vec<Transaction>,
    pub drops: Vec<(usize, DropReason)>,
}

/// Assemble every row of an accepted table.
pub fn assemble_table(
    table: &RawTable,
    mapping: &ColumnMapping,
    config: &NormalizeConfig,
) -> Assembled {
    let mut out = Assembled::default();
    // Row index that the last transaction was built from or extended by.
    let mut open_row: Option<usize> = None;

    for row in 0..table.rows.len() {
        match assemble(table, mapping, row, config) {
            Ok(tx) => {
                out.transactions.push(tx);
                open_row = Some(row);
            }
            Err(DropReason::NoDate) if config.assemble.merge_continuation_rows => {
                let follows_open = open_row.is_some_and(|r| r + 1 == row);
                match (follows_open, continuation_text(table, mapping, row), out.transactions.last_mut()) {
                    (true, Some(text), Some(last)) => {
                        if last.description.is_empty() {
                            last.description = text;
                        } else {
                            last.description = format!("{} {}", last.description, text);
                        }
                        out.drops.push((row, DropReason::Continuation));
                        open_row = Some(row);
                    }
                    _ => {
                        tracing::debug!("Dropping {}: {}", table.source(row), DropReason::NoDate);
                        out.drops.push((row, DropReason::NoDate));
                        open_row = None;
                    }
                }
            }
            Err(reason) => {
                tracing::debug!("Dropping {}: {}", table.source(row), reason);
                out.drops.push((row, reason));
                open_row = None;
            }
        }
    }

    out
}
