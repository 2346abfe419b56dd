//! Header vocabulary: which header phrases name which column role.
//!
//! Extending support for a new statement layout means adding rows here (or
//! `[[vocabulary]]` entries in the config), not new code paths.

use serde::{Deserialize, Serialize};

use crate::mapping::ColumnRole;

/// A configurable vocabulary row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub role: ColumnRole,
    pub phrase: String,
}

pub const VOCABULARY: &[(ColumnRole, &str)] = &[
    (ColumnRole::Date, "date"),
    (ColumnRole::Date, "txn date"),
    (ColumnRole::Date, "tran date"),
    (ColumnRole::Date, "value date"),
    (ColumnRole::Date, "value dt"),
    (ColumnRole::Date, "transaction date"),
    (ColumnRole::Date, "transaction dt"),
    (ColumnRole::Date, "posting date"),
    (ColumnRole::Date, "posting dt"),
    (ColumnRole::Date, "post date"),
    (ColumnRole::Date, "date posted"),
    (ColumnRole::Date, "txn dt"),
    (ColumnRole::Description, "description"),
    (ColumnRole::Description, "transaction description"),
    (ColumnRole::Description, "narration"),
    (ColumnRole::Description, "particulars"),
    (ColumnRole::Description, "details"),
    (ColumnRole::Description, "transaction details"),
    (ColumnRole::Description, "remarks"),
    (ColumnRole::Description, "memo"),
    (ColumnRole::Description, "payee"),
    (ColumnRole::Description, "merchant"),
    (ColumnRole::Debit, "debit"),
    (ColumnRole::Debit, "debits"),
    (ColumnRole::Debit, "withdrawal"),
    (ColumnRole::Debit, "withdrawals"),
    (ColumnRole::Debit, "dr"),
    (ColumnRole::Debit, "debit amount"),
    (ColumnRole::Debit, "withdrawal amt"),
    (ColumnRole::Debit, "withdrawal amount"),
    (ColumnRole::Debit, "paid out"),
    (ColumnRole::Debit, "money out"),
    (ColumnRole::Debit, "payments"),
    (ColumnRole::Credit, "credit"),
    (ColumnRole::Credit, "credits"),
    (ColumnRole::Credit, "deposit"),
    (ColumnRole::Credit, "deposits"),
    (ColumnRole::Credit, "cr"),
    (ColumnRole::Credit, "credit amount"),
    (ColumnRole::Credit, "deposit amt"),
    (ColumnRole::Credit, "deposit amount"),
    (ColumnRole::Credit, "paid in"),
    (ColumnRole::Credit, "money in"),
    (ColumnRole::Credit, "receipts"),
    (ColumnRole::Amount, "amount"),
    (ColumnRole::Amount, "amt"),
    (ColumnRole::Amount, "transaction amount"),
    (ColumnRole::Balance, "balance"),
    (ColumnRole::Balance, "bal"),
    (ColumnRole::Balance, "closing balance"),
    (ColumnRole::Balance, "running balance"),
    (ColumnRole::Balance, "available balance"),
    (ColumnRole::Reference, "ref"),
    (ColumnRole::Reference, "ref no"),
    (ColumnRole::Reference, "reference"),
    (ColumnRole::Reference, "reference no"),
    (ColumnRole::Reference, "cheque no"),
    (ColumnRole::Reference, "chq no"),
    (ColumnRole::Reference, "chq"),
    (ColumnRole::Reference, "transaction id"),
    (ColumnRole::Reference, "utr no"),
    (ColumnRole::Indicator, "type"),
    (ColumnRole::Indicator, "txn type"),
    (ColumnRole::Indicator, "transaction type"),
    (ColumnRole::Indicator, "dr cr"),
    (ColumnRole::Indicator, "cr dr"),
    (ColumnRole::Indicator, "debit credit"),
    (ColumnRole::Indicator, "credit debit"),
];

/// Header keywords that mark a table as carrying dates. Substring match on
/// the normalized header.
pub const DATE_HEADER_KEYWORDS: &[&str] = &["date", "value dt", "txn dt", "tran dt", "posting dt"];

/// Header keywords that mark a table as carrying money columns.
pub const AMOUNT_HEADER_KEYWORDS: &[&str] = &[
    "amount", "amt", "debit", "credit", "balance", "withdrawal", "deposit",
];

/// Whether `phrase` occurs in `label` as a contiguous run of whole words.
/// Both sides must already be normalized.
pub fn phrase_matches(label: &str, phrase: &str) -> bool {
    let words: Vec<&str> = label.split(' ').filter(|w| !w.is_empty()).collect();
    let needle: Vec<&str> = phrase.split(' ').filter(|w| !w.is_empty()).collect();
    if needle.is_empty() || needle.len() > words.len() {
        return false;
    }
    words.windows(needle.len()).any(|w| w == needle.as_slice())
}
