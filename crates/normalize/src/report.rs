use serde::Serialize;
use std::collections::BTreeMap;

use crate::assemble::DropReason;
use crate::classify::Classification;
use crate::mapping::ColumnMapping;
use crate::validate::Rejection;

/// What happened to one input table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableReport {
    pub page: usize,
    pub table: usize,
    pub decision: Classification,
    /// Present only for accepted tables.
    pub mapping: Option<ColumnMapping>,
    pub rows_seen: usize,
    pub rows_accepted: usize,
    pub ambiguous_dates: usize,
    pub sign_repairs: usize,
    pub description_repairs: usize,
    pub balance_breaks: usize,
    pub drops: BTreeMap<DropReason, usize>,
    pub rejections: Vec<Rejection>,
}

impl TableReport {
    pub fn new(page: usize, table: usize, decision: Classification) -> Self {
        Self {
            page,
            table,
            decision,
            mapping: None,
            rows_seen: 0,
            rows_accepted: 0,
            ambiguous_dates: 0,
            sign_repairs: 0,
            description_repairs: 0,
            balance_breaks: 0,
            drops: BTreeMap::new(),
            rejections: Vec::new(),
        }
    }

    pub fn rows_rejected(&self) -> usize {
        self.drops.values().sum()
    }

    pub(crate) fn record_drop(&mut self, reason: DropReason) {
        *self.drops.entry(reason).or_insert(0) += 1;
    }
}

/// Run-level data quality summary, aggregated from the per-table reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QualityReport {
    pub tables_seen: usize,
    pub tables_accepted: usize,
    pub rows_seen: usize,
    pub rows_accepted: usize,
    pub rows_rejected: usize,
    pub ambiguous_dates: usize,
    pub sign_repairs: usize,
    pub description_repairs: usize,
    pub balance_breaks: usize,
    pub drops: BTreeMap<DropReason, usize>,
    pub tables: Vec<TableReport>,
}

impl QualityReport {
    /// Tables are sorted into document order before totals are summed.
    pub fn from_tables(mut tables: Vec<TableReport>) -> Self {
        tables.sort_by_key(|t| (t.page, t.table));

        let mut report = QualityReport {
            tables_seen: tables.len(),
            ..Default::default()
        };
        for t in &tables {
            if t.decision.is_accept() {
                report.tables_accepted += 1;
            }
            report.rows_seen += t.rows_seen;
            report.rows_accepted += t.rows_accepted;
            report.rows_rejected += t.rows_rejected();
            report.ambiguous_dates += t.ambiguous_dates;
            report.sign_repairs += t.sign_repairs;
            report.description_repairs += t.description_repairs;
            report.balance_breaks += t.balance_breaks;
            for (reason, n) in &t.drops {
                *report.drops.entry(*reason).or_insert(0) += n;
            }
        }
        report.tables = tables;
        report
    }

    pub fn dropped(&self, reason: DropReason) -> usize {
        self.drops.get(&reason).copied().unwrap_or(0)
    }
}
