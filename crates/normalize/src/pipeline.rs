use chrono::NaiveDate;
use ledgerline_core::{RawTable, Transaction};
use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::assemble::{assemble_table, DropReason};
use crate::classify::{classify, Classification, RejectReason};
use crate::config::{ConfigError, NormalizeConfig};
use crate::mapping::{map_columns, AmountEncoding};
use crate::report::{QualityReport, TableReport};
use crate::validate::Validator;

#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Two tables claim the same position, so rows could not be traced back.
    #[error("Duplicate table key: page {page} table {table}")]
    InvalidInput { page: usize, table: usize },
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizeOutput {
    pub transactions: Vec<Transaction>,
    pub report: QualityReport,
}

/// Orchestrates: classify → map columns → assemble rows → validate, per table.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizeConfig,
    today: Option<NaiveDate>,
}

impl Normalizer {
    pub fn new(config: NormalizeConfig) -> Self {
        Self { config, today: None }
    }

    /// Pin the processing date used by the future-date check.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Normalize a batch of tables. Output is in `(page, table, row)` order
    /// whatever the input order.
    pub fn normalize(&self, tables: &[RawTable]) -> Result<NormalizeOutput, NormalizeError> {
        self.config.validate()?;
        let today = self.today();
        let mut keys = BTreeSet::new();
        let mut results = Vec::with_capacity(tables.len());

        for table in tables {
            check_unique(&mut keys, table)?;
            results.push(self.process(table, today));
        }

        Ok(finish(results))
    }

    /// Same as [`Normalizer::normalize`], for tables arriving over a channel.
    pub async fn normalize_stream(
        &self,
        mut rx: mpsc::Receiver<RawTable>,
    ) -> Result<NormalizeOutput, NormalizeError> {
        self.config.validate()?;
        let today = self.today();
        let mut keys = BTreeSet::new();
        let mut results = Vec::new();

        while let Some(table) = rx.recv().await {
            check_unique(&mut keys, &table)?;
            results.push(self.process(&table, today));
        }

        Ok(finish(results))
    }

    /// Normalize one table on its own.
    pub fn normalize_table(&self, table: &RawTable) -> (Vec<Transaction>, TableReport) {
        self.process(table, self.today())
    }

    fn process(&self, table: &RawTable, today: NaiveDate) -> (Vec<Transaction>, TableReport) {
        let decision = classify(table, &self.config);
        let mut report = TableReport::new(table.page, table.table, decision);

        if let Classification::Reject(reason) = decision {
            match reason {
                // Date header present, so this looked like a ledger.
                RejectReason::MissingAmountHeader
                | RejectReason::UnmappedColumns
                | RejectReason::NoDateColumn => tracing::warn!(
                    "Rejected table at page {} table {}: {}",
                    table.page,
                    table.table,
                    reason
                ),
                _ => tracing::info!(
                    "Skipping table at page {} table {}: {}",
                    table.page,
                    table.table,
                    reason
                ),
            }
            return (Vec::new(), report);
        }

        let mapping = map_columns(&table.header, &self.config.vocabulary);
        tracing::debug!(
            "Page {} table {} columns: {:?}",
            table.page,
            table.table,
            mapping.roles()
        );

        let assembled = assemble_table(table, &mapping, &self.config);
        report.rows_seen = table.rows.len();
        for (_, reason) in &assembled.drops {
            report.record_drop(*reason);
        }

        let single_amount = matches!(mapping.encoding(), AmountEncoding::Single(_));
        let validated = Validator::new(&self.config.validation, today)
            .with_sign_repair(single_amount)
            .validate(assembled.transactions);
        for _ in &validated.rejected {
            report.record_drop(DropReason::ImplausibleValue);
        }

        report.rows_accepted = validated.accepted.len();
        report.ambiguous_dates = validated.accepted.iter().filter(|t| t.date_ambiguous).count();
        report.sign_repairs = validated.sign_repairs;
        report.description_repairs = validated.description_repairs;
        report.balance_breaks = validated.balance_breaks;
        report.rejections = validated.rejected;
        report.mapping = Some(mapping);

        tracing::info!(
            "Page {} table {}: {} of {} rows accepted",
            table.page,
            table.table,
            report.rows_accepted,
            report.rows_seen
        );
        (validated.accepted, report)
    }
}

fn check_unique(keys: &mut BTreeSet<(usize, usize)>, table: &RawTable) -> Result<(), NormalizeError> {
    if keys.insert((table.page, table.table)) {
        Ok(())
    } else {
        Err(NormalizeError::InvalidInput {
            page: table.page,
            table: table.table,
        })
    }
}

fn finish(mut results: Vec<(Vec<Transaction>, TableReport)>) -> NormalizeOutput {
    results.sort_by_key(|(_, report)| (report.page, report.table));

    let mut transactions = Vec::new();
    let mut reports = Vec::with_capacity(results.len());
    for (txs, report) in results {
        transactions.extend(txs);
        reports.push(report);
    }
    let report = QualityReport::from_tables(reports);

    tracing::info!(
        "Normalized {} transactions from {} of {} tables ({} rows dropped)",
        report.rows_accepted,
        report.tables_accepted,
        report.tables_seen,
        report.rows_rejected
    );
    NormalizeOutput { transactions, report }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
