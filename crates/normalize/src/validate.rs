//! Plausibility checks and repairs over one table's assembled transactions.

use chrono::{Datelike, Duration, NaiveDate};
use ledgerline_core::{Money, SourceRef, Transaction};
use serde::Serialize;
use std::fmt;

use crate::config::ValidationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Implausibility {
    AmountTooLarge,
    DateTooEarly,
    DateInFuture,
    /// Neither a description nor a balance to tell the line apart.
    NoIdentifyingText,
}

impl fmt::Display for Implausibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Implausibility::AmountTooLarge => "AMOUNT_TOO_LARGE",
            Implausibility::DateTooEarly => "DATE_TOO_EARLY",
            Implausibility::DateInFuture => "DATE_IN_FUTURE",
            Implausibility::NoIdentifyingText => "NO_IDENTIFYING_TEXT",
        };
        write!(f, "{s}")
    }
}

/// A transaction the validator refused, kept for the quality report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub source: SourceRef,
    pub reasons: Vec<Implausibility>,
    pub transaction: Transaction,
}

#[derive(Debug, Default)]
pub struct Validated {
    pub accepted: Vec<Transaction>,
    pub rejected: Vec<Rejection>,
    pub sign_repairs: usize,
    pub description_repairs: usize,
    /// Consecutive balances that no signing of the amount reconciles.
    pub balance_breaks: usize,
}

pub struct Validator<'a> {
    config: &'a ValidationConfig,
    today: NaiveDate,
    repair_signs: bool,
}

impl<'a> Validator<'a> {
    pub fn new(config: &'a ValidationConfig, today: NaiveDate) -> Self {
        Self {
            config,
            today,
            repair_signs: config.repair_sign_from_balance,
        }
    }

    /// Sign repair only makes sense when the amount column was unsigned
    /// text; split debit/credit columns already fix the sign.
    pub fn with_sign_repair(mut self, enabled: bool) -> Self {
        self.repair_signs = self.config.repair_sign_from_balance && enabled;
        self
    }

    /// Repair then check transactions of a single table, in row order.
    pub fn validate(&self, transactions: Vec<Transaction>) -> Validated {
        let mut out = Validated::default();
        let mut previous_balance: Option<Money> = None;

        for mut tx in transactions {
            if tx.description.is_empty() {
                if let Some(reference) = tx.reference.clone() {
                    tx.description = reference;
                    out.description_repairs += 1;
                }
            }

            if let (Some(prev), Some(balance)) = (previous_balance, tx.balance) {
                let amount = tx.amount();
                // Out-of-range sums come from garbled balances; they can never reconcile.
                let forward = prev.checked_add(amount);
                let reversed = prev.checked_sub(amount);
                if forward != Some(balance) {
                    if self.repair_signs && reversed == Some(balance) {
                        tracing::debug!(
                            "Flipping sign at {}: balance {} -> {} implies {}",
                            tx.source,
                            prev,
                            balance,
                            -amount
                        );
                        if tx.set_amount(-amount).is_ok() {
                            out.sign_repairs += 1;
                        }
                    } else {
                        tracing::warn!(
                            "Balance break at {}: {} + {} != {}",
                            tx.source,
                            prev,
                            amount,
                            balance
                        );
                        out.balance_breaks += 1;
                    }
                }
            }
            previous_balance = tx.balance;

            let reasons = self.check(&tx);
            if reasons.is_empty() {
                out.accepted.push(tx);
            } else {
                tracing::debug!("Rejecting {}: {:?}", tx.source, reasons);
                out.rejected.push(Rejection {
                    source: tx.source,
                    reasons,
                    transaction: tx,
                });
            }
        }

        out
    }

    /// Last acceptable date; saturates rather than overflowing the calendar.
    fn latest_date(&self) -> NaiveDate {
        Duration::try_days(self.config.future_tolerance_days)
            .and_then(|d| self.today.checked_add_signed(d))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn check(&self, tx: &Transaction) -> Vec<Implausibility> {
        let mut reasons = Vec::new();
        if tx.amount().abs().as_decimal() > self.config.max_abs_amount {
            reasons.push(Implausibility::AmountTooLarge);
        }
        if tx.date.year() < self.config.earliest_year {
            reasons.push(Implausibility::DateTooEarly);
        }
        if tx.date > self.latest_date() {
            reasons.push(Implausibility::DateInFuture);
        }
        if tx.description.trim().is_empty() && tx.balance.is_none() {
            reasons.push(Implausibility::NoIdentifyingText);
        }
        reasons
    }
}
