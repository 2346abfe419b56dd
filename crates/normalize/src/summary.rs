//! Statement-level totals over a normalized transaction sequence.

use ledgerline_core::{DateRange, Money, Transaction};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementSummary {
    pub transactions: usize,
    pub debits: usize,
    pub credits: usize,
    /// Sum of debit magnitudes, positive.
    pub total_debits: Money,
    pub total_credits: Money,
    pub net_change: Money,
    pub period: DateRange,
    /// Balance before the first transaction, when it carries one.
    pub opening_balance: Option<Money>,
    /// Balance of the last transaction that carries one.
    pub closing_balance: Option<Money>,
}

impl StatementSummary {
    /// `None` for an empty sequence, or when the totals leave the decimal
    /// range. Expects document order.
    pub fn from_transactions(transactions: &[Transaction]) -> Option<Self> {
        let period = DateRange::spanning(transactions.iter().map(|t| t.date))?;

        let (mut debits, mut credits) = (0, 0);
        let (mut total_debits, mut total_credits) = (Money::zero(), Money::zero());
        for t in transactions {
            if t.is_debit() {
                debits += 1;
                total_debits = total_debits.checked_add(t.amount().abs())?;
            } else {
                credits += 1;
                total_credits = total_credits.checked_add(t.amount())?;
            }
        }

        let opening_balance = transactions
            .first()
            .and_then(|t| t.balance.and_then(|b| b.checked_sub(t.amount())));
        let closing_balance = transactions.iter().rev().find_map(|t| t.balance);

        let net_change = total_credits.checked_sub(total_debits)?;

        Some(StatementSummary {
            transactions: transactions.len(),
            debits,
            credits,
            total_debits,
            total_credits,
            net_change,
            period,
            opening_balance,
            closing_balance,
        })
    }
}
