use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::money::Money;
use super::table::SourceRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebitCredit {
    Debit,
    Credit,
}

impl DebitCredit {
    pub fn of(amount: Money) -> Self {
        if amount.is_negative() {
            DebitCredit::Debit
        } else {
            DebitCredit::Credit
        }
    }
}

impl fmt::Display for DebitCredit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebitCredit::Debit => write!(f, "debit"),
            DebitCredit::Credit => write!(f, "credit"),
        }
    }
}

impl std::str::FromStr for DebitCredit {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debit" => Ok(DebitCredit::Debit),
            "credit" => Ok(DebitCredit::Credit),
            other => Err(format!("Unknown debit/credit label: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("Transaction amount must not be zero ({0})")]
    ZeroAmount(SourceRef),
}

/// One normalized statement line.
///
/// `amount` and `debit_credit` can only change together, so the label never
/// contradicts the sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    amount: Money,
    debit_credit: DebitCredit,
    pub balance: Option<Money>,
    pub reference: Option<String>,
    pub source: SourceRef,
    pub category: Option<String>,
    /// The date cell read validly as both DD/MM and MM/DD.
    pub date_ambiguous: bool,
}

impl Transaction {
    pub fn new(
        date: NaiveDate,
        description: impl Into<String>,
        amount: Money,
        source: SourceRef,
    ) -> Result<Self, TransactionError> {
        if amount.is_zero() {
            return Err(TransactionError::ZeroAmount(source));
        }
        Ok(Transaction {
            date,
            description: description.into(),
            amount,
            debit_credit: DebitCredit::of(amount),
            balance: None,
            reference: None,
            source,
            category: None,
            date_ambiguous: false,
        })
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn debit_credit(&self) -> DebitCredit {
        self.debit_credit
    }

    pub fn set_amount(&mut self, amount: Money) -> Result<(), TransactionError> {
        if amount.is_zero() {
            return Err(TransactionError::ZeroAmount(self.source));
        }
        self.amount = amount;
        self.debit_credit = DebitCredit::of(amount);
        Ok(())
    }

    pub fn is_debit(&self) -> bool {
        self.debit_credit == DebitCredit::Debit
    }

    pub fn with_balance(mut self, balance: Option<Money>) -> Self {
        self.balance = balance;
        self
    }

    pub fn with_reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }

    pub fn with_date_ambiguous(mut self, ambiguous: bool) -> Self {
        self.date_ambiguous = ambiguous;
        self
    }
}
