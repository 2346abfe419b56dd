use serde::{Deserialize, Serialize};
use std::fmt;

use crate::fields::normalize_label;
use crate::vocabulary::{phrase_matches, VocabularyEntry, VOCABULARY};

/// Canonical meaning of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnRole {
    Date,
    Description,
    Debit,
    Credit,
    Amount,
    Balance,
    Reference,
    /// Debit/credit marker beside a single unsigned amount column.
    Indicator,
    Ignore,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnRole::Date => "DATE",
            ColumnRole::Description => "DESCRIPTION",
            ColumnRole::Debit => "DEBIT",
            ColumnRole::Credit => "CREDIT",
            ColumnRole::Amount => "AMOUNT",
            ColumnRole::Balance => "BALANCE",
            ColumnRole::Reference => "REFERENCE",
            ColumnRole::Indicator => "INDICATOR",
            ColumnRole::Ignore => "IGNORE",
        };
        write!(f, "{s}")
    }
}

/// How a table encodes transaction amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountEncoding {
    /// Separate debit and credit columns (either may be missing).
    Split { debit: Option<usize>, credit: Option<usize> },
    /// One signed amount column.
    Single(usize),
    Missing,
}

/// Role per header column. Columns past the header are `Ignore`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    roles: Vec<ColumnRole>,
}

impl ColumnMapping {
    pub fn from_roles(roles: Vec<ColumnRole>) -> Self {
        Self { roles }
    }

    pub fn role(&self, col: usize) -> ColumnRole {
        self.roles.get(col).copied().unwrap_or(ColumnRole::Ignore)
    }

    pub fn roles(&self) -> &[ColumnRole] {
        &self.roles
    }

    pub fn column_for(&self, role: ColumnRole) -> Option<usize> {
        if role == ColumnRole::Ignore {
            return None;
        }
        self.roles.iter().position(|r| *r == role)
    }

    pub fn encoding(&self) -> AmountEncoding {
        let debit = self.column_for(ColumnRole::Debit);
        let credit = self.column_for(ColumnRole::Credit);
        if debit.is_some() || credit.is_some() {
            AmountEncoding::Split { debit, credit }
        } else if let Some(col) = self.column_for(ColumnRole::Amount) {
            AmountEncoding::Single(col)
        } else {
            AmountEncoding::Missing
        }
    }
}

/// Assign a role to every header column.
///
/// Each column takes its most specific (longest) matching vocabulary phrase
/// whose role is still free; earlier columns win. `Amount` is dropped when a
/// debit or credit column exists. An indicator column is dropped beside split
/// columns, and becomes the amount column when its header names both sides
/// and no other amount column exists.
pub fn map_columns(header: &[String], extra: &[VocabularyEntry]) -> ColumnMapping {
    let mut roles = vec![ColumnRole::Ignore; header.len()];
    let mut taken: Vec<ColumnRole> = Vec::new();
    let mut indicator_names_sides = false;

    for (col, raw) in header.iter().enumerate() {
        let label = normalize_label(raw);
        if label.is_empty() {
            continue;
        }

        let mut candidates: Vec<(usize, ColumnRole)> = VOCABULARY
            .iter()
            .map(|(role, phrase)| (*role, *phrase))
            .chain(extra.iter().map(|e| (e.role, e.phrase.as_str())))
            .filter(|(role, _)| *role != ColumnRole::Ignore)
            .filter_map(|(role, phrase)| {
                let phrase = normalize_label(phrase);
                phrase_matches(&label, &phrase).then_some((phrase.len(), role))
            })
            .collect();
        // Longest phrase first, then role declaration order.
        candidates.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        let mut seen = Vec::new();
        candidates.retain(|(_, role)| {
            let first = !seen.contains(role);
            seen.push(*role);
            first
        });

        // A "Dr/Cr" or "Type" column holds markers, never one side's amounts.
        if candidates.first().is_some_and(|(_, top)| *top == ColumnRole::Indicator) {
            candidates.retain(|(_, role)| !matches!(role, ColumnRole::Debit | ColumnRole::Credit));
        }
        let names_sides = seen.iter().any(|r| matches!(r, ColumnRole::Debit | ColumnRole::Credit));

        if candidates.len() > 1 {
            tracing::debug!(
                "Header '{}' matches several roles: {:?}; preferring the most specific",
                raw,
                candidates.iter().map(|c| c.1).collect::<Vec<_>>()
            );
        }

        if let Some((_, role)) = candidates.iter().find(|(_, role)| !taken.contains(role)) {
            roles[col] = *role;
            taken.push(*role);
            if *role == ColumnRole::Indicator {
                indicator_names_sides = names_sides;
            }
        } else if !candidates.is_empty() {
            tracing::debug!("Header '{}' lost every role to an earlier column", raw);
        }
    }

    let split = taken.contains(&ColumnRole::Debit) || taken.contains(&ColumnRole::Credit);
    if split && taken.contains(&ColumnRole::Amount) {
        for role in roles.iter_mut().filter(|r| **r == ColumnRole::Amount) {
            tracing::debug!("Separate debit/credit columns present; ignoring the amount column");
            *role = ColumnRole::Ignore;
        }
    }

    if let Some(col) = roles.iter().position(|r| *r == ColumnRole::Indicator) {
        if split {
            tracing::debug!("Separate debit/credit columns present; ignoring the indicator column");
            roles[col] = ColumnRole::Ignore;
        } else if !taken.contains(&ColumnRole::Amount) {
            if indicator_names_sides {
                tracing::debug!("Header '{}' carries signed amounts", header[col]);
                roles[col] = ColumnRole::Amount;
            } else {
                roles[col] = ColumnRole::Ignore;
            }
        }
    }

    ColumnMapping { roles }
}
