//! Cell-level parsers: dates, amounts and free text.
//!
//! Every parser works on a single cell string and never looks at neighbouring
//! cells. Date grammars are a static table tried in a fixed order; the first
//! grammar that consumes the whole cell wins.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use ledgerline_core::{DebitCredit, Money};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Empty cell")]
    Empty,
    #[error("Unrecognized date: {0}")]
    UnrecognizedDate(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_numeric_date,
    r"^(\d{1,2})([/.\-])(\d{1,2})([/.\-])(\d{4}|\d{2})$");
re!(re_day_month_name,
    r"(?i)^(\d{1,2})[\s./\-]+([a-z]{3,9})\.?[\s./\-]+(\d{4}|\d{2})$");
re!(re_month_name_day,
    r"(?i)^([a-z]{3,9})\.?\s+(\d{1,2}),?\s+(\d{4})$");
re!(re_compact_date,
    r"^(\d{2})(\d{2})(\d{4})$");
re!(re_iso_date,
    r"^(\d{4})([/.\-])(\d{1,2})([/.\-])(\d{1,2})$");
re!(re_time_suffix,
    r"(?i)[\sT]+\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?\s*(?:am|pm)?$");

re!(re_currency_code,
    r"(?i)\b(?:rs|inr|usd|eur|gbp|aud|cad)\b\.?");
re!(re_plain_number,
    r"^(?:\d+(?:\.\d+)?|\.\d+)$");

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹'];

const BLANK_PLACEHOLDERS: &[&str] = &["", "-", "--", "—", "nil", "n/a", "na", "null", "none", "nan"];

// ── Dates ────────────────────────────────────────────────────────────────────

/// One supported date layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateGrammar {
    /// `DD/MM/YYYY` (also `-` or `.` separated, two-digit years allowed)
    DayMonthYear,
    /// `MM/DD/YYYY`
    MonthDayYear,
    /// `DD-MMM-YYYY`, `DD MMM YYYY`, `01-March-2025`
    DayMonthNameYear,
    /// `Jan 15, 2024`
    MonthNameDayYear,
    /// `DDMMYYYY`
    Compact,
    /// `YYYY-MM-DD`
    Iso,
}

const DAY_FIRST_ORDER: &[DateGrammar] = &[
    DateGrammar::DayMonthYear,
    DateGrammar::MonthDayYear,
    DateGrammar::DayMonthNameYear,
    DateGrammar::MonthNameDayYear,
    DateGrammar::Compact,
    DateGrammar::Iso,
];

const MONTH_FIRST_ORDER: &[DateGrammar] = &[
    DateGrammar::MonthDayYear,
    DateGrammar::DayMonthYear,
    DateGrammar::DayMonthNameYear,
    DateGrammar::MonthNameDayYear,
    DateGrammar::Compact,
    DateGrammar::Iso,
];

impl DateGrammar {
    /// Grammars in the order they are tried.
    pub fn priority(day_first: bool) -> &'static [DateGrammar] {
        if day_first {
            DAY_FIRST_ORDER
        } else {
            MONTH_FIRST_ORDER
        }
    }

    pub fn read(self, s: &str) -> Option<NaiveDate> {
        match self {
            DateGrammar::DayMonthYear => {
                let (a, b, y) = numeric_parts(s)?;
                NaiveDate::from_ymd_opt(y, b, a)
            }
            DateGrammar::MonthDayYear => {
                let (a, b, y) = numeric_parts(s)?;
                NaiveDate::from_ymd_opt(y, a, b)
            }
            DateGrammar::DayMonthNameYear => {
                let c = re_day_month_name().captures(s)?;
                let day: u32 = c.get(1)?.as_str().parse().ok()?;
                let month = month_from_name(c.get(2)?.as_str())?;
                let year = expand_year(c.get(3)?.as_str())?;
                NaiveDate::from_ymd_opt(year, month, day)
            }
            DateGrammar::MonthNameDayYear => {
                let c = re_month_name_day().captures(s)?;
                let month = month_from_name(c.get(1)?.as_str())?;
                let day: u32 = c.get(2)?.as_str().parse().ok()?;
                let year: i32 = c.get(3)?.as_str().parse().ok()?;
                NaiveDate::from_ymd_opt(year, month, day)
            }
            DateGrammar::Compact => {
                let c = re_compact_date().captures(s)?;
                let day: u32 = c.get(1)?.as_str().parse().ok()?;
                let month: u32 = c.get(2)?.as_str().parse().ok()?;
                let year: i32 = c.get(3)?.as_str().parse().ok()?;
                NaiveDate::from_ymd_opt(year, month, day)
            }
            DateGrammar::Iso => {
                let c = re_iso_date().captures(s)?;
                if c.get(2)?.as_str() != c.get(4)?.as_str() {
                    return None;
                }
                let year: i32 = c.get(1)?.as_str().parse().ok()?;
                let month: u32 = c.get(3)?.as_str().parse().ok()?;
                let day: u32 = c.get(5)?.as_str().parse().ok()?;
                NaiveDate::from_ymd_opt(year, month, day)
            }
        }
    }
}

/// A parsed date, plus whether the cell also read validly under the other
/// numeric ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub date: NaiveDate,
    pub grammar: DateGrammar,
    pub ambiguous: bool,
}

pub fn parse_date(raw: &str, day_first: bool) -> Result<ParsedDate, FieldError> {
    let trimmed = parse_text(raw);
    if trimmed.is_empty() {
        return Err(FieldError::Empty);
    }
    let s = re_time_suffix().replace(&trimmed, "");
    let s = s.trim();

    for &grammar in DateGrammar::priority(day_first) {
        if let Some(date) = grammar.read(s) {
            let ambiguous = match grammar {
                DateGrammar::DayMonthYear => {
                    DateGrammar::MonthDayYear.read(s).is_some_and(|alt| alt != date)
                }
                DateGrammar::MonthDayYear => {
                    DateGrammar::DayMonthYear.read(s).is_some_and(|alt| alt != date)
                }
                _ => false,
            };
            return Ok(ParsedDate { date, grammar, ambiguous });
        }
    }

    Err(FieldError::UnrecognizedDate(trimmed))
}

fn numeric_parts(s: &str) -> Option<(u32, u32, i32)> {
    let c = re_numeric_date().captures(s)?;
    if c.get(2)?.as_str() != c.get(4)?.as_str() {
        return None;
    }
    let a: u32 = c.get(1)?.as_str().parse().ok()?;
    let b: u32 = c.get(3)?.as_str().parse().ok()?;
    let y = expand_year(c.get(5)?.as_str())?;
    Some((a, b, y))
}

/// Two-digit years pivot at 50.
fn expand_year(s: &str) -> Option<i32> {
    let y: i32 = s.parse().ok()?;
    Some(match s.len() {
        2 if y < 50 => 2000 + y,
        2 => 1900 + y,
        _ => y,
    })
}

const MONTH_NAMES: [&str; 12] = [
    "january", "february", "march", "april", "may", "june",
    "july", "august", "september", "october", "november", "december",
];

fn month_from_name(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    if name == "sept" {
        return Some(9);
    }
    MONTH_NAMES
        .iter()
        .position(|full| *full == name || (name.len() == 3 && full.starts_with(name.as_str())))
        .map(|i| i as u32 + 1)
}

// ── Amounts ──────────────────────────────────────────────────────────────────

/// True for cells that carry no value: empty, whitespace, or a placeholder dash.
pub fn is_blank(raw: &str) -> bool {
    let s = raw.trim().to_lowercase();
    BLANK_PLACEHOLDERS.contains(&s.as_str())
}

/// Parse a monetary cell into an exact signed decimal.
///
/// A trailing `Dr`/`Cr` (or `D`/`C`) suffix decides the sign outright.
/// Otherwise parentheses, a leading `-` or a trailing `-` make it negative.
pub fn parse_amount(raw: &str) -> Result<Money, FieldError> {
    if is_blank(raw) {
        return Err(FieldError::Empty);
    }
    let invalid = || FieldError::InvalidAmount(raw.trim().to_string());

    let mut s = raw.trim().to_lowercase();
    let forced_negative = strip_sign_suffix(&mut s);

    s = re_currency_code().replace_all(&s, "").into_owned();
    s.retain(|c| !CURRENCY_SYMBOLS.contains(&c));
    let mut s = s.trim().to_string();

    let mut negative = false;
    if s.starts_with('(') && s.ends_with(')') && s.len() >= 2 {
        negative = true;
        s = s[1..s.len() - 1].trim().to_string();
    }
    if let Some(rest) = s.strip_prefix('-') {
        negative = !negative;
        s = rest.trim_start().to_string();
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest.trim_start().to_string();
    }
    if let Some(rest) = s.strip_suffix('-') {
        negative = !negative;
        s = rest.trim_end().to_string();
    }

    let digits = strip_grouping(&s);
    if !re_plain_number().is_match(&digits) {
        return Err(invalid());
    }
    let digits = if digits.starts_with('.') { format!("0{digits}") } else { digits };
    let magnitude = Decimal::from_str(&digits).map_err(|_| invalid())?;

    let signed = match forced_negative {
        Some(true) => -magnitude,
        Some(false) => magnitude,
        None if negative => -magnitude,
        None => magnitude,
    };
    Ok(Money::from_decimal(signed))
}

/// Removes a trailing Dr/Cr marker; `Some(true)` means debit.
fn strip_sign_suffix(s: &mut String) -> Option<bool> {
    let body = s.trim_end().trim_end_matches('.');
    let (marker_len, negative) = if body.ends_with("dr") {
        (2, true)
    } else if body.ends_with("cr") {
        (2, false)
    } else if body.ends_with('d') {
        (1, true)
    } else if body.ends_with('c') {
        (1, false)
    } else {
        return None;
    };
    let rest = &body[..body.len() - marker_len];
    // Only a marker when it follows the number, not when it ends a word.
    if !rest.ends_with(|c: char| c.is_ascii_digit() || c.is_whitespace() || c == ')' || c == '.') {
        return None;
    }
    *s = rest.trim_end().to_string();
    Some(negative)
}

const DEBIT_MARKERS: &[&str] = &["dr", "d", "debit", "db", "withdrawal", "wdl"];
const CREDIT_MARKERS: &[&str] = &["cr", "c", "credit", "deposit", "dep"];

/// Read a debit/credit marker cell such as `DR`, `Cr.` or `Debit`. `None`
/// for blanks and for text that names neither side or both.
pub fn parse_indicator(raw: &str) -> Option<DebitCredit> {
    let label = normalize_label(raw);
    let debit = label.split(' ').any(|w| DEBIT_MARKERS.contains(&w));
    let credit = label.split(' ').any(|w| CREDIT_MARKERS.contains(&w));
    match (debit, credit) {
        (true, false) => Some(DebitCredit::Debit),
        (false, true) => Some(DebitCredit::Credit),
        _ => None,
    }
}

/// Drops thousands separators. A lone comma followed by one or two digits,
/// or a comma after the last dot, is read as the decimal separator.
fn strip_grouping(s: &str) -> String {
    let s: String = s.chars().filter(|c| !c.is_whitespace() && *c != '\'').collect();
    let last_dot = s.rfind('.');
    let last_comma = s.rfind(',');
    let decimal_comma = match (last_dot, last_comma) {
        (Some(d), Some(c)) => c > d,
        (None, Some(c)) => s.matches(',').count() == 1 && (1..=2).contains(&(s.len() - c - 1)),
        _ => false,
    };
    if decimal_comma {
        s.replace('.', "").replace(',', ".")
    } else {
        s.replace(',', "")
    }
}

// ── Text ─────────────────────────────────────────────────────────────────────

/// Strip control characters and collapse runs of whitespace.
pub fn parse_text(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercase, punctuation to spaces, whitespace collapsed. Used for header
/// and keyword matching.
pub fn normalize_label(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_alphanumeric() { c.to_lowercase().next().unwrap_or(c) } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Tests ────────────────────────────────────────────────────────────────────
