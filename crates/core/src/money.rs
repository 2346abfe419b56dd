use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// Signed monetary value. Positive is an inflow (credit), negative an outflow (debit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    /// Keeps the parsed scale, padded to at least two fractional digits.
    pub fn from_decimal(decimal: Decimal) -> Self {
        let mut d = decimal;
        if d.scale() < 2 {
            d.rescale(2);
        }
        Money(d)
    }

    pub fn zero() -> Self {
        Money::from_decimal(Decimal::ZERO)
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    /// `None` when the sum leaves the representable range.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Money::from_decimal)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Money::from_decimal)
    }
}

impl From<Decimal> for Money {
    fn from(decimal: Decimal) -> Self {
        Money::from_decimal(decimal)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money::from_decimal(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money::from_decimal(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn m(s: &str) -> Money {
        Money::from_decimal(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn pads_to_two_fraction_digits() {
        assert_eq!(m("125").to_string(), "125.00");
        assert_eq!(m("125.5").to_string(), "125.50");
    }

    #[test]
    fn keeps_extra_precision() {
        assert_eq!(m("0.125").to_string(), "0.125");
    }

    #[test]
    fn equality_ignores_scale() {
        assert_eq!(m("10.5"), m("10.500"));
    }

    #[test]
    fn arithmetic_is_exact() {
        assert_eq!(m("0.10") + m("0.20"), m("0.30"));
        assert_eq!(m("1542.75") - m("125.50"), m("1417.25"));
    }

    #[test]
    fn checked_ops_report_overflow() {
        let max = Money::from_decimal(Decimal::MAX);
        assert_eq!(max.checked_add(m("1")), None);
        assert_eq!((-max).checked_sub(m("1")), None);
        assert_eq!(m("5").checked_add(m("2.50")), Some(m("7.50")));
        assert_eq!(m("5").checked_sub(m("7")), Some(m("-2")));
    }

    #[test]
    fn sign_helpers() {
        assert!(m("-1").is_negative());
        assert!(!m("1").is_negative());
        assert!(!Money::zero().is_negative());
        assert_eq!(-m("3.20"), m("-3.20"));
        assert_eq!(m("-3.20").abs(), m("3.20"));
    }
}
