//! Amount codec between human decimal strings and ledger units.
//!
//! The ledger stores value as a fixed-point integer: one whole unit of the
//! native currency is 10^18 ledger units. Amounts are kept as `u128` so no
//! floating-point arithmetic is ever involved.
//!
//! Conversion is strict: an input that carries more than 18 fractional digits
//! cannot be represented exactly and is rejected rather than truncated.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of fractional decimal digits in one whole unit.
pub const DECIMALS: usize = 18;

/// Ledger units per whole unit (10^18).
pub const UNITS_PER_WHOLE: u128 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("amount must not be negative: {0}")]
    Negative(String),

    #[error("amount is not a plain decimal number: {0}")]
    Malformed(String),

    #[error("amount has {digits} fractional digits, at most 18 are representable")]
    TooPrecise { digits: usize },

    #[error("amount exceeds the representable range: {0}")]
    Overflow(String),
}

/// A value expressed in ledger units (amount × 10^18).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LedgerUnits(u128);

impl LedgerUnits {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for LedgerUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&from_ledger_units(*self))
    }
}

/// Scale a non-negative decimal string by 10^18.
///
/// Accepts `digits` or `digits.digits` (surrounding whitespace ignored).
/// Signs, exponents, and separators are rejected, as is any fraction longer
/// than 18 digits.
pub fn to_ledger_units(input: &str) -> Result<LedgerUnits, AmountError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(AmountError::Empty);
    }
    if s.starts_with('-') {
        return Err(AmountError::Negative(s.to_string()));
    }

    let (whole, fraction) = match s.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (s, None),
    };

    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::Malformed(s.to_string()));
    }
    if let Some(f) = fraction {
        if f.is_empty() || !f.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::Malformed(s.to_string()));
        }
        if f.len() > DECIMALS {
            return Err(AmountError::TooPrecise { digits: f.len() });
        }
    }

    let overflow = || AmountError::Overflow(s.to_string());

    let whole_units = parse_digits(whole)
        .and_then(|w| w.checked_mul(UNITS_PER_WHOLE))
        .ok_or_else(overflow)?;

    let fraction_units = match fraction {
        Some(f) => {
            let scale = 10u128.pow((DECIMALS - f.len()) as u32);
            parse_digits(f)
                .and_then(|v| v.checked_mul(scale))
                .ok_or_else(overflow)?
        }
        None => 0,
    };

    whole_units
        .checked_add(fraction_units)
        .map(LedgerUnits)
        .ok_or_else(overflow)
}

/// Render ledger units as a canonical decimal string.
///
/// Whole amounts carry no decimal point; fractional amounts carry no trailing
/// zeros. `to_ledger_units(&from_ledger_units(x)) == Ok(x)` for every `x`.
pub fn from_ledger_units(units: LedgerUnits) -> String {
    let whole = units.0 / UNITS_PER_WHOLE;
    let fraction = units.0 % UNITS_PER_WHOLE;
    if fraction == 0 {
        return whole.to_string();
    }
    let padded = format!("{fraction:0width$}", width = DECIMALS);
    format!("{whole}.{}", padded.trim_end_matches('0'))
}

fn parse_digits(digits: &str) -> Option<u128> {
    digits.bytes().try_fold(0u128, |acc, b| {
        acc.checked_mul(10)?.checked_add(u128::from(b - b'0'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_whole_and_fractional_amounts() {
        assert_eq!(to_ledger_units("1").unwrap().raw(), UNITS_PER_WHOLE);
        assert_eq!(to_ledger_units("0.01").unwrap().raw(), 10_000_000_000_000_000);
        assert_eq!(to_ledger_units("0").unwrap(), LedgerUnits::ZERO);
        assert_eq!(to_ledger_units(" 2.5 ").unwrap().raw(), 2_500_000_000_000_000_000);
    }

    #[test]
    fn smallest_unit_is_accepted() {
        assert_eq!(to_ledger_units("0.000000000000000001").unwrap().raw(), 1);
    }

    #[test]
    fn over_precision_is_rejected_not_truncated() {
        assert_eq!(
            to_ledger_units("0.0000000000000000001"),
            Err(AmountError::TooPrecise { digits: 19 })
        );
    }

    #[test]
    fn rejects_negative_and_non_numeric() {
        assert!(matches!(to_ledger_units("-1"), Err(AmountError::Negative(_))));
        assert!(matches!(to_ledger_units("abc"), Err(AmountError::Malformed(_))));
        assert!(matches!(to_ledger_units("1e18"), Err(AmountError::Malformed(_))));
        assert!(matches!(to_ledger_units("+1"), Err(AmountError::Malformed(_))));
        assert!(matches!(to_ledger_units(".5"), Err(AmountError::Malformed(_))));
        assert!(matches!(to_ledger_units("5."), Err(AmountError::Malformed(_))));
        assert!(matches!(to_ledger_units("1.2.3"), Err(AmountError::Malformed(_))));
        assert!(matches!(to_ledger_units("NaN"), Err(AmountError::Malformed(_))));
        assert_eq!(to_ledger_units("   "), Err(AmountError::Empty));
    }

    #[test]
    fn rejects_values_beyond_u128() {
        // u128::MAX / 10^18 is roughly 3.4e20 whole units.
        assert!(matches!(
            to_ledger_units("340282366920938463464"),
            Err(AmountError::Overflow(_))
        ));
        assert!(to_ledger_units("340282366920938463463").is_ok());
    }

    #[test]
    fn renders_canonical_form() {
        assert_eq!(from_ledger_units(LedgerUnits::new(UNITS_PER_WHOLE)), "1");
        assert_eq!(from_ledger_units(LedgerUnits::new(10_000_000_000_000_000)), "0.01");
        assert_eq!(from_ledger_units(LedgerUnits::ZERO), "0");
        assert_eq!(from_ledger_units(LedgerUnits::new(1)), "0.000000000000000001");
    }

    #[test]
    fn non_canonical_input_keeps_its_value() {
        let units = to_ledger_units("001.50").unwrap();
        assert_eq!(from_ledger_units(units), "1.5");
    }

    #[test]
    fn display_matches_decimal_rendering() {
        let units = to_ledger_units("12.345").unwrap();
        assert_eq!(units.to_string(), "12.345");
    }
}
