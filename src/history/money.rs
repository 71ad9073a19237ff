//! Monetary literal conversion.
//!
//! Every amount in a hand history goes through [`parse_amount`]. Tournament
//! chips are whole numbers and are kept as-is. Cash game currency is scaled
//! into integer minor units (cents) by splitting the decimal string, never
//! by floating point multiplication.
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Amount in integer minor units: chips for tournaments, cents for cash.
pub type Amount = i64;

/// The largest chip count accepted from a hand history.
pub const MAX_SAFE_CHIPS: Amount = 1_000_000_000_000;

/// The largest currency amount accepted, in minor units.
pub const MAX_SAFE_CURRENCY_MINOR: Amount = 10_000_000_000;

/// Minor units per currency unit.
const MINOR_PER_UNIT: Amount = 100;
const MINOR_DIGITS: usize = 2;

const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

/// How a numeric literal should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoneyUnit {
    /// Integer tournament chips, no scaling.
    Chips,
    /// Fractional currency scaled to minor units.
    Currency,
}

#[derive(Error, Debug, PartialEq, Eq, Clone, Hash)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount {0:?} is negative")]
    Negative(String),
    #[error("amount {0:?} has more than one decimal point")]
    MultipleDecimalPoints(String),
    #[error("amount {0:?} is not a number")]
    NotANumber(String),
    #[error("chip amount {0:?} has a fractional part")]
    FractionalChips(String),
    #[error("amount {0:?} has more precision than minor units allow")]
    TooPrecise(String),
    #[error("amount {raw:?} exceeds the maximum of {max}")]
    Overflow { raw: String, max: Amount },
}

/// Strip symbols, trailing currency codes and thousands separators.
fn clean(raw: &str) -> String {
    let trimmed = raw.trim();
    // "10.00 USD" or "10.00USD"
    let without_code = trimmed.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    without_code
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && *c != ',' && !c.is_whitespace())
        .collect()
}

fn digits_to_amount(digits: &str, raw: &str, max: Amount) -> Result<Amount, AmountError> {
    if digits.is_empty() {
        return Ok(0);
    }
    digits.chars().try_fold(0 as Amount, |acc, c| {
        let d = c
            .to_digit(10)
            .ok_or_else(|| AmountError::NotANumber(raw.to_string()))?;
        acc.checked_mul(10)
            .and_then(|v| v.checked_add(d as Amount))
            .filter(|v| *v <= max)
            .ok_or_else(|| AmountError::Overflow {
                raw: raw.to_string(),
                max,
            })
    })
}

/// Convert a printed amount into integer minor units.
///
/// # Examples
/// ```
/// use rs_poker_replay::history::{MoneyUnit, parse_amount};
///
/// assert_eq!(Ok(1_500), parse_amount("1,500", MoneyUnit::Chips));
/// assert_eq!(Ok(1_005), parse_amount("$10.05", MoneyUnit::Currency));
/// assert_eq!(Ok(50), parse_amount("€0.5", MoneyUnit::Currency));
/// ```
pub fn parse_amount(raw: &str, unit: MoneyUnit) -> Result<Amount, AmountError> {
    let cleaned = clean(raw);
    if cleaned.is_empty() {
        return Err(AmountError::Empty);
    }
    if cleaned.starts_with('-') {
        return Err(AmountError::Negative(raw.to_string()));
    }

    let mut parts = cleaned.split('.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next();
    if parts.next().is_some() {
        return Err(AmountError::MultipleDecimalPoints(raw.to_string()));
    }
    if whole.is_empty() && fraction.is_none_or(str::is_empty) {
        return Err(AmountError::NotANumber(raw.to_string()));
    }
    if let Some(f) = fraction
        && !f.chars().all(|c| c.is_ascii_digit())
    {
        return Err(AmountError::NotANumber(raw.to_string()));
    }

    match unit {
        MoneyUnit::Chips => {
            if fraction.is_some_and(|f| f.chars().any(|c| c != '0')) {
                return Err(AmountError::FractionalChips(raw.to_string()));
            }
            digits_to_amount(whole, raw, MAX_SAFE_CHIPS)
        }
        MoneyUnit::Currency => {
            let fraction = fraction.unwrap_or_default();
            let (kept, rest) = fraction.split_at(fraction.len().min(MINOR_DIGITS));
            if rest.chars().any(|c| c != '0') {
                return Err(AmountError::TooPrecise(raw.to_string()));
            }
            let units = digits_to_amount(whole, raw, MAX_SAFE_CURRENCY_MINOR / MINOR_PER_UNIT)?;
            let padded = format!("{kept:0<width$}", width = MINOR_DIGITS);
            let minor = digits_to_amount(&padded, raw, MINOR_PER_UNIT - 1)?;
            units
                .checked_mul(MINOR_PER_UNIT)
                .and_then(|v| v.checked_add(minor))
                .filter(|v| *v <= MAX_SAFE_CURRENCY_MINOR)
                .ok_or_else(|| AmountError::Overflow {
                    raw: raw.to_string(),
                    max: MAX_SAFE_CURRENCY_MINOR,
                })
        }
    }
}

/// Render an amount back in the unit it was parsed from.
pub fn format_amount(amount: Amount, unit: MoneyUnit) -> String {
    match unit {
        MoneyUnit::Chips => amount.to_string(),
        MoneyUnit::Currency => {
            let sign = if amount < 0 { "-" } else { "" };
            let abs = amount.unsigned_abs();
            format!(
                "{sign}{}.{:02}",
                abs / MINOR_PER_UNIT as u64,
                abs % MINOR_PER_UNIT as u64
            )
        }
    }
}
