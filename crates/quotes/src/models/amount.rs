//! Decimal amount helpers.
//!
//! Amounts cross the provider boundary as decimal strings and are held as
//! [`Decimal`] inside the engine. Nothing here goes through `f64`.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::errors::QuoteError;

/// Default number of fractional digits kept when dividing amounts.
pub const DECIMAL_PRECISION: u32 = 18;

/// Largest scale a `Decimal` can carry.
const MAX_SCALE: u32 = 28;

/// Parse a non-negative decimal string such as `"0.0001"` or `"100000000"`.
///
/// Scientific notation, signs other than a leading `+`, and empty input
/// are rejected.
pub fn parse_amount(input: &str) -> Result<Decimal, QuoteError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.contains(&['e', 'E'][..]) {
        return Err(QuoteError::InvalidAmount(input.to_string()));
    }

    let value = Decimal::from_str(trimmed.trim_start_matches('+'))
        .map_err(|_| QuoteError::InvalidAmount(input.to_string()))?;

    if value.is_sign_negative() && !value.is_zero() {
        return Err(QuoteError::InvalidAmount(input.to_string()));
    }

    Ok(value.normalize())
}

/// Divide `numerator` by `denominator`, truncating to `precision` fractional digits.
///
/// Returns `None` on a zero denominator or overflow.
pub fn div_truncated(numerator: Decimal, denominator: Decimal, precision: u32) -> Option<Decimal> {
    if denominator.is_zero() {
        return None;
    }
    numerator
        .checked_div(denominator)
        .map(|q| q.round_dp_with_strategy(precision.min(MAX_SCALE), RoundingStrategy::ToZero))
}
