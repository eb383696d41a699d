//! Money Normalization Module
//!
//! Unified handling of client-facing amount strings and internal
//! `rust_decimal::Decimal` values. All amounts entering the engine MUST go
//! through this module.
//!
//! ## Internal Representation
//! - Amounts and balances are `Decimal`, persisted as NUMERIC(30, 8)
//! - Each asset type carries its own precision (`decimal_places`, 0..=8)
//! - Normalization rounds half-even to the asset precision; the rounded
//!   value must remain strictly positive

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use thiserror::Error;

/// Upper bound for `AssetType::decimal_places`
pub const MAX_DECIMAL_PLACES: u32 = 8;

/// Money conversion errors
#[derive(Debug, Error)]
pub enum MoneyError {
    #[error("amount must be a positive number")]
    NotPositive,

    #[error("amount rounds to zero at {0} decimal places")]
    RoundsToZero(u32),

    #[error("unsupported precision {0}, max allowed is {MAX_DECIMAL_PLACES}")]
    UnsupportedPrecision(u32),

    #[error("invalid amount format: {0}")]
    InvalidFormat(String),
}

/// Parses a client-provided amount string into a `Decimal`.
///
/// Amounts travel as JSON strings to avoid float precision issues; this is
/// the single parse point for them. Zero and negative amounts are rejected
/// here, before any store access.
pub fn parse_amount(amount_str: &str) -> Result<Decimal, MoneyError> {
    let trimmed = amount_str.trim();
    if trimmed.is_empty() {
        return Err(MoneyError::InvalidFormat("empty string".into()));
    }

    let amount =
        Decimal::from_str(trimmed).map_err(|e| MoneyError::InvalidFormat(e.to_string()))?;

    if amount <= Decimal::ZERO {
        return Err(MoneyError::NotPositive);
    }

    Ok(amount)
}

/// Normalizes an amount to the asset's precision.
///
/// Rounds half-even (banker's rounding). Precision beyond the asset's
/// `decimal_places` is not rejected; it is folded into the rounded value,
/// which must remain strictly positive.
pub fn normalize(amount: Decimal, decimal_places: u32) -> Result<Decimal, MoneyError> {
    if decimal_places > MAX_DECIMAL_PLACES {
        return Err(MoneyError::UnsupportedPrecision(decimal_places));
    }

    if amount <= Decimal::ZERO {
        return Err(MoneyError::NotPositive);
    }

    let rounded =
        amount.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven);

    if rounded <= Decimal::ZERO {
        return Err(MoneyError::RoundsToZero(decimal_places));
    }

    Ok(rounded)
}

/// Formats an amount at the asset's precision for API responses.
///
/// format_amount(570.into(), 2) -> "570.00"
pub fn format_amount(amount: Decimal, decimal_places: u32) -> String {
    let shown =
        amount.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven);
    format!("{:.prec$}", shown, prec = decimal_places as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn qa_parse_amount_variations() {
        assert_eq!(parse_amount("1.23").unwrap(), dec("1.23"));
        assert_eq!(parse_amount("  100 ").unwrap(), dec("100"));
        assert_eq!(parse_amount("0.00000001").unwrap(), dec("0.00000001"));

        assert!(matches!(parse_amount("0"), Err(MoneyError::NotPositive)));
        assert!(matches!(parse_amount("0.00"), Err(MoneyError::NotPositive)));
        assert!(matches!(parse_amount("-5"), Err(MoneyError::NotPositive)));
    }

    #[test]
    fn qa_parse_amount_invalid_formats() {
        for case in ["", "  ", "abc", "1,000.00", "1.2.3", "1. 23"] {
            assert!(
                parse_amount(case).is_err(),
                "Should reject invalid format: {:?}",
                case
            );
        }
    }

    #[test]
    fn qa_normalize_rounds_half_even() {
        // Banker's rounding: ties go to the even neighbor
        assert_eq!(normalize(dec("1.125"), 2).unwrap(), dec("1.12"));
        assert_eq!(normalize(dec("1.135"), 2).unwrap(), dec("1.14"));
        assert_eq!(normalize(dec("2.5"), 0).unwrap(), dec("2"));
        assert_eq!(normalize(dec("3.5"), 0).unwrap(), dec("4"));
    }

    #[test]
    fn qa_normalize_preserves_in_precision_values() {
        assert_eq!(normalize(dec("100"), 2).unwrap(), dec("100"));
        assert_eq!(normalize(dec("0.01"), 2).unwrap(), dec("0.01"));
        assert_eq!(normalize(dec("99.99"), 2).unwrap(), dec("99.99"));
    }

    #[test]
    fn qa_normalize_rejects_zero_after_rounding() {
        // 0.001 at 2 decimal places rounds to 0.00
        assert!(matches!(
            normalize(dec("0.001"), 2),
            Err(MoneyError::RoundsToZero(2))
        ));
        // 0.4 at 0 decimal places rounds to 0
        assert!(matches!(
            normalize(dec("0.4"), 0),
            Err(MoneyError::RoundsToZero(0))
        ));
    }

    #[test]
    fn qa_normalize_precision_bounds() {
        assert!(normalize(dec("1"), 8).is_ok());
        assert!(matches!(
            normalize(dec("1"), 9),
            Err(MoneyError::UnsupportedPrecision(9))
        ));
    }

    #[test]
    fn qa_format_amount_fixed_precision() {
        assert_eq!(format_amount(dec("570"), 2), "570.00");
        assert_eq!(format_amount(dec("1.5"), 4), "1.5000");
        assert_eq!(format_amount(dec("100"), 0), "100");
        assert_eq!(format_amount(dec("0.125"), 2), "0.12");
    }
}
