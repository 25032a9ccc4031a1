//! Exact conversion of human-readable decimal amounts to base units.
//!
//! Fund amounts arrive as decimal strings like `"100.0"` and must become
//! `U256` base-unit integers (e.g. wei at an 18-decimal shift) without ever
//! passing through floating point.

use alloy_core::primitives::U256;
use thiserror::Error;

/// Errors from decimal-to-base-unit conversion.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("not a non-negative decimal number: '{0}'")]
    Malformed(String),
    #[error("{digits} fractional digits exceed the {decimals}-decimal shift")]
    TooManyFractionalDigits { digits: usize, decimals: u32 },
    #[error("amount overflows 256 bits at a {decimals}-decimal shift")]
    Overflow { decimals: u32 },
}

/// Convert a decimal string to base units with an explicit decimal shift.
///
/// `"1.5"` at 18 decimals yields `1_500_000_000_000_000_000`. The conversion
/// is exact: more fractional digits than the shift supports is an error, not
/// a rounding.
pub fn to_base_units(amount: &str, decimals: u32) -> Result<U256, AmountError> {
    let malformed = || AmountError::Malformed(amount.to_string());

    let (integer, fraction) = match amount.split_once('.') {
        Some((i, f)) => (i, f),
        None => (amount, ""),
    };

    if integer.is_empty() && fraction.is_empty() {
        return Err(malformed());
    }
    if !integer.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(malformed());
    }
    if fraction.len() > decimals as usize {
        // Trailing zeros past the shift are still a caller mistake: the
        // configured precision does not represent them.
        return Err(AmountError::TooManyFractionalDigits {
            digits: fraction.len(),
            decimals,
        });
    }

    let shift = U256::from(10u64)
        .checked_pow(U256::from(decimals))
        .ok_or(AmountError::Overflow { decimals })?;
    let frac_shift = U256::from(10u64)
        .checked_pow(U256::from(decimals as usize - fraction.len()))
        .ok_or(AmountError::Overflow { decimals })?;

    let integer_part = if integer.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(integer, 10).map_err(|_| AmountError::Overflow { decimals })?
    };
    let fraction_part = if fraction.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(fraction, 10).map_err(|_| malformed())?
    };

    integer_part
        .checked_mul(shift)
        .and_then(|scaled| scaled.checked_add(fraction_part.checked_mul(frac_shift)?))
        .ok_or(AmountError::Overflow { decimals })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wei(s: &str) -> U256 {
        U256::from_str_radix(s, 10).unwrap()
    }

    #[test]
    fn test_whole_amounts() {
        assert_eq!(
            to_base_units("100.0", 18).unwrap(),
            wei("100000000000000000000")
        );
        assert_eq!(to_base_units("1", 18).unwrap(), wei("1000000000000000000"));
        assert_eq!(to_base_units("0", 18).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_fractional_amounts_are_exact() {
        assert_eq!(
            to_base_units("1.5", 18).unwrap(),
            wei("1500000000000000000")
        );
        // 0.7 is the classic f64 trap; the exact path must not round.
        assert_eq!(
            to_base_units("0.7", 18).unwrap(),
            wei("700000000000000000")
        );
        assert_eq!(
            to_base_units("0.000000000000000001", 18).unwrap(),
            U256::from(1u64)
        );
        assert_eq!(to_base_units(".5", 18).unwrap(), wei("500000000000000000"));
    }

    #[test]
    fn test_excess_fractional_digits_rejected() {
        assert_eq!(
            to_base_units("1.23456789012345678901", 18),
            Err(AmountError::TooManyFractionalDigits {
                digits: 20,
                decimals: 18
            })
        );
        assert!(matches!(
            to_base_units("0.001", 2),
            Err(AmountError::TooManyFractionalDigits { .. })
        ));
    }

    #[test]
    fn test_malformed_amounts_rejected() {
        for bad in ["", ".", "-1", "1.5.0", "one", "1e18", " 1", "0x10"] {
            assert!(
                matches!(to_base_units(bad, 18), Err(AmountError::Malformed(_))),
                "expected '{bad}' to be rejected as malformed"
            );
        }
    }

    #[test]
    fn test_overflow_rejected() {
        // 2^256 / 10^18 has 60 digits; 80 integer digits cannot fit.
        let huge = "1".repeat(80);
        assert_eq!(
            to_base_units(&huge, 18),
            Err(AmountError::Overflow { decimals: 18 })
        );
    }

    #[test]
    fn test_zero_decimal_shift() {
        assert_eq!(to_base_units("42", 0).unwrap(), U256::from(42u64));
        assert!(matches!(
            to_base_units("42.1", 0),
            Err(AmountError::TooManyFractionalDigits { .. })
        ));
    }
}
