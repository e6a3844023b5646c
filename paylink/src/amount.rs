//! Token amount codec.
//!
//! Converts between human-readable decimal strings (what a creator types as
//! a price) and the token's smallest-unit integer representation (what a
//! `Transfer` event carries). Comparisons between a stored price and an
//! on-chain amount always happen in the integer domain; a string that cannot
//! be converted losslessly is rejected rather than rounded.

use alloy_primitives::U256;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Error converting a decimal string into a smallest-unit amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedAmount {
    /// The input is not a plain decimal number.
    #[error("amount `{0}` is not a valid decimal number")]
    NotANumber(String),

    /// The input is negative.
    #[error("amount `{0}` is negative")]
    Negative(String),

    /// The input carries more fractional digits than the token supports.
    /// Truncating would change the economic value, so the input is rejected.
    #[error("amount `{value}` has more than {decimals} fractional digits")]
    ExcessPrecision {
        /// The offending input string.
        value: String,
        /// The token's decimal count.
        decimals: u8,
    },

    /// The scaled amount does not fit in a 256-bit integer.
    #[error("amount `{0}` overflows the token's integer range")]
    Overflow(String),
}

/// Converts a decimal string into the token's smallest-unit integer.
///
/// Trailing fractional zeros are normalized away before the precision check,
/// so `"10.50"` is accepted for a 1-decimal token while `"10.55"` is not.
///
/// # Errors
///
/// Returns [`MalformedAmount`] if the string is not a non-negative decimal,
/// carries excess fractional precision, or overflows 256 bits.
pub fn to_smallest_unit(value: &str, decimals: u8) -> Result<U256, MalformedAmount> {
    let parsed =
        Decimal::from_str(value).map_err(|_| MalformedAmount::NotANumber(value.to_owned()))?;
    if parsed.is_sign_negative() && !parsed.is_zero() {
        return Err(MalformedAmount::Negative(value.to_owned()));
    }

    let normalized = parsed.normalize();
    let scale = normalized.scale();
    if scale > u32::from(decimals) {
        return Err(MalformedAmount::ExcessPrecision {
            value: value.to_owned(),
            decimals,
        });
    }

    let mantissa = U256::from(normalized.mantissa().unsigned_abs());
    let factor = U256::from(10u8)
        .checked_pow(U256::from(u32::from(decimals) - scale))
        .ok_or_else(|| MalformedAmount::Overflow(value.to_owned()))?;
    mantissa
        .checked_mul(factor)
        .ok_or_else(|| MalformedAmount::Overflow(value.to_owned()))
}

/// Formats a smallest-unit integer as a decimal string.
///
/// Total inverse of [`to_smallest_unit`]: works for any `U256` (pure base-10
/// string manipulation, no intermediate numeric type) and trims trailing
/// fractional zeros, so round-trips normalize `"10.50"` to `"10.5"`.
#[must_use]
pub fn to_decimal_string(amount: U256, decimals: u8) -> String {
    let digits = amount.to_string();
    let decimals = usize::from(decimals);
    if decimals == 0 {
        return digits;
    }

    let (int_part, frac_part) = if digits.len() > decimals {
        let split = digits.len() - decimals;
        (digits[..split].to_owned(), digits[split..].to_owned())
    } else {
        ("0".to_owned(), format!("{digits:0>decimals$}"))
    };

    let frac = frac_part.trim_end_matches('0');
    if frac.is_empty() {
        int_part
    } else {
        format!("{int_part}.{frac}")
    }
}

/// Serde adapter serializing a [`U256`] amount as a base-10 string.
///
/// JSON numbers cannot represent 256-bit integers without precision loss,
/// so wire formats carry smallest-unit amounts as decimal strings.
pub mod serde_u256_dec {
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer, de};

    /// Serializes the amount as its base-10 string form.
    ///
    /// # Errors
    ///
    /// Never fails for a `U256` value.
    pub fn serialize<S: Serializer>(amount: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    /// Deserializes an amount from a base-10 string.
    ///
    /// # Errors
    ///
    /// Fails if the string is not a non-negative base-10 integer.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_str_radix(&s, 10)
            .map_err(|_| de::Error::custom("amount must be a base-10 integer string"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_number() {
        assert_eq!(to_smallest_unit("5", 6).unwrap(), U256::from(5_000_000u64));
    }

    #[test]
    fn test_fractional() {
        assert_eq!(
            to_smallest_unit("10.5", 6).unwrap(),
            U256::from(10_500_000u64)
        );
        assert_eq!(
            to_smallest_unit("0.000001", 6).unwrap(),
            U256::from(1u64)
        );
    }

    #[test]
    fn test_trailing_zeros_normalized() {
        assert_eq!(
            to_smallest_unit("5.00", 6).unwrap(),
            to_smallest_unit("5", 6).unwrap()
        );
        // Normalization happens before the precision check.
        assert_eq!(to_smallest_unit("1.50", 1).unwrap(), U256::from(15u64));
    }

    #[test]
    fn test_zero() {
        assert_eq!(to_smallest_unit("0", 6).unwrap(), U256::ZERO);
        assert_eq!(to_smallest_unit("0.00", 6).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_rejects_excess_precision() {
        assert!(matches!(
            to_smallest_unit("1.0000001", 6),
            Err(MalformedAmount::ExcessPrecision { .. })
        ));
        assert!(matches!(
            to_smallest_unit("0.5", 0),
            Err(MalformedAmount::ExcessPrecision { .. })
        ));
    }

    #[test]
    fn test_rejects_negative() {
        assert!(matches!(
            to_smallest_unit("-1", 6),
            Err(MalformedAmount::Negative(_))
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        for bad in ["", "abc", "1.2.3", "1,5", "0x10"] {
            assert!(
                matches!(to_smallest_unit(bad, 6), Err(MalformedAmount::NotANumber(_))),
                "expected NotANumber for {bad:?}"
            );
        }
    }

    #[test]
    fn test_format_basic() {
        assert_eq!(to_decimal_string(U256::from(5_000_000u64), 6), "5");
        assert_eq!(to_decimal_string(U256::from(10_500_000u64), 6), "10.5");
        assert_eq!(to_decimal_string(U256::from(1u64), 6), "0.000001");
        assert_eq!(to_decimal_string(U256::ZERO, 6), "0");
    }

    #[test]
    fn test_format_zero_decimals() {
        assert_eq!(to_decimal_string(U256::from(42u64), 0), "42");
    }

    #[test]
    fn test_format_large_amount() {
        // Beyond u128: formatting must stay exact over the full U256 range.
        let big = U256::from(u128::MAX) * U256::from(1_000_000u64);
        assert_eq!(to_decimal_string(big, 6), u128::MAX.to_string());
    }

    #[test]
    fn test_round_trip() {
        for (input, normalized) in [
            ("10.5", "10.5"),
            ("10.50", "10.5"),
            ("0.000001", "0.000001"),
            ("7.3", "7.3"),
            ("5.00", "5"),
            ("0", "0"),
        ] {
            let units = to_smallest_unit(input, 6).unwrap();
            assert_eq!(to_decimal_string(units, 6), normalized, "input {input:?}");
        }
    }
}
