//! Decimal policy for financial values
//!
//! Every value that crosses a component boundary (stored field, metric
//! result) is a `rust_decimal::Decimal` with at most 8 fractional digits,
//! rounded half-up, trailing zeros stripped.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits kept on canonical values
pub const SCALE: u32 = 8;

/// Half-up rounding (ties away from zero)
pub const ROUNDING: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// Smallest positive canonical value, `dec!(0.00000001)`: mantissa 1 at scale 8
pub const EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, SCALE);

/// Round to the canonical scale and strip trailing zeros.
///
/// Values already within 8 fractional digits keep their numeric value.
#[inline]
pub fn canonicalize(value: Decimal) -> Decimal {
    let rounded = if value.scale() > SCALE {
        value.round_dp_with_strategy(SCALE, ROUNDING)
    } else {
        value
    };
    rounded.normalize()
}

/// Canonical quotient, `None` unless the divisor is strictly positive.
#[inline]
pub fn divide(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if !is_positive(denominator) {
        return None;
    }
    numerator.checked_div(denominator).map(canonicalize)
}

/// Canonical product, `None` on overflow.
#[inline]
pub fn multiply(lhs: Decimal, rhs: Decimal) -> Option<Decimal> {
    lhs.checked_mul(rhs).map(canonicalize)
}

/// Canonical sum, `None` on overflow.
#[inline]
pub fn add(lhs: Decimal, rhs: Decimal) -> Option<Decimal> {
    lhs.checked_add(rhs).map(canonicalize)
}

/// Strictly greater than zero
#[inline(always)]
pub fn is_positive(value: Decimal) -> bool {
    value > Decimal::ZERO
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rounds_half_up_at_scale() {
        assert_eq!(canonicalize(dec!(1.234567885)), dec!(1.23456789));
        assert_eq!(canonicalize(dec!(1.234567884)), dec!(1.23456788));
        assert_eq!(canonicalize(dec!(-1.234567885)), dec!(-1.23456789));
    }

    #[test]
    fn test_strips_trailing_zeros() {
        let value = canonicalize(dec!(1.50000000));
        assert_eq!(value.to_string(), "1.5");
        assert_eq!(value.scale(), 1);
        assert_eq!(canonicalize(dec!(100)).to_string(), "100");
    }

    #[test]
    fn test_short_values_untouched() {
        assert_eq!(canonicalize(dec!(0.02)), dec!(0.02));
        assert_eq!(canonicalize(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_divide_requires_positive_divisor() {
        assert!(divide(dec!(1), Decimal::ZERO).is_none());
        assert!(divide(dec!(1), dec!(-2)).is_none());
        assert_eq!(divide(dec!(50), dec!(3)), Some(dec!(16.66666667)));
    }

    #[test]
    fn test_epsilon() {
        assert_eq!(EPSILON, dec!(0.00000001));
        assert!(is_positive(EPSILON));
    }

    proptest! {
        #[test]
        fn canonicalize_is_idempotent(mantissa in any::<i64>(), scale in 0u32..=20) {
            let value = Decimal::new(mantissa, scale);
            let once = canonicalize(value);
            prop_assert_eq!(canonicalize(once), once);
            prop_assert!(once.scale() <= SCALE);
        }

        #[test]
        fn canonicalize_moves_at_most_half_ulp(mantissa in any::<i64>(), scale in 0u32..=20) {
            let value = Decimal::new(mantissa, scale);
            let diff = (canonicalize(value) - value).abs();
            prop_assert!(diff <= EPSILON / Decimal::TWO);
        }
    }
}
