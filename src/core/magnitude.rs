//! Scientific-notation decimal for unbounded products
//!
//! `Decimal` tops out near 7.9e28, which a product of a few dozen trade
//! prices overruns quickly. `Magnitude` stores `mantissa × 10^exponent`
//! with `1 <= |mantissa| < 10`, so the exponent absorbs the growth and the
//! mantissa keeps `Decimal`'s full 28 significant digits.

use super::decimal::{canonicalize, SCALE};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;

/// Largest power-of-ten shift `Decimal` can express as a scale
const MAX_SHIFT: i64 = 28;

/// Values with an exponent at or above this carry no digits past the
/// canonical scale, so rounding them is a no-op
const ROUNDING_EXPONENT_LIMIT: i64 = MAX_SHIFT - SCALE as i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Magnitude {
    mantissa: Decimal,
    exponent: i64,
}

impl Magnitude {
    pub const ZERO: Self = Self {
        mantissa: Decimal::ZERO,
        exponent: 0,
    };

    pub const ONE: Self = Self {
        mantissa: Decimal::ONE,
        exponent: 0,
    };

    /// `10^exponent`
    #[inline]
    pub const fn power_of_ten(exponent: i64) -> Self {
        Self {
            mantissa: Decimal::ONE,
            exponent,
        }
    }

    fn normalized(mut mantissa: Decimal, mut exponent: i64) -> Self {
        if mantissa.is_zero() {
            return Self::ZERO;
        }
        while mantissa.abs() >= Decimal::TEN {
            mantissa = shift_right(mantissa, 1);
            exponent += 1;
        }
        while mantissa.abs() < Decimal::ONE {
            // |mantissa| < 1 implies scale >= 1
            let scale = mantissa.scale();
            if mantissa.set_scale(scale - 1).is_err() {
                mantissa *= Decimal::TEN;
            }
            exponent -= 1;
        }
        Self {
            mantissa: mantissa.normalize(),
            exponent,
        }
    }

    /// Significand in `[1, 10)` (or zero)
    #[inline(always)]
    pub fn mantissa(&self) -> Decimal {
        self.mantissa
    }

    /// Power of ten applied to the mantissa
    #[inline(always)]
    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    #[inline(always)]
    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    #[inline(always)]
    pub fn is_positive(&self) -> bool {
        self.mantissa > Decimal::ZERO
    }

    #[inline]
    pub fn abs(self) -> Self {
        Self {
            mantissa: self.mantissa.abs(),
            exponent: self.exponent,
        }
    }

    #[inline]
    pub fn neg(self) -> Self {
        Self {
            mantissa: -self.mantissa,
            exponent: self.exponent,
        }
    }

    /// Product; mantissas multiply into `[1, 100)` so this never overflows.
    #[inline]
    pub fn mul(self, rhs: Self) -> Self {
        if self.is_zero() || rhs.is_zero() {
            return Self::ZERO;
        }
        Self::normalized(self.mantissa * rhs.mantissa, self.exponent + rhs.exponent)
    }

    /// Quotient, `None` on division by zero.
    #[inline]
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        if rhs.is_zero() {
            return None;
        }
        let mantissa = self.mantissa.checked_div(rhs.mantissa)?;
        Some(Self::normalized(mantissa, self.exponent - rhs.exponent))
    }

    /// Sum; an addend more than 28 decades smaller than the other is dropped.
    pub fn add(self, rhs: Self) -> Self {
        if self.is_zero() {
            return rhs;
        }
        if rhs.is_zero() {
            return self;
        }
        let (big, small) = if self.exponent >= rhs.exponent {
            (self, rhs)
        } else {
            (rhs, self)
        };
        let shift = big.exponent - small.exponent;
        if shift > MAX_SHIFT {
            return big;
        }
        let aligned = shift_right(small.mantissa, shift as u32);
        Self::normalized(big.mantissa + aligned, big.exponent)
    }

    #[inline]
    pub fn sub(self, rhs: Self) -> Self {
        self.add(rhs.neg())
    }

    /// Integer power by repeated squaring
    pub fn powi(self, mut exp: u64) -> Self {
        let mut base = self;
        let mut acc = Self::ONE;
        while exp > 0 {
            if exp & 1 == 1 {
                acc = acc.mul(base);
            }
            exp >>= 1;
            if exp > 0 {
                base = base.mul(base);
            }
        }
        acc
    }

    /// Round to the canonical scale (8 fractional digits, half-up).
    pub fn canonical(self) -> Self {
        if self.exponent >= ROUNDING_EXPONENT_LIMIT {
            return self;
        }
        match self.to_decimal() {
            Some(value) => Self::from(canonicalize(value)),
            None => self,
        }
    }

    /// Plain `Decimal`, `None` when the value exceeds `Decimal`'s range.
    ///
    /// Values below `Decimal`'s smallest scale round toward zero.
    pub fn to_decimal(self) -> Option<Decimal> {
        if self.is_zero() {
            return Some(Decimal::ZERO);
        }
        if self.exponent > MAX_SHIFT {
            return None;
        }
        if self.exponent < -MAX_SHIFT {
            return Some(Decimal::ZERO);
        }
        if self.exponent >= 0 {
            let factor = Decimal::from_i128_with_scale(10i128.pow(self.exponent as u32), 0);
            self.mantissa.checked_mul(factor)
        } else {
            Some(shift_right(self.mantissa, (-self.exponent) as u32))
        }
    }
}

/// Divide by `10^places`; exact while the resulting scale fits.
fn shift_right(value: Decimal, places: u32) -> Decimal {
    if places == 0 {
        return value;
    }
    let mut shifted = value;
    if shifted.set_scale(value.scale() + places).is_ok() {
        return shifted;
    }
    value * Decimal::new(1, places.min(MAX_SHIFT as u32))
}

impl From<Decimal> for Magnitude {
    #[inline]
    fn from(value: Decimal) -> Self {
        Self::normalized(value, 0)
    }
}

impl From<u64> for Magnitude {
    #[inline]
    fn from(value: u64) -> Self {
        Self::normalized(Decimal::from(value), 0)
    }
}

impl Ord for Magnitude {
    fn cmp(&self, other: &Self) -> Ordering {
        let sign = |m: &Magnitude| -> i8 {
            if m.mantissa.is_zero() {
                0
            } else if m.mantissa.is_sign_negative() {
                -1
            } else {
                1
            }
        };
        let (lhs_sign, rhs_sign) = (sign(self), sign(other));
        if lhs_sign != rhs_sign {
            return lhs_sign.cmp(&rhs_sign);
        }
        match lhs_sign {
            0 => Ordering::Equal,
            1 => self
                .exponent
                .cmp(&other.exponent)
                .then_with(|| self.mantissa.cmp(&other.mantissa)),
            _ => other
                .exponent
                .cmp(&self.exponent)
                .then_with(|| self.mantissa.cmp(&other.mantissa)),
        }
    }
}

impl PartialOrd for Magnitude {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Magnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_decimal() {
            Some(value) if self.exponent.abs() <= SCALE as i64 => write!(f, "{}", value),
            _ => write!(f, "{}e{}", self.mantissa, self.exponent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normalization() {
        let m = Magnitude::from(dec!(1234.5));
        assert_eq!(m.mantissa(), dec!(1.2345));
        assert_eq!(m.exponent(), 3);

        let small = Magnitude::from(dec!(0.00042));
        assert_eq!(small.mantissa(), dec!(4.2));
        assert_eq!(small.exponent(), -4);

        assert!(Magnitude::from(Decimal::ZERO).is_zero());
    }

    #[test]
    fn test_mul_and_back() {
        let product = Magnitude::from(dec!(4)).mul(Magnitude::from(dec!(9)));
        assert_eq!(product.to_decimal(), Some(dec!(36)));
    }

    #[test]
    fn test_product_beyond_decimal_range() {
        // 100^20 = 1e40, well past Decimal::MAX
        let hundred = Magnitude::from(dec!(100));
        let big = hundred.powi(20);
        assert_eq!(big.mantissa(), Decimal::ONE);
        assert_eq!(big.exponent(), 40);
        assert!(big.to_decimal().is_none());

        let back = big.checked_div(hundred.powi(19)).unwrap();
        assert_eq!(back.to_decimal(), Some(dec!(100)));
    }

    #[test]
    fn test_add_sub() {
        let a = Magnitude::from(dec!(6.8));
        let b = Magnitude::from(dec!(0.2));
        assert_eq!(a.add(b).to_decimal(), Some(dec!(7)));
        assert_eq!(a.sub(b).to_decimal(), Some(dec!(6.6)));
        assert_eq!(b.sub(a).to_decimal(), Some(dec!(-6.6)));
        assert!(a.sub(a).is_zero());
    }

    #[test]
    fn test_add_drops_negligible_term() {
        let huge = Magnitude::from(dec!(1)).mul(Magnitude::from(10u64).powi(40));
        let tiny = Magnitude::from(dec!(1));
        assert_eq!(huge.add(tiny), huge);
    }

    #[test]
    fn test_div_by_zero() {
        assert!(Magnitude::ONE.checked_div(Magnitude::ZERO).is_none());
    }

    #[test]
    fn test_ordering() {
        let neg_big = Magnitude::from(dec!(-1000));
        let neg_small = Magnitude::from(dec!(-0.5));
        let zero = Magnitude::ZERO;
        let pos_small = Magnitude::from(dec!(0.5));
        let pos_big = Magnitude::from(dec!(1000));
        let mut values = vec![pos_big, zero, neg_small, pos_small, neg_big];
        values.sort();
        assert_eq!(values, vec![neg_big, neg_small, zero, pos_small, pos_big]);
        assert!(Magnitude::from(dec!(9.9)) < Magnitude::from(dec!(10)));
    }

    #[test]
    fn test_canonical_rounding() {
        let third = Magnitude::ONE.checked_div(Magnitude::from(3u64)).unwrap();
        assert_eq!(third.canonical().to_decimal(), Some(dec!(0.33333333)));

        let tiny = Magnitude::from(dec!(0.000000004));
        assert!(tiny.canonical().is_zero());
    }

    #[test]
    fn test_powi_zero_is_one() {
        assert_eq!(Magnitude::from(dec!(7.5)).powi(0), Magnitude::ONE);
    }

    #[test]
    fn test_power_of_ten() {
        assert_eq!(Magnitude::power_of_ten(0), Magnitude::ONE);
        assert_eq!(Magnitude::power_of_ten(3).to_decimal(), Some(dec!(1000)));
        assert_eq!(Magnitude::power_of_ten(-2).to_decimal(), Some(dec!(0.01)));
        assert_eq!(Magnitude::power_of_ten(-2), Magnitude::from(dec!(0.01)));
    }
}
