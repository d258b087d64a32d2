//! Two-decimal fixed-point values.
//!
//! Work quantities and currency amounts are stored as integer hundredths.
//! Rounding happens exactly once, when a value enters the system or when a
//! product is formed, and always rounds half away from zero (half-up for the
//! non-negative values the scheduler works with).

use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use crate::error::QuantityError;

/// Hundredths per unit.
const SCALE: i64 = 100;

/// Largest magnitude accepted, in hundredths (10^13 units).
const MAX_HUNDREDTHS: i64 = 1_000_000_000_000_000;

/// Divides rounding half away from zero. `den` must be positive.
fn div_round_half_up(num: i128, den: i128) -> i128 {
    if num >= 0 {
        (2 * num + den) / (2 * den)
    } else {
        -((-2 * num + den) / (2 * den))
    }
}

fn clamp_hundredths(value: i128) -> i64 {
    value.clamp(-(MAX_HUNDREDTHS as i128), MAX_HUNDREDTHS as i128) as i64
}

macro_rules! fixed_point {
    ($name:ident, $what:literal) => {
        #[doc = concat!("A ", $what, " with two-decimal precision.")]
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(i64);

        impl $name {
            /// Zero.
            pub const ZERO: Self = Self(0);

            /// Exactly one unit.
            pub const ONE: Self = Self(SCALE);

            /// Creates a value from integer hundredths.
            #[must_use]
            pub const fn from_hundredths(hundredths: i64) -> Self {
                Self(hundredths)
            }

            /// Creates a value from whole units.
            #[must_use]
            pub const fn from_units(units: i64) -> Self {
                Self(units * SCALE)
            }

            /// Returns the value in integer hundredths.
            #[must_use]
            pub const fn hundredths(&self) -> i64 {
                self.0
            }

            /// Converts a float, rounding half-up to two decimals.
            pub fn from_f64(value: f64) -> Result<Self, QuantityError> {
                if !value.is_finite() {
                    return Err(QuantityError::NotFinite);
                }

                // Nudge by far less than half a hundredth so that decimal
                // literals like 2.675 (stored as 2.67499..) round as written.
                let scaled = value * SCALE as f64;
                let rounded = (scaled + scaled.signum() * 1e-6).round();
                if rounded.abs() > MAX_HUNDREDTHS as f64 {
                    return Err(QuantityError::OutOfRange(value.to_string()));
                }

                Ok(Self(rounded as i64))
            }

            /// Returns the value as a float (for display math only).
            #[must_use]
            pub fn to_f64(&self) -> f64 {
                self.0 as f64 / SCALE as f64
            }

            /// Returns true if the value is strictly greater than zero.
            #[must_use]
            pub const fn is_positive(&self) -> bool {
                self.0 > 0
            }

            /// Returns true if the value is zero.
            #[must_use]
            pub const fn is_zero(&self) -> bool {
                self.0 == 0
            }

            /// Formats with a single decimal, rounding half-up.
            #[must_use]
            pub fn to_string_one_decimal(&self) -> String {
                let tenths = div_round_half_up(self.0 as i128, 10);
                let sign = if tenths < 0 { "-" } else { "" };
                let abs = tenths.unsigned_abs();
                format!("{sign}{}.{}", abs / 10, abs % 10)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let sign = if self.0 < 0 { "-" } else { "" };
                let abs = self.0.unsigned_abs();
                write!(f, "{sign}{}.{:02}", abs / SCALE as u64, abs % SCALE as u64)
            }
        }

        impl std::str::FromStr for $name {
            type Err = QuantityError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_hundredths(s).map(Self)
            }
        }

        impl Add for $name {
            type Output = Self;

            fn add(self, rhs: Self) -> Self {
                Self(clamp_hundredths(self.0 as i128 + rhs.0 as i128))
            }
        }

        impl AddAssign for $name {
            fn add_assign(&mut self, rhs: Self) {
                *self = *self + rhs;
            }
        }

        impl Sub for $name {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self {
                Self(clamp_hundredths(self.0 as i128 - rhs.0 as i128))
            }
        }

        impl SubAssign for $name {
            fn sub_assign(&mut self, rhs: Self) {
                *self = *self - rhs;
            }
        }

        impl std::iter::Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                iter.fold(Self::ZERO, Add::add)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_f64(self.to_f64())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                deserializer
                    .deserialize_any(HundredthsVisitor($what))
                    .map(Self)
            }
        }
    };
}

fixed_point!(Quantity, "work quantity");
fixed_point!(Amount, "currency amount");

impl Quantity {
    /// Returns the smaller of two quantities.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Ord::min(self, other)
    }

    /// Multiplies by a whole count (e.g. a per-worker target by pool size).
    #[must_use]
    pub fn times(self, count: u64) -> Self {
        Self(clamp_hundredths(self.0 as i128 * count as i128))
    }

    /// Number of `divisor`-sized pieces needed to cover `self`, rounding up.
    ///
    /// Returns 0 when `self` is not positive. `divisor` must be positive.
    #[must_use]
    pub fn ceil_div(self, divisor: Self) -> u64 {
        debug_assert!(divisor.is_positive(), "ceil_div by non-positive quantity");
        if !self.is_positive() || !divisor.is_positive() {
            return 0;
        }
        let (num, den) = (self.0 as u64, divisor.0 as u64);
        num.div_ceil(den)
    }

    /// Cost of this quantity at `rate`, rounded half-up to two decimals.
    #[must_use]
    pub fn cost(self, rate: Amount) -> Amount {
        self.cost_times(rate, 1)
    }

    /// Cost of `factor` repetitions of this quantity at `rate`, rounded once.
    #[must_use]
    pub fn cost_times(self, rate: Amount, factor: u64) -> Amount {
        let product = self.0 as i128 * rate.0 as i128 * factor as i128;
        Amount(clamp_hundredths(div_round_half_up(product, SCALE as i128)))
    }

    /// `self / of × 100`, rounded half-up to one decimal, as tenths of a percent.
    ///
    /// Returns `None` when `of` is not positive.
    #[must_use]
    pub fn percent_tenths_of(self, of: Self) -> Option<i64> {
        if !of.is_positive() {
            return None;
        }
        let tenths = div_round_half_up(self.0 as i128 * 1000, of.0 as i128);
        Some(tenths.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }
}

/// Parses a decimal string into hundredths, rounding half-up on the third decimal.
fn parse_hundredths(input: &str) -> Result<i64, QuantityError> {
    let invalid = || QuantityError::Invalid(input.to_string());
    let s = input.trim();

    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        Some(_) => (false, s),
        None => return Err(invalid()),
    };

    let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let mut value: i128 = 0;
    for b in whole.bytes() {
        value = value * 10 + i128::from(b - b'0');
        if value > MAX_HUNDREDTHS as i128 {
            return Err(QuantityError::OutOfRange(input.to_string()));
        }
    }

    let mut frac_digits = frac.bytes().map(|b| i128::from(b - b'0'));
    let tenths = frac_digits.next().unwrap_or(0);
    let hundredths = frac_digits.next().unwrap_or(0);
    let round_up = frac_digits.next().is_some_and(|d| d >= 5);

    let mut total = value * SCALE as i128 + tenths * 10 + hundredths;
    if round_up {
        total += 1;
    }
    if total > MAX_HUNDREDTHS as i128 {
        return Err(QuantityError::OutOfRange(input.to_string()));
    }

    let total = total as i64;
    Ok(if negative { -total } else { total })
}

/// Accepts integers, floats, and decimal strings.
struct HundredthsVisitor(&'static str);

impl<'de> serde::de::Visitor<'de> for HundredthsVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a {} as a number or decimal string", self.0)
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<i64, E> {
        if v.unsigned_abs() > (MAX_HUNDREDTHS / SCALE) as u64 {
            return Err(E::custom(QuantityError::OutOfRange(v.to_string())));
        }
        Ok(v * SCALE)
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<i64, E> {
        if v > (MAX_HUNDREDTHS / SCALE) as u64 {
            return Err(E::custom(QuantityError::OutOfRange(v.to_string())));
        }
        Ok(v as i64 * SCALE)
    }

    fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<i64, E> {
        Quantity::from_f64(v)
            .map(|q| q.hundredths())
            .map_err(E::custom)
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<i64, E> {
        parse_hundredths(v).map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(s: &str) -> Quantity {
        s.parse().unwrap()
    }

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Quantity::from_units(3).to_string(), "3.00");
        assert_eq!(Amount::from_hundredths(12345).to_string(), "123.45");
        assert_eq!(Amount::from_hundredths(-5).to_string(), "-0.05");
    }

    #[test]
    fn test_parse_rounds_half_up() {
        assert_eq!(q("0.125").hundredths(), 13);
        assert_eq!(q("0.124").hundredths(), 12);
        assert_eq!(q("2.675").hundredths(), 268);
        assert_eq!(q("10").hundredths(), 1000);
        assert_eq!(q(".5").hundredths(), 50);
        assert_eq!(q("7.").hundredths(), 700);
        assert_eq!(q("-1.005").hundredths(), -101);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "-", ".", "1.2.3", "abc", "1e3", "1,5"] {
            assert!(matches!(
                bad.parse::<Quantity>(),
                Err(QuantityError::Invalid(_))
            ), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_from_f64_rounds_decimal_literals_half_up() {
        assert_eq!(Quantity::from_f64(2.675).unwrap().hundredths(), 268);
        assert_eq!(Quantity::from_f64(1.005).unwrap().hundredths(), 101);
        assert_eq!(Quantity::from_f64(0.004).unwrap().hundredths(), 0);
        assert_eq!(Quantity::from_f64(3.0).unwrap(), Quantity::from_units(3));
    }

    #[test]
    fn test_from_f64_rejects_non_finite() {
        assert_eq!(Quantity::from_f64(f64::NAN), Err(QuantityError::NotFinite));
        assert_eq!(
            Quantity::from_f64(f64::INFINITY),
            Err(QuantityError::NotFinite)
        );
        assert!(matches!(
            Quantity::from_f64(1e20),
            Err(QuantityError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_ceil_div() {
        assert_eq!(q("10").ceil_div(q("6")), 2);
        assert_eq!(q("12").ceil_div(q("6")), 2);
        assert_eq!(q("0.01").ceil_div(q("6")), 1);
        assert_eq!(Quantity::ZERO.ceil_div(q("6")), 0);
    }

    #[test]
    fn test_cost_rounds_once() {
        assert_eq!(q("3").cost(Amount::from_units(100)).to_string(), "300.00");
        // 0.33 * 0.5 = 0.165 -> 0.17
        assert_eq!(q("0.33").cost("0.5".parse().unwrap()).to_string(), "0.17");
        // 3 * (0.33 * 0.5) rounded once = 0.495 -> 0.50
        assert_eq!(
            q("0.33").cost_times("0.5".parse().unwrap(), 3).to_string(),
            "0.50"
        );
    }

    #[test]
    fn test_percent_tenths() {
        assert_eq!(q("2").percent_tenths_of(q("3")), Some(667));
        assert_eq!(q("4.5").percent_tenths_of(q("3")), Some(1500));
        assert_eq!(q("1").percent_tenths_of(Quantity::ZERO), None);
    }

    #[test]
    fn test_one_decimal_display() {
        assert_eq!(q("6").to_string_one_decimal(), "6.0");
        assert_eq!(q("2.25").to_string_one_decimal(), "2.3");
        assert_eq!(q("2.24").to_string_one_decimal(), "2.2");
    }

    #[test]
    fn test_serde_accepts_numbers_and_strings() {
        let from_int: Quantity = serde_json::from_str("10").unwrap();
        let from_float: Quantity = serde_json::from_str("2.5").unwrap();
        let from_str: Quantity = serde_json::from_str("\"1.25\"").unwrap();
        assert_eq!(from_int.hundredths(), 1000);
        assert_eq!(from_float.hundredths(), 250);
        assert_eq!(from_str.hundredths(), 125);
        assert_eq!(serde_json::to_string(&from_float).unwrap(), "2.5");
    }

    #[test]
    fn test_arithmetic() {
        let mut total = q("1.25") + q("2.50");
        total -= q("0.75");
        assert_eq!(total, q("3"));
        let sum: Quantity = [q("1"), q("2"), q("0.5")].into_iter().sum();
        assert_eq!(sum, q("3.5"));
    }
}
