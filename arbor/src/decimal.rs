//! Fixed point numbers for split fractions and decimal attributes.
//! Floats would make `dump` output depend on rounding, so everything is stored in units of 1/10000.

use std::{
    fmt::{self, Display},
    ops::{Add, Sub},
    str::FromStr,
};

use crate::errors::ParseDecimalError;

const UNIT: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub(crate) struct Decimal(i64);

impl Decimal {
    pub(crate) const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    pub(crate) fn half() -> Self {
        Self(UNIT / 2)
    }

    pub(crate) fn clamp(self, min: Decimal, max: Decimal) -> Self {
        Self(self.0.clamp(min.0, max.0))
    }

    /// `floor(self * n)`
    pub(crate) fn scale(self, n: i32) -> i32 {
        (self.0 * n as i64).div_euclid(UNIT) as i32
    }

    /// The fraction `num / den`, rounded to the nearest unit
    pub(crate) fn ratio(num: i32, den: i32) -> Self {
        if den == 0 {
            return Self(0);
        }
        let num = num as i64 * UNIT;
        let den = den as i64;
        Self((num + den / 2).div_euclid(den))
    }
}

impl Add for Decimal {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl Sub for Decimal {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDecimalError {
            decimal: s.to_string(),
        };
        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (int, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if int.is_empty() && frac.is_empty() {
            return Err(err());
        }
        if !int.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            return Err(err());
        }
        let int = if int.is_empty() {
            0
        } else {
            int.parse::<i64>().map_err(|_| err())?
        };
        // only four places are significant, the rest is cut off
        let mut places = frac.chars().take(4).collect::<String>();
        while places.len() < 4 {
            places.push('0');
        }
        let frac = places.parse::<i64>().map_err(|_| err())?;
        let raw = int.checked_mul(UNIT).ok_or_else(err)? + frac;
        Ok(Self(if negative { -raw } else { raw }))
    }
}

impl Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "-")?;
        }
        let abs = self.0.abs();
        write!(f, "{}", abs / UNIT)?;
        let frac = abs % UNIT;
        if frac != 0 {
            let places = format!("{:04}", frac);
            write!(f, ".{}", places.trim_end_matches('0'))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_print() {
        let d: Decimal = "0.5".parse().unwrap();
        assert_eq!(d, Decimal::half());
        assert_eq!(d.to_string(), "0.5");
        assert_eq!("1".parse::<Decimal>().unwrap().to_string(), "1");
        assert_eq!("-0.25".parse::<Decimal>().unwrap().to_string(), "-0.25");
        assert_eq!(".1".parse::<Decimal>().unwrap().to_string(), "0.1");
        assert!("0.x".parse::<Decimal>().is_err());
        assert!("".parse::<Decimal>().is_err());
    }

    #[test]
    fn scaling_floors() {
        let third: Decimal = "0.3333".parse().unwrap();
        assert_eq!(third.scale(100), 33);
        assert_eq!(Decimal::half().scale(101), 50);
        assert_eq!(Decimal::ratio(1, 3).to_string(), "0.3333");
    }
}
