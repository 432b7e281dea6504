//! Challenge ratings as exact fractions.
//!
//! Monster CRs are whole numbers or one of 1/8, 1/4, 1/2. They are kept in
//! eighths so table keys compare exactly and the string form round-trips.
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::CR_DENOMINATOR;
use crate::error::{BalanceError, Result};
use crate::numbers::round_f64_to_i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ChallengeRating {
    eighths: i32,
}

impl ChallengeRating {
    /// # Errors
    ///
    /// Returns `InvalidChallengeRating` when `cr` eighths do not fit in an `i32`.
    pub fn from_whole(cr: i32) -> Result<Self> {
        cr.checked_mul(CR_DENOMINATOR)
            .map(Self::from_eighths)
            .ok_or_else(|| BalanceError::InvalidChallengeRating(cr.to_string()))
    }

    #[must_use]
    pub const fn from_eighths(eighths: i32) -> Self {
        Self { eighths }
    }

    /// Build a CR from its decimal value (`0.125`, `0.25`, `0.5`, `1.0`, ...).
    ///
    /// # Errors
    ///
    /// Returns `InvalidChallengeRating` for negative or non-finite values and
    /// for values that are not a whole number of eighths.
    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(BalanceError::InvalidChallengeRating(value.to_string()));
        }
        let scaled = value * f64::from(CR_DENOMINATOR);
        let eighths = round_f64_to_i32(scaled);
        if (scaled - f64::from(eighths)).abs() > 1e-9 {
            return Err(BalanceError::InvalidChallengeRating(value.to_string()));
        }
        Ok(Self { eighths })
    }

    #[must_use]
    pub fn as_f64(self) -> f64 {
        f64::from(self.eighths) / f64::from(CR_DENOMINATOR)
    }

    #[must_use]
    pub const fn eighths(self) -> i32 {
        self.eighths
    }

    /// Shift the rating by a whole number of CR steps. The result may be
    /// negative; such ratings never appear in the reference tables.
    ///
    /// # Errors
    ///
    /// Returns `InvalidChallengeRating` when the shifted rating overflows.
    pub fn offset(self, whole: i32) -> Result<Self> {
        whole
            .checked_mul(CR_DENOMINATOR)
            .and_then(|steps| self.eighths.checked_add(steps))
            .map(Self::from_eighths)
            .ok_or_else(|| BalanceError::InvalidChallengeRating(format!("{self} + {whole}")))
    }

    /// True for 0, 1/8, 1/4, 1/2 and every whole rating of 1 or more.
    #[must_use]
    pub const fn is_canonical(self) -> bool {
        match self.eighths {
            0 | 1 | 2 | 4 => true,
            e => e > 0 && e % CR_DENOMINATOR == 0,
        }
    }
}

const fn gcd(a: i32, b: i32) -> i32 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl fmt::Display for ChallengeRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.eighths % CR_DENOMINATOR == 0 {
            return write!(f, "{}", self.eighths / CR_DENOMINATOR);
        }
        let divisor = gcd(self.eighths, CR_DENOMINATOR);
        write!(
            f,
            "{}/{}",
            self.eighths / divisor,
            CR_DENOMINATOR / divisor
        )
    }
}

impl FromStr for ChallengeRating {
    type Err = BalanceError;

    fn from_str(raw: &str) -> Result<Self> {
        let text = raw.trim();
        let invalid = || BalanceError::InvalidChallengeRating(raw.to_string());
        if let Some((num, den)) = text.split_once('/') {
            let num: i32 = num.trim().parse().map_err(|_| invalid())?;
            let den: i32 = den.trim().parse().map_err(|_| invalid())?;
            if num < 0 || den <= 0 || CR_DENOMINATOR % den != 0 {
                return Err(invalid());
            }
            return num
                .checked_mul(CR_DENOMINATOR / den)
                .map(Self::from_eighths)
                .ok_or_else(invalid);
        }
        if let Ok(whole) = text.parse::<i32>() {
            if whole < 0 {
                return Err(invalid());
            }
            return Self::from_whole(whole).map_err(|_| invalid());
        }
        let decimal: f64 = text.parse().map_err(|_| invalid())?;
        Self::from_f64(decimal).map_err(|_| invalid())
    }
}

/// Canonical string form of a decimal CR (`0.25` becomes `"1/4"`).
///
/// # Errors
///
/// Returns `InvalidChallengeRating` when the value is not a whole number of eighths.
pub fn cr_num_to_str(cr: f64) -> Result<String> {
    ChallengeRating::from_f64(cr).map(|rating| rating.to_string())
}

/// Decimal value of a CR string (`"1/4"` becomes `0.25`).
///
/// # Errors
///
/// Returns `InvalidChallengeRating` when the string is not a CR.
pub fn cr_str_to_num(cr: &str) -> Result<f64> {
    cr.parse::<ChallengeRating>().map(ChallengeRating::as_f64)
}

impl Serialize for ChallengeRating {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct ChallengeRatingVisitor;

impl Visitor<'_> for ChallengeRatingVisitor {
    type Value = ChallengeRating;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a challenge rating such as 2, 0.25 or \"1/4\"")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Self::Value, E> {
        i32::try_from(value)
            .ok()
            .and_then(|whole| ChallengeRating::from_whole(whole).ok())
            .ok_or_else(|| E::custom(format!("challenge rating {value} is too large")))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Self::Value, E> {
        u64::try_from(value)
            .map_err(|_| E::custom(format!("challenge rating {value} is negative")))
            .and_then(|v| self.visit_u64(v))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> std::result::Result<Self::Value, E> {
        ChallengeRating::from_f64(value).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Self::Value, E> {
        value.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for ChallengeRating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(ChallengeRatingVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_crs_round_trip_through_strings() {
        let mut crs = vec![0.0, 0.125, 0.25, 0.5];
        crs.extend((1..=30).map(f64::from));
        for cr in crs {
            let text = cr_num_to_str(cr).unwrap();
            assert!((cr_str_to_num(&text).unwrap() - cr).abs() < f64::EPSILON, "{text}");
        }
    }

    #[test]
    fn string_forms_match_table_keys() {
        assert_eq!(cr_num_to_str(0.0).unwrap(), "0");
        assert_eq!(cr_num_to_str(0.125).unwrap(), "1/8");
        assert_eq!(cr_num_to_str(0.25).unwrap(), "1/4");
        assert_eq!(cr_num_to_str(0.5).unwrap(), "1/2");
        assert_eq!(cr_num_to_str(17.0).unwrap(), "17");
    }

    #[test]
    fn parses_fractions_integers_and_decimals() {
        assert_eq!("1/4".parse::<ChallengeRating>().unwrap().eighths(), 2);
        assert_eq!(" 15 ".parse::<ChallengeRating>().unwrap(), ChallengeRating::from_whole(15).unwrap());
        assert_eq!("0.5".parse::<ChallengeRating>().unwrap().eighths(), 4);
        assert!("1/3".parse::<ChallengeRating>().is_err());
        assert!("-1".parse::<ChallengeRating>().is_err());
        assert!("dragon".parse::<ChallengeRating>().is_err());
        assert!(ChallengeRating::from_f64(0.3).is_err());
    }

    #[test]
    fn offsets_leave_canonical_set() {
        let quarter = ChallengeRating::from_eighths(2);
        assert!(quarter.is_canonical());
        let shifted = quarter.offset(4).unwrap();
        assert!(!shifted.is_canonical());
        assert_eq!(shifted.to_string(), "17/4");
        let one = ChallengeRating::from_whole(1).unwrap();
        assert_eq!(one.offset(-2).unwrap().to_string(), "-1");
        assert_eq!(ChallengeRating::from_eighths(4).offset(-2).unwrap().to_string(), "-3/2");
    }

    #[test]
    fn oversized_ratings_are_rejected() {
        assert!(matches!(
            "400000000".parse::<ChallengeRating>(),
            Err(BalanceError::InvalidChallengeRating(raw)) if raw == "400000000"
        ));
        assert!("600000000/2".parse::<ChallengeRating>().is_err());
        assert!(ChallengeRating::from_whole(i32::MAX / 8 + 1).is_err());
        assert!(ChallengeRating::from_eighths(i32::MAX).offset(1).is_err());
        assert!(ChallengeRating::from_whole(0).unwrap().offset(i32::MIN).is_err());
        assert!(serde_json::from_str::<ChallengeRating>("400000000").is_err());
        assert!(serde_json::from_str::<ChallengeRating>("1e12").is_err());
    }

    #[test]
    fn deserializes_numbers_and_strings() {
        let crs: Vec<ChallengeRating> = serde_json::from_str(r#"[8, 0.25, "1/2", "3"]"#).unwrap();
        let eighths: Vec<i32> = crs.iter().map(|cr| cr.eighths()).collect();
        assert_eq!(eighths, vec![64, 2, 4, 24]);
        assert_eq!(serde_json::to_string(&crs[1]).unwrap(), r#""1/4""#);
    }
}
