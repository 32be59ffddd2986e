//! Shared primitive types used across the whole pipeline.

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A stable customer identifier, exactly as it appears in the input.
pub type CustomerId = String;

/// A unique order identifier, exactly as it appears in the input.
pub type OrderId = String;

/// The identifier of one engine run inside the data mart.
pub type RunId = String;

/// Months since a customer's cohort month. Never negative once enriched.
pub type Offset = u32;

/// A monetary amount. All inputs are non-negative.
pub type Money = f64;

/// A metric that may be undefined (zero denominator).
/// `None` is a first-class value and is never coerced to zero.
pub type Metric = Option<f64>;

/// A calendar month key, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year:  i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year:  date.year(),
            month: date.month(),
        }
    }

    /// Months elapsed since year 0, used for offset arithmetic.
    pub fn ordinal(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    /// Whole calendar months from `earlier` to `self`. Negative if `self` is earlier.
    pub fn months_since(&self, earlier: YearMonth) -> i64 {
        self.ordinal() - earlier.ordinal()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    /// Accepts `YYYY-MM`, or a full `YYYY-MM-DD` date truncated to its month.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self::of(date));
        }
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("'{s}' is not a YYYY-MM month"))?;
        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            return Err(format!("'{s}' is not a YYYY-MM month"));
        }
        let year: i32 = year
            .parse()
            .map_err(|_| format!("'{s}' has an invalid year"))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("'{s}' has an invalid month"))?;
        YearMonth::new(year, month).ok_or_else(|| format!("'{s}' has month out of range"))
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Order identifiers compare numerically when both are integers,
/// lexicographically otherwise. Integers sort before non-integers.
pub fn cmp_order_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
