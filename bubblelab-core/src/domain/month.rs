//! Calendar-month index type.
//!
//! Every table in this crate is indexed by calendar month. `Month` is a thin
//! (year, month) pair with ordering, month arithmetic, and the decimal-year
//! conversion used by the Shiller spreadsheet's date column.

use chrono::{Datelike, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A calendar month (year + month-of-year, 1..=12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Self {
        assert!((1..=12).contains(&month), "month must be in 1..=12");
        Self { year, month }
    }

    pub const fn year(&self) -> i32 {
        self.year
    }

    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Month containing the given date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Decode a month from a fractional-year value.
    ///
    /// Floor rule: `year = floor(d)`,
    /// `month = clamp(floor((d - year) * 12) + 1, 1, 12)`. This is the
    /// decoding applied to the Shiller workbook's date column, preserved
    /// bit-for-bit including its float-truncation quirks.
    pub fn from_decimal_year(decimal: f64) -> Self {
        let year = decimal.floor();
        let month = (((decimal - year) * 12.0).floor() as i64 + 1).clamp(1, 12) as u32;
        Self {
            year: year as i32,
            month,
        }
    }

    /// First day of the month.
    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap()
    }

    /// Last day of the month. This is the timestamp months are serialized as.
    pub fn end_date(&self) -> NaiveDate {
        let next = self.plus_months(1);
        next.start_date() - chrono::Duration::days(1)
    }

    /// The month `n` months after this one (`n` may be negative).
    pub fn plus_months(&self, n: i32) -> Self {
        let total = self.year * 12 + (self.month as i32 - 1) + n;
        Self {
            year: total.div_euclid(12),
            month: (total.rem_euclid(12) + 1) as u32,
        }
    }

    /// Signed number of months from `other` to `self`.
    pub fn months_since(&self, other: &Self) -> i32 {
        (self.year - other.year) * 12 + self.month as i32 - other.month as i32
    }

    /// Quarter-end month of the quarter containing this month
    /// (Mar, Jun, Sep, or Dec).
    pub fn quarter_end(&self) -> Self {
        let end = ((self.month - 1) / 3) * 3 + 3;
        Self {
            year: self.year,
            month: end,
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Parses `YYYY-MM` or a full `YYYY-MM-DD` date.
impl FromStr for Month {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self::from_date(date));
        }
        let (y, m) = s
            .split_once('-')
            .ok_or_else(|| format!("invalid month '{s}', expected YYYY-MM"))?;
        let year: i32 = y.parse().map_err(|_| format!("invalid year in '{s}'"))?;
        let month: u32 = m.parse().map_err(|_| format!("invalid month in '{s}'"))?;
        if !(1..=12).contains(&month) {
            return Err(format!("month out of range in '{s}'"));
        }
        Ok(Self { year, month })
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
