//! A single named series on a monthly axis.

use super::month::Month;

/// One named numeric series: ascending unique months, NaN = missing.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySeries {
    pub name: String,
    pub months: Vec<Month>,
    pub values: Vec<f64>,
}

impl MonthlySeries {
    /// Build a series from (month, value) points.
    ///
    /// Points are stably sorted by month; on duplicate months the first
    /// occurrence in input order wins.
    pub fn from_points(name: impl Into<String>, mut points: Vec<(Month, f64)>) -> Self {
        points.sort_by_key(|(m, _)| *m);
        points.dedup_by_key(|(m, _)| *m);
        let (months, values) = points.into_iter().unzip();
        Self {
            name: name.into(),
            months,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// Value at a given month, NaN when the month is absent.
    pub fn value_at(&self, month: Month) -> f64 {
        match self.months.binary_search(&month) {
            Ok(i) => self.values[i],
            Err(_) => f64::NAN,
        }
    }
}
