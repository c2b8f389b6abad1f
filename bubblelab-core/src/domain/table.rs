//! Monthly table: one shared month axis, named f64 columns.
//!
//! The table is the value every pipeline stage consumes and returns.
//! Invariants: the month axis is ascending and duplicate-free; every column
//! has exactly one value per month; gaps are NaN and propagate downstream.
//! Boolean flag columns are stored as 1.0 / 0.0.

use super::month::Month;
use super::series::MonthlySeries;
use std::collections::BTreeSet;
use std::ops::Range;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyTable {
    months: Vec<Month>,
    columns: Vec<(String, Vec<f64>)>,
}

impl MonthlyTable {
    /// Build a table on the union of the series' month axes.
    ///
    /// Months absent from a given series become NaN in its column. Column
    /// order follows the input order.
    pub fn from_series(series: &[MonthlySeries]) -> Self {
        let mut axis = BTreeSet::new();
        for s in series {
            axis.extend(s.months.iter().copied());
        }
        let months: Vec<Month> = axis.into_iter().collect();

        let columns = series
            .iter()
            .map(|s| {
                let values = months.iter().map(|m| s.value_at(*m)).collect();
                (s.name.clone(), values)
            })
            .collect();

        Self { months, columns }
    }

    pub fn with_axis(months: Vec<Month>) -> Self {
        debug_assert!(months.windows(2).all(|w| w[0] < w[1]));
        Self {
            months,
            columns: Vec::new(),
        }
    }

    pub fn months(&self) -> &[Month] {
        &self.months
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Value of `column` at row `i`; NaN when the column is absent.
    pub fn get(&self, name: &str, i: usize) -> f64 {
        self.column(name).map_or(f64::NAN, |v| v[i])
    }

    /// Add a column, replacing any existing column of the same name in place.
    pub fn set_column(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        assert_eq!(
            values.len(),
            self.months.len(),
            "column '{name}' length must match the month axis"
        );
        if let Some(slot) = self.columns.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = values;
        } else {
            self.columns.push((name, values));
        }
    }

    /// Row positions whose months fall inside `start..=end`.
    pub fn row_range(&self, start: Month, end: Month) -> Range<usize> {
        let lo = self.months.partition_point(|m| *m < start);
        let hi = self.months.partition_point(|m| *m <= end);
        lo..hi
    }

    /// Drop rows where every column is NaN, ignoring the named columns.
    ///
    /// Flag columns are excluded from the check because 0.0 would keep an
    /// otherwise-empty row alive.
    pub fn drop_all_nan_rows(&mut self, ignore: &[&str]) {
        let checked: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, (name, _))| !ignore.contains(&name.as_str()))
            .map(|(i, _)| i)
            .collect();

        let keep: Vec<bool> = (0..self.months.len())
            .map(|row| checked.iter().any(|&c| self.columns[c].1[row].is_finite()))
            .collect();

        if keep.iter().all(|&k| k) {
            return;
        }

        let mut it = keep.iter();
        self.months.retain(|_| *it.next().unwrap());
        for (_, values) in &mut self.columns {
            let mut it = keep.iter();
            values.retain(|_| *it.next().unwrap());
        }
    }
}
