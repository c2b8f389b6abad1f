//! Combining series into one table.

use crate::domain::{MonthlySeries, MonthlyTable};

/// Element-wise "prefer primary, fall back to secondary".
///
/// Wherever the primary value is finite it wins; otherwise the fallback
/// value is used (which may itself be NaN).
pub fn combine_first(primary: &[f64], fallback: &[f64]) -> Vec<f64> {
    debug_assert_eq!(primary.len(), fallback.len());
    primary
        .iter()
        .zip(fallback)
        .map(|(&p, &f)| if p.is_finite() { p } else { f })
        .collect()
}

/// Merge named series onto the union of their month axes.
pub fn union_merge(series: &[MonthlySeries]) -> MonthlyTable {
    MonthlyTable::from_series(series)
}
