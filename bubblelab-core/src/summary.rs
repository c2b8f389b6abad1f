//! Per-window bubble summaries.
//!
//! For each configured window: find the price peak, the subsequent trough
//! (the window-wide minimum from the peak onward, not the nearest local
//! bottom), and the run-up/drawdown/duration statistics around them.
//! Windows with no rows, or no finite price, are skipped silently.

use crate::domain::Month;
use crate::features::FeatureTable;
use serde::Serialize;

/// Summary statistics for one bubble window.
#[derive(Debug, Clone, Serialize)]
pub struct BubbleSummary {
    pub window: String,
    pub peak_month: Month,
    /// Valuation ratio at the peak (NaN when unavailable).
    pub peak_valuation: f64,
    /// Compounded return over the last 12 in-window months ending at the peak.
    pub runup_12m: f64,
    /// Compounded return over the last 24 in-window months ending at the peak.
    pub runup_24m: f64,
    /// Most negative drawdown between the peak and the window end.
    pub max_drawdown: f64,
    /// Whole months from the peak to the trough.
    pub months_to_trough: i32,
}

/// Compute one summary per non-empty window, in window-set order.
pub fn compute_bubble_summary(features: &FeatureTable) -> Vec<BubbleSummary> {
    let table = &features.table;
    let mut records = Vec::new();

    for window in features.windows.iter() {
        let rows = table.row_range(window.start, window.end);
        if rows.is_empty() {
            continue;
        }

        let Some(sp500) = table.column("sp500") else {
            continue;
        };
        let Some(peak) = argmax(&sp500[rows.clone()]).map(|i| rows.start + i) else {
            // A window with rows but no finite price has nothing to summarize.
            continue;
        };
        // Trough: minimum over the remainder of the window, peak included.
        let trough = argmin(&sp500[peak..rows.end])
            .map(|i| peak + i)
            .unwrap_or(peak);

        let (runup_12m, runup_24m) = match table.column("sp500_return") {
            Some(returns) => {
                let upto_peak = &returns[rows.start..=peak];
                (compound_tail(upto_peak, 12), compound_tail(upto_peak, 24))
            }
            None => (0.0, 0.0),
        };

        let max_drawdown = table
            .column("sp500_drawdown")
            .map(|dd| min_finite(&dd[peak..rows.end]))
            .unwrap_or(f64::NAN);

        let months = table.months();
        records.push(BubbleSummary {
            window: window.name.clone(),
            peak_month: months[peak],
            peak_valuation: table.get("cape", peak),
            runup_12m,
            runup_24m,
            max_drawdown,
            months_to_trough: months[trough].months_since(&months[peak]),
        });
    }

    records
}

/// Index of the first maximum among finite values.
fn argmax(xs: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &x) in xs.iter().enumerate() {
        if x.is_finite() && best.map_or(true, |(_, b)| x > b) {
            best = Some((i, x));
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the first minimum among finite values.
fn argmin(xs: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &x) in xs.iter().enumerate() {
        if x.is_finite() && best.map_or(true, |(_, b)| x < b) {
            best = Some((i, x));
        }
    }
    best.map(|(i, _)| i)
}

/// Compound the last `n` returns of a slice, skipping NaN.
///
/// An all-NaN (or empty) tail compounds to zero, matching a product over
/// no observations.
fn compound_tail(returns: &[f64], n: usize) -> f64 {
    let tail = &returns[returns.len().saturating_sub(n)..];
    tail.iter()
        .filter(|r| r.is_finite())
        .map(|r| 1.0 + r)
        .product::<f64>()
        - 1.0
}

/// Minimum of the finite values (NaN when there are none).
fn min_finite(xs: &[f64]) -> f64 {
    xs.iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::NAN, |acc, v| if acc.is_finite() && acc < v { acc } else { v })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureConfig;
    use crate::domain::{BubbleWindow, BubbleWindowSet, MonthlySeries, MonthlyTable};
    use crate::features::prepare_features;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "assert_approx failed: actual={actual}, expected={expected}"
        );
    }

    fn feature_fixture(prices: Vec<f64>, windows: BubbleWindowSet) -> FeatureTable {
        let months: Vec<Month> = (0..prices.len() as i32)
            .map(|i| Month::new(1995, 1).plus_months(i))
            .collect();
        let series = vec![MonthlySeries::from_points(
            "sp500",
            months.into_iter().zip(prices).collect(),
        )];
        let merged = MonthlyTable::from_series(&series);
        prepare_features(&merged, &FeatureConfig::default(), &windows)
    }

    fn single_window(start: Month, end: Month) -> BubbleWindowSet {
        BubbleWindowSet::new(vec![BubbleWindow::new("episode", start, end)]).unwrap()
    }

    #[test]
    fn rise_then_fall_finds_peak_and_trough() {
        // 100 -> 110 -> 121 (peak) -> 108.9 -> 96.8 -> 99.0
        let prices = vec![100.0, 110.0, 121.0, 108.9, 96.8, 99.0];
        let windows = single_window(Month::new(1995, 1), Month::new(1995, 6));
        let features = feature_fixture(prices, windows);

        let summaries = compute_bubble_summary(&features);
        assert_eq!(summaries.len(), 1);
        let s = &summaries[0];

        assert_eq!(s.peak_month, Month::new(1995, 3));
        // Trough is the window-wide minimum after the peak (96.8 in month 5),
        // not the later partial recovery.
        assert_eq!(s.months_to_trough, 2);
        assert_approx(s.max_drawdown, (96.8 - 121.0) / 121.0);
        // Run-up compounds the two +10% months before the peak.
        assert_approx(s.runup_12m, 1.1 * 1.1 - 1.0);
        assert_approx(s.runup_24m, 1.1 * 1.1 - 1.0);
    }

    #[test]
    fn trough_is_window_wide_minimum_not_first_local_bottom() {
        // After the peak at index 2 there is a local bottom (90), a bounce,
        // then a deeper low (80). The trough must be the deeper low.
        let prices = vec![100.0, 120.0, 130.0, 90.0, 110.0, 80.0, 85.0];
        let windows = single_window(Month::new(1995, 1), Month::new(1995, 7));
        let features = feature_fixture(prices, windows);

        let s = &compute_bubble_summary(&features)[0];
        assert_eq!(s.peak_month, Month::new(1995, 3));
        assert_eq!(s.months_to_trough, 3);
        assert_approx(s.max_drawdown, (80.0 - 130.0) / 130.0);
    }

    #[test]
    fn single_row_window_is_its_own_peak_and_trough() {
        let prices = vec![100.0, 110.0, 120.0];
        let windows = single_window(Month::new(1995, 2), Month::new(1995, 2));
        let features = feature_fixture(prices, windows);

        let s = &compute_bubble_summary(&features)[0];
        assert_eq!(s.peak_month, Month::new(1995, 2));
        assert_eq!(s.months_to_trough, 0);
        // Drawdown at a running maximum is exactly zero.
        assert_approx(s.max_drawdown, 0.0);
    }

    #[test]
    fn empty_windows_are_skipped() {
        let prices = vec![100.0, 110.0];
        let windows = BubbleWindowSet::new(vec![
            BubbleWindow::new("before_data", Month::new(1980, 1), Month::new(1980, 12)),
            BubbleWindow::new("episode", Month::new(1995, 1), Month::new(1995, 2)),
        ])
        .unwrap();
        let features = feature_fixture(prices, windows);

        let summaries = compute_bubble_summary(&features);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].window, "episode");
    }

    #[test]
    fn output_follows_window_set_order() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + f64::from(i)).collect();
        let windows = BubbleWindowSet::new(vec![
            BubbleWindow::new("late", Month::new(1996, 6), Month::new(1996, 12)),
            BubbleWindow::new("early", Month::new(1995, 1), Month::new(1995, 6)),
        ])
        .unwrap();
        let features = feature_fixture(prices, windows);

        let names: Vec<String> = compute_bubble_summary(&features)
            .into_iter()
            .map(|s| s.window)
            .collect();
        assert_eq!(names, vec!["late".to_string(), "early".to_string()]);
    }

    #[test]
    fn peak_valuation_is_nan_without_cape() {
        let prices = vec![100.0, 110.0];
        let windows = single_window(Month::new(1995, 1), Month::new(1995, 2));
        let features = feature_fixture(prices, windows);

        let s = &compute_bubble_summary(&features)[0];
        assert!(s.peak_valuation.is_nan());
    }
}
