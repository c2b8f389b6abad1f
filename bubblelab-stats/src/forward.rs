//! Forward holding-period returns.

/// Annualized forward return over `horizon_months`.
///
/// `out[t] = ((x[t+h] - x[t]) / x[t]) / (h / 12)`; the last `h` slots are
/// NaN because their future value does not exist yet.
pub fn forward_annualized_return(prices: &[f64], horizon_months: usize) -> Vec<f64> {
    let n = prices.len();
    let mut out = vec![f64::NAN; n];
    if horizon_months == 0 {
        return out;
    }
    let years = horizon_months as f64 / 12.0;
    for t in 0..n.saturating_sub(horizon_months) {
        let now = prices[t];
        let future = prices[t + horizon_months];
        if now.is_finite() && future.is_finite() {
            out[t] = ((future - now) / now) / years;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-10,
            "assert_approx failed: actual={actual}, expected={expected}"
        );
    }

    #[test]
    fn doubling_over_five_years_is_twenty_percent_annualized() {
        // 100 -> 200 over 60 months: total return 1.0, divided by 5 years.
        let mut prices = vec![100.0; 61];
        prices[60] = 200.0;
        let fwd = forward_annualized_return(&prices, 60);
        assert_approx(fwd[0], 0.2);
        // Every other slot's future month is past the end of the series.
        assert!(fwd[1..].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn tail_has_no_forward_return() {
        let prices: Vec<f64> = (0..24).map(|i| 100.0 + f64::from(i)).collect();
        let fwd = forward_annualized_return(&prices, 12);
        assert!(fwd[12..].iter().all(|v| v.is_nan()));
        assert!(fwd[..12].iter().all(|v| v.is_finite()));
    }

    #[test]
    fn gaps_propagate() {
        let prices = [100.0, f64::NAN, 120.0, 130.0];
        let fwd = forward_annualized_return(&prices, 2);
        assert_approx(fwd[0], ((120.0 - 100.0) / 100.0) / (2.0 / 12.0));
        assert!(fwd[1].is_nan());
    }
}
