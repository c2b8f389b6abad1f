//! Chronological out-of-sample evaluation.
//!
//! Fits the regression-with-ARMA-errors model on the head of the series and
//! forecasts the entire tail with the held-out exogenous rows. Accuracy is
//! reported as directional agreement and mean absolute error.

use crate::arima::ArimaOrder;
use crate::arimax::ArimaxFit;
use crate::error::StatsError;
use serde::Serialize;

/// Out-of-sample accuracy of the tail forecast.
#[derive(Debug, Clone, Serialize)]
pub struct WalkForwardReport {
    pub directional_accuracy: f64,
    pub mae: f64,
    pub train_len: usize,
    pub test_len: usize,
}

/// Split chronologically at `train_fraction`, fit on the head, forecast the
/// whole tail, and score the forecast.
pub fn walk_forward_accuracy(
    y: &[f64],
    exog: &[(&str, &[f64])],
    order: ArimaOrder,
    train_fraction: f64,
) -> Result<WalkForwardReport, StatsError> {
    if !(0.0..1.0).contains(&train_fraction) || train_fraction == 0.0 {
        return Err(StatsError::InvalidParameter(format!(
            "train fraction {train_fraction} must be in (0, 1)"
        )));
    }

    let n = y.len();
    let split = (n as f64 * train_fraction) as usize;
    if split == 0 || split == n {
        return Err(StatsError::TooFewObservations { need: 2, got: n });
    }

    let train_y = &y[..split];
    let train_exog: Vec<(&str, &[f64])> = exog
        .iter()
        .map(|(name, xs)| (*name, &xs[..split]))
        .collect();
    let test_y = &y[split..];
    let test_exog: Vec<(&str, &[f64])> = exog
        .iter()
        .map(|(name, xs)| (*name, &xs[split..]))
        .collect();

    let fit = ArimaxFit::fit(train_y, &train_exog, order)?;
    let predictions = fit.forecast(&test_exog)?;

    let hits = predictions
        .iter()
        .zip(test_y)
        .filter(|(p, a)| sign(**p) == sign(**a))
        .count();
    let abs_err: f64 = predictions
        .iter()
        .zip(test_y)
        .map(|(p, a)| (p - a).abs())
        .sum();

    Ok(WalkForwardReport {
        directional_accuracy: hits as f64 / test_y.len() as f64,
        mae: abs_err / test_y.len() as f64,
        train_len: split,
        test_len: test_y.len(),
    })
}

/// Sign with a true zero (unlike `f64::signum`, which maps 0.0 to 1.0).
fn sign(x: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x.signum()
    }
}
