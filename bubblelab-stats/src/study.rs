//! Table-level entry points tying the fitters to the featured table.
//!
//! These functions do the row bookkeeping: pick columns, drop rows the
//! models cannot use, forward-fill exogenous gaps, and hand clean slices to
//! the fitters.

use crate::arima::{ArimaFit, ArimaOrder};
use crate::arimax::ArimaxFit;
use crate::error::StatsError;
use crate::forward::forward_annualized_return;
use crate::ols::{ols, OlsFit};
use crate::ttest::{pooled_t_test, TTestResult};
use crate::walk_forward::{walk_forward_accuracy, WalkForwardReport};
use bubblelab_core::features::FeatureTable;

/// Default forward-return horizon, in months.
pub const DEFAULT_HORIZON_MONTHS: usize = 60;

/// Default chronological train share for walk-forward evaluation.
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.7;

/// OLS of forward annualized return on the valuation ratio.
///
/// Rows where either side is missing are dropped before fitting.
pub fn regression_valuation_vs_return(
    features: &FeatureTable,
    horizon_months: usize,
) -> Result<OlsFit, StatsError> {
    let table = &features.table;
    let prices = table
        .column("sp500")
        .ok_or_else(|| StatsError::MissingColumn("sp500".into()))?;
    let cape = table
        .column("cape")
        .ok_or_else(|| StatsError::MissingColumn("cape".into()))?;

    let forward = forward_annualized_return(prices, horizon_months);

    let mut y = Vec::new();
    let mut x = Vec::new();
    for (f, c) in forward.iter().zip(cape) {
        if f.is_finite() && c.is_finite() {
            y.push(*f);
            x.push(*c);
        }
    }
    ols(&y, &[("cape", &x)])
}

/// Mean monthly return inside flagged months versus outside them.
///
/// The mask column holds 1.0 / 0.0; `bubble_flag` is the usual choice.
pub fn flagged_vs_normal_test(
    features: &FeatureTable,
    mask_column: &str,
) -> Result<TTestResult, StatsError> {
    let table = &features.table;
    let returns = table
        .column("sp500_return")
        .ok_or_else(|| StatsError::MissingColumn("sp500_return".into()))?;
    let mask = table
        .column(mask_column)
        .ok_or_else(|| StatsError::MissingColumn(mask_column.into()))?;

    let flagged: Vec<f64> = returns
        .iter()
        .zip(mask)
        .filter(|(_, m)| **m == 1.0)
        .map(|(r, _)| *r)
        .collect();
    let normal: Vec<f64> = returns
        .iter()
        .zip(mask)
        .filter(|(_, m)| **m != 1.0)
        .map(|(r, _)| *r)
        .collect();

    pooled_t_test(&flagged, &normal)
}

/// ARIMA baseline on the monthly return series.
pub fn fit_return_baseline(
    features: &FeatureTable,
    order: ArimaOrder,
) -> Result<ArimaFit, StatsError> {
    let (returns, _) = return_series_with_exog(features)?;
    ArimaFit::fit(&returns, order)
}

/// Regression of monthly returns on valuation and the bubble flag, with
/// ARMA errors.
pub fn fit_return_arimax(
    features: &FeatureTable,
    order: ArimaOrder,
) -> Result<ArimaxFit, StatsError> {
    let (returns, exog) = return_series_with_exog(features)?;
    let regressors: Vec<(&str, &[f64])> = exog
        .iter()
        .map(|(name, xs)| (name.as_str(), xs.as_slice()))
        .collect();
    ArimaxFit::fit(&returns, &regressors, order)
}

/// Chronological walk-forward accuracy of the exogenous return model.
pub fn return_walk_forward(
    features: &FeatureTable,
    order: ArimaOrder,
    train_fraction: f64,
) -> Result<WalkForwardReport, StatsError> {
    let (returns, exog) = return_series_with_exog(features)?;
    let regressors: Vec<(&str, &[f64])> = exog
        .iter()
        .map(|(name, xs)| (name.as_str(), xs.as_slice()))
        .collect();
    walk_forward_accuracy(&returns, &regressors, order, train_fraction)
}

/// Extract the finite return series with aligned exogenous columns
/// (valuation and the bubble flag).
///
/// Exogenous gaps are forward-filled; leading rows where any regressor is
/// still missing are dropped together with their returns.
fn return_series_with_exog(
    features: &FeatureTable,
) -> Result<(Vec<f64>, Vec<(String, Vec<f64>)>), StatsError> {
    let table = &features.table;
    let returns = table
        .column("sp500_return")
        .ok_or_else(|| StatsError::MissingColumn("sp500_return".into()))?;
    let cape = table
        .column("cape")
        .ok_or_else(|| StatsError::MissingColumn("cape".into()))?;
    let flag = table
        .column("bubble_flag")
        .ok_or_else(|| StatsError::MissingColumn("bubble_flag".into()))?;

    // Rows with a return, exogenous values forward-filled across gaps.
    let mut y = Vec::new();
    let mut cape_col = Vec::new();
    let mut flag_col = Vec::new();
    let mut held_cape = f64::NAN;
    let mut held_flag = f64::NAN;
    for i in 0..returns.len() {
        if cape[i].is_finite() {
            held_cape = cape[i];
        }
        if flag[i].is_finite() {
            held_flag = flag[i];
        }
        if returns[i].is_finite() {
            y.push(returns[i]);
            cape_col.push(held_cape);
            flag_col.push(held_flag);
        }
    }

    // Drop the leading rows that still lack an exogenous value.
    let first_complete = cape_col
        .iter()
        .zip(&flag_col)
        .position(|(c, f)| c.is_finite() && f.is_finite())
        .ok_or(StatsError::TooFewObservations { need: 1, got: 0 })?;

    Ok((
        y.split_off(first_complete),
        vec![
            ("cape".to_string(), cape_col.split_off(first_complete)),
            ("bubble_flag".to_string(), flag_col.split_off(first_complete)),
        ],
    ))
}
