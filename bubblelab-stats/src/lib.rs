//! BubbleLab Stats — model fitters over the featured table.
//!
//! This crate builds on `bubblelab-core` to provide:
//! - Forward holding-period returns
//! - OLS with Student-t inference
//! - Pooled two-sample t-tests
//! - Pre/post-peak volatility comparison
//! - ARIMA and regression-with-ARMA-errors fitters
//! - Chronological walk-forward evaluation
//!
//! Every fitter is a pure function from its inputs to a result struct; the
//! `study` module does the column/row bookkeeping against a feature table.

pub mod arima;
pub mod arimax;
pub mod error;
pub mod forward;
pub mod ols;
pub mod study;
pub mod ttest;
pub mod volatility;
pub mod walk_forward;

pub use arima::{difference, ArimaFit, ArimaOrder};
pub use arimax::ArimaxFit;
pub use error::StatsError;
pub use forward::forward_annualized_return;
pub use ols::{ols, OlsFit};
pub use study::{
    fit_return_arimax, fit_return_baseline, flagged_vs_normal_test,
    regression_valuation_vs_return, return_walk_forward, DEFAULT_HORIZON_MONTHS,
    DEFAULT_TRAIN_FRACTION,
};
pub use ttest::{pooled_t_test, TTestResult};
pub use volatility::{volatility_regimes, VolatilityRegimes};
pub use walk_forward::{walk_forward_accuracy, WalkForwardReport};
