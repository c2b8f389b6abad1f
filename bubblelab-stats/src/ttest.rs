//! Pooled two-sample t-test.

use crate::error::StatsError;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Result of comparing two group means.
#[derive(Debug, Clone, Serialize)]
pub struct TTestResult {
    pub mean_a: f64,
    pub mean_b: f64,
    pub t_stat: f64,
    /// Two-sided p-value.
    pub p_value: f64,
    pub n_a: usize,
    pub n_b: usize,
}

/// Two-sided pooled-variance t-test for a difference in means.
///
/// Non-finite inputs are dropped before testing. Both groups need at least
/// two finite observations.
pub fn pooled_t_test(a: &[f64], b: &[f64]) -> Result<TTestResult, StatsError> {
    let a: Vec<f64> = a.iter().copied().filter(|v| v.is_finite()).collect();
    let b: Vec<f64> = b.iter().copied().filter(|v| v.is_finite()).collect();
    let (n_a, n_b) = (a.len(), b.len());
    if n_a < 2 || n_b < 2 {
        return Err(StatsError::TooFewObservations {
            need: 2,
            got: n_a.min(n_b),
        });
    }

    let mean_a = a.iter().sum::<f64>() / n_a as f64;
    let mean_b = b.iter().sum::<f64>() / n_b as f64;
    let var_a = a.iter().map(|v| (v - mean_a).powi(2)).sum::<f64>() / (n_a - 1) as f64;
    let var_b = b.iter().map(|v| (v - mean_b).powi(2)).sum::<f64>() / (n_b - 1) as f64;

    let df = (n_a + n_b - 2) as f64;
    let pooled_var = ((n_a - 1) as f64 * var_a + (n_b - 1) as f64 * var_b) / df;
    let se = (pooled_var * (1.0 / n_a as f64 + 1.0 / n_b as f64)).sqrt();
    let t_stat = (mean_a - mean_b) / se;

    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| StatsError::InvalidParameter(e.to_string()))?;
    let p_value = 2.0 * (1.0 - dist.cdf(t_stat.abs()));

    Ok(TTestResult {
        mean_a,
        mean_b,
        t_stat,
        p_value,
        n_a,
        n_b,
    })
}
