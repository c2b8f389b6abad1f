//! Ordinary least squares via the normal equations.
//!
//! Small designs only (a constant plus a handful of regressors), so the
//! direct `(X'X)^-1 X'y` solve is plenty. Inference uses the Student-t
//! distribution with `n - k` degrees of freedom.

use crate::error::StatsError;
use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// A fitted least-squares regression, intercept first.
#[derive(Debug, Clone, Serialize)]
pub struct OlsFit {
    /// Regressor names, starting with "const".
    pub names: Vec<String>,
    pub params: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub t_values: Vec<f64>,
    pub p_values: Vec<f64>,
    pub r_squared: f64,
    /// Residual variance, SSR / (n - k).
    pub sigma2: f64,
    pub nobs: usize,
    #[serde(skip)]
    pub residuals: Vec<f64>,
}

impl OlsFit {
    /// Plain-text summary in regression-table shape.
    pub fn summary(&self) -> String {
        let mut s = format!(
            "OLS (n = {}, R^2 = {:.4})\n{:<12} {:>12} {:>12} {:>9} {:>9}\n",
            self.nobs, self.r_squared, "term", "coef", "std err", "t", "P>|t|"
        );
        for i in 0..self.names.len() {
            s.push_str(&format!(
                "{:<12} {:>12.6} {:>12.6} {:>9.3} {:>9.4}\n",
                self.names[i],
                self.params[i],
                self.std_errors[i],
                self.t_values[i],
                self.p_values[i]
            ));
        }
        s
    }
}

/// Fit `y` on the named regressor columns, with an intercept prepended.
///
/// Rows must be pre-filtered: every value in `y` and the regressors is
/// expected to be finite.
pub fn ols(y: &[f64], regressors: &[(&str, &[f64])]) -> Result<OlsFit, StatsError> {
    let n = y.len();
    let k = regressors.len() + 1;
    for (name, xs) in regressors {
        if xs.len() != n {
            return Err(StatsError::InvalidParameter(format!(
                "regressor '{name}' has {} rows, expected {n}",
                xs.len()
            )));
        }
    }
    if n <= k {
        return Err(StatsError::TooFewObservations { need: k + 1, got: n });
    }

    let mut design = Vec::with_capacity(n * k);
    for row in 0..n {
        design.push(1.0);
        for (_, xs) in regressors {
            design.push(xs[row]);
        }
    }
    let x = DMatrix::from_row_slice(n, k, &design);
    let y_vec = DVector::from_column_slice(y);

    let xtx = x.transpose() * &x;
    let xtx_inv = xtx.try_inverse().ok_or(StatsError::SingularDesign)?;
    let beta = &xtx_inv * x.transpose() * &y_vec;

    let fitted = &x * &beta;
    let residuals: Vec<f64> = (y_vec - fitted).iter().copied().collect();

    let ssr: f64 = residuals.iter().map(|r| r * r).sum();
    let df = (n - k) as f64;
    let sigma2 = ssr / df;

    let y_mean = y.iter().sum::<f64>() / n as f64;
    let sst: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let r_squared = if sst > 0.0 { 1.0 - ssr / sst } else { f64::NAN };

    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| StatsError::InvalidParameter(e.to_string()))?;

    let mut params = Vec::with_capacity(k);
    let mut std_errors = Vec::with_capacity(k);
    let mut t_values = Vec::with_capacity(k);
    let mut p_values = Vec::with_capacity(k);
    for i in 0..k {
        let b = beta[i];
        let se = (xtx_inv[(i, i)] * sigma2).sqrt();
        let t = b / se;
        params.push(b);
        std_errors.push(se);
        t_values.push(t);
        p_values.push(2.0 * (1.0 - dist.cdf(t.abs())));
    }

    let mut names = vec!["const".to_string()];
    names.extend(regressors.iter().map(|(name, _)| name.to_string()));

    Ok(OlsFit {
        names,
        params,
        std_errors,
        t_values,
        p_values,
        r_squared,
        sigma2,
        nobs: n,
        residuals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
        assert!(
            (actual - expected).abs() < epsilon,
            "assert_approx failed: actual={actual}, expected={expected}"
        );
    }

    #[test]
    fn recovers_exact_linear_relationship() {
        // y = 3 + 2x, no noise
        let x: Vec<f64> = (0..20).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 + 2.0 * v).collect();

        let fit = ols(&y, &[("x", &x)]).unwrap();
        assert_approx(fit.params[0], 3.0, 1e-8);
        assert_approx(fit.params[1], 2.0, 1e-8);
        assert_approx(fit.r_squared, 1.0, 1e-10);
        assert!(fit.residuals.iter().all(|r| r.abs() < 1e-8));
    }

    #[test]
    fn noisy_fit_has_sane_inference() {
        // y = 1 + 0.5x + deterministic "noise" in [-0.5, 0.5]
        let x: Vec<f64> = (0..100).map(f64::from).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, v)| 1.0 + 0.5 * v + ((i * 37 % 100) as f64 / 100.0 - 0.5))
            .collect();

        let fit = ols(&y, &[("x", &x)]).unwrap();
        assert_approx(fit.params[1], 0.5, 0.05);
        assert!(fit.r_squared > 0.99);
        // The slope is overwhelmingly significant on 100 points.
        assert!(fit.p_values[1] < 1e-6);
        assert!(fit.std_errors[1] > 0.0);
        assert_eq!(fit.nobs, 100);
    }

    #[test]
    fn flat_regressor_is_singular() {
        let x = vec![1.0; 10];
        let y: Vec<f64> = (0..10).map(f64::from).collect();
        // A constant regressor duplicates the intercept column.
        assert_eq!(ols(&y, &[("x", &x)]).unwrap_err(), StatsError::SingularDesign);
    }

    #[test]
    fn too_few_rows_is_an_error() {
        let err = ols(&[1.0, 2.0], &[("x", &[1.0, 2.0])]).unwrap_err();
        assert!(matches!(err, StatsError::TooFewObservations { .. }));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = ols(&[1.0, 2.0, 3.0], &[("x", &[1.0])]).unwrap_err();
        assert!(matches!(err, StatsError::InvalidParameter(_)));
    }

    #[test]
    fn summary_lists_every_term() {
        let x: Vec<f64> = (0..20).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 + 2.0 * v).collect();
        let fit = ols(&y, &[("cape", &x)]).unwrap();
        let text = fit.summary();
        assert!(text.contains("const"));
        assert!(text.contains("cape"));
    }
}
