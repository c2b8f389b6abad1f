//! Regression with ARMA errors (ARIMAX).
//!
//! Two-step fit: OLS of the series on the exogenous regressors, then an
//! ARMA(p, q) model on the regression residuals. Forecasts recombine the
//! regression part (which needs future exogenous rows) with the error
//! model's shock forecast. Differencing is not supported alongside
//! exogenous regressors; every fit here runs with d = 0.

use crate::arima::{ArimaFit, ArimaOrder};
use crate::error::StatsError;
use crate::ols::{ols, OlsFit};
use serde::Serialize;

/// A fitted regression-with-ARMA-errors model.
#[derive(Debug, Clone, Serialize)]
pub struct ArimaxFit {
    pub order: ArimaOrder,
    /// The exogenous regression, intercept first.
    pub regression: OlsFit,
    /// ARMA model on the regression residuals.
    pub error_model: ArimaFit,
}

impl ArimaxFit {
    /// Fit `y` on exogenous columns with ARMA(p, q) errors.
    ///
    /// Rows must be pre-aligned and finite.
    pub fn fit(
        y: &[f64],
        exog: &[(&str, &[f64])],
        order: ArimaOrder,
    ) -> Result<Self, StatsError> {
        if order.d != 0 {
            return Err(StatsError::InvalidParameter(
                "differencing is not supported with exogenous regressors".into(),
            ));
        }
        if exog.is_empty() {
            return Err(StatsError::InvalidParameter(
                "at least one exogenous regressor is required".into(),
            ));
        }

        let regression = ols(y, exog)?;
        let error_model = ArimaFit::fit(&regression.residuals, order)?;

        Ok(Self {
            order,
            regression,
            error_model,
        })
    }

    /// Predicted values for future exogenous rows.
    ///
    /// `exog_future` is column-ordered to match the fit. The error model
    /// contributes its multi-step forecast from the end of the training
    /// residuals; the regression part is exact given the exogenous values.
    pub fn forecast(&self, exog_future: &[(&str, &[f64])]) -> Result<Vec<f64>, StatsError> {
        if exog_future.len() + 1 != self.regression.params.len() {
            return Err(StatsError::InvalidParameter(format!(
                "expected {} exogenous columns, got {}",
                self.regression.params.len() - 1,
                exog_future.len()
            )));
        }
        let steps = exog_future
            .first()
            .map(|(_, xs)| xs.len())
            .unwrap_or(0);
        for (name, xs) in exog_future {
            if xs.len() != steps {
                return Err(StatsError::InvalidParameter(format!(
                    "exogenous column '{name}' has {} rows, expected {steps}",
                    xs.len()
                )));
            }
        }

        let error_path = self
            .error_model
            .forecast(&self.regression.residuals, steps);

        let mut out = Vec::with_capacity(steps);
        for t in 0..steps {
            let mut value = self.regression.params[0] + error_path[t];
            for (j, (_, xs)) in exog_future.iter().enumerate() {
                value += self.regression.params[j + 1] * xs[t];
            }
            out.push(value);
        }
        Ok(out)
    }

    /// Plain-text description of both stages.
    pub fn summary(&self) -> String {
        format!(
            "{}with errors:\n{}",
            self.regression.summary(),
            self.error_model.summary()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise(i: usize) -> f64 {
        ((i * 7919) % 1000) as f64 / 5000.0 - 0.1
    }

    /// y = 2 + 0.5 * x + AR(1) error with phi = 0.6.
    fn fixture(n: usize) -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..n).map(|i| ((i * 31) % 17) as f64 / 4.0).collect();
        let mut err = vec![0.0];
        for i in 1..n {
            err.push(0.6 * err[i - 1] + noise(i));
        }
        let y: Vec<f64> = (0..n).map(|i| 2.0 + 0.5 * x[i] + err[i]).collect();
        (y, x)
    }

    #[test]
    fn recovers_regression_coefficients() {
        let (y, x) = fixture(300);
        let fit = ArimaxFit::fit(&y, &[("x", &x)], ArimaOrder::new(1, 0, 0)).unwrap();

        assert!((fit.regression.params[0] - 2.0).abs() < 0.3);
        assert!((fit.regression.params[1] - 0.5).abs() < 0.1);
        // The error model should pick up the residual autocorrelation.
        assert!(fit.error_model.ar[0] > 0.3);
    }

    #[test]
    fn forecast_tracks_exogenous_swing() {
        let (y, x) = fixture(300);
        let fit = ArimaxFit::fit(&y, &[("x", &x)], ArimaOrder::new(1, 0, 0)).unwrap();

        let lo = vec![0.0; 3];
        let hi = vec![4.0; 3];
        let pred_lo = fit.forecast(&[("x", &lo)]).unwrap();
        let pred_hi = fit.forecast(&[("x", &hi)]).unwrap();
        for t in 0..3 {
            // Roughly beta * 4 apart, whatever the error forecast adds.
            assert!((pred_hi[t] - pred_lo[t] - 2.0).abs() < 0.5);
        }
    }

    #[test]
    fn differencing_is_rejected() {
        let (y, x) = fixture(60);
        let err = ArimaxFit::fit(&y, &[("x", &x)], ArimaOrder::new(1, 1, 0)).unwrap_err();
        assert!(matches!(err, StatsError::InvalidParameter(_)));
    }

    #[test]
    fn forecast_validates_column_count() {
        let (y, x) = fixture(60);
        let fit = ArimaxFit::fit(&y, &[("x", &x)], ArimaOrder::new(1, 0, 0)).unwrap();
        assert!(fit.forecast(&[]).is_err());
    }
}
