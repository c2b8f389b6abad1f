//! ARIMA(p, d, q) by conditional least squares.
//!
//! Estimation strategy per component:
//! - pure AR: lagged-design OLS
//! - pure MA: iterative conditional estimation on the centered series
//! - mixed ARMA: two-step Hannan-Rissanen (long-AR residual proxies, then
//!   OLS on AR lags plus lagged residual proxies)
//!
//! Differencing is applied before estimation and undone on forecasts.
//! Fit quality is reported as AIC/BIC from the Gaussian log-likelihood.

use crate::error::StatsError;
use crate::ols::ols;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Model order (AR terms, differences, MA terms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self::new(1, 0, 1)
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

/// Parses `p,d,q` (e.g. `1,0,1`).
impl FromStr for ArimaOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(format!("invalid order '{s}', expected p,d,q"));
        }
        let parse = |part: &str| {
            part.parse::<usize>()
                .map_err(|_| format!("invalid order component '{part}'"))
        };
        Ok(Self::new(parse(parts[0])?, parse(parts[1])?, parse(parts[2])?))
    }
}

/// A fitted ARIMA model.
#[derive(Debug, Clone, Serialize)]
pub struct ArimaFit {
    pub order: ArimaOrder,
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub intercept: f64,
    pub sigma2: f64,
    pub aic: f64,
    pub bic: f64,
    pub nobs: usize,
    #[serde(skip)]
    pub residuals: Vec<f64>,
}

impl ArimaFit {
    /// Fit on a finite series (callers drop NaN beforehand).
    pub fn fit(series: &[f64], order: ArimaOrder) -> Result<Self, StatsError> {
        if series.iter().any(|v| !v.is_finite()) {
            return Err(StatsError::InvalidParameter(
                "series contains non-finite values".into(),
            ));
        }
        let min_len = order.p + order.d + order.q + 10;
        if series.len() < min_len {
            return Err(StatsError::TooFewObservations {
                need: min_len,
                got: series.len(),
            });
        }

        let diffed = difference(series, order.d);

        let (ar, ma, intercept, residuals) = if order.q == 0 {
            estimate_ar(&diffed, order.p)?
        } else if order.p == 0 {
            estimate_ma(&diffed, order.q)?
        } else {
            estimate_arma(&diffed, order.p, order.q)?
        };

        let n = residuals.len() as f64;
        let k = (order.p + order.q + 1) as f64;
        let sigma2 = residuals.iter().map(|r| r * r).sum::<f64>() / n;
        let log_likelihood = -0.5 * n * (1.0 + (2.0 * std::f64::consts::PI * sigma2).ln());

        Ok(Self {
            order,
            ar,
            ma,
            intercept,
            sigma2,
            aic: -2.0 * log_likelihood + 2.0 * k,
            bic: -2.0 * log_likelihood + k * n.ln(),
            nobs: series.len(),
            residuals,
        })
    }

    /// Forecast `steps` values past the end of `series`.
    ///
    /// Future shocks take their expectation (zero), so MA terms fade after
    /// `q` steps and AR terms decay geometrically toward the intercept.
    pub fn forecast(&self, series: &[f64], steps: usize) -> Vec<f64> {
        let mut history = difference(series, self.order.d);
        let mut shocks = self.residuals.clone();
        let mut forecasts = Vec::with_capacity(steps);

        for _ in 0..steps {
            let mut value = self.intercept;
            for (i, &phi) in self.ar.iter().enumerate() {
                if let Some(&lag) = history.get(history.len().wrapping_sub(i + 1)) {
                    value += phi * lag;
                }
            }
            for (i, &theta) in self.ma.iter().enumerate() {
                if let Some(&shock) = shocks.get(shocks.len().wrapping_sub(i + 1)) {
                    value += theta * shock;
                }
            }
            history.push(value);
            shocks.push(0.0);
            forecasts.push(value);
        }

        if self.order.d > 0 {
            let mut out = forecasts;
            for _ in 0..self.order.d {
                out = integrate(&out, *series.last().unwrap_or(&0.0));
            }
            out
        } else {
            forecasts
        }
    }

    /// Plain-text description of the fitted model.
    pub fn summary(&self) -> String {
        let mut s = format!("ARIMA{} fit (n = {})\n", self.order, self.nobs);
        for (i, phi) in self.ar.iter().enumerate() {
            s.push_str(&format!("  ar{}      {:>12.6}\n", i + 1, phi));
        }
        for (i, theta) in self.ma.iter().enumerate() {
            s.push_str(&format!("  ma{}      {:>12.6}\n", i + 1, theta));
        }
        s.push_str(&format!("  const    {:>12.6}\n", self.intercept));
        s.push_str(&format!("  sigma^2  {:>12.6}\n", self.sigma2));
        s.push_str(&format!("  AIC      {:>12.2}\n", self.aic));
        s.push_str(&format!("  BIC      {:>12.2}\n", self.bic));
        s
    }
}

/// Difference a series `d` times.
pub fn difference(data: &[f64], d: usize) -> Vec<f64> {
    let mut out = data.to_vec();
    for _ in 0..d {
        if out.len() < 2 {
            return Vec::new();
        }
        out = out.windows(2).map(|w| w[1] - w[0]).collect();
    }
    out
}

/// Undo one differencing pass, cumulating from `start`.
fn integrate(diffed: &[f64], start: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(diffed.len());
    let mut level = start;
    for &d in diffed {
        level += d;
        out.push(level);
    }
    out
}

type Components = (Vec<f64>, Vec<f64>, f64, Vec<f64>);

/// AR(p) by lagged-design OLS. `p = 0` degenerates to a constant fit.
fn estimate_ar(data: &[f64], p: usize) -> Result<Components, StatsError> {
    let n = data.len();
    if n < p + 3 {
        return Err(StatsError::TooFewObservations { need: p + 3, got: n });
    }

    let y = &data[p..];
    let lag_columns: Vec<Vec<f64>> = (1..=p).map(|i| data[p - i..n - i].to_vec()).collect();
    let names: Vec<String> = (1..=p).map(|i| format!("ar{i}")).collect();
    let regressors: Vec<(&str, &[f64])> = names
        .iter()
        .map(String::as_str)
        .zip(lag_columns.iter().map(Vec::as_slice))
        .collect();

    let fit = ols(y, &regressors)?;
    let ar = fit.params[1..].to_vec();
    Ok((ar, Vec::new(), fit.params[0], fit.residuals))
}

/// MA(q) by iterative conditional estimation on the centered series.
fn estimate_ma(data: &[f64], q: usize) -> Result<Components, StatsError> {
    let n = data.len();
    if n < q + 3 {
        return Err(StatsError::TooFewObservations { need: q + 3, got: n });
    }
    let mean = data.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = data.iter().map(|v| v - mean).collect();

    let mut theta = vec![0.0; q];
    let max_iter = 100;
    let tolerance = 1e-6;

    for _ in 0..max_iter {
        let residuals = ma_residuals(&centered, &theta);

        let mut next = vec![0.0; q];
        for (i, slot) in next.iter_mut().enumerate() {
            let mut num = 0.0;
            let mut den = 0.0;
            for t in (i + 1)..n {
                let shock = residuals[t - i - 1];
                num += centered[t] * shock;
                den += shock * shock;
            }
            if den > 0.0 {
                *slot = num / den;
            }
        }

        let delta: f64 = theta
            .iter()
            .zip(&next)
            .map(|(a, b)| (a - b).abs())
            .sum();
        theta = next;
        if delta < tolerance {
            break;
        }
    }

    let residuals = ma_residuals(&centered, &theta);
    Ok((Vec::new(), theta, mean, residuals))
}

/// Conditional residuals of an MA model, pre-sample shocks set to zero.
fn ma_residuals(centered: &[f64], theta: &[f64]) -> Vec<f64> {
    let mut residuals = vec![0.0; centered.len()];
    for t in 0..centered.len() {
        let mut ma_part = 0.0;
        for (i, &coef) in theta.iter().enumerate() {
            if t > i {
                ma_part += coef * residuals[t - i - 1];
            }
        }
        residuals[t] = centered[t] - ma_part;
    }
    residuals
}

/// ARMA(p, q) via two-step Hannan-Rissanen.
fn estimate_arma(data: &[f64], p: usize, q: usize) -> Result<Components, StatsError> {
    let n = data.len();

    // Step 1: a long AR approximation supplies residual proxies for the
    // unobserved shocks.
    let long_order = (p + q).max(10).min(n / 4).max(1);
    let (long_ar, _, long_const, _) = estimate_ar(data, long_order)?;

    // Align proxies with the data: defined from `long_order` onward.
    let mut shocks = vec![0.0; n];
    for t in long_order..n {
        let mut predicted = long_const;
        for (i, &phi) in long_ar.iter().enumerate() {
            predicted += phi * data[t - i - 1];
        }
        shocks[t] = data[t] - predicted;
    }

    // Step 2: OLS of the series on its own lags and lagged shock proxies.
    let start = p.max(long_order + q);
    if n - start < p + q + 3 {
        return Err(StatsError::TooFewObservations {
            need: start + p + q + 3,
            got: n,
        });
    }

    let y = &data[start..];
    let mut columns: Vec<(String, Vec<f64>)> = Vec::with_capacity(p + q);
    for i in 1..=p {
        columns.push((format!("ar{i}"), data[start - i..n - i].to_vec()));
    }
    for i in 1..=q {
        columns.push((format!("ma{i}"), shocks[start - i..n - i].to_vec()));
    }
    let regressors: Vec<(&str, &[f64])> = columns
        .iter()
        .map(|(name, values)| (name.as_str(), values.as_slice()))
        .collect();

    let fit = ols(y, &regressors)?;
    let ar = fit.params[1..=p].to_vec();
    let ma = fit.params[p + 1..].to_vec();
    Ok((ar, ma, fit.params[0], fit.residuals))
}
