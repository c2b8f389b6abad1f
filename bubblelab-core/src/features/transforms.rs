//! NaN-aware column transforms.
//!
//! Every transform is a pure function from a value slice to a new vector of
//! the same length. Missing inputs are NaN; a window that is incomplete or
//! contains NaN yields NaN. Mathematically undefined ratios (division by a
//! zero running maximum, z-scores of a constant series) produce non-finite
//! values rather than errors.

/// One-period percent change: `(x[t] - x[t-1]) / x[t-1]`.
pub fn pct_change(xs: &[f64]) -> Vec<f64> {
    pct_change_n(xs, 1)
}

/// N-period percent change: `(x[t] - x[t-n]) / x[t-n]`.
pub fn pct_change_n(xs: &[f64], n: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; xs.len()];
    for t in n..xs.len() {
        let prev = xs[t - n];
        let cur = xs[t];
        if prev.is_finite() && cur.is_finite() {
            out[t] = (cur - prev) / prev;
        }
    }
    out
}

/// Rolling mean over a full window of `n` values.
///
/// NaN until the window is full, and NaN whenever the window contains NaN.
pub fn rolling_mean(xs: &[f64], n: usize) -> Vec<f64> {
    rolling(xs, n, |window| {
        window.iter().sum::<f64>() / window.len() as f64
    })
}

/// Rolling sample standard deviation (ddof = 1) over a full window.
pub fn rolling_std(xs: &[f64], n: usize) -> Vec<f64> {
    rolling(xs, n, std_sample)
}

/// Trailing compounded return: product of `1 + r` over the window minus one.
pub fn trailing_compound(returns: &[f64], n: usize) -> Vec<f64> {
    rolling(returns, n, |window| {
        window.iter().map(|r| 1.0 + r).product::<f64>() - 1.0
    })
}

/// Drawdown from the running maximum: `(x - cummax) / cummax`.
///
/// The running maximum is taken over finite observations only, so a gap
/// emits NaN without resetting the peak. Always <= 0 where defined, and
/// exactly 0 on a fresh running maximum.
pub fn drawdown(xs: &[f64]) -> Vec<f64> {
    let mut out = vec![f64::NAN; xs.len()];
    let mut peak = f64::NAN;
    for (t, &x) in xs.iter().enumerate() {
        if !x.is_finite() {
            continue;
        }
        if !peak.is_finite() || x > peak {
            peak = x;
        }
        out[t] = (x - peak) / peak;
    }
    out
}

/// Z-score against the population mean/std (ddof = 0) of the finite values.
pub fn zscore_population(xs: &[f64]) -> Vec<f64> {
    let m = mean(xs);
    let s = std_population(xs);
    xs.iter()
        .map(|&x| if x.is_finite() { (x - m) / s } else { f64::NAN })
        .collect()
}

/// Linear-interpolation quantile of the finite values, `q` in [0, 1].
pub fn quantile(xs: &[f64], q: f64) -> f64 {
    let mut finite: Vec<f64> = xs.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return f64::NAN;
    }
    finite.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let pos = q.clamp(0.0, 1.0) * (finite.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        finite[lo]
    } else {
        let frac = pos - lo as f64;
        finite[lo] * (1.0 - frac) + finite[hi] * frac
    }
}

/// Mean of the finite values (NaN when there are none).
pub fn mean(xs: &[f64]) -> f64 {
    let finite: Vec<f64> = xs.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return f64::NAN;
    }
    finite.iter().sum::<f64>() / finite.len() as f64
}

/// Population standard deviation (ddof = 0) of the finite values.
pub fn std_population(xs: &[f64]) -> f64 {
    let finite: Vec<f64> = xs.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return f64::NAN;
    }
    let m = finite.iter().sum::<f64>() / finite.len() as f64;
    let var = finite.iter().map(|v| (v - m).powi(2)).sum::<f64>() / finite.len() as f64;
    var.sqrt()
}

/// Sample standard deviation (ddof = 1) of the finite values.
pub fn std_sample(xs: &[f64]) -> f64 {
    let finite: Vec<f64> = xs.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.len() < 2 {
        return f64::NAN;
    }
    let m = finite.iter().sum::<f64>() / finite.len() as f64;
    let var = finite.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (finite.len() - 1) as f64;
    var.sqrt()
}

/// Apply `f` to every full `n`-window; NaN for short or NaN-bearing windows.
fn rolling(xs: &[f64], n: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    assert!(n >= 1, "window must be >= 1");
    let mut out = vec![f64::NAN; xs.len()];
    if xs.len() < n {
        return out;
    }
    for t in (n - 1)..xs.len() {
        let window = &xs[t + 1 - n..=t];
        if window.iter().all(|v| v.is_finite()) {
            out[t] = f(window);
        }
    }
    out
}
