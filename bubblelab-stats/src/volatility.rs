//! Return volatility around a peak.

use bubblelab_core::domain::Month;
use bubblelab_core::features::FeatureTable;
use serde::Serialize;

/// Sample standard deviation of monthly returns before and after a peak.
#[derive(Debug, Clone, Serialize)]
pub struct VolatilityRegimes {
    pub pre_vol: f64,
    pub post_vol: f64,
}

/// Compare return volatility over the `window` months strictly before the
/// peak against the `window` months strictly after it.
pub fn volatility_regimes(
    features: &FeatureTable,
    peak: Month,
    window: usize,
) -> VolatilityRegimes {
    let table = &features.table;
    let months = table.months();
    let returns = table.column("sp500_return").unwrap_or(&[]);

    let collect = |start: Month, end: Month| -> Vec<f64> {
        months
            .iter()
            .zip(returns)
            .filter(|(m, _)| start <= **m && **m <= end)
            .map(|(_, r)| *r)
            .collect()
    };

    let pre = collect(peak.plus_months(-(window as i32)), peak.plus_months(-1));
    let post = collect(peak.plus_months(1), peak.plus_months(window as i32));

    VolatilityRegimes {
        pre_vol: bubblelab_core::features::transforms::std_sample(&pre),
        post_vol: bubblelab_core::features::transforms::std_sample(&post),
    }
}
