//! Feature engineering over the merged monthly table.
//!
//! `prepare_features` augments the merged table with returns, rolling
//! statistics, trailing compounded performance, drawdowns, the housing
//! heat z-score, and the bubble flags, in that order. Flag columns hold
//! 1.0 / 0.0; the window label of a row is derived from the window set
//! rather than stored as a column.

use super::transforms::{
    drawdown, pct_change, pct_change_n, quantile, rolling_mean, trailing_compound,
    zscore_population,
};
use crate::config::{FeatureConfig, StudyConfig};
use crate::data::loader::DatasetBuilder;
use crate::data::provider::DataError;
use crate::data::store::{self, FEATURED_FILE};
use crate::data::CsvCache;
use crate::domain::{BubbleWindowSet, Month, MonthlyTable};

/// Z-score above which housing growth counts as overheated.
const HOUSING_OVERVALUATION_Z: f64 = 1.5;

/// The featured table plus the window set its labels derive from.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub table: MonthlyTable,
    pub windows: BubbleWindowSet,
}

impl FeatureTable {
    /// Window label for a row, if its month falls inside a window.
    pub fn label_for_row(&self, row: usize) -> Option<&str> {
        self.windows.label_for(self.table.months()[row])
    }

    pub fn months(&self) -> &[Month] {
        self.table.months()
    }
}

/// Augment the merged table with every derived column.
pub fn prepare_features(
    merged: &MonthlyTable,
    config: &FeatureConfig,
    windows: &BubbleWindowSet,
) -> FeatureTable {
    let mut table = merged.clone();
    let n = table.len();
    let col = |table: &MonthlyTable, name: &str| {
        table
            .column(name)
            .map(<[f64]>::to_vec)
            .unwrap_or_else(|| vec![f64::NAN; n])
    };

    // Returns
    let sp500_return = pct_change(&col(&table, "sp500"));
    table.set_column("sp500_return", sp500_return.clone());
    let has_nasdaq = table.has_column("nasdaq");
    if has_nasdaq {
        table.set_column("nasdaq_return", pct_change(&col(&table, "nasdaq")));
    }

    // Trailing compounded performance
    let momentum_col = format!("sp500_trailing_{}", config.momentum_window);
    table.set_column(
        momentum_col.clone(),
        trailing_compound(&sp500_return, config.momentum_window),
    );
    if has_nasdaq {
        table.set_column(
            format!("nasdaq_trailing_{}", config.momentum_window),
            trailing_compound(&col(&table, "nasdaq_return"), config.momentum_window),
        );
    }

    // Rolling means
    for name in ["sp500_return", "nasdaq_return", "cape"] {
        if table.has_column(name) {
            let values = col(&table, name);
            table.set_column(format!("{name}_roll6"), rolling_mean(&values, 6));
            table.set_column(format!("{name}_roll12"), rolling_mean(&values, 12));
        }
    }

    // Drawdowns from running maxima
    table.set_column("sp500_drawdown", drawdown(&col(&table, "sp500")));
    if has_nasdaq {
        table.set_column("nasdaq_drawdown", drawdown(&col(&table, "nasdaq")));
    }
    if table.has_column("case_shiller") {
        table.set_column("housing_drawdown", drawdown(&col(&table, "case_shiller")));
    }

    // Bubble flags: valuation above its historical quantile, or trailing
    // momentum above the threshold. NaN compares as not-high.
    let cape = col(&table, "cape");
    let cape_cut = quantile(&cape, config.valuation_quantile);
    let high_valuation: Vec<f64> = cape.iter().map(|&v| flag(v > cape_cut)).collect();
    let momentum = col(&table, &momentum_col);
    let high_momentum: Vec<f64> = momentum
        .iter()
        .map(|&v| flag(v > config.high_momentum_threshold))
        .collect();
    let bubble_flag: Vec<f64> = high_valuation
        .iter()
        .zip(&high_momentum)
        .map(|(&v, &m)| flag(v == 1.0 || m == 1.0))
        .collect();
    table.set_column("high_valuation", high_valuation);
    table.set_column("high_momentum", high_momentum);
    table.set_column("bubble_flag", bubble_flag);

    // Housing heat: year-over-year growth and its z-score
    if table.has_column("case_shiller") {
        let yoy = pct_change_n(&col(&table, "case_shiller"), 12);
        let z = zscore_population(&yoy);
        let overvalued: Vec<f64> = z.iter().map(|&v| flag(v > HOUSING_OVERVALUATION_Z)).collect();
        table.set_column("cs_yoy", yoy);
        table.set_column("cs_yoy_z", z);
        table.set_column("housing_overvaluation", overvalued);
    }

    table.drop_all_nan_rows(&[
        "high_valuation",
        "high_momentum",
        "bubble_flag",
        "housing_overvaluation",
    ]);

    FeatureTable {
        table,
        windows: windows.clone(),
    }
}

/// Build the merged dataset, derive features, and persist the featured table.
pub fn run_pipeline(
    cache: &CsvCache,
    builder: &DatasetBuilder<'_>,
    config: &StudyConfig,
    force: bool,
) -> Result<FeatureTable, DataError> {
    let merged = builder.build_merged(force)?;
    let features = prepare_features(&merged, &config.features, &config.windows);
    store::write_table(
        &cache.data_dir().join(FEATURED_FILE),
        &features.table,
        Some(&features.windows),
    )?;
    Ok(features)
}

fn flag(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}
