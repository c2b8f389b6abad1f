//! Plot-ready CSV panels.
//!
//! Each panel is one flat CSV a charting tool can read directly: a `date`
//! first column, numeric series, and (where useful) the window label. NaN
//! cells are written empty.

use crate::markdown::StudyReportInputs;
use anyhow::{Context, Result};
use bubblelab_core::features::transforms::rolling_std;
use bubblelab_core::features::FeatureTable;
use bubblelab_core::Month;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Z-score line drawn on the housing panel.
const HOUSING_THRESHOLD: f64 = 1.5;

/// Base month for the dot-com comparison panel.
const DOTCOM_BASE: (i32, u32) = (1995, 1);

/// Index level with window labels.
pub fn write_index_panel(path: &Path, features: &FeatureTable) -> Result<()> {
    let mut file = create(path)?;
    writeln!(file, "date,sp500,bubble_window")?;
    let table = &features.table;
    for (i, month) in table.months().iter().enumerate() {
        writeln!(
            file,
            "{},{},{}",
            month.end_date(),
            cell(table.get("sp500", i)),
            features.label_for_row(i).unwrap_or("")
        )?;
    }
    Ok(())
}

/// Valuation ratio with window labels.
pub fn write_valuation_panel(path: &Path, features: &FeatureTable) -> Result<()> {
    let mut file = create(path)?;
    writeln!(file, "date,cape,bubble_window")?;
    let table = &features.table;
    for (i, month) in table.months().iter().enumerate() {
        writeln!(
            file,
            "{},{},{}",
            month.end_date(),
            cell(table.get("cape", i)),
            features.label_for_row(i).unwrap_or("")
        )?;
    }
    Ok(())
}

/// Indices normalized to 100 at the base month, plus both drawdowns.
pub fn write_dotcom_panel(path: &Path, features: &FeatureTable) -> Result<()> {
    let table = &features.table;
    let base_month = Month::new(DOTCOM_BASE.0, DOTCOM_BASE.1);
    let start = table.months().partition_point(|m| *m < base_month);

    let mut file = create(path)?;
    writeln!(
        file,
        "date,sp500_norm,nasdaq_norm,sp500_drawdown,nasdaq_drawdown"
    )?;
    if start >= table.len() {
        return Ok(());
    }

    let sp500_base = table.get("sp500", start);
    let nasdaq_base = table.get("nasdaq", start);
    for i in start..table.len() {
        let month = table.months()[i];
        writeln!(
            file,
            "{},{},{},{},{}",
            month.end_date(),
            cell(table.get("sp500", i) / sp500_base * 100.0),
            cell(table.get("nasdaq", i) / nasdaq_base * 100.0),
            cell(table.get("sp500_drawdown", i)),
            cell(table.get("nasdaq_drawdown", i)),
        )?;
    }
    Ok(())
}

/// Housing level versus equities, with the YoY z-score and its threshold.
pub fn write_housing_panel(path: &Path, features: &FeatureTable) -> Result<()> {
    let mut file = create(path)?;
    writeln!(
        file,
        "date,case_shiller,sp500,cs_yoy_z,overvaluation_threshold"
    )?;
    let table = &features.table;
    for (i, month) in table.months().iter().enumerate() {
        writeln!(
            file,
            "{},{},{},{},{}",
            month.end_date(),
            cell(table.get("case_shiller", i)),
            cell(table.get("sp500", i)),
            cell(table.get("cs_yoy_z", i)),
            HOUSING_THRESHOLD,
        )?;
    }
    Ok(())
}

/// Rolling 12-month standard deviation of monthly returns.
pub fn write_volatility_panel(path: &Path, features: &FeatureTable) -> Result<()> {
    let table = &features.table;
    let returns = table.column("sp500_return").unwrap_or(&[]);
    let vol = rolling_std(returns, 12);

    let mut file = create(path)?;
    writeln!(file, "date,rolling_vol_12m")?;
    for (i, month) in table.months().iter().enumerate() {
        writeln!(
            file,
            "{},{}",
            month.end_date(),
            cell(vol.get(i).copied().unwrap_or(f64::NAN))
        )?;
    }
    Ok(())
}

/// Write the window summaries and model fits as one pretty-printed JSON file.
pub fn save_model_fits(path: &Path, inputs: &StudyReportInputs<'_>) -> Result<()> {
    let json = serde_json::to_string_pretty(inputs)
        .context("failed to serialize model fits")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Write every panel into `out_dir`, creating it if needed.
pub fn save_study_panels(out_dir: &Path, features: &FeatureTable) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    write_index_panel(&out_dir.join("index_with_windows.csv"), features)?;
    write_valuation_panel(&out_dir.join("valuation.csv"), features)?;
    write_dotcom_panel(&out_dir.join("dotcom_comparison.csv"), features)?;
    write_housing_panel(&out_dir.join("housing.csv"), features)?;
    write_volatility_panel(&out_dir.join("volatility.csv"), features)?;
    Ok(())
}

fn create(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("failed to create {}", path.display()))
}

fn cell(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.6}")
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubblelab_core::config::FeatureConfig;
    use bubblelab_core::domain::{BubbleWindowSet, MonthlySeries, MonthlyTable};
    use bubblelab_core::features::prepare_features;

    fn fixture() -> FeatureTable {
        let n = 40;
        let months: Vec<Month> = (0..n).map(|i| Month::new(1994, 1).plus_months(i)).collect();
        let prices: Vec<f64> = (0..n).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let nasdaq: Vec<f64> = (0..n).map(|i| 500.0 * 1.015f64.powi(i)).collect();
        let merged = MonthlyTable::from_series(&[
            MonthlySeries::from_points(
                "sp500",
                months.iter().copied().zip(prices).collect(),
            ),
            MonthlySeries::from_points(
                "nasdaq",
                months.iter().copied().zip(nasdaq).collect(),
            ),
        ]);
        prepare_features(
            &merged,
            &FeatureConfig::default(),
            &BubbleWindowSet::canonical(),
        )
    }

    #[test]
    fn panels_land_in_the_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        save_study_panels(dir.path(), &fixture()).unwrap();

        for name in [
            "index_with_windows.csv",
            "valuation.csv",
            "dotcom_comparison.csv",
            "housing.csv",
            "volatility.csv",
        ] {
            assert!(dir.path().join(name).exists(), "missing {name}");
        }
    }

    #[test]
    fn index_panel_carries_window_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.csv");
        write_index_panel(&path, &fixture()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("date,sp500,bubble_window"));
        // Months from 1995-01 onward sit inside the dot-com window.
        assert!(text.contains("dot_com"));
    }

    #[test]
    fn dotcom_panel_normalizes_to_one_hundred() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dotcom.csv");
        write_dotcom_panel(&path, &fixture()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let first_row = text.lines().nth(1).unwrap();
        let fields: Vec<&str> = first_row.split(',').collect();
        assert!(first_row.starts_with("1995-01-31"));
        assert_eq!(fields[1], "100.000000");
        assert_eq!(fields[2], "100.000000");
    }

    #[test]
    fn model_fits_serialize_to_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.json");
        let features = fixture();
        let summaries = bubblelab_core::summary::compute_bubble_summary(&features);
        assert!(!summaries.is_empty());

        let inputs = StudyReportInputs {
            summaries: &summaries,
            ..Default::default()
        };
        save_model_fits(&path, &inputs).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value["summaries"].is_array());
        assert_eq!(value["summaries"][0]["window"], "dot_com");
        assert!(value["regression"].is_null());
    }

    #[test]
    fn missing_values_become_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("housing.csv");
        write_housing_panel(&path, &fixture()).unwrap();

        // The fixture has no housing series, so those cells are empty.
        let text = std::fs::read_to_string(&path).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert!(row.contains(",,"));
    }
}
