//! Reading and writing monthly tables as CSV.
//!
//! Tables are persisted with a `date` first column holding month-end dates,
//! one column per series, and empty cells for NaN. The featured table also
//! carries a trailing `bubble_window` label column derived from the window
//! set; on read, non-numeric columns are skipped because labels are always
//! recomputed from configuration.

use super::provider::DataError;
use crate::domain::{BubbleWindowSet, Month, MonthlyTable};
use chrono::NaiveDate;
use std::path::Path;

/// File name of the merged raw table inside the data directory.
pub const MERGED_RAW_FILE: &str = "merged_monthly_raw.csv";

/// File name of the featured table inside the data directory.
pub const FEATURED_FILE: &str = "merged_monthly.csv";

/// Write a table, optionally appending a `bubble_window` label column.
pub fn write_table(
    path: &Path,
    table: &MonthlyTable,
    windows: Option<&BubbleWindowSet>,
) -> Result<(), DataError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| DataError::Cache(format!("failed to create data dir: {e}")))?;
    }

    let tmp_path = path.with_extension("csv.tmp");
    let mut writer = csv::Writer::from_path(&tmp_path)
        .map_err(|e| DataError::Cache(format!("failed to create {}: {e}", tmp_path.display())))?;

    let mut header: Vec<&str> = vec!["date"];
    header.extend(table.column_names());
    if windows.is_some() {
        header.push("bubble_window");
    }
    writer
        .write_record(&header)
        .map_err(|e| DataError::Cache(format!("header write: {e}")))?;

    let names: Vec<String> = table.column_names().map(str::to_string).collect();
    for (i, month) in table.months().iter().enumerate() {
        let mut record: Vec<String> = Vec::with_capacity(header.len());
        record.push(month.end_date().format("%Y-%m-%d").to_string());
        for name in &names {
            let v = table.get(name, i);
            record.push(if v.is_finite() { v.to_string() } else { String::new() });
        }
        if let Some(set) = windows {
            record.push(set.label_for(*month).unwrap_or("").to_string());
        }
        writer
            .write_record(&record)
            .map_err(|e| DataError::Cache(format!("row write: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| DataError::Cache(format!("flush: {e}")))?;
    drop(writer);

    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        DataError::Cache(format!("atomic rename failed: {e}"))
    })
}

/// Read a table written by [`write_table`]. Non-numeric columns are dropped.
pub fn read_table(path: &Path) -> Result<MonthlyTable, DataError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| DataError::Cache(format!("failed to open {}: {e}", path.display())))?;

    let headers = reader
        .headers()
        .map_err(|e| DataError::Cache(format!("unreadable header: {e}")))?
        .clone();
    if headers.get(0) != Some("date") {
        return Err(DataError::Validation(format!(
            "{} does not look like a table file",
            path.display()
        )));
    }

    let mut months: Vec<Month> = Vec::new();
    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len() - 1];
    for record in reader.records() {
        let record = record.map_err(|e| DataError::Cache(format!("unreadable row: {e}")))?;
        let date_field = record.get(0).unwrap_or("");
        let date = NaiveDate::parse_from_str(date_field, "%Y-%m-%d").map_err(|_| {
            DataError::Validation(format!("bad date '{date_field}' in {}", path.display()))
        })?;
        months.push(Month::from_date(date));
        for (col, cell) in cells.iter_mut().enumerate() {
            cell.push(record.get(col + 1).unwrap_or("").to_string());
        }
    }

    if months.windows(2).any(|w| w[0] >= w[1]) {
        return Err(DataError::Validation(format!(
            "{} has an unsorted or duplicated month axis",
            path.display()
        )));
    }

    let mut table = MonthlyTable::with_axis(months);
    for (col, raw) in cells.iter().enumerate() {
        let name = headers.get(col + 1).unwrap_or("");
        let mut values = Vec::with_capacity(raw.len());
        let mut numeric = true;
        for cell in raw {
            let trimmed = cell.trim();
            if trimmed.is_empty() {
                values.push(f64::NAN);
            } else if let Ok(v) = trimmed.parse::<f64>() {
                values.push(v);
            } else {
                numeric = false;
                break;
            }
        }
        if numeric {
            table.set_column(name, values);
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Month;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_path(name: &str) -> std::path::PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "bubblelab_store_{}_{id}_{name}",
            std::process::id()
        ))
    }

    fn sample_table() -> MonthlyTable {
        let months: Vec<Month> = (1..=3).map(|m| Month::new(1995, m)).collect();
        let mut table = MonthlyTable::with_axis(months);
        table.set_column("sp500", vec![459.27, f64::NAN, 493.15]);
        table.set_column("cape", vec![25.0, 25.5, 26.0]);
        table
    }

    #[test]
    fn roundtrip_preserves_values_and_gaps() {
        let path = temp_path("roundtrip.csv");
        let table = sample_table();

        write_table(&path, &table, None).unwrap();
        let loaded = read_table(&path).unwrap();

        assert_eq!(loaded.months(), table.months());
        assert_eq!(loaded.get("sp500", 0), 459.27);
        assert!(loaded.get("sp500", 1).is_nan());
        assert_eq!(loaded.get("cape", 2), 26.0);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn label_column_is_written_and_skipped_on_read() {
        let path = temp_path("labels.csv");
        let table = sample_table();
        let windows = BubbleWindowSet::canonical();

        write_table(&path, &table, Some(&windows)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.lines().next().unwrap().ends_with("bubble_window"));
        assert!(text.contains("dot_com"));

        let loaded = read_table(&path).unwrap();
        assert!(!loaded.has_column("bubble_window"));
        assert!(loaded.has_column("sp500"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn unsorted_axis_is_rejected() {
        let path = temp_path("unsorted.csv");
        std::fs::write(
            &path,
            "date,x\n1995-02-28,1.0\n1995-01-31,2.0\n",
        )
        .unwrap();
        assert!(matches!(
            read_table(&path),
            Err(DataError::Validation(_))
        ));
        let _ = std::fs::remove_file(&path);
    }
}
