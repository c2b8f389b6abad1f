//! Flat CSV cache, one file per raw series.
//!
//! Layout: `{data_dir}/{key}.csv` with a `date,value` header row. Missing
//! values are written as empty fields. Writes are atomic (write to .tmp,
//! rename into place); loads validate the header and non-emptiness.

use super::provider::{DataError, Observation};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvCache {
    data_dir: PathBuf,
}

impl CsvCache {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Root directory of the cache.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the cache file for a series key.
    pub fn series_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{key}.csv"))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.series_path(key).exists()
    }

    /// Write observations for a series, atomically replacing any previous file.
    pub fn write_series(&self, key: &str, observations: &[Observation]) -> Result<(), DataError> {
        if observations.is_empty() {
            return Err(DataError::Cache(format!("no observations to cache for '{key}'")));
        }
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| DataError::Cache(format!("failed to create data dir: {e}")))?;

        let path = self.series_path(key);
        let tmp_path = path.with_extension("csv.tmp");

        let mut writer = csv::Writer::from_path(&tmp_path)
            .map_err(|e| DataError::Cache(format!("failed to create {}: {e}", tmp_path.display())))?;
        writer
            .write_record(["date", "value"])
            .map_err(|e| DataError::Cache(format!("header write: {e}")))?;
        for obs in observations {
            let value = if obs.value.is_finite() {
                obs.value.to_string()
            } else {
                String::new()
            };
            writer
                .write_record([obs.date.format("%Y-%m-%d").to_string(), value])
                .map_err(|e| DataError::Cache(format!("row write: {e}")))?;
        }
        writer
            .flush()
            .map_err(|e| DataError::Cache(format!("flush: {e}")))?;
        drop(writer);

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::Cache(format!("atomic rename failed: {e}"))
        })
    }

    /// Load all cached observations for a series, sorted by date ascending.
    pub fn load_series(&self, key: &str) -> Result<Vec<Observation>, DataError> {
        let path = self.series_path(key);
        if !path.exists() {
            return Err(DataError::NoCachedData {
                key: key.to_string(),
            });
        }

        let mut reader = csv::Reader::from_path(&path)
            .map_err(|e| DataError::Cache(format!("failed to open {}: {e}", path.display())))?;

        let headers = reader
            .headers()
            .map_err(|e| DataError::Cache(format!("unreadable header: {e}")))?;
        if headers.len() != 2 || headers.get(0) != Some("date") || headers.get(1) != Some("value") {
            return Err(DataError::Validation(format!(
                "{} does not look like a series cache file",
                path.display()
            )));
        }

        let mut observations = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| DataError::Cache(format!("unreadable row: {e}")))?;
            let date_field = record.get(0).unwrap_or("");
            let date = NaiveDate::parse_from_str(date_field, "%Y-%m-%d").map_err(|_| {
                DataError::Validation(format!(
                    "bad date '{date_field}' in {}",
                    path.display()
                ))
            })?;
            let raw = record.get(1).unwrap_or("").trim();
            let value = if raw.is_empty() {
                f64::NAN
            } else {
                raw.parse().map_err(|_| {
                    DataError::Validation(format!("bad value '{raw}' in {}", path.display()))
                })?
            };
            observations.push(Observation::new(date, value));
        }

        if observations.is_empty() {
            return Err(DataError::Validation(format!(
                "{} contained no rows",
                path.display()
            )));
        }

        observations.sort_by_key(|o| o.date);
        Ok(observations)
    }

    /// Presence, row count, and date range per series key.
    pub fn status(&self, keys: &[&str]) -> Vec<CacheStatus> {
        keys.iter()
            .map(|key| match self.load_series(key) {
                Ok(obs) => CacheStatus {
                    key: key.to_string(),
                    cached: true,
                    rows: Some(obs.len()),
                    start: obs.first().map(|o| o.date),
                    end: obs.last().map(|o| o.date),
                },
                Err(_) => CacheStatus {
                    key: key.to_string(),
                    cached: false,
                    rows: None,
                    start: None,
                    end: None,
                },
            })
            .collect()
    }
}

/// Cache status for a single series key.
#[derive(Debug, Clone)]
pub struct CacheStatus {
    pub key: String,
    pub cached: bool,
    pub rows: Option<usize>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}
