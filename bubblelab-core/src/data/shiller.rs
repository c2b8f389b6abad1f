//! Shiller workbook provider.
//!
//! Downloads the long-run market data workbook published on Robert
//! Shiller's site and extracts the S&P 500 price level (`P`) and the
//! cyclically-adjusted P/E (`CAPE`) from the `Data` sheet. The sheet has a
//! fixed 7-row preamble above the header row, and dates are encoded as
//! fractional years decoded with the floor rule in [`Month`].
//!
//! One download yields both series, so the parsed sheet is memoized for
//! the lifetime of the provider.

use super::provider::{DataError, Observation, RawSeries, SeriesProvider, SourceKind};
use crate::domain::Month;
use calamine::{Data, Reader, Xlsx};
use chrono::NaiveDate;
use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

/// Published workbook location.
pub const SHILLER_URL: &str = "https://www.econ.yale.edu/~shiller/data/ie_data.xlsx";

/// Sheet holding the monthly data table.
const SHEET_NAME: &str = "Data";

/// Rows above the header row.
const HEADER_SKIP: usize = 7;

/// Series keys this provider understands.
pub const SHILLER_SP500: &str = "sp500_shiller";
pub const SHILLER_CAPE: &str = "cape";

/// One parsed row of the `Data` sheet.
#[derive(Debug, Clone, Copy)]
struct SheetRow {
    month: Month,
    sp500: f64,
    cape: f64,
}

pub struct ShillerProvider {
    client: reqwest::blocking::Client,
    url: String,
    parsed: Mutex<Option<Vec<SheetRow>>>,
}

impl ShillerProvider {
    pub fn new() -> Self {
        Self::with_url(SHILLER_URL)
    }

    /// Override the workbook location (tests point this at a fixture server).
    pub fn with_url(url: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent("bubblelab/0.1")
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            url: url.into(),
            parsed: Mutex::new(None),
        }
    }

    /// Download and parse the sheet, memoizing the result.
    fn rows(&self) -> Result<Vec<SheetRow>, DataError> {
        let mut guard = self.parsed.lock().unwrap();
        if let Some(rows) = guard.as_ref() {
            return Ok(rows.clone());
        }

        let resp = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| DataError::Network {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }
        let bytes = resp.bytes().map_err(|e| DataError::Network {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        let rows = parse_workbook(&bytes)?;
        *guard = Some(rows.clone());
        Ok(rows)
    }
}

impl Default for ShillerProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SeriesProvider for ShillerProvider {
    fn name(&self) -> &str {
        "shiller"
    }

    fn fetch(&self, key: &str, start: NaiveDate) -> Result<RawSeries, DataError> {
        let pick: fn(&SheetRow) -> f64 = match key {
            SHILLER_SP500 => |r| r.sp500,
            SHILLER_CAPE => |r| r.cape,
            other => return Err(DataError::UnknownSeries(other.to_string())),
        };

        let observations = self
            .rows()?
            .iter()
            .map(|row| Observation::new(row.month.end_date(), pick(row)))
            .filter(|obs| obs.date >= start)
            .collect();

        Ok(RawSeries {
            key: key.to_string(),
            observations,
            source: SourceKind::Shiller,
        })
    }
}

/// Parse the workbook bytes into sheet rows, sorted by month with the first
/// occurrence kept on duplicates.
fn parse_workbook(bytes: &[u8]) -> Result<Vec<SheetRow>, DataError> {
    let mut workbook = Xlsx::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| DataError::ResponseFormat(format!("not a readable workbook: {e}")))?;
    let range = workbook
        .worksheet_range(SHEET_NAME)
        .map_err(|e| DataError::ResponseFormat(format!("missing sheet '{SHEET_NAME}': {e}")))?;

    let mut rows_iter = range.rows().skip(HEADER_SKIP);
    let header = rows_iter
        .next()
        .ok_or_else(|| DataError::ResponseFormat("sheet shorter than its preamble".into()))?;

    let date_col = find_column(header, "Date")?;
    let price_col = find_column(header, "P")?;
    let cape_col = find_column(header, "CAPE")?;

    let mut rows: Vec<SheetRow> = Vec::new();
    for raw in rows_iter {
        // Trailing footnote rows have no date; skip them.
        let Some(decimal) = cell_to_f64(raw.get(date_col)) else {
            continue;
        };
        rows.push(SheetRow {
            month: Month::from_decimal_year(decimal),
            sp500: cell_to_f64(raw.get(price_col)).unwrap_or(f64::NAN),
            cape: cell_to_f64(raw.get(cape_col)).unwrap_or(f64::NAN),
        });
    }

    if rows.is_empty() {
        return Err(DataError::ResponseFormat(
            "sheet contained no data rows".into(),
        ));
    }

    rows.sort_by_key(|r| r.month);
    rows.dedup_by_key(|r| r.month);
    Ok(rows)
}

fn find_column(header: &[Data], name: &str) -> Result<usize, DataError> {
    header
        .iter()
        .position(|cell| matches!(cell, Data::String(s) if s.trim() == name))
        .ok_or_else(|| DataError::ResponseFormat(format!("header column '{name}' not found")))
}

fn cell_to_f64(cell: Option<&Data>) -> Option<f64> {
    match cell? {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
