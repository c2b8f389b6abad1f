//! FRED data provider.
//!
//! Fetches a single series as CSV from the St. Louis Fed's `fredgraph.csv`
//! endpoint. The response is two columns: an observation date and the
//! series value, with `.` marking missing observations.

use super::provider::{DataError, Observation, RawSeries, SeriesProvider, SourceKind};
use chrono::NaiveDate;
use std::time::Duration;

/// CSV download endpoint; `?id=<series>&cosd=<start>` selects the series.
pub const FRED_URL: &str = "https://fred.stlouisfed.org/graph/fredgraph.csv";

pub struct FredProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl FredProvider {
    pub fn new() -> Self {
        Self::with_url(FRED_URL)
    }

    /// Override the endpoint (tests point this at a fixture server).
    pub fn with_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("bubblelab/0.1")
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl Default for FredProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SeriesProvider for FredProvider {
    fn name(&self) -> &str {
        "fred"
    }

    fn fetch(&self, series_id: &str, start: NaiveDate) -> Result<RawSeries, DataError> {
        let url = format!(
            "{}?id={}&cosd={}",
            self.base_url,
            series_id,
            start.format("%Y-%m-%d")
        );

        let resp = self.client.get(&url).send().map_err(|e| DataError::Network {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }
        let body = resp.text().map_err(|e| DataError::Network {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        let observations = parse_fred_csv(&body)?;
        Ok(RawSeries {
            key: series_id.to_string(),
            observations,
            source: SourceKind::Fred,
        })
    }
}

/// Parse the two-column `date,value` response body.
fn parse_fred_csv(body: &str) -> Result<Vec<Observation>, DataError> {
    let mut reader = csv::Reader::from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| DataError::ResponseFormat(format!("unreadable header: {e}")))?;
    if headers.len() < 2 {
        return Err(DataError::ResponseFormat(format!(
            "expected 2 columns, got {}",
            headers.len()
        )));
    }

    let mut observations = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| DataError::ResponseFormat(format!("unreadable row: {e}")))?;
        let date_field = record.get(0).unwrap_or("");
        let date = NaiveDate::parse_from_str(date_field, "%Y-%m-%d").map_err(|_| {
            DataError::ResponseFormat(format!("unparseable observation date '{date_field}'"))
        })?;

        let raw = record.get(1).unwrap_or("").trim();
        let value = if raw.is_empty() || raw == "." {
            f64::NAN
        } else {
            raw.parse().map_err(|_| {
                DataError::ResponseFormat(format!("unparseable value '{raw}' on {date}"))
            })?
        };

        observations.push(Observation::new(date, value));
    }

    if observations.is_empty() {
        return Err(DataError::ResponseFormat("response had no rows".into()));
    }
    Ok(observations)
}
