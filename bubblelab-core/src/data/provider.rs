//! Source abstraction and structured error types for the data layer.
//!
//! A `SeriesProvider` turns a series key into dated raw observations.
//! Implementations cover the Shiller workbook and FRED; the cache layer
//! sits above this trait, so providers never touch the filesystem.
//!
//! There is deliberately no retry or fallback source: this is a batch tool
//! and a failed fetch surfaces to the operator, who reruns the command.

use chrono::NaiveDate;
use thiserror::Error;

/// One dated raw observation, as delivered by an external source.
///
/// `value` may be NaN: FRED publishes explicit missing cells and the
/// Shiller sheet's early valuation column is empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Where a series ultimately came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Shiller,
    Fred,
    Cache,
}

/// Result of fetching one series.
#[derive(Debug, Clone)]
pub struct RawSeries {
    pub key: String,
    pub observations: Vec<Observation>,
    pub source: SourceKind,
}

/// Structured errors for fetching, parsing, and caching series data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("response format changed: {0}")]
    ResponseFormat(String),

    #[error("unknown series key '{0}'")]
    UnknownSeries(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("no cached data for series '{key}' — run `fetch` first")]
    NoCachedData { key: String },

    #[error("validation error: {0}")]
    Validation(String),
}

/// A source of dated observations for named series keys.
pub trait SeriesProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch all observations for `key` from `start` onward.
    fn fetch(&self, key: &str, start: NaiveDate) -> Result<RawSeries, DataError>;
}
