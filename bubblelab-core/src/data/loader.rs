//! Series catalog and merged-dataset assembly.
//!
//! For each catalogued series the loader follows the cache-or-fetch
//! contract: use the cached file unless `force` is set, otherwise fetch
//! from the external source and cache the raw observations. Resampling to
//! the monthly axis happens after load, so cache files always hold the
//! source's own observation dates.

use super::cache::CsvCache;
use super::merge::{combine_first, union_merge};
use super::provider::{DataError, Observation, SeriesProvider};
use super::resample::{monthly_ffill, monthly_last, quarterly_last};
use super::shiller::{SHILLER_CAPE, SHILLER_SP500};
use super::store::{self, MERGED_RAW_FILE};
use crate::domain::{MonthlySeries, MonthlyTable};
use chrono::NaiveDate;

/// Which provider serves a series, and under what remote identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSpec {
    /// A column of the Shiller workbook, keyed by our own series key.
    Shiller,
    /// A FRED series id.
    Fred(&'static str),
}

/// How a series is brought onto the monthly axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Last observation within each calendar month.
    Monthly,
    /// Last observation within each quarter, forward-filled across months.
    QuarterlyFfill,
}

/// One catalogued raw series.
#[derive(Debug, Clone, Copy)]
pub struct SeriesSpec {
    pub key: &'static str,
    pub source: SourceSpec,
    pub start: (i32, u32),
    pub cadence: Cadence,
}

impl SeriesSpec {
    fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.start.0, self.start.1, 1).unwrap()
    }
}

/// Every raw series the merged dataset is built from, in column order.
pub const SERIES_CATALOG: &[SeriesSpec] = &[
    SeriesSpec {
        key: SHILLER_SP500,
        source: SourceSpec::Shiller,
        start: (1871, 1),
        cadence: Cadence::Monthly,
    },
    SeriesSpec {
        key: "sp500_fred",
        source: SourceSpec::Fred("SP500"),
        start: (1950, 1),
        cadence: Cadence::Monthly,
    },
    SeriesSpec {
        key: "nasdaq",
        source: SourceSpec::Fred("NASDAQCOM"),
        start: (1970, 1),
        cadence: Cadence::Monthly,
    },
    SeriesSpec {
        key: SHILLER_CAPE,
        source: SourceSpec::Shiller,
        start: (1871, 1),
        cadence: Cadence::Monthly,
    },
    SeriesSpec {
        key: "case_shiller",
        source: SourceSpec::Fred("CSUSHPINSA"),
        start: (1987, 1),
        cadence: Cadence::Monthly,
    },
    SeriesSpec {
        key: "mortgage_gdp",
        source: SourceSpec::Fred("HDTGPDUSQ163N"),
        start: (1980, 1),
        cadence: Cadence::QuarterlyFfill,
    },
    SeriesSpec {
        key: "homeownership_rate",
        source: SourceSpec::Fred("RHORUSQ156N"),
        start: (1980, 1),
        cadence: Cadence::QuarterlyFfill,
    },
];

/// Assembles the merged monthly dataset from cache and providers.
pub struct DatasetBuilder<'a> {
    cache: &'a CsvCache,
    shiller: &'a dyn SeriesProvider,
    fred: &'a dyn SeriesProvider,
}

impl<'a> DatasetBuilder<'a> {
    pub fn new(
        cache: &'a CsvCache,
        shiller: &'a dyn SeriesProvider,
        fred: &'a dyn SeriesProvider,
    ) -> Self {
        Self {
            cache,
            shiller,
            fred,
        }
    }

    /// Cache-or-fetch one catalogued series.
    fn load_series(&self, spec: &SeriesSpec, force: bool) -> Result<Vec<Observation>, DataError> {
        if !force && self.cache.contains(spec.key) {
            return self.cache.load_series(spec.key);
        }

        let raw = match spec.source {
            SourceSpec::Shiller => self.shiller.fetch(spec.key, spec.start_date())?,
            SourceSpec::Fred(id) => self.fred.fetch(id, spec.start_date())?,
        };
        self.cache.write_series(spec.key, &raw.observations)?;
        Ok(raw.observations)
    }

    /// Fetch (or load) every catalogued series, resample each onto the
    /// monthly axis, merge them onto the union axis, derive the combined
    /// `sp500` column, and persist the result as the merged raw table.
    pub fn build_merged(&self, force: bool) -> Result<MonthlyTable, DataError> {
        let mut series: Vec<MonthlySeries> = Vec::with_capacity(SERIES_CATALOG.len());
        for spec in SERIES_CATALOG {
            let observations = self.load_series(spec, force)?;
            let points = match spec.cadence {
                Cadence::Monthly => monthly_last(&observations),
                Cadence::QuarterlyFfill => monthly_ffill(&quarterly_last(&observations)),
            };
            series.push(MonthlySeries::from_points(spec.key, points));
        }

        let mut table = union_merge(&series);

        // The headline price series prefers the long Shiller history and
        // falls back to the FRED level where Shiller has no observation.
        let sp500 = {
            let shiller = table
                .column(SHILLER_SP500)
                .ok_or_else(|| DataError::Validation("merged table lost sp500_shiller".into()))?;
            let fred = table
                .column("sp500_fred")
                .ok_or_else(|| DataError::Validation("merged table lost sp500_fred".into()))?;
            combine_first(shiller, fred)
        };
        table.set_column("sp500", sp500);

        store::write_table(&self.cache.data_dir().join(MERGED_RAW_FILE), &table, None)?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::{RawSeries, SourceKind};
    use chrono::Datelike;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_data_dir() -> std::path::PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir =
            std::env::temp_dir().join(format!("bubblelab_loader_{}_{id}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Provider stub that serves a flat synthetic ramp and counts fetches.
    struct StubProvider {
        name: &'static str,
        calls: Mutex<Vec<String>>,
    }

    impl StubProvider {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl SeriesProvider for StubProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn fetch(&self, key: &str, start: NaiveDate) -> Result<RawSeries, DataError> {
            self.calls.lock().unwrap().push(key.to_string());
            let observations: Vec<Observation> = (0..6)
                .map(|i| {
                    let date = NaiveDate::from_ymd_opt(start.year(), 1 + i, 15).unwrap();
                    Observation::new(date, 100.0 + f64::from(i))
                })
                .collect();
            Ok(RawSeries {
                key: key.to_string(),
                observations,
                source: SourceKind::Fred,
            })
        }
    }

    #[test]
    fn build_merged_combines_and_persists() {
        let dir = temp_data_dir();
        let cache = CsvCache::new(&dir);
        let shiller = StubProvider::new("shiller");
        let fred = StubProvider::new("fred");
        let builder = DatasetBuilder::new(&cache, &shiller, &fred);

        let table = builder.build_merged(false).unwrap();

        assert!(table.has_column("sp500"));
        assert!(table.has_column("cape"));
        assert!(table.has_column("mortgage_gdp"));
        assert!(dir.join(MERGED_RAW_FILE).exists());

        // Every catalogued series now has a cache file.
        for spec in SERIES_CATALOG {
            assert!(cache.contains(spec.key), "missing cache for {}", spec.key);
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn second_build_reads_from_cache() {
        let dir = temp_data_dir();
        let cache = CsvCache::new(&dir);
        let shiller = StubProvider::new("shiller");
        let fred = StubProvider::new("fred");
        let builder = DatasetBuilder::new(&cache, &shiller, &fred);

        builder.build_merged(false).unwrap();
        let after_first = shiller.call_count() + fred.call_count();
        builder.build_merged(false).unwrap();
        let after_second = shiller.call_count() + fred.call_count();

        assert_eq!(after_first, after_second, "cached build must not refetch");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn force_refetches_everything() {
        let dir = temp_data_dir();
        let cache = CsvCache::new(&dir);
        let shiller = StubProvider::new("shiller");
        let fred = StubProvider::new("fred");
        let builder = DatasetBuilder::new(&cache, &shiller, &fred);

        builder.build_merged(false).unwrap();
        let after_first = shiller.call_count() + fred.call_count();
        builder.build_merged(true).unwrap();
        let after_second = shiller.call_count() + fred.call_count();

        assert_eq!(after_second, after_first * 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn sp500_prefers_shiller_level() {
        // The stub serves identical ramps for every key, so wherever both
        // sources are present the combined column equals the Shiller one.
        let dir = temp_data_dir();
        let cache = CsvCache::new(&dir);
        let shiller = StubProvider::new("shiller");
        let fred = StubProvider::new("fred");
        let builder = DatasetBuilder::new(&cache, &shiller, &fred);

        let table = builder.build_merged(false).unwrap();
        let combined = table.column("sp500").unwrap();
        let from_shiller = table.column(SHILLER_SP500).unwrap();
        for (c, s) in combined.iter().zip(from_shiller) {
            if s.is_finite() {
                assert_eq!(c, s);
            }
        }

        let _ = std::fs::remove_dir_all(&dir);
    }
}
