//! Data fetching, caching, resampling, and merging.

pub mod cache;
pub mod fred;
pub mod loader;
pub mod merge;
pub mod provider;
pub mod resample;
pub mod shiller;
pub mod store;

pub use cache::{CacheStatus, CsvCache};
pub use fred::FredProvider;
pub use loader::{DatasetBuilder, SeriesSpec, SERIES_CATALOG};
pub use merge::combine_first;
pub use provider::{DataError, Observation, RawSeries, SeriesProvider, SourceKind};
pub use shiller::ShillerProvider;
pub use store::{read_table, write_table, FEATURED_FILE, MERGED_RAW_FILE};
