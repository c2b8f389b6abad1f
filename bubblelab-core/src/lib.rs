//! BubbleLab Core — monthly market/housing dataset assembly and bubble analysis.
//!
//! This crate contains the heart of the pipeline:
//! - Domain types (calendar months, monthly series/tables, bubble windows)
//! - Data layer (Shiller and FRED providers, flat CSV cache, resampling, merge)
//! - Feature engineering (returns, rolling stats, drawdowns, flags)
//! - Per-window bubble summaries
//!
//! Everything is synchronous and single-pass: each stage takes a table value
//! and returns a new one, and callers decide what to persist.

pub mod config;
pub mod data;
pub mod domain;
pub mod features;
pub mod summary;

pub use config::{ConfigError, FeatureConfig, StudyConfig};
pub use data::{CsvCache, DataError, DatasetBuilder, FredProvider, ShillerProvider};
pub use domain::{BubbleWindow, BubbleWindowSet, Month, MonthlySeries, MonthlyTable};
pub use features::{prepare_features, run_pipeline, FeatureTable};
pub use summary::{compute_bubble_summary, BubbleSummary};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn table_types_are_send_sync() {
        assert_send::<MonthlyTable>();
        assert_sync::<MonthlyTable>();
        assert_send::<FeatureTable>();
        assert_sync::<FeatureTable>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<StudyConfig>();
        assert_sync::<StudyConfig>();
        assert_send::<BubbleWindowSet>();
        assert_sync::<BubbleWindowSet>();
    }

    #[test]
    fn providers_are_send_sync() {
        assert_send::<ShillerProvider>();
        assert_sync::<ShillerProvider>();
        assert_send::<FredProvider>();
        assert_sync::<FredProvider>();
    }
}
