//! Serializable study configuration.
//!
//! Thresholds and the window table are explicit immutable values handed to
//! the pipeline by the caller; there are no process-wide defaults to mutate.

use crate::domain::{BubbleWindowSet, WindowError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Thresholds controlling the bubble flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Trailing window, in months, for the momentum flag.
    pub momentum_window: usize,
    /// Trailing compounded return above which momentum is "high".
    pub high_momentum_threshold: f64,
    /// Valuation quantile (over full history) above which valuation is "high".
    pub valuation_quantile: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            momentum_window: 24,
            high_momentum_threshold: 0.25,
            valuation_quantile: 0.9,
        }
    }
}

/// Full study configuration: feature thresholds plus the window table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    pub features: FeatureConfig,
    pub windows: BubbleWindowSet,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            features: FeatureConfig::default(),
            windows: BubbleWindowSet::canonical(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Windows(#[from] WindowError),
}

impl StudyConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Month;

    #[test]
    fn defaults_match_documented_thresholds() {
        let config = FeatureConfig::default();
        assert_eq!(config.momentum_window, 24);
        assert_eq!(config.high_momentum_threshold, 0.25);
        assert_eq!(config.valuation_quantile, 0.9);
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config = StudyConfig::from_toml("").unwrap();
        assert_eq!(config, StudyConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = StudyConfig::from_toml(
            r#"
[features]
momentum_window = 12
"#,
        )
        .unwrap();
        assert_eq!(config.features.momentum_window, 12);
        assert_eq!(config.features.high_momentum_threshold, 0.25);
        assert_eq!(config.windows, BubbleWindowSet::canonical());
    }

    #[test]
    fn windows_can_be_replaced() {
        let config = StudyConfig::from_toml(
            r#"
[[windows]]
name = "roaring_twenties"
start = "1926-01"
end = "1932-12"
"#,
        )
        .unwrap();
        assert_eq!(config.windows.len(), 1);
        assert_eq!(
            config.windows.label_for(Month::new(1929, 10)),
            Some("roaring_twenties")
        );
    }

    #[test]
    fn overlapping_windows_fail_to_parse() {
        let result = StudyConfig::from_toml(
            r#"
[[windows]]
name = "a"
start = "2000-01"
end = "2002-12"

[[windows]]
name = "b"
start = "2001-01"
end = "2003-12"
"#,
        );
        assert!(result.is_err());
    }
}
