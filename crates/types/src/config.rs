//! Percentile aggregate configuration.
//!
//! The percentile `p` is frozen when a query is compiled; the multiset
//! settings only tune how observations are stored and never change the
//! values an aggregate produces.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Default value of [`MultisetConfig::branching_factor`].
pub const fn default_branching_factor() -> usize {
    64
}

/// Storage used to keep observations ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultisetBackend {
    /// Sorted vector with binary-search insertion. O(n) per update, compact
    /// and fast for the small windows most queries use.
    #[default]
    SortedVec,
    /// Weighted B+ tree with subtree counts. O(log n) per update.
    OrderStatisticsTree,
}

/// Settings for the ordered multiset behind a percentile aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisetConfig {
    #[serde(default)]
    pub backend: MultisetBackend,

    /// Maximum entries per tree node. Only used by
    /// [`MultisetBackend::OrderStatisticsTree`].
    #[serde(default = "default_branching_factor")]
    pub branching_factor: usize,
}

impl Default for MultisetConfig {
    fn default() -> Self {
        Self {
            backend: MultisetBackend::default(),
            branching_factor: default_branching_factor(),
        }
    }
}

impl MultisetConfig {
    pub fn with_backend(backend: MultisetBackend) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }
}

/// Full configuration of a standalone percentile estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileConfig {
    /// The percentile to compute, `0 < percentile <= 100`.
    pub percentile: f64,

    #[serde(flatten)]
    pub multiset: MultisetConfig,
}

impl PercentileConfig {
    pub fn new(percentile: f64) -> Result<Self, ConfigError> {
        let config = Self {
            percentile,
            multiset: MultisetConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_backend(mut self, backend: MultisetBackend) -> Self {
        self.multiset.backend = backend;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_percentile(self.percentile).map(|_| ())
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(config: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(config)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML configuration.
    pub fn from_yaml(config: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(config)?;
        config.validate()?;
        Ok(config)
    }
}

/// Check that `percentile` lies in `(0, 100]`. NaN is rejected.
pub fn validate_percentile(percentile: f64) -> Result<f64, ConfigError> {
    if percentile > 0.0 && percentile <= 100.0 {
        Ok(percentile)
    } else {
        Err(ConfigError::PercentileOutOfRange { percentile })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn percentile_range() {
        assert!(validate_percentile(0.0).is_err());
        assert!(validate_percentile(-1.0).is_err());
        assert!(validate_percentile(100.000001).is_err());
        assert!(validate_percentile(f64::NAN).is_err());
        assert_eq!(validate_percentile(100.0), Ok(100.0));
        assert_eq!(validate_percentile(0.001), Ok(0.001));
    }

    #[test]
    fn json_defaults() {
        let config = PercentileConfig::from_json(r#"{"percentile": 97.0}"#).unwrap();
        assert_eq!(
            config,
            PercentileConfig {
                percentile: 97.0,
                multiset: MultisetConfig {
                    backend: MultisetBackend::SortedVec,
                    branching_factor: 64,
                },
            }
        );
    }

    #[test]
    fn yaml_backend() {
        let config = PercentileConfig::from_yaml(
            r#"
percentile: 50
backend: order_statistics_tree
branching_factor: 16
"#,
        )
        .unwrap();
        assert_eq!(config.percentile, 50.0);
        assert_eq!(
            config.multiset.backend,
            MultisetBackend::OrderStatisticsTree
        );
        assert_eq!(config.multiset.branching_factor, 16);
    }

    #[test]
    fn rejects_out_of_range() {
        let err = PercentileConfig::from_json(r#"{"percentile": 0}"#).unwrap_err();
        assert_eq!(err.error_code(), "PercentileOutOfRange");

        let err = PercentileConfig::new(150.0).unwrap_err();
        assert_eq!(err, ConfigError::PercentileOutOfRange { percentile: 150.0 });
    }

    #[test]
    fn rejects_malformed() {
        let err = PercentileConfig::from_json(r#"{"backend": "sorted_vec"}"#).unwrap_err();
        assert_eq!(err.error_code(), "InvalidConfig");

        let err = PercentileConfig::from_yaml("percentile: 10\nbackend: skiplist\n").unwrap_err();
        assert_eq!(err.error_code(), "InvalidConfig");
    }

    #[test]
    fn with_backend() {
        let config = PercentileConfig::new(25.0)
            .unwrap()
            .with_backend(MultisetBackend::OrderStatisticsTree);
        assert_eq!(config.multiset, MultisetConfig::with_backend(MultisetBackend::OrderStatisticsTree));
    }
}
