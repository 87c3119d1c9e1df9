use serde::Serialize;
use std::borrow::Cow;
use thiserror::Error;

/// Errors detected while a percentile call is being compiled.
///
/// These prevent the owning query from being built and are never
/// produced while events flow.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
pub enum ConfigError {
    #[error(
        "percentile function has to have exactly 2 parameters, currently {actual} parameters provided"
    )]
    ArgumentCount { actual: usize },

    #[error("percentile not supported for argument type {found}")]
    UnsupportedArgumentType { found: String },

    #[error("percentile value has to be a constant")]
    PercentileNotConstant,

    #[error("percentile value should be of type DOUBLE, but found {found}")]
    PercentileType { found: String },

    #[error("percentile value should be in 0 < p <= 100 range, but found {percentile}")]
    PercentileOutOfRange { percentile: f64 },

    #[error("invalid percentile configuration: {message}")]
    Parse { message: String },
}

impl ConfigError {
    /// Identifying name of the error.
    pub fn error_code(&self) -> Cow<'static, str> {
        match self {
            ConfigError::ArgumentCount { .. } => Cow::from("ArgumentCount"),
            ConfigError::UnsupportedArgumentType { .. } => Cow::from("UnsupportedArgumentType"),
            ConfigError::PercentileNotConstant => Cow::from("PercentileNotConstant"),
            ConfigError::PercentileType { .. } => Cow::from("PercentileType"),
            ConfigError::PercentileOutOfRange { .. } => Cow::from("PercentileOutOfRange"),
            ConfigError::Parse { .. } => Cow::from("InvalidConfig"),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(error: serde_json::Error) -> Self {
        ConfigError::Parse {
            message: error.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(error: serde_yaml::Error) -> Self {
        ConfigError::Parse {
            message: error.to_string(),
        }
    }
}
