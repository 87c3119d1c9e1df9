pub mod config;
pub mod error;
pub mod value;

pub use config::{MultisetBackend, MultisetConfig, PercentileConfig};
pub use error::ConfigError;
pub use value::{SqlType, SqlValue};
