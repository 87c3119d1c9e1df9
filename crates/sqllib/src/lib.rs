//! Runtime library for the streammath SQL functions.
//!
//! The centerpiece is [`PercentileEstimator`], which maintains the p-th
//! percentile of a window of values as they are added and removed one at a
//! time. [`aggregates`] wraps it in the argument checking and type
//! coercion a query engine needs to expose it as `percentile(arg, p)`.

pub mod aggregates;
pub mod error;
pub mod floats;
pub mod multiset;
pub mod order_statistics_multiset;
pub mod percentile;
pub mod snapshot;

pub use aggregates::{Operand, PercentileFunction, PercentileState};
pub use error::{AggregateError, SnapshotError};
pub use floats::F64;
pub use multiset::{OrderedMultiset, SortedVecMultiset};
pub use order_statistics_multiset::OrderStatisticsMultiset;
pub use percentile::{percentile_value, PercentileEstimator};
pub use snapshot::PercentileSnapshot;

// Re-export these types, so callers don't need a direct dependency on the
// types crate.
pub use streammath_types::{
    ConfigError, MultisetBackend, MultisetConfig, PercentileConfig, SqlType, SqlValue,
};

/// Build a standalone estimator from a configuration, using the backend the
/// configuration selects.
///
/// Returns a compiled function; call
/// [`PercentileFunction::create_state`] for each group.
pub fn percentile_function(
    input_type: SqlType,
    config: &PercentileConfig,
) -> Result<PercentileFunction, ConfigError> {
    PercentileFunction::compile(
        &[
            Operand::Column(input_type),
            Operand::Constant(SqlValue::Double(config.percentile)),
        ],
        &config.multiset,
    )
}
