//! Incremental percentile estimator.
//!
//! The estimator keeps every live observation in an ordered multiset and
//! recomputes the requested percentile after each update. The percentile of
//! `n` sorted values is defined through the index `idx = p * n / 100`:
//!
//! * if `idx` is a whole number, the result is the average of the `idx`-th
//!   value and the one after it (1-indexed), or the last value when
//!   `idx == n`;
//! * otherwise `idx` is rounded half up and the value at that rank is
//!   returned, the first value when it rounds to 0.
//!
//! The empty multiset has percentile `0.0`.

use crate::floats::F64;
use crate::multiset::{OrderedMultiset, SortedVecMultiset};
use crate::order_statistics_multiset::OrderStatisticsMultiset;
use crate::snapshot::PercentileSnapshot;
use size_of::SizeOf;
use streammath_types::config::validate_percentile;
use streammath_types::ConfigError;
use tracing::{debug, trace};

/// Compute the `percentile`-th percentile of `values`.
///
/// `percentile` is expected to lie in `(0, 100]`.
pub fn percentile_value<M>(values: &M, percentile: f64) -> f64
where
    M: OrderedMultiset,
{
    let n = values.len();
    if n == 0 {
        return 0.0;
    }

    let at = |k: usize| values.select(k).map_or(0.0, F64::into_inner);

    let index = percentile * n as f64 / 100.0;
    if index.fract() == 0.0 {
        let index = index as usize;
        if index >= n {
            at(n - 1)
        } else if index == 0 {
            at(0)
        } else {
            (at(index - 1) + at(index)) / 2.0
        }
    } else {
        // `index` is positive, so rounding away from zero rounds half up.
        let rank = index.round() as usize;
        if rank == 0 {
            at(0)
        } else {
            at(rank.min(n) - 1)
        }
    }
}

/// Maintains the p-th percentile of a multiset of `f64` values under
/// interleaved [`add`](Self::add) and [`remove`](Self::remove) calls.
///
/// `p` is fixed at construction. An estimator is not meant to be shared
/// between threads while it is being updated; independent instances share
/// no state.
#[derive(Debug, Clone, SizeOf)]
pub struct PercentileEstimator<M = SortedVecMultiset> {
    percentile: f64,
    values: M,
}

impl PercentileEstimator<SortedVecMultiset> {
    /// Create an estimator backed by a sorted vector.
    pub fn new(percentile: f64) -> Result<Self, ConfigError> {
        Self::with_multiset(percentile, SortedVecMultiset::new())
    }
}

impl PercentileEstimator<OrderStatisticsMultiset<F64>> {
    /// Create an estimator backed by an order-statistics tree with the given
    /// branching factor.
    pub fn with_tree(percentile: f64, branching_factor: usize) -> Result<Self, ConfigError> {
        Self::with_multiset(
            percentile,
            OrderStatisticsMultiset::with_branching_factor(branching_factor),
        )
    }
}

impl<M> PercentileEstimator<M>
where
    M: OrderedMultiset,
{
    /// Create an estimator over `values`, which may already hold
    /// observations.
    pub fn with_multiset(percentile: f64, values: M) -> Result<Self, ConfigError> {
        let percentile = validate_percentile(percentile)?;
        Ok(Self::new_unchecked(percentile, values))
    }

    /// `percentile` must already have passed [`validate_percentile`].
    pub(crate) fn new_unchecked(percentile: f64, values: M) -> Self {
        Self { percentile, values }
    }

    pub fn percentile(&self) -> f64 {
        self.percentile
    }

    /// Number of live observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &M {
        &self.values
    }

    /// Record `value` and return the updated percentile.
    pub fn add(&mut self, value: f64) -> f64 {
        self.values.insert(F64::new(value));
        self.current()
    }

    /// Forget one occurrence of `value` and return the updated percentile.
    ///
    /// Removing a value that is not present leaves the estimator unchanged.
    pub fn remove(&mut self, value: f64) -> f64 {
        if !self.values.remove(F64::new(value)) {
            debug!(
                value,
                size = self.values.len(),
                "percentile: removed value was not present"
            );
        }
        self.current()
    }

    /// Percentile of the current observations.
    pub fn current(&self) -> f64 {
        percentile_value(&self.values, self.percentile)
    }

    /// Drop all observations. Returns the percentile of the empty set, `0.0`.
    pub fn reset(&mut self) -> f64 {
        self.values.clear();
        0.0
    }

    /// True when the estimator holds no observations and may be discarded.
    pub fn can_destroy(&self) -> bool {
        self.values.is_empty()
    }

    pub fn snapshot(&self) -> PercentileSnapshot {
        PercentileSnapshot::new(
            self.values
                .to_sorted_vec()
                .into_iter()
                .map(F64::into_inner)
                .collect(),
        )
    }

    /// Replace all observations with the contents of `snapshot`.
    pub fn restore(&mut self, snapshot: PercentileSnapshot) {
        let values = snapshot.into_values().into_iter().map(F64::new).collect();
        self.values.replace(values);
        trace!(size = self.values.len(), "percentile: restored snapshot");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sorted(values: &[f64]) -> SortedVecMultiset {
        let mut multiset = SortedVecMultiset::new();
        multiset.replace(values.iter().copied().map(F64::new).collect());
        multiset
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(percentile_value(&SortedVecMultiset::new(), 50.0), 0.0);
        assert_eq!(percentile_value(&SortedVecMultiset::new(), 100.0), 0.0);
    }

    #[test]
    fn fractional_index_rounds_half_up() {
        // idx = 2.5 rounds to 3.
        let values = sorted(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        assert_eq!(percentile_value(&values, 50.0), 30.0);

        // idx = 0.2 rounds to 0, which selects the first value.
        assert_eq!(percentile_value(&values, 4.0), 10.0);

        // idx = 1.2 rounds to 1.
        assert_eq!(percentile_value(&values, 24.0), 10.0);

        // idx = 3.5 rounds to 4; idx = 1.5 rounds to 2.
        let seven = sorted(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(percentile_value(&seven, 50.0), 4.0);
        let four = sorted(&[7.0, 9.0, 11.0, 13.0]);
        assert_eq!(percentile_value(&four, 37.5), 9.0);
    }

    #[test]
    fn whole_index_averages_neighbours() {
        let values = sorted(&[10.0, 20.0, 30.0, 40.0]);
        assert_eq!(percentile_value(&values, 50.0), 25.0);
        assert_eq!(percentile_value(&values, 25.0), 15.0);
        assert_eq!(percentile_value(&values, 75.0), 35.0);
    }

    #[test]
    fn whole_index_at_end_returns_last() {
        let values = sorted(&[10.0, 20.0, 30.0, 40.0]);
        assert_eq!(percentile_value(&values, 100.0), 40.0);

        let single = sorted(&[7.0]);
        assert_eq!(percentile_value(&single, 100.0), 7.0);
        assert_eq!(percentile_value(&single, 50.0), 7.0);
        assert_eq!(percentile_value(&single, 1.0), 7.0);
    }

    #[test]
    fn rejects_invalid_percentile() {
        assert_eq!(
            PercentileEstimator::new(0.0).unwrap_err(),
            ConfigError::PercentileOutOfRange { percentile: 0.0 }
        );
        assert!(PercentileEstimator::new(100.5).is_err());
        assert!(PercentileEstimator::new(f64::NAN).is_err());
        assert!(PercentileEstimator::with_tree(-3.0, 16).is_err());
        assert_eq!(PercentileEstimator::new(100.0).unwrap().percentile(), 100.0);
    }

    #[test]
    fn growing_stream() {
        let mut estimator = PercentileEstimator::new(97.0).unwrap();
        let results: Vec<f64> = [10.0, 30.0, 50.0, 40.0, 80.0, 60.0, 20.0, 90.0, 70.0, 100.0]
            .into_iter()
            .map(|value| estimator.add(value))
            .collect();
        assert_eq!(
            results,
            vec![10.0, 30.0, 50.0, 50.0, 80.0, 80.0, 80.0, 90.0, 90.0, 100.0]
        );
    }

    #[test]
    fn duplicate_values() {
        let mut estimator = PercentileEstimator::new(50.0).unwrap();
        estimator.add(5.0);
        estimator.add(5.0);
        assert_eq!(estimator.values().as_slice(), &[F64::new(5.0), F64::new(5.0)]);

        assert_eq!(estimator.remove(5.0), 5.0);
        assert_eq!(estimator.len(), 1);
    }

    #[test]
    fn remove_absent_value() {
        let mut estimator = PercentileEstimator::new(50.0).unwrap();
        assert_eq!(estimator.remove(3.0), 0.0);
        assert!(estimator.can_destroy());

        estimator.add(1.0);
        estimator.add(2.0);
        estimator.add(3.0);
        assert_eq!(estimator.remove(2.5), 2.0);
        assert_eq!(estimator.len(), 3);
    }

    #[test]
    fn current_is_idempotent() {
        let mut estimator = PercentileEstimator::new(30.0).unwrap();
        for value in [4.0, 8.0, 15.0, 16.0, 23.0, 42.0] {
            estimator.add(value);
        }
        let first = estimator.current();
        for _ in 0..10 {
            assert_eq!(estimator.current(), first);
        }
        assert_eq!(estimator.len(), 6);
    }

    #[test]
    fn reset() {
        let mut estimator = PercentileEstimator::new(90.0).unwrap();
        estimator.add(1.0);
        estimator.add(2.0);
        assert!(!estimator.can_destroy());

        assert_eq!(estimator.reset(), 0.0);
        assert!(estimator.can_destroy());
        assert_eq!(estimator.current(), 0.0);
    }

    #[test]
    fn snapshot_restore() {
        let mut estimator = PercentileEstimator::new(75.0).unwrap();
        for value in [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0] {
            estimator.add(value);
        }
        let snapshot = estimator.snapshot();
        assert_eq!(snapshot.values(), &[1.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 9.0]);

        let mut restored = PercentileEstimator::with_tree(75.0, 4).unwrap();
        restored.add(100.0);
        restored.restore(snapshot);
        assert_eq!(restored.current(), estimator.current());
        assert_eq!(restored.len(), 8);
    }

    #[test]
    fn restore_unsorted_snapshot() {
        let mut estimator = PercentileEstimator::new(50.0).unwrap();
        estimator.restore(PercentileSnapshot::new(vec![40.0, 10.0, 30.0, 20.0]));
        assert_eq!(estimator.current(), 25.0);
        assert_eq!(estimator.snapshot().values(), &[10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn tree_backend_matches() {
        let mut vec = PercentileEstimator::new(97.0).unwrap();
        let mut tree = PercentileEstimator::with_tree(97.0, 4).unwrap();
        for value in [10.0, 30.0, 100.0, 40.0, 80.0, 60.0, 20.0, 90.0, 70.0, 50.0] {
            assert_eq!(vec.add(value), tree.add(value));
        }
        for value in [30.0, 10.0, 55.0, 90.0] {
            assert_eq!(vec.remove(value), tree.remove(value));
        }
    }
}
