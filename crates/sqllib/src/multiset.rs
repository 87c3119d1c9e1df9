//! Ordered multisets of observations.
//!
//! A percentile estimator only needs to insert, delete one occurrence of,
//! and select by rank among the values it has seen. [`OrderedMultiset`]
//! captures that contract so the estimator can run on a plain sorted vector
//! or on an [`OrderStatisticsMultiset`](crate::OrderStatisticsMultiset)
//! when windows grow large.

use crate::floats::F64;
use size_of::SizeOf;
use std::fmt::Debug;

/// A sorted collection of `F64` values that permits duplicates.
///
/// Removing a value deletes exactly one occurrence of it.
pub trait OrderedMultiset: Clone + Debug + Send + 'static {
    /// Add one occurrence of `value`.
    fn insert(&mut self, value: F64);

    /// Delete one occurrence of `value`. Returns `false` and leaves the
    /// multiset untouched if `value` is absent.
    fn remove(&mut self, value: F64) -> bool;

    /// Number of occurrences, counting duplicates.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `k`-th smallest value, 0-indexed.
    fn select(&self, k: usize) -> Option<F64>;

    fn clear(&mut self);

    /// All occurrences in ascending order.
    fn to_sorted_vec(&self) -> Vec<F64>;

    /// Replace the contents with `values`, which may arrive in any order.
    fn replace(&mut self, values: Vec<F64>);
}

/// Sorted vector with binary-search insertion and removal.
///
/// A value equal to existing entries is placed immediately after the entry
/// found by the binary search.
#[derive(Debug, Clone, Default, PartialEq, Eq, SizeOf)]
pub struct SortedVecMultiset {
    values: Vec<F64>,
}

impl SortedVecMultiset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[F64] {
        &self.values
    }
}

impl OrderedMultiset for SortedVecMultiset {
    fn insert(&mut self, value: F64) {
        let pos = match self.values.binary_search(&value) {
            Ok(pos) => pos + 1,
            Err(pos) => pos,
        };
        self.values.insert(pos, value);
    }

    fn remove(&mut self, value: F64) -> bool {
        match self.values.binary_search(&value) {
            Ok(pos) => {
                self.values.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    fn select(&self, k: usize) -> Option<F64> {
        self.values.get(k).copied()
    }

    fn clear(&mut self) {
        self.values.clear();
    }

    fn to_sorted_vec(&self) -> Vec<F64> {
        self.values.clone()
    }

    fn replace(&mut self, mut values: Vec<F64>) {
        values.sort();
        self.values = values;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multiset(values: &[f64]) -> SortedVecMultiset {
        let mut multiset = SortedVecMultiset::new();
        for value in values {
            multiset.insert(F64::new(*value));
        }
        multiset
    }

    #[test]
    fn insert_keeps_order() {
        let multiset = multiset(&[10.0, 30.0, 50.0, 40.0, 80.0, 60.0, 20.0]);
        assert_eq!(
            multiset.as_slice(),
            &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 80.0].map(F64::new)
        );
        assert_eq!(multiset.select(0), Some(F64::new(10.0)));
        assert_eq!(multiset.select(6), Some(F64::new(80.0)));
        assert_eq!(multiset.select(7), None);
    }

    #[test]
    fn duplicates() {
        let mut multiset = multiset(&[5.0, 5.0, 1.0, 5.0]);
        assert_eq!(multiset.len(), 4);

        assert!(multiset.remove(F64::new(5.0)));
        assert_eq!(multiset.as_slice(), &[1.0, 5.0, 5.0].map(F64::new));
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut multiset = multiset(&[1.0, 2.0, 3.0]);
        assert!(!multiset.remove(F64::new(2.5)));
        assert!(!multiset.remove(F64::new(100.0)));
        assert_eq!(multiset.as_slice(), &[1.0, 2.0, 3.0].map(F64::new));

        let mut empty = SortedVecMultiset::new();
        assert!(!empty.remove(F64::new(0.0)));
        assert!(empty.is_empty());
    }

    #[test]
    fn replace_sorts() {
        let mut multiset = multiset(&[7.0]);
        multiset.replace([3.0, 1.0, 2.0, 1.0].map(F64::new).to_vec());
        assert_eq!(multiset.to_sorted_vec(), [1.0, 1.0, 2.0, 3.0].map(F64::new).to_vec());
    }
}
