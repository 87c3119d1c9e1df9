//! Weighted B+ tree answering "k-th smallest occurrence" in O(log n).
//!
//! Leaves hold sorted `(key, weight)` entries and are chained left to right.
//! Every branch records the total weight below each of its children, so a
//! select walks from the root to one leaf, skipping whole subtrees whose
//! weight lies before `k`:
//!
//! ```text
//!                  branch  bounds  [20,    40]
//!                          weights [6,  5,  4]
//!                 /              |              \
//!     leaf [(10,2),(15,4)] -> leaf [(20,1),(30,4)] -> leaf [(40,4)]
//! ```
//!
//! Leaves and branches live in two arenas and refer to each other by index.
//! Entries are never unlinked: a key whose weight falls to zero stays in its
//! leaf until [`OrderStatisticsMultiset::compact`] rebuilds the tree. The
//! [`OrderedMultiset`] impl compacts once dead keys outnumber live ones.

use crate::floats::F64;
use crate::multiset::OrderedMultiset;
use size_of::SizeOf;

/// Signed occurrence count of a key.
pub type Weight = i64;

pub const DEFAULT_BRANCHING_FACTOR: usize = 64;

/// Smallest fanout for which splitting a node leaves both halves non-empty.
pub const MIN_BRANCHING_FACTOR: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, SizeOf)]
enum NodeRef {
    Leaf(usize),
    Branch(usize),
}

#[derive(Debug, Clone, SizeOf)]
struct Leaf<T> {
    entries: Vec<(T, Weight)>,
    /// The leaf holding the next larger keys.
    next: Option<usize>,
}

#[derive(Debug, Clone, SizeOf)]
struct Branch<T> {
    /// `bounds[i]` is the smallest key stored under `children[i + 1]`.
    bounds: Vec<T>,
    children: Vec<NodeRef>,
    /// Total weight under each child.
    weights: Vec<Weight>,
}

impl<T: Ord> Branch<T> {
    fn child_for(&self, key: &T) -> usize {
        self.bounds.partition_point(|bound| bound <= key)
    }
}

/// Result of adding weight below some node.
struct Inserted<T> {
    /// Weight of the key before the update, `None` for a new key.
    previous: Option<Weight>,
    /// The separator and the new right sibling, when the node split.
    split: Option<(T, NodeRef)>,
}

/// A multiset of keys with signed weights, ordered by key.
///
/// # Example
/// ```
/// use streammath_sqllib::OrderStatisticsMultiset;
///
/// let mut tree = OrderStatisticsMultiset::new();
/// tree.insert(10, 3);
/// tree.insert(20, 2);
/// tree.insert(10, -1);
///
/// assert_eq!(tree.total_weight(), 4);
/// assert_eq!(tree.select_kth(0), Some(&10));
/// assert_eq!(tree.select_kth(2), Some(&20));
/// assert_eq!(tree.get_weight(&10), 2);
/// ```
#[derive(Debug, Clone, SizeOf)]
pub struct OrderStatisticsMultiset<T> {
    leaves: Vec<Leaf<T>>,
    branches: Vec<Branch<T>>,
    root: Option<NodeRef>,
    fanout: usize,
    total_weight: Weight,
    /// Distinct keys, zero-weight ones included.
    num_keys: usize,
    zero_weight_keys: usize,
}

impl<T: Ord + Clone> PartialEq for OrderStatisticsMultiset<T> {
    fn eq(&self, other: &Self) -> bool {
        self.total_weight == other.total_weight
            && self
                .iter()
                .filter(|(_, w)| *w != 0)
                .eq(other.iter().filter(|(_, w)| *w != 0))
    }
}

impl<T: Ord + Clone> Eq for OrderStatisticsMultiset<T> {}

impl<T: Ord + Clone> Default for OrderStatisticsMultiset<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> OrderStatisticsMultiset<T> {
    pub fn new() -> Self {
        Self::with_branching_factor(DEFAULT_BRANCHING_FACTOR)
    }

    /// Empty multiset whose nodes hold at most `fanout` entries or children.
    /// Values below [`MIN_BRANCHING_FACTOR`] are raised to it.
    pub fn with_branching_factor(fanout: usize) -> Self {
        Self {
            leaves: Vec::new(),
            branches: Vec::new(),
            root: None,
            fanout: fanout.max(MIN_BRANCHING_FACTOR),
            total_weight: 0,
            num_keys: 0,
            zero_weight_keys: 0,
        }
    }

    pub fn branching_factor(&self) -> usize {
        self.fanout
    }

    #[inline]
    pub fn total_weight(&self) -> Weight {
        self.total_weight
    }

    #[inline]
    pub fn num_keys(&self) -> usize {
        self.num_keys
    }

    #[inline]
    pub fn zero_weight_keys(&self) -> usize {
        self.zero_weight_keys
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_weight <= 0
    }

    /// Add `weight` to `key`. A negative weight removes occurrences.
    pub fn insert(&mut self, key: T, weight: Weight) {
        if weight == 0 {
            return;
        }

        let Some(root) = self.root else {
            self.leaves.push(Leaf {
                entries: vec![(key, weight)],
                next: None,
            });
            self.root = Some(NodeRef::Leaf(0));
            self.total_weight = weight;
            self.num_keys = 1;
            return;
        };

        let inserted = self.insert_below(root, key, weight);
        self.total_weight += weight;
        match inserted.previous {
            None => self.num_keys += 1,
            Some(previous) => {
                if previous == 0 {
                    self.zero_weight_keys -= 1;
                }
                if previous + weight == 0 {
                    self.zero_weight_keys += 1;
                }
            }
        }

        if let Some((bound, right)) = inserted.split {
            let weights = vec![self.weight_below(root), self.weight_below(right)];
            self.branches.push(Branch {
                bounds: vec![bound],
                children: vec![root, right],
                weights,
            });
            self.root = Some(NodeRef::Branch(self.branches.len() - 1));
        }
    }

    fn insert_below(&mut self, node: NodeRef, key: T, weight: Weight) -> Inserted<T> {
        match node {
            NodeRef::Leaf(idx) => {
                let leaf = &mut self.leaves[idx];
                let previous = match leaf.entries.binary_search_by(|(k, _)| k.cmp(&key)) {
                    Ok(pos) => {
                        let entry = &mut leaf.entries[pos].1;
                        let previous = *entry;
                        *entry += weight;
                        Some(previous)
                    }
                    Err(pos) => {
                        leaf.entries.insert(pos, (key, weight));
                        None
                    }
                };
                let overflow = leaf.entries.len() > self.fanout;
                Inserted {
                    previous,
                    split: overflow.then(|| self.split_leaf(idx)),
                }
            }
            NodeRef::Branch(idx) => {
                let branch = &self.branches[idx];
                let pos = branch.child_for(&key);
                let child = branch.children[pos];

                let inserted = self.insert_below(child, key, weight);
                let split = match inserted.split {
                    None => {
                        self.branches[idx].weights[pos] += weight;
                        None
                    }
                    Some((bound, right)) => {
                        let left_weight = self.weight_below(child);
                        let right_weight = self.weight_below(right);
                        let branch = &mut self.branches[idx];
                        branch.weights[pos] = left_weight;
                        branch.bounds.insert(pos, bound);
                        branch.children.insert(pos + 1, right);
                        branch.weights.insert(pos + 1, right_weight);
                        let overflow = branch.children.len() > self.fanout;
                        overflow.then(|| self.split_branch(idx))
                    }
                };
                Inserted {
                    previous: inserted.previous,
                    split,
                }
            }
        }
    }

    /// Move the upper half of a leaf into a new leaf chained after it.
    fn split_leaf(&mut self, idx: usize) -> (T, NodeRef) {
        let right_idx = self.leaves.len();
        let leaf = &mut self.leaves[idx];
        let upper = leaf.entries.split_off(leaf.entries.len() / 2);
        let bound = upper[0].0.clone();
        let next = leaf.next.replace(right_idx);
        self.leaves.push(Leaf {
            entries: upper,
            next,
        });
        (bound, NodeRef::Leaf(right_idx))
    }

    /// Move the upper half of a branch into a new branch. The middle bound
    /// moves up to the parent.
    fn split_branch(&mut self, idx: usize) -> (T, NodeRef) {
        let branch = &mut self.branches[idx];
        let mid = branch.bounds.len() / 2;
        let mut bounds = branch.bounds.split_off(mid);
        let promoted = bounds.remove(0);
        let children = branch.children.split_off(mid + 1);
        let weights = branch.weights.split_off(mid + 1);
        self.branches.push(Branch {
            bounds,
            children,
            weights,
        });
        (promoted, NodeRef::Branch(self.branches.len() - 1))
    }

    fn weight_below(&self, node: NodeRef) -> Weight {
        match node {
            NodeRef::Leaf(idx) => self.leaves[idx].entries.iter().map(|(_, w)| w).sum(),
            NodeRef::Branch(idx) => self.branches[idx].weights.iter().sum(),
        }
    }

    /// The k-th occurrence (0-indexed) in ascending order. Keys with a
    /// non-positive weight are skipped.
    pub fn select_kth(&self, k: Weight) -> Option<&T> {
        if k < 0 || k >= self.total_weight {
            return None;
        }

        let mut remaining = k;
        let mut node = self.root?;
        loop {
            match node {
                NodeRef::Leaf(idx) => {
                    return self.leaves[idx]
                        .entries
                        .iter()
                        .filter(|(_, w)| *w > 0)
                        .find_map(|(key, w)| {
                            if remaining < *w {
                                Some(key)
                            } else {
                                remaining -= w;
                                None
                            }
                        });
                }
                NodeRef::Branch(idx) => {
                    let branch = &self.branches[idx];
                    let mut next = None;
                    for (child, weight) in branch.children.iter().zip(&branch.weights) {
                        let weight = (*weight).max(0);
                        if remaining < weight {
                            next = Some(*child);
                            break;
                        }
                        remaining -= weight;
                    }
                    node = next?;
                }
            }
        }
    }

    /// Weight of `key`, 0 if absent.
    pub fn get_weight(&self, key: &T) -> Weight {
        let mut node = self.root;
        while let Some(current) = node {
            match current {
                NodeRef::Leaf(idx) => {
                    let entries = &self.leaves[idx].entries;
                    return entries
                        .binary_search_by(|(k, _)| k.cmp(key))
                        .map_or(0, |pos| entries[pos].1);
                }
                NodeRef::Branch(idx) => {
                    let branch = &self.branches[idx];
                    node = Some(branch.children[branch.child_for(key)]);
                }
            }
        }
        0
    }

    /// All `(key, weight)` entries in ascending key order, zero weights
    /// included.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            tree: self,
            leaf: (!self.leaves.is_empty()).then_some(0),
            pos: 0,
        }
    }

    /// Rebuild the tree without zero-weight entries.
    pub fn compact(&mut self) {
        let live: Vec<(T, Weight)> = self
            .iter()
            .filter(|(_, w)| *w != 0)
            .map(|(k, w)| (k.clone(), w))
            .collect();

        self.clear();
        for (key, weight) in live {
            self.insert(key, weight);
        }
    }

    pub fn clear(&mut self) {
        self.leaves.clear();
        self.branches.clear();
        self.root = None;
        self.total_weight = 0;
        self.num_keys = 0;
        self.zero_weight_keys = 0;
    }
}

/// Iterator returned by [`OrderStatisticsMultiset::iter`].
pub struct Iter<'a, T> {
    tree: &'a OrderStatisticsMultiset<T>,
    leaf: Option<usize>,
    pos: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (&'a T, Weight);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let leaf = &self.tree.leaves[self.leaf?];
            if let Some((key, weight)) = leaf.entries.get(self.pos) {
                self.pos += 1;
                return Some((key, *weight));
            }
            self.leaf = leaf.next;
            self.pos = 0;
        }
    }
}

impl OrderedMultiset for OrderStatisticsMultiset<F64> {
    fn insert(&mut self, value: F64) {
        OrderStatisticsMultiset::insert(self, value, 1);
    }

    fn remove(&mut self, value: F64) -> bool {
        if self.get_weight(&value) <= 0 {
            return false;
        }
        OrderStatisticsMultiset::insert(self, value, -1);
        if self.zero_weight_keys > self.num_keys - self.zero_weight_keys {
            self.compact();
        }
        true
    }

    #[inline]
    fn len(&self) -> usize {
        self.total_weight.max(0) as usize
    }

    fn select(&self, k: usize) -> Option<F64> {
        self.select_kth(Weight::try_from(k).ok()?).copied()
    }

    fn clear(&mut self) {
        OrderStatisticsMultiset::clear(self);
    }

    fn to_sorted_vec(&self) -> Vec<F64> {
        self.iter()
            .flat_map(|(key, weight)| std::iter::repeat_n(*key, weight.max(0) as usize))
            .collect()
    }

    fn replace(&mut self, mut values: Vec<F64>) {
        OrderStatisticsMultiset::clear(self);
        values.sort();
        for run in values.chunk_by(|a, b| a == b) {
            OrderStatisticsMultiset::insert(self, run[0], run.len() as Weight);
        }
    }
}
