//! Series and Data-Point Store
//!
//! The mutable aggregate state owned by a dimension: an insertion-ordered
//! map from series key to [`Series`], each holding an insertion-ordered map
//! from group key to [`DataPoint`]. The store is mutated exclusively by the
//! aggregation engine; callers observe it through the frozen
//! [`SeriesSnapshot`] built by the post-processing pipeline.
//!
//! # Design Notes
//!
//! - Insertion order is preserved (via `IndexMap`) so output is stable under
//!   repeated snapshots, independent of hash state.
//! - A series is created lazily on the first record mapping to it and is
//!   never destroyed; its `visible` flag flips off when its count reaches
//!   zero. The dimension remembers every series it has ever produced.
//! - Data points carry a user-defined accumulator `A` produced by the
//!   `reduce_init` hook and mutated by `reduce_add` / `reduce_remove`.

use indexmap::IndexMap;
use serde::Serialize;

use crate::key::GroupKey;

// ============================================================================
// Data Point
// ============================================================================

/// An aggregate within a series, keyed by the `group_data` extractor result.
#[derive(Debug, Clone, Serialize)]
pub struct DataPoint<A> {
    /// Group key of this point within its series
    pub key: GroupKey,
    /// Number of currently-included records contributing to this point
    pub count: usize,
    /// Display color, assigned once at creation via the `data_color` hook
    pub color: Option<String>,
    /// User-defined accumulator maintained by the reduce hooks
    pub value: A,
}

// ============================================================================
// Series
// ============================================================================

/// A top-level group of data points, keyed by the `group_series` extractor
/// result.
#[derive(Debug, Clone)]
pub struct Series<A> {
    /// Series key
    pub key: GroupKey,
    /// False once the series' included-record count has dropped to zero
    pub visible: bool,
    /// Number of currently-included records mapping to this series
    pub count: usize,
    /// Display color, assigned once at creation via the `series_color` hook
    pub color: Option<String>,
    /// Creation ordinal (0 for the first series ever seen)
    pub ordinal: usize,
    pub(crate) points: IndexMap<GroupKey, DataPoint<A>>,
}

impl<A> Series<A> {
    pub(crate) fn new(key: GroupKey, ordinal: usize, color: Option<String>) -> Self {
        Self {
            key,
            visible: true,
            count: 0,
            color,
            ordinal,
            points: IndexMap::new(),
        }
    }

    /// Display name of the series (bare rendering of its key).
    pub fn name(&self) -> String {
        self.key.to_string()
    }

    /// Look up a data point by group key.
    pub fn point(&self, key: &GroupKey) -> Option<&DataPoint<A>> {
        self.points.get(key)
    }

    /// Iterate data points in insertion order.
    pub fn points(&self) -> impl Iterator<Item = &DataPoint<A>> {
        self.points.values()
    }

    /// Number of data points currently held (including zero-count points
    /// when the hide-empty policy is off).
    pub fn points_len(&self) -> usize {
        self.points.len()
    }
}

// ============================================================================
// Series Store
// ============================================================================

/// Insertion-ordered mapping from series key to series.
#[derive(Debug, Clone)]
pub struct SeriesStore<A> {
    pub(crate) series: IndexMap<GroupKey, Series<A>>,
}

impl<A> SeriesStore<A> {
    pub(crate) fn new() -> Self {
        Self {
            series: IndexMap::new(),
        }
    }

    /// Number of series ever seen.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether no series has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Look up a series by key.
    pub fn get(&self, key: &GroupKey) -> Option<&Series<A>> {
        self.series.get(key)
    }

    /// Iterate series in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Series<A>> {
        self.series.values()
    }

    pub(crate) fn clear(&mut self) {
        self.series.clear();
    }
}

// ============================================================================
// Output Snapshot
// ============================================================================

/// Frozen, caller-facing view of one series.
///
/// Built by the post-processing pipeline after every mutation. Data-point
/// accumulators are cloned out of the store, so a snapshot never observes
/// later mutations.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesSnapshot<A> {
    /// Series key
    pub key: GroupKey,
    /// Display name (bare rendering of the key)
    pub name: String,
    /// Included-record count at snapshot time
    pub count: usize,
    /// Whether the series currently has any included records
    pub visible: bool,
    /// Display color assigned at series creation
    pub color: Option<String>,
    /// Data points, pruned and sorted per the dimension's configuration
    pub data_points: Vec<DataPoint<A>>,
}

impl<A> SeriesSnapshot<A> {
    /// Look up a data point by group key.
    pub fn point(&self, key: &GroupKey) -> Option<&DataPoint<A>> {
        self.data_points.iter().find(|p| &p.key == key)
    }
}
