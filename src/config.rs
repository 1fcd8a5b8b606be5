//! Dimension Configuration
//!
//! All user-supplied behavior — grouping, reduction, splitting, filtering,
//! coloring, sorting, post-processing — enters the engine through typed hook
//! slots on [`DimensionConfig`]. Required hooks are validated eagerly when
//! the dimension is constructed; a missing reducer is a fatal configuration
//! error, never a per-record one.
//!
//! # Example
//!
//! ```rust
//! use crossdim::{Dimension, DimensionConfig, GroupKey};
//!
//! #[derive(Clone)]
//! struct Sale {
//!     region: &'static str,
//!     day: i64,
//!     amount: f64,
//! }
//!
//! let config = DimensionConfig::new("sales-by-region")
//!     .group_series(|s: &Sale| GroupKey::from(s.region))
//!     .group_data(|s: &Sale| GroupKey::from(s.day))
//!     .reduce_init(|_s: &Sale| 0.0f64)
//!     .reduce_add(|sum, s| *sum += s.amount)
//!     .reduce_remove(|sum, s| *sum -= s.amount);
//!
//! let dimension = Dimension::new(config).unwrap();
//! assert_eq!(dimension.id(), "sales-by-region");
//! ```

use std::cmp::Ordering;
use std::sync::Arc;

use crate::dimension::{DataPoint, SeriesSnapshot};
use crate::error::{ConfigError, Result};
use crate::filter::{membership_factory, Selection};
use crate::key::GroupKey;

// ============================================================================
// Hook Signatures
// ============================================================================

/// Extracts a grouping key from a record.
pub type KeyFn<R> = Arc<dyn Fn(&R) -> GroupKey + Send + Sync>;

/// Produces the initial accumulator for a new data point.
pub type ReduceInitFn<R, A> = Arc<dyn Fn(&R) -> A + Send + Sync>;

/// Folds a record into (or out of) an accumulator.
pub type ReduceFn<R, A> = Arc<dyn Fn(&mut A, &R) + Send + Sync>;

/// Derives zero or more records from one input record.
pub type SplitFn<R> = Arc<dyn Fn(&R) -> Vec<R> + Send + Sync>;

/// Boolean record test used for filtering.
pub type PredicateFn<R> = Arc<dyn Fn(&R) -> bool + Send + Sync>;

/// Builds a filter predicate from a selection set and a key extractor.
pub type FilterFactoryFn<R> = Arc<dyn Fn(&Selection, &KeyFn<R>) -> PredicateFn<R> + Send + Sync>;

/// Assigns a display color given a key and its creation ordinal.
pub type ColorFn = Arc<dyn Fn(&GroupKey, usize) -> String + Send + Sync>;

/// Comparator over data points for output ordering within a series.
pub type SortFn<A> = Arc<dyn Fn(&DataPoint<A>, &DataPoint<A>) -> Ordering + Send + Sync>;

/// Final adjustment hook over the output snapshot.
pub type PostProcessFn<A> = Arc<dyn Fn(&mut Vec<SeriesSnapshot<A>>) + Send + Sync>;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for a [`Dimension`](crate::Dimension).
///
/// `R` is the record type (opaque to the engine), `A` the accumulator type
/// held by each data point. Required hooks: `group_series`, `group_data`,
/// `reduce_init`, `reduce_add`, and `reduce_remove` unless
/// `reprocess_all_on_filter` is enabled.
pub struct DimensionConfig<R, A> {
    pub(crate) id: String,
    pub(crate) group_series: Option<KeyFn<R>>,
    pub(crate) group_data: Option<KeyFn<R>>,
    pub(crate) reduce_init: Option<ReduceInitFn<R, A>>,
    pub(crate) reduce_add: Option<ReduceFn<R, A>>,
    pub(crate) reduce_remove: Option<ReduceFn<R, A>>,
    pub(crate) split: Option<SplitFn<R>>,
    pub(crate) filter_predicate: Option<KeyFn<R>>,
    pub(crate) filter_factory: Option<FilterFactoryFn<R>>,
    pub(crate) series_color: Option<ColorFn>,
    pub(crate) data_color: Option<ColorFn>,
    pub(crate) sort: Option<SortFn<A>>,
    pub(crate) post_process: Option<PostProcessFn<A>>,
    pub(crate) selection: Selection,
    pub(crate) data: Vec<R>,
    pub(crate) hide_empty_data_points: bool,
    pub(crate) reprocess_all_on_filter: bool,
}

impl<R: 'static, A> DimensionConfig<R, A> {
    /// Start a configuration for the dimension with the given identity.
    ///
    /// The id tags the filter this dimension exports, making cross-dimension
    /// add/replace/remove idempotent per origin.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            group_series: None,
            group_data: None,
            reduce_init: None,
            reduce_add: None,
            reduce_remove: None,
            split: None,
            filter_predicate: None,
            filter_factory: None,
            series_color: None,
            data_color: None,
            sort: None,
            post_process: None,
            selection: Selection::new(),
            data: Vec::new(),
            hide_empty_data_points: true,
            reprocess_all_on_filter: false,
        }
    }

    /// Record → series key (required).
    pub fn group_series(mut self, f: impl Fn(&R) -> GroupKey + Send + Sync + 'static) -> Self {
        self.group_series = Some(Arc::new(f));
        self
    }

    /// Record → data-point key within its series (required).
    pub fn group_data(mut self, f: impl Fn(&R) -> GroupKey + Send + Sync + 'static) -> Self {
        self.group_data = Some(Arc::new(f));
        self
    }

    /// Record → initial accumulator for a new data point (required).
    pub fn reduce_init(mut self, f: impl Fn(&R) -> A + Send + Sync + 'static) -> Self {
        self.reduce_init = Some(Arc::new(f));
        self
    }

    /// Fold an included record into an accumulator (required).
    pub fn reduce_add(mut self, f: impl Fn(&mut A, &R) + Send + Sync + 'static) -> Self {
        self.reduce_add = Some(Arc::new(f));
        self
    }

    /// Undo a record's contribution to an accumulator.
    ///
    /// Required unless [`reprocess_all_on_filter`](Self::reprocess_all_on_filter)
    /// is enabled. For the incremental filter strategy to be exact, this must
    /// be a true inverse of `reduce_add`.
    pub fn reduce_remove(mut self, f: impl Fn(&mut A, &R) + Send + Sync + 'static) -> Self {
        self.reduce_remove = Some(Arc::new(f));
        self
    }

    /// Derive zero or more records from each input record before
    /// classification. Each derived record is classified and aggregated
    /// independently, in the returned order.
    pub fn split(mut self, f: impl Fn(&R) -> Vec<R> + Send + Sync + 'static) -> Self {
        self.split = Some(Arc::new(f));
        self
    }

    /// Record → value compared against the selection when exporting this
    /// dimension's filter. Defaults to the `group_series` hook.
    pub fn filter_predicate(mut self, f: impl Fn(&R) -> GroupKey + Send + Sync + 'static) -> Self {
        self.filter_predicate = Some(Arc::new(f));
        self
    }

    /// Custom predicate constructor for the exported filter. Defaults to
    /// [`membership_factory`]: "any selection value equals the predicate
    /// value".
    pub fn filter_factory(
        mut self,
        f: impl Fn(&Selection, &KeyFn<R>) -> PredicateFn<R> + Send + Sync + 'static,
    ) -> Self {
        self.filter_factory = Some(Arc::new(f));
        self
    }

    /// Assign a display color to each series, once, at creation. The hook
    /// receives the series key and its creation ordinal.
    pub fn series_color(mut self, f: impl Fn(&GroupKey, usize) -> String + Send + Sync + 'static) -> Self {
        self.series_color = Some(Arc::new(f));
        self
    }

    /// Assign a display color to each data point, once, at creation.
    pub fn data_color(mut self, f: impl Fn(&GroupKey, usize) -> String + Send + Sync + 'static) -> Self {
        self.data_color = Some(Arc::new(f));
        self
    }

    /// Stable sort for each series' data points in the output snapshot.
    pub fn sort(
        mut self,
        f: impl Fn(&DataPoint<A>, &DataPoint<A>) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.sort = Some(Arc::new(f));
        self
    }

    /// Convenience over [`sort`](Self::sort): order data points by an
    /// extracted sort key.
    pub fn sort_key<K: Ord>(self, f: impl Fn(&DataPoint<A>) -> K + Send + Sync + 'static) -> Self {
        self.sort(move |a, b| f(a).cmp(&f(b)))
    }

    /// Final hook over the output snapshot, e.g. for computing per-series
    /// summaries.
    pub fn post_process(
        mut self,
        f: impl Fn(&mut Vec<SeriesSnapshot<A>>) + Send + Sync + 'static,
    ) -> Self {
        self.post_process = Some(Arc::new(f));
        self
    }

    /// Initial selection set.
    pub fn selection<K: Into<GroupKey>>(mut self, selection: impl IntoIterator<Item = K>) -> Self {
        self.selection = selection.into_iter().map(Into::into).collect();
        self
    }

    /// Initial record batch, ingested at construction with a single
    /// post-processing pass.
    pub fn data(mut self, records: impl IntoIterator<Item = R>) -> Self {
        self.data = records.into_iter().collect();
        self
    }

    /// Drop zero-count data points from the output (default `true`).
    pub fn hide_empty_data_points(mut self, on: bool) -> Self {
        self.hide_empty_data_points = on;
        self
    }

    /// On any filter change, discard and replay all raw records instead of
    /// incrementally reclassifying the affected partition (default `false`).
    /// The only strategy available when no `reduce_remove` is supplied.
    pub fn reprocess_all_on_filter(mut self, on: bool) -> Self {
        self.reprocess_all_on_filter = on;
        self
    }

    /// Validate required hooks and resolve defaults.
    pub(crate) fn into_parts(self) -> Result<Parts<R, A>> {
        let group_series = self
            .group_series
            .ok_or(ConfigError::MissingHook("group_series"))?;
        let group_data = self
            .group_data
            .ok_or(ConfigError::MissingHook("group_data"))?;
        let reduce_init = self
            .reduce_init
            .ok_or(ConfigError::MissingHook("reduce_init"))?;
        let reduce_add = self
            .reduce_add
            .ok_or(ConfigError::MissingHook("reduce_add"))?;
        if self.reduce_remove.is_none() && !self.reprocess_all_on_filter {
            return Err(ConfigError::MissingReduceRemove.into());
        }

        let filter_predicate = self
            .filter_predicate
            .unwrap_or_else(|| Arc::clone(&group_series));
        let filter_factory = self.filter_factory.unwrap_or_else(membership_factory);

        Ok(Parts {
            id: self.id,
            hooks: Hooks {
                group_series,
                group_data,
                reduce_init,
                reduce_add,
                reduce_remove: self.reduce_remove,
                split: self.split,
                filter_predicate,
                filter_factory,
                series_color: self.series_color,
                data_color: self.data_color,
                sort: self.sort,
                post_process: self.post_process,
            },
            selection: self.selection,
            data: self.data,
            hide_empty_data_points: self.hide_empty_data_points,
            reprocess_all_on_filter: self.reprocess_all_on_filter,
        })
    }
}

/// Resolved hooks with defaults applied.
pub(crate) struct Hooks<R, A> {
    pub(crate) group_series: KeyFn<R>,
    pub(crate) group_data: KeyFn<R>,
    pub(crate) reduce_init: ReduceInitFn<R, A>,
    pub(crate) reduce_add: ReduceFn<R, A>,
    pub(crate) reduce_remove: Option<ReduceFn<R, A>>,
    pub(crate) split: Option<SplitFn<R>>,
    pub(crate) filter_predicate: KeyFn<R>,
    pub(crate) filter_factory: FilterFactoryFn<R>,
    pub(crate) series_color: Option<ColorFn>,
    pub(crate) data_color: Option<ColorFn>,
    pub(crate) sort: Option<SortFn<A>>,
    pub(crate) post_process: Option<PostProcessFn<A>>,
}

/// Validated configuration, ready to build a dimension from.
pub(crate) struct Parts<R, A> {
    pub(crate) id: String,
    pub(crate) hooks: Hooks<R, A>,
    pub(crate) selection: Selection,
    pub(crate) data: Vec<R>,
    pub(crate) hide_empty_data_points: bool,
    pub(crate) reprocess_all_on_filter: bool,
}
