//! The Dimension Engine
//!
//! A [`Dimension`] is one independently filterable grouping/aggregation view
//! over a record stream. Records are grouped into series, each series is
//! aggregated into data points by user-supplied reducers, and the aggregate
//! state is maintained incrementally as filters come and go.
//!
//! # Architecture
//!
//! ```text
//! add_one / add_many
//!       │
//!       ▼
//! ┌─────────────────────┐   included    ┌──────────────────────┐
//! │   Filter Chain      ├──────────────▶│ Aggregation Engine   │
//! │   (classify)        │               │ process_addition /   │
//! └──────────┬──────────┘               │ process_removal      │
//!            │ excluded                 └──────────┬───────────┘
//!            ▼                                     ▼
//!   excluded partition                  ┌──────────────────────┐
//!   (rescanned on filter               │ Series / DataPoint   │
//!    removal only)                      │ Store                │
//!                                       └──────────┬───────────┘
//!                                                  ▼
//!                                       ┌──────────────────────┐
//!                                       │ Post-Processing      │
//!                                       │ sort → snapshot →    │
//!                                       │ hook → "change"      │
//!                                       └──────────────────────┘
//! ```
//!
//! Selection changes flow the other way: [`Dimension::select`] rebuilds the
//! dimension's exported [`DimensionFilter`] and emits a `selection`
//! notification; a host wires that filter into sibling dimensions via
//! [`Dimension::replace_filter`], re-entering this same pipeline there.
//!
//! # Incremental Strategy
//!
//! The key algorithmic property: a filter change never rescans the full raw
//! data. Adding a filter rescans only the currently *included* partition
//! (records already excluded stay excluded); removing one rescans only the
//! *excluded* partition. This bounds per-change cost to the affected
//! partition, at the price of requiring `reduce_remove` to be a true inverse
//! of `reduce_add`. When that inverse is unavailable, the
//! `reprocess_all_on_filter` policy falls back to a full replay.

mod store;

pub use store::{DataPoint, Series, SeriesSnapshot, SeriesStore};

use serde::Serialize;
use tracing::{debug, trace};

use crate::config::{DimensionConfig, Hooks, PredicateFn};
use crate::error::Result;
use crate::events::{EventHub, SubscriptionId};
use crate::filter::{DimensionFilter, FilterChain, Selection};
use crate::key::GroupKey;

// ============================================================================
// Stats
// ============================================================================

/// Point-in-time counters for one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DimensionStats {
    /// Raw records retained (pre-split)
    pub raw_records: usize,
    /// Derived records after split
    pub derived_records: usize,
    /// Currently included derived records
    pub included: usize,
    /// Currently excluded derived records
    pub excluded: usize,
    /// Series ever seen
    pub series: usize,
    /// Series with at least one included record
    pub visible_series: usize,
    /// Filters currently in the chain
    pub active_filters: usize,
}

// ============================================================================
// Dimension
// ============================================================================

/// One independently filterable grouping/aggregation view over a record
/// stream.
///
/// `R` is the record type, `A` the per-data-point accumulator. Both must be
/// `Clone`: raw records are retained for replay, and snapshots clone
/// accumulators out of the live store.
///
/// All operations are synchronous and run to completion; see the crate docs
/// for the single-threaded, re-entrant execution model.
pub struct Dimension<R, A> {
    id: String,
    hooks: Hooks<R, A>,
    hide_empty: bool,
    reprocess_all: bool,

    /// Raw records as passed in, retained for `refresh`.
    raw: Vec<R>,
    /// Derived records (post-split) backing the included/excluded partition.
    records: Vec<R>,
    included: Vec<usize>,
    excluded: Vec<usize>,

    store: SeriesStore<A>,
    chain: FilterChain<R>,
    selection: Selection,
    exported: DimensionFilter<R>,
    data: Vec<SeriesSnapshot<A>>,
    events: EventHub<R>,
}

impl<R: Clone + 'static, A: Clone> Dimension<R, A> {
    /// Build a dimension from its configuration.
    ///
    /// Validates required hooks synchronously and ingests the configured
    /// initial batch (one post-processing pass, no notifications — nothing
    /// can have subscribed yet).
    pub fn new(config: DimensionConfig<R, A>) -> Result<Self> {
        let parts = config.into_parts()?;
        let exported = build_filter(&parts.id, &parts.selection, &parts.hooks);

        let mut dimension = Self {
            id: parts.id,
            hooks: parts.hooks,
            hide_empty: parts.hide_empty_data_points,
            reprocess_all: parts.reprocess_all_on_filter,
            raw: Vec::new(),
            records: Vec::new(),
            included: Vec::new(),
            excluded: Vec::new(),
            store: SeriesStore::new(),
            chain: FilterChain::new(),
            selection: parts.selection,
            exported,
            data: Vec::new(),
            events: EventHub::new(),
        };

        for record in parts.data {
            dimension.ingest(record);
        }
        dimension.post_process();
        Ok(dimension)
    }

    /// The dimension's identity, used to tag its exported filter.
    pub fn id(&self) -> &str {
        &self.id
    }

    // ------------------------------------------------------------------
    // Ingestion
    // ------------------------------------------------------------------

    /// Add a single record and run the post-processing pipeline.
    pub fn add_one(&mut self, record: R) {
        self.ingest(record);
        self.post_process();
        self.events.emit_change();
    }

    /// Add a batch of records; post-processing and the `change` notification
    /// run once for the whole batch.
    pub fn add_many(&mut self, records: impl IntoIterator<Item = R>) {
        let before = self.records.len();
        for record in records {
            self.ingest(record);
        }
        trace!(
            "dimension {}: ingested batch of {} derived records",
            self.id,
            self.records.len() - before
        );
        self.post_process();
        self.events.emit_change();
    }

    /// Discard all derived state and replay every raw record under the
    /// current filter chain.
    ///
    /// The fallback strategy when incremental removal is unavailable, and
    /// the documented remedy after a user hook has panicked mid-operation.
    pub fn refresh(&mut self) {
        self.rebuild();
        self.post_process();
        self.events.emit_change();
    }

    fn ingest(&mut self, record: R) {
        self.raw.push(record.clone());
        self.ingest_derived(record);
    }

    /// Split, classify, and route one record. Derived records are processed
    /// independently, in the split function's returned order.
    fn ingest_derived(&mut self, record: R) {
        let derived = match &self.hooks.split {
            Some(split) => split(&record),
            None => vec![record],
        };
        for rec in derived {
            let idx = self.records.len();
            if self.chain.accepts(&rec) {
                self.process_addition(&rec);
                self.included.push(idx);
            } else {
                self.excluded.push(idx);
            }
            self.records.push(rec);
        }
    }

    fn rebuild(&mut self) {
        debug!(
            "dimension {}: full replay of {} raw records under {} filters",
            self.id,
            self.raw.len(),
            self.chain.len()
        );
        self.store.clear();
        self.records.clear();
        self.included.clear();
        self.excluded.clear();
        let raw = std::mem::take(&mut self.raw);
        for record in raw.iter().cloned() {
            self.ingest_derived(record);
        }
        self.raw = raw;
    }

    // ------------------------------------------------------------------
    // Aggregation engine
    // ------------------------------------------------------------------

    fn process_addition(&mut self, record: &R) {
        let hooks = &self.hooks;
        let series_key = (hooks.group_series)(record);
        let data_key = (hooks.group_data)(record);

        let ordinal = self.store.series.len();
        let series = self
            .store
            .series
            .entry(series_key.clone())
            .or_insert_with(|| {
                let color = hooks.series_color.as_ref().map(|c| c(&series_key, ordinal));
                Series::new(series_key.clone(), ordinal, color)
            });

        series.count += 1;
        series.visible = true;

        let point_ordinal = series.points.len();
        let point = series.points.entry(data_key.clone()).or_insert_with(|| {
            let color = hooks.data_color.as_ref().map(|c| c(&data_key, point_ordinal));
            DataPoint {
                key: data_key.clone(),
                count: 0,
                color,
                value: (hooks.reduce_init)(record),
            }
        });

        // Count first: reduce_add always observes a positive count.
        point.count += 1;
        (hooks.reduce_add)(&mut point.value, record);
    }

    fn process_removal(&mut self, record: &R) {
        let hooks = &self.hooks;
        let series_key = (hooks.group_series)(record);
        let data_key = (hooks.group_data)(record);

        // Removal is only ever invoked for a record previously counted as
        // included, so both lookups succeed by invariant.
        let Some(series) = self.store.series.get_mut(&series_key) else {
            return;
        };
        series.count = series.count.saturating_sub(1);

        let mut delete = false;
        if let Some(point) = series.points.get_mut(&data_key) {
            point.count = point.count.saturating_sub(1);
            if point.count == 0 && self.hide_empty {
                // The aggregate is about to be discarded; skip reduce_remove.
                delete = true;
            } else if let Some(reduce_remove) = &hooks.reduce_remove {
                reduce_remove(&mut point.value, record);
            }
        }
        if delete {
            series.points.shift_remove(&data_key);
        }

        if series.count == 0 {
            series.visible = false;
        }
    }

    // ------------------------------------------------------------------
    // Filter chain manager
    // ------------------------------------------------------------------

    /// Whether a filter with the given origin id is in the chain, active or
    /// not.
    pub fn has_filter(&self, filter: &DimensionFilter<R>) -> bool {
        self.chain.has(&filter.id)
    }

    /// Append a filter to the chain and reclassify.
    ///
    /// Under the incremental strategy only the currently included partition
    /// is rescanned, and only against the new predicate — every other filter
    /// already passed those records.
    pub fn add_filter(&mut self, filter: DimensionFilter<R>) {
        debug!("dimension {}: adding filter '{}'", self.id, filter.id);
        let predicate = filter.predicate.clone();
        self.chain.push(filter);
        if self.reprocess_all {
            self.rebuild();
        } else if let Some(predicate) = predicate {
            self.exclude_now_failing(&predicate);
        }
        self.post_process();
        self.events.emit_change();
    }

    /// Remove the filter with the matching origin id and reclassify.
    ///
    /// A filter id never added is a total no-op: no state mutation, no
    /// notification. Under the incremental strategy only the excluded
    /// partition is rescanned.
    pub fn remove_filter(&mut self, filter: &DimensionFilter<R>) {
        if self.chain.remove(&filter.id).is_none() {
            trace!(
                "dimension {}: remove_filter for unknown id '{}', ignoring",
                self.id,
                filter.id
            );
            return;
        }
        debug!("dimension {}: removed filter '{}'", self.id, filter.id);
        if self.reprocess_all {
            self.rebuild();
        } else {
            self.restore_now_passing();
        }
        self.post_process();
        self.events.emit_change();
    }

    /// Replace (or insert) the filter with the matching origin id as one
    /// logical operation: a single reclassification pass pair and a single
    /// post-processing run.
    ///
    /// A predicate-less filter behaves exactly as [`remove_filter`](Self::remove_filter).
    pub fn replace_filter(&mut self, filter: DimensionFilter<R>) {
        if filter.predicate.is_none() {
            self.remove_filter(&filter);
            return;
        }
        debug!("dimension {}: replacing filter '{}'", self.id, filter.id);
        let predicate = filter.predicate.clone();
        self.chain.remove(&filter.id);
        self.chain.push(filter);
        if self.reprocess_all {
            self.rebuild();
        } else {
            // Included records passed every other filter already, so the new
            // predicate alone decides their fate; excluded records must pass
            // the whole chain to come back.
            if let Some(predicate) = predicate {
                self.exclude_now_failing(&predicate);
            }
            self.restore_now_passing();
        }
        self.post_process();
        self.events.emit_change();
    }

    /// Empty the chain, restoring every excluded record. A no-op when the
    /// chain is already empty.
    pub fn clear_filters(&mut self) {
        if self.chain.is_empty() {
            return;
        }
        debug!("dimension {}: clearing {} filters", self.id, self.chain.len());
        self.chain.clear();
        if self.reprocess_all {
            self.rebuild();
        } else {
            self.restore_now_passing();
        }
        self.post_process();
        self.events.emit_change();
    }

    /// Move included records failing `predicate` to the excluded partition.
    /// Cost is proportional to the included partition.
    fn exclude_now_failing(&mut self, predicate: &PredicateFn<R>) {
        let records = std::mem::take(&mut self.records);
        let included = std::mem::take(&mut self.included);
        let mut still_included = Vec::with_capacity(included.len());
        for idx in included {
            let record = &records[idx];
            if predicate(record) {
                still_included.push(idx);
            } else {
                self.process_removal(record);
                self.excluded.push(idx);
            }
        }
        self.included = still_included;
        self.records = records;
    }

    /// Move excluded records now passing the whole chain back to the
    /// included partition. Cost is proportional to the excluded partition.
    fn restore_now_passing(&mut self) {
        let records = std::mem::take(&mut self.records);
        let excluded = std::mem::take(&mut self.excluded);
        let mut still_excluded = Vec::new();
        for idx in excluded {
            let record = &records[idx];
            if self.chain.accepts(record) {
                self.process_addition(record);
                self.included.push(idx);
            } else {
                still_excluded.push(idx);
            }
        }
        self.excluded = still_excluded;
        self.records = records;
    }

    // ------------------------------------------------------------------
    // Selection / filter export
    // ------------------------------------------------------------------

    /// Replace the selection and re-export this dimension's filter.
    ///
    /// A selection equal (as an unordered set) to the current one is a
    /// no-op: no filter recomputation, no notification. Otherwise the
    /// exported filter is rebuilt — predicate-less when the selection is
    /// empty — and the `selection` notification is emitted for propagation
    /// to sibling dimensions. The dimension never applies its own exported
    /// filter to itself.
    pub fn select<K: Into<GroupKey>>(&mut self, selection: impl IntoIterator<Item = K>) {
        let selection: Selection = selection.into_iter().map(Into::into).collect();
        if selection == self.selection {
            trace!("dimension {}: selection unchanged, skipping", self.id);
            return;
        }
        debug!(
            "dimension {}: selection changed to {} values",
            self.id,
            selection.len()
        );
        self.selection = selection;
        self.exported = build_filter(&self.id, &self.selection, &self.hooks);
        let filter = self.exported.clone();
        self.events.emit_selection(&filter);
    }

    /// Equivalent to selecting the empty set.
    pub fn clear_selection(&mut self) {
        self.select(std::iter::empty::<GroupKey>());
    }

    /// The current selection set.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The filter this dimension currently exports. Predicate-less when the
    /// selection is empty.
    pub fn filter(&self) -> &DimensionFilter<R> {
        &self.exported
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    /// The frozen output snapshot, one entry per series ever seen, in series
    /// creation order.
    pub fn data(&self) -> &[SeriesSnapshot<A>] {
        &self.data
    }

    /// Find a series in the output snapshot by key.
    pub fn find_series(&self, key: &GroupKey) -> Option<&SeriesSnapshot<A>> {
        self.data.iter().find(|s| &s.key == key)
    }

    /// Find a data point in the output snapshot by series key and group key.
    pub fn find_data_point(&self, series: &GroupKey, point: &GroupKey) -> Option<&DataPoint<A>> {
        self.find_series(series).and_then(|s| s.point(point))
    }

    /// The live aggregate store (series remembered forever, visibility
    /// flags, insertion-ordered points).
    pub fn store(&self) -> &SeriesStore<A> {
        &self.store
    }

    /// Point-in-time counters.
    pub fn stats(&self) -> DimensionStats {
        DimensionStats {
            raw_records: self.raw.len(),
            derived_records: self.records.len(),
            included: self.included.len(),
            excluded: self.excluded.len(),
            series: self.store.len(),
            visible_series: self.store.iter().filter(|s| s.visible).count(),
            active_filters: self.chain.len(),
        }
    }

    /// Rebuild the output snapshot: collect, sort, freeze, run the
    /// post-process hook.
    ///
    /// Zero-count data points can only be present in the store when the
    /// hide-empty policy is off (deletion at removal time is the single
    /// source of truth for that policy), so no pruning pass is needed here.
    fn post_process(&mut self) {
        let hooks = &self.hooks;
        let mut data: Vec<SeriesSnapshot<A>> = self
            .store
            .series
            .values()
            .map(|series| {
                let mut points: Vec<DataPoint<A>> = series.points.values().cloned().collect();
                if let Some(sort) = &hooks.sort {
                    points.sort_by(|a, b| sort(a, b));
                }
                SeriesSnapshot {
                    key: series.key.clone(),
                    name: series.name(),
                    count: series.count,
                    visible: series.visible,
                    color: series.color.clone(),
                    data_points: points,
                }
            })
            .collect();
        if let Some(post) = &hooks.post_process {
            post(&mut data);
        }
        self.data = data;
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    /// Subscribe to `change` notifications (no payload; re-read via
    /// [`data`](Self::data)).
    pub fn on_change(&mut self, handler: impl FnMut() + 'static) -> SubscriptionId {
        self.events.on_change(handler)
    }

    /// Subscribe to `selection` notifications; the payload is this
    /// dimension's freshly exported filter.
    pub fn on_selection(
        &mut self,
        handler: impl FnMut(&DimensionFilter<R>) + 'static,
    ) -> SubscriptionId {
        self.events.on_selection(handler)
    }

    /// Drop a subscription. Returns false if the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }
}

/// Build the exported filter for a selection: predicate-less when empty,
/// otherwise produced by the configured filter factory.
fn build_filter<R, A>(id: &str, selection: &Selection, hooks: &Hooks<R, A>) -> DimensionFilter<R> {
    if selection.is_empty() {
        DimensionFilter::empty(id)
    } else {
        let predicate = (hooks.filter_factory)(selection, &hooks.filter_predicate);
        DimensionFilter::from_predicate(id, predicate)
    }
}
