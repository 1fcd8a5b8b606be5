//! Filter Objects and the Filter Chain
//!
//! A [`DimensionFilter`] is the unit of cross-dimension coupling: an
//! origin-tagged predicate exported by one dimension and applied by the
//! others. The [`FilterChain`] keeps the ordered set of filters currently
//! constraining a dimension; classification requires every predicate to
//! pass, so chain order never affects the result, only short-circuit cost.
//!
//! # Example
//!
//! ```rust
//! use crossdim::DimensionFilter;
//!
//! let f: DimensionFilter<i64> = DimensionFilter::new("amount", |r: &i64| *r > 5);
//! assert!(f.passes(&10));
//! assert!(!f.passes(&3));
//!
//! // A predicate-less filter is trackable but never excludes anything.
//! let cleared: DimensionFilter<i64> = DimensionFilter::empty("amount");
//! assert!(cleared.passes(&3));
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::config::{FilterFactoryFn, KeyFn, PredicateFn};
use crate::key::GroupKey;

/// The set of key values a dimension currently highlights.
///
/// Compared as an unordered set; a selection equal to the current one is a
/// no-op in [`Dimension::select`](crate::Dimension::select).
pub type Selection = HashSet<GroupKey>;

// ============================================================================
// Dimension Filter
// ============================================================================

/// An origin-tagged filter predicate.
///
/// `id` identifies the dimension the filter came from, which makes
/// add/replace/remove idempotent per origin. A `None` predicate means "no
/// active constraint from this origin": the filter is still visible to
/// `has_filter` but excludes nothing.
pub struct DimensionFilter<R> {
    /// Identity of the origin dimension
    pub id: String,
    /// Boolean test over a record, or `None` for no constraint
    pub predicate: Option<PredicateFn<R>>,
}

impl<R> DimensionFilter<R> {
    /// Create a filter with an active predicate.
    pub fn new(id: impl Into<String>, predicate: impl Fn(&R) -> bool + Send + Sync + 'static) -> Self {
        Self {
            id: id.into(),
            predicate: Some(Arc::new(predicate)),
        }
    }

    /// Create a filter from an already-shared predicate.
    pub fn from_predicate(id: impl Into<String>, predicate: PredicateFn<R>) -> Self {
        Self {
            id: id.into(),
            predicate: Some(predicate),
        }
    }

    /// Create a constraint-less filter for the given origin.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            predicate: None,
        }
    }

    /// Whether this filter carries an active predicate.
    pub fn is_active(&self) -> bool {
        self.predicate.is_some()
    }

    /// Test a record. A missing predicate passes everything.
    pub fn passes(&self, record: &R) -> bool {
        match &self.predicate {
            Some(p) => p(record),
            None => true,
        }
    }
}

impl<R> Clone for DimensionFilter<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            predicate: self.predicate.clone(),
        }
    }
}

impl<R> fmt::Debug for DimensionFilter<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DimensionFilter")
            .field("id", &self.id)
            .field("active", &self.predicate.is_some())
            .finish()
    }
}

// ============================================================================
// Filter Chain
// ============================================================================

/// Ordered list of active filters constraining a dimension.
pub struct FilterChain<R> {
    filters: Vec<DimensionFilter<R>>,
}

impl<R> FilterChain<R> {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Number of filters in the chain (active or not).
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Whether a filter with the given origin id is present.
    pub fn has(&self, id: &str) -> bool {
        self.filters.iter().any(|f| f.id == id)
    }

    /// Append a filter to the chain.
    pub fn push(&mut self, filter: DimensionFilter<R>) {
        self.filters.push(filter);
    }

    /// Remove the filter with the given origin id, if present.
    pub fn remove(&mut self, id: &str) -> Option<DimensionFilter<R>> {
        let pos = self.filters.iter().position(|f| f.id == id)?;
        Some(self.filters.remove(pos))
    }

    /// Drop every filter.
    pub fn clear(&mut self) {
        self.filters.clear();
    }

    /// Classify a record: true iff every filter passes.
    pub fn accepts(&self, record: &R) -> bool {
        self.filters.iter().all(|f| f.passes(record))
    }

    /// Iterate the chain in application order.
    pub fn iter(&self) -> impl Iterator<Item = &DimensionFilter<R>> {
        self.filters.iter()
    }
}

impl<R> Default for FilterChain<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for FilterChain<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.filters.iter()).finish()
    }
}

// ============================================================================
// Default Filter Factory
// ============================================================================

/// The default filter factory: "any selection value equals the predicate
/// value".
///
/// Given the selection set and the dimension's `filter_predicate` extractor,
/// builds a predicate that includes a record iff the extracted key is a
/// member of the selection.
pub fn membership_factory<R: 'static>() -> FilterFactoryFn<R> {
    Arc::new(|selection: &Selection, key_fn: &KeyFn<R>| {
        let selection = selection.clone();
        let key_fn = Arc::clone(key_fn);
        Arc::new(move |record: &R| selection.contains(&key_fn(record))) as PredicateFn<R>
    })
}
