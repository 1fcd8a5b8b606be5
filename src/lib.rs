//! crossdim - In-process crossfilter-style dimensional aggregation
//!
//! This library incrementally groups a stream of records into named series,
//! aggregates each series into discrete data points via user-supplied
//! reducers, and supports dynamic, composable filtering across independent
//! dimensions:
//! - Incremental aggregate maintenance under filter add/remove/replace,
//!   with at most one pass over the affected record partition per operation
//! - Two reprocessing strategies: incremental reclassification (requires an
//!   inverse `reduce_remove`) or full replay
//! - A selection/filter contract for cross-dimension filtering: each
//!   dimension's active selection becomes a predicate every other dimension
//!   can apply
//! - Synchronous `change` / `selection` notifications
//!
//! It is a lightweight analytical engine, not a persistent store or query
//! planner.
//!
//! # Quick Start
//!
//! ```rust
//! use crossdim::{Dimension, DimensionConfig, GroupKey};
//!
//! #[derive(Clone)]
//! struct Row {
//!     g: &'static str,
//!     k: i64,
//!     v: f64,
//! }
//!
//! let mut dim = Dimension::new(
//!     DimensionConfig::new("by-group")
//!         .group_series(|r: &Row| GroupKey::from(r.g))
//!         .group_data(|r: &Row| GroupKey::from(r.k))
//!         .reduce_init(|_r: &Row| 0.0f64)
//!         .reduce_add(|sum, r| *sum += r.v)
//!         .reduce_remove(|sum, r| *sum -= r.v),
//! )
//! .unwrap();
//!
//! dim.add_many([
//!     Row { g: "A", k: 1, v: 10.0 },
//!     Row { g: "A", k: 1, v: 20.0 },
//!     Row { g: "B", k: 1, v: 5.0 },
//! ]);
//!
//! let a = dim.find_series(&GroupKey::from("A")).unwrap();
//! assert_eq!(a.count, 2);
//! assert_eq!(a.data_points[0].value, 30.0);
//! ```
//!
//! # Execution Model
//!
//! Single-threaded, synchronous, cooperative: every public operation runs to
//! completion before returning. Cross-dimension filter propagation is a
//! synchronous re-entrant call — dimension A's `selection` handler applies
//! the exported filter to dimension B, whose whole pipeline runs and emits
//! its own `change` before control returns to A's caller. A host using
//! multiple threads must serialize access to each dimension.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dimension;
pub mod error;
pub mod events;
pub mod filter;
pub mod key;

// Re-export main types
pub use config::DimensionConfig;
pub use dimension::{DataPoint, Dimension, DimensionStats, Series, SeriesSnapshot, SeriesStore};
pub use error::{ConfigError, Error, Result};
pub use events::SubscriptionId;
pub use filter::{membership_factory, DimensionFilter, FilterChain, Selection};
pub use key::{FloatKey, GroupKey};
