//! Error types for the engine
//!
//! Construction-time validation is the only fallible path. Every
//! engine-internal operation (series/point lookup, count bookkeeping) is
//! defined over invariants that make failure structurally impossible, and
//! errors raised by user-supplied hooks propagate to the caller unmodified.

use thiserror::Error;

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum Error {
    /// Dimension configuration error
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Configuration validation errors
///
/// Raised synchronously by [`Dimension::new`](crate::Dimension::new) when a
/// required hook is missing. Never raised per-record.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required hook was not supplied
    #[error("missing required hook `{0}`")]
    MissingHook(&'static str),

    /// `reduce_remove` is mandatory for the incremental filter strategy
    #[error("`reduce_remove` is required unless `reprocess_all_on_filter` is enabled")]
    MissingReduceRemove,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
