//! Group Key Canonicalization
//!
//! Grouping extractors may return heterogeneous values (strings, integers,
//! floats, booleans). Series and data-point maps are keyed by [`GroupKey`],
//! an explicit tagged representation, so two values of different types that
//! happen to render to the same text (`"1"` vs `1`) can never collide.
//!
//! # Example
//!
//! ```rust
//! use crossdim::GroupKey;
//!
//! let a = GroupKey::from("1");
//! let b = GroupKey::from(1i64);
//! assert_ne!(a, b);
//! assert_eq!(a.to_string(), b.to_string()); // same display, distinct keys
//! assert_ne!(a.canonical(), b.canonical());
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A float usable as a map key.
///
/// Equality and hashing go through the bit pattern, ordering through
/// `f64::total_cmp`. `-0.0` is normalized to `0.0` at construction so the
/// two zeros land in the same group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FloatKey(f64);

impl FloatKey {
    /// Wrap a float, normalizing negative zero.
    pub fn new(value: f64) -> Self {
        if value == 0.0 {
            FloatKey(0.0)
        } else {
            FloatKey(value)
        }
    }

    /// The wrapped value.
    pub fn get(&self) -> f64 {
        self.0
    }
}

impl PartialEq for FloatKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatKey {}

impl Hash for FloatKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for FloatKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Canonical, collision-free grouping key.
///
/// Produced by the `group_series` / `group_data` / `filter_predicate` hooks.
/// Keys of different variants are always distinct, regardless of how they
/// render as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GroupKey {
    /// String key
    Str(String),
    /// Signed integer key
    Int(i64),
    /// Float key (bit-pattern equality, total ordering)
    Float(FloatKey),
    /// Boolean key
    Bool(bool),
}

impl GroupKey {
    /// Type-tagged string form, unique per key.
    ///
    /// Unlike [`Display`](fmt::Display), which renders the bare value, this
    /// carries a variant prefix (`s:`, `i:`, `f:`, `b:`) so no two distinct
    /// keys share a canonical form. Used in diagnostics and logs.
    pub fn canonical(&self) -> String {
        match self {
            GroupKey::Str(s) => format!("s:{s}"),
            GroupKey::Int(i) => format!("i:{i}"),
            GroupKey::Float(f) => format!("f:{}", f.get()),
            GroupKey::Bool(b) => format!("b:{b}"),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Str(s) => write!(f, "{s}"),
            GroupKey::Int(i) => write!(f, "{i}"),
            GroupKey::Float(v) => write!(f, "{}", v.get()),
            GroupKey::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<String> for GroupKey {
    fn from(s: String) -> Self {
        GroupKey::Str(s)
    }
}

impl From<&str> for GroupKey {
    fn from(s: &str) -> Self {
        GroupKey::Str(s.to_string())
    }
}

impl From<i64> for GroupKey {
    fn from(i: i64) -> Self {
        GroupKey::Int(i)
    }
}

impl From<i32> for GroupKey {
    fn from(i: i32) -> Self {
        GroupKey::Int(i as i64)
    }
}

impl From<u32> for GroupKey {
    fn from(i: u32) -> Self {
        GroupKey::Int(i as i64)
    }
}

impl From<f64> for GroupKey {
    fn from(v: f64) -> Self {
        GroupKey::Float(FloatKey::new(v))
    }
}

impl From<bool> for GroupKey {
    fn from(b: bool) -> Self {
        GroupKey::Bool(b)
    }
}
