//! Numeric field index.
//!
//! Each numeric flat path owns an ordered map from value to posting bitmap.
//! Comparison queries walk the relevant key range and union the postings.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;

use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};

use crate::document::Ordinal;

/// A comparison operator of a numeric `where` lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
}

impl Comparison {
    /// All accepted operator spellings.
    pub const ALLOWED: &'static str = "<, <=, =, >, >=";

    /// Parse an operator spelling.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "<" => Some(Comparison::Lt),
            "<=" => Some(Comparison::Lte),
            "=" => Some(Comparison::Eq),
            ">" => Some(Comparison::Gt),
            ">=" => Some(Comparison::Gte),
            _ => None,
        }
    }

    /// The operator's spelling.
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
            Comparison::Eq => "=",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A finite `f64` with a total order, usable as a `BTreeMap` key.
///
/// Negative zero is normalized to zero so `=` lookups follow numeric
/// equality. Non-finite values never reach the index; document validation
/// rejects them.
#[derive(Clone, Copy, Debug)]
struct NumericKey(f64);

impl NumericKey {
    fn new(value: f64) -> Self {
        debug_assert!(value.is_finite());
        NumericKey(if value == 0.0 { 0.0 } else { value })
    }
}

impl PartialEq for NumericKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == std::cmp::Ordering::Equal
    }
}

impl Eq for NumericKey {}

impl PartialOrd for NumericKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NumericKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Index over one numeric flat path.
#[derive(Clone, Debug, Default)]
pub struct NumericIndex {
    postings: BTreeMap<NumericKey, RoaringBitmap>,
}

impl NumericIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        NumericIndex {
            postings: BTreeMap::new(),
        }
    }

    /// Record a document's value.
    pub fn insert(&mut self, value: f64, ordinal: Ordinal) {
        self.postings
            .entry(NumericKey::new(value))
            .or_default()
            .insert(ordinal);
    }

    /// Remove a document's value. Returns `true` iff the posting existed.
    pub fn remove(&mut self, value: f64, ordinal: Ordinal) -> bool {
        let key = NumericKey::new(value);
        match self.postings.get_mut(&key) {
            Some(postings) => {
                let removed = postings.remove(ordinal);
                if postings.is_empty() {
                    self.postings.remove(&key);
                }
                removed
            }
            None => false,
        }
    }

    /// The documents whose value satisfies `op target`.
    pub fn query(&self, op: Comparison, target: f64) -> RoaringBitmap {
        let key = NumericKey::new(target);
        let mut out = RoaringBitmap::new();

        match op {
            Comparison::Eq => {
                if let Some(postings) = self.postings.get(&key) {
                    out |= postings;
                }
            }
            Comparison::Lt => {
                for (_, postings) in self.postings.range(..key) {
                    out |= postings;
                }
            }
            Comparison::Lte => {
                for (_, postings) in self.postings.range(..=key) {
                    out |= postings;
                }
            }
            Comparison::Gt => {
                for (_, postings) in self
                    .postings
                    .range((Bound::Excluded(key), Bound::Unbounded))
                {
                    out |= postings;
                }
            }
            Comparison::Gte => {
                for (_, postings) in self.postings.range(key..) {
                    out |= postings;
                }
            }
        }

        out
    }

    /// Number of distinct values stored.
    pub fn value_count(&self) -> usize {
        self.postings.len()
    }
}
