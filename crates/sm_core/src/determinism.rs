//! Determinism utilities: first-seen ordering and canonical key sorting.
//!
//! Output key order is the order in which keys are first observed while
//! scanning records in input order. One `SeenOrder` is owned by each fold;
//! there is no process-wide ordering state.

use std::collections::HashSet;

use serde_json::{Map, Value};

/* -------------------------------------------------------------------------- */
/*                               First-seen order                             */
/* -------------------------------------------------------------------------- */

/// Insertion-ordered set of keys.
#[derive(Clone, Debug, Default)]
pub struct SeenOrder {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl SeenOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key`; returns `true` when it was not seen before.
    pub fn observe(&mut self, key: &str) -> bool {
        if self.seen.contains(key) {
            return false;
        }
        self.seen.insert(key.to_owned());
        self.order.push(key.to_owned());
        true
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}

/* -------------------------------------------------------------------------- */
/*                          Canonical map materialization                      */
/* -------------------------------------------------------------------------- */

/// Rebuild `v` with every object's keys sorted lexicographically (recursive).
/// Arrays keep their element order.
pub fn sort_keys_recursive(v: Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut out = Map::with_capacity(entries.len());
            for (k, inner) in entries {
                out.insert(k, sort_keys_recursive(inner));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys_recursive).collect()),
        other => other,
    }
}

/* ---------------------------------- Tests --------------------------------- */
