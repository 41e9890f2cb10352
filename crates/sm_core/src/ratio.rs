//! Ratio-key conventions.
//!
//! A key ending in `_ratio` is always derived: its input values are discarded
//! and it is recomputed from merged totals. The denominator of
//! `<numerator>_ratio` is found through a [`DenominatorRule`]; the default
//! rule drops the last underscore-delimited segment of the numerator
//! (`macro_expr_seeded` → `macro_expr`). An [`ExplicitTable`] overrides it
//! per key.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::errors::CoreError;

pub const RATIO_SUFFIX: &str = "_ratio";

#[inline]
pub fn is_ratio_key(key: &str) -> bool {
    key.ends_with(RATIO_SUFFIX)
}

/// `macro_seeded` → `macro_seeded_ratio`.
#[inline]
pub fn ratio_key_for(base: &str) -> String {
    format!("{base}{RATIO_SUFFIX}")
}

/// `macro_seeded_ratio` → `macro_seeded`; `None` for non-ratio keys.
#[inline]
pub fn numerator_key(ratio_key: &str) -> Option<&str> {
    ratio_key.strip_suffix(RATIO_SUFFIX)
}

/// Drop the last `_segment` of `numerator`. No underscore → no denominator.
#[inline]
pub fn infer_denominator_key(numerator: &str) -> Option<&str> {
    numerator.rsplit_once('_').map(|(head, _)| head)
}

/* ------------------------------ Rule interface ------------------------------ */

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DenominatorSource {
    /// Derived from the key name by [`infer_denominator_key`].
    Heuristic,
    /// Declared explicitly in an [`ExplicitTable`].
    Declared,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Denominator {
    pub key: String,
    pub source: DenominatorSource,
}

/// Maps a numerator key to the key of its denominator.
pub trait DenominatorRule {
    fn denominator_for(&self, numerator: &str) -> Option<Denominator>;
}

/// The naming heuristic on its own.
#[derive(Clone, Copy, Debug, Default)]
pub struct LastSegment;

impl DenominatorRule for LastSegment {
    fn denominator_for(&self, numerator: &str) -> Option<Denominator> {
        infer_denominator_key(numerator).map(|key| Denominator {
            key: key.to_owned(),
            source: DenominatorSource::Heuristic,
        })
    }
}

/// Declared numerator→denominator pairs, falling back to [`LastSegment`].
#[derive(Clone, Debug, Default)]
pub struct ExplicitTable {
    table: BTreeMap<String, String>,
}

impl ExplicitTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, numerator: impl Into<String>, denominator: impl Into<String>) -> Self {
        self.table.insert(numerator.into(), denominator.into());
        self
    }

    /// Parse `{"numerator": "denominator", ...}`.
    pub fn from_json(v: &Value) -> Result<Self, CoreError> {
        let obj = v.as_object().ok_or(CoreError::NotAnObject("denominator table"))?;
        let mut table = BTreeMap::new();
        for (k, d) in obj {
            let d = d.as_str().ok_or_else(|| CoreError::NonStringEntry(k.clone()))?;
            table.insert(k.clone(), d.to_owned());
        }
        Ok(Self { table })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl DenominatorRule for ExplicitTable {
    fn denominator_for(&self, numerator: &str) -> Option<Denominator> {
        match self.table.get(numerator) {
            Some(key) => Some(Denominator {
                key: key.clone(),
                source: DenominatorSource::Declared,
            }),
            None => LastSegment.denominator_for(numerator),
        }
    }
}
