//! ACCUMULATE stage: fold statistics records into one combined report.
//!
//! Per key, in record order:
//! 1. track first-seen order (per nesting level);
//! 2. top-level `_ratio` keys are only *marked*; their input values are
//!    discarded (nested ones are kept unless their numerator is a sibling);
//! 3. `null` contributes nothing;
//! 4. an object recurses one level into a per-key nested accumulator;
//! 5. numbers add into a running real total;
//! 6. anything else is a scalar: first non-null value is kept, a differing
//!    later value is a conflict (fatal).
//!
//! Resolution priority per key is numeric > nested > scalar > null.

use std::collections::HashMap;

use log::warn;
use serde_json::Value;
use sm_core::{
    determinism::SeenOrder,
    ratio::{is_ratio_key, numerator_key},
    value::{as_real, describe, normalize_total, same_scalar, Report},
};

use crate::PipelineError;

/// Result of a completed fold.
#[derive(Clone, Debug)]
pub struct Accumulated {
    /// Combined report in first-seen key order (ratio keys present, `null`).
    pub report: Report,
    /// Number of records folded.
    pub file_count: usize,
    /// Top-level ratio keys in first-seen order.
    pub ratio_keys: Vec<String>,
}

/// Totals and scalars for one nesting level.
#[derive(Clone, Debug, Default)]
struct Level {
    order: SeenOrder,
    totals: HashMap<String, f64>,
    scalars: HashMap<String, Value>,
}

impl Level {
    /// Add a numeric contribution.
    fn add(&mut self, key: &str, x: f64) {
        *self.totals.entry(key.to_owned()).or_insert(0.0) += x;
    }

    /// Store a scalar, or report the previously stored one if it differs.
    fn store_scalar(&mut self, key: &str, v: &Value) -> Result<(), &Value> {
        if !self.scalars.contains_key(key) {
            self.scalars.insert(key.to_owned(), v.clone());
            return Ok(());
        }
        match self.scalars.get(key) {
            Some(stored) if !same_scalar(stored, v) => Err(stored),
            _ => Ok(()),
        }
    }
}

/// Owns all state of one statistics aggregation call.
#[derive(Clone, Debug, Default)]
pub struct StatisticsAccumulator {
    top: Level,
    nested: HashMap<String, Level>,
    ratio_keys: SeenOrder,
    file_count: usize,
}

impl StatisticsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record. A conflict aborts with no partial effect on callers
    /// (the accumulator should be dropped).
    pub fn fold(&mut self, record: &Report) -> Result<(), PipelineError> {
        self.file_count += 1;

        for (key, value) in record {
            self.top.order.observe(key);

            if is_ratio_key(key) {
                self.ratio_keys.observe(key);
                continue;
            }

            match value {
                Value::Null => {}
                Value::Object(inner) => {
                    let level = self.nested.entry(key.clone()).or_default();
                    fold_nested(level, key, inner)?;
                }
                v => match as_real(v) {
                    Some(x) => self.top.add(key, x),
                    None => {
                        if let Err(stored) = self.top.store_scalar(key, v) {
                            return Err(PipelineError::Conflict {
                                key: key.clone(),
                                inner: None,
                                first: describe(stored),
                                second: describe(v),
                            });
                        }
                    }
                },
            }
        }
        Ok(())
    }

    /// Resolve every first-seen key into the combined report.
    pub fn finish(self) -> Accumulated {
        let StatisticsAccumulator { top, nested, ratio_keys, file_count } = self;

        let mut report = Report::new();
        for key in top.order.iter() {
            let resolved = if let Some(total) = top.totals.get(key) {
                resolve_total(None, key, *total)
            } else if let Some(level) = nested.get(key) {
                Value::Object(resolve_level(key, level))
            } else if let Some(scalar) = top.scalars.get(key) {
                scalar.clone()
            } else {
                Value::Null
            };
            report.insert(key.to_owned(), resolved);
        }

        Accumulated { report, file_count, ratio_keys: ratio_keys.into_vec() }
    }
}

/// Fold a complete sequence of records.
pub fn accumulate_statistics<'a, I>(records: I) -> Result<Accumulated, PipelineError>
where
    I: IntoIterator<Item = &'a Report>,
{
    let mut acc = StatisticsAccumulator::new();
    for record in records {
        acc.fold(record)?;
    }
    Ok(acc.finish())
}

/* ------------------------------ helpers ------------------------------ */

/// Values inside a nested mapping are never treated as further-nested:
/// an inner object is a scalar like any other non-number.
fn fold_nested(level: &mut Level, outer: &str, inner: &Report) -> Result<(), PipelineError> {
    for (inner_key, inner_value) in inner {
        level.order.observe(inner_key);

        if inner_value.is_null() {
            continue;
        }

        match as_real(inner_value) {
            Some(x) => level.add(inner_key, x),
            // Ratio entries only carry numbers; anything else is dropped.
            None if is_ratio_key(inner_key) => {}
            None => {
                if let Err(stored) = level.store_scalar(inner_key, inner_value) {
                    return Err(PipelineError::Conflict {
                        key: outer.to_owned(),
                        inner: Some(inner_key.clone()),
                        first: describe(stored),
                        second: describe(inner_value),
                    });
                }
            }
        }
    }
    Ok(())
}

/// A nested `<k>_ratio` whose `<k>` sits in the same level is re-derived
/// downstream and resolves to null; any other ratio-named entry is an
/// ordinary counter.
fn resolve_level(outer: &str, level: &Level) -> Report {
    let mut out = Report::new();
    for key in level.order.iter() {
        let derived = numerator_key(key).is_some_and(|n| level.order.contains(n));
        let resolved = if derived {
            Value::Null
        } else if let Some(total) = level.totals.get(key) {
            resolve_total(Some(outer), key, *total)
        } else if let Some(scalar) = level.scalars.get(key) {
            scalar.clone()
        } else {
            Value::Null
        };
        out.insert(key.to_owned(), resolved);
    }
    out
}

fn resolve_total(outer: Option<&str>, key: &str, total: f64) -> Value {
    if !total.is_finite() {
        match outer {
            Some(outer) => warn!("merged total for {outer:?}[{key:?}] is {total}; emitted as null"),
            None => warn!("merged total for {key:?} is {total}; emitted as null"),
        }
    }
    normalize_total(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(v: Value) -> Report {
        match v {
            Value::Object(m) => m,
            _ => panic!("test record must be an object"),
        }
    }

    fn keys(r: &Report) -> Vec<&str> {
        r.keys().map(String::as_str).collect()
    }

    #[test]
    fn sums_numbers_and_normalizes_integers() {
        let a = rec(json!({"macro": 10, "loc": 1.5}));
        let b = rec(json!({"macro": 5, "loc": 2.0}));
        let out = accumulate_statistics([&a, &b]).unwrap();
        assert_eq!(out.report["macro"], json!(15));
        assert_eq!(out.report["loc"], json!(3.5));
        assert_eq!(out.file_count, 2);
    }

    #[test]
    fn key_order_is_first_seen_across_records() {
        let a = rec(json!({"b": 1, "a": 1}));
        let b = rec(json!({"c": 1, "a": 1, "d": 1}));
        let out = accumulate_statistics([&a, &b]).unwrap();
        assert_eq!(keys(&out.report), vec!["b", "a", "c", "d"]);

        let out = accumulate_statistics([&b, &a]).unwrap();
        assert_eq!(keys(&out.report), vec!["c", "a", "d", "b"]);
    }

    #[test]
    fn ratio_values_are_marked_not_summed() {
        let a = rec(json!({"x_y_ratio": 1.0, "x_y": 3}));
        let b = rec(json!({"x_y_ratio": 0.5, "z_ratio": 0.1}));
        let out = accumulate_statistics([&a, &b]).unwrap();
        assert_eq!(out.ratio_keys, vec!["x_y_ratio", "z_ratio"]);
        assert_eq!(out.report["x_y_ratio"], Value::Null);
        assert_eq!(keys(&out.report), vec!["x_y_ratio", "x_y", "z_ratio"]);
    }

    #[test]
    fn null_does_not_mask_numbers_or_scalars() {
        let a = rec(json!({"n": null, "s": null, "only_null": null}));
        let b = rec(json!({"n": 4, "s": "gcc"}));
        let c = rec(json!({"n": null, "s": null}));
        let out = accumulate_statistics([&a, &b, &c]).unwrap();
        assert_eq!(out.report["n"], json!(4));
        assert_eq!(out.report["s"], json!("gcc"));
        assert_eq!(out.report["only_null"], Value::Null);
    }

    #[test]
    fn scalar_conflict_names_key_and_both_values() {
        let a = rec(json!({"x": "a"}));
        let b = rec(json!({"x": "b"}));
        let err = accumulate_statistics([&a, &b]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("\"x\""), "{msg}");
        assert!(msg.contains("\"a\""), "{msg}");
        assert!(msg.contains("\"b\""), "{msg}");

        // Order-independent: the reverse also conflicts.
        assert!(accumulate_statistics([&b, &a]).is_err());
    }

    #[test]
    fn equal_scalars_merge_quietly() {
        let a = rec(json!({"tool": "c2rust", "flag": true, "tags": ["x", "y"]}));
        let b = rec(json!({"tool": "c2rust", "flag": true, "tags": ["x", "y"]}));
        let out = accumulate_statistics([&a, &b]).unwrap();
        assert_eq!(out.report["tool"], json!("c2rust"));
        assert_eq!(out.report["flag"], json!(true));
        assert_eq!(out.report["tags"], json!(["x", "y"]));
    }

    #[test]
    fn booleans_conflict_instead_of_summing() {
        let a = rec(json!({"flag": true}));
        let b = rec(json!({"flag": false}));
        assert!(matches!(
            accumulate_statistics([&a, &b]),
            Err(PipelineError::Conflict { .. })
        ));
    }

    #[test]
    fn nested_maps_merge_one_level() {
        let a = rec(json!({"failing_reasons": {"b": 1, "a": 2, "deep": {"k": 1}}}));
        let b = rec(json!({"failing_reasons": {"c": 3, "a": 1, "deep": {"k": 1}, "a_ratio": 0.3}}));
        let out = accumulate_statistics([&a, &b]).unwrap();
        let fr = out.report["failing_reasons"].as_object().unwrap();
        assert_eq!(keys(fr), vec!["b", "a", "deep", "c", "a_ratio"]);
        assert_eq!(fr["a"], json!(3));
        assert_eq!(fr["deep"], json!({"k": 1}));
        assert_eq!(fr["a_ratio"], Value::Null);
        assert!(out.ratio_keys.is_empty());
    }

    #[test]
    fn lone_nested_ratio_name_is_a_counter() {
        let a = rec(json!({"failing_reasons": {"bad_ratio": 2, "x_ratio": "n/a"}}));
        let b = rec(json!({"failing_reasons": {"bad_ratio": 1}}));
        let out = accumulate_statistics([&a, &b]).unwrap();
        assert_eq!(out.report["failing_reasons"], json!({"bad_ratio": 3, "x_ratio": null}));
    }

    #[test]
    fn overflowing_total_resolves_to_null() {
        let a = rec(json!({"x": 1e308, "n": {"y": 1e308}}));
        let b = rec(json!({"x": 1e308, "n": {"y": 1e308}}));
        let out = accumulate_statistics([&a, &b]).unwrap();
        assert_eq!(out.report["x"], Value::Null);
        assert_eq!(out.report["n"], json!({"y": null}));
    }

    #[test]
    fn numerically_equal_arrays_do_not_conflict() {
        let a = rec(json!({"opt": [1], "env": {"levels": [0, 2]}}));
        let b = rec(json!({"opt": [1.0], "env": {"levels": [0.0, 2.0]}}));
        let out = accumulate_statistics([&a, &b]).unwrap();
        assert_eq!(out.report["opt"], json!([1]));
        assert_eq!(out.report["env"], json!({"levels": [0, 2]}));
    }

    #[test]
    fn all_null_nested_entries_stay_as_null() {
        let a = rec(json!({"env": {"a": null}}));
        let out = accumulate_statistics([&a]).unwrap();
        assert_eq!(out.report["env"], json!({"a": null}));
    }

    #[test]
    fn nested_conflict_names_inner_key() {
        let a = rec(json!({"env": {"cc": "gcc"}}));
        let b = rec(json!({"env": {"cc": "clang"}}));
        match accumulate_statistics([&a, &b]).unwrap_err() {
            PipelineError::Conflict { key, inner, first, second } => {
                assert_eq!(key, "env");
                assert_eq!(inner.as_deref(), Some("cc"));
                assert_eq!(first, "\"gcc\"");
                assert_eq!(second, "\"clang\"");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn numeric_wins_over_nested_and_scalar() {
        let a = rec(json!({"k": {"x": 1}, "s": "text"}));
        let b = rec(json!({"k": 2, "s": 3}));
        let out = accumulate_statistics([&a, &b]).unwrap();
        assert_eq!(out.report["k"], json!(2));
        assert_eq!(out.report["s"], json!(3));
    }

    #[test]
    fn empty_nested_object_is_kept() {
        let a = rec(json!({"failing_reasons": {}}));
        let out = accumulate_statistics([&a]).unwrap();
        assert_eq!(out.report["failing_reasons"], json!({}));
    }

    #[test]
    fn no_records_yield_empty_report() {
        let out = accumulate_statistics(std::iter::empty::<&Report>()).unwrap();
        assert!(out.report.is_empty());
        assert_eq!(out.file_count, 0);
    }
}
