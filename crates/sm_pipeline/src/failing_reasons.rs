//! Per-reason ratios for the failing-reasons breakdown.
//!
//! Each reason count is divided by the number of rejected macros
//! (`total - seeded`); the `<reason>_ratio` key is placed right after its
//! reason. Must run after ratio recomputation.

use serde_json::Value;
use sm_core::{
    ratio::{numerator_key, ratio_key_for},
    value::{as_real, real_at, real_or_null, safe_ratio, Report},
};

/// Names of the fields the enrichment reads.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FailingReasonsLayout {
    /// Nested reason → count field.
    pub field: String,
    /// Aggregated total macro count.
    pub total_key: String,
    /// Aggregated seeded macro count.
    pub seeded_key: String,
}

impl Default for FailingReasonsLayout {
    fn default() -> Self {
        Self {
            field: "failing_reasons".into(),
            total_key: "macro".into(),
            seeded_key: "macro_seeded".into(),
        }
    }
}

/// Enrich `report[layout.field]` in place. Skipped entirely when the field is
/// not an object or either total is not numeric. A `<reason>_ratio` entry
/// next to its `<reason>` is replaced, so running it twice gives the same
/// result; a ratio-named entry without that sibling is a reason of its own.
pub fn add_failing_reason_ratios(report: &mut Report, layout: &FailingReasonsLayout) {
    let (Some(total), Some(seeded)) = (
        real_at(report, &layout.total_key),
        real_at(report, &layout.seeded_key),
    ) else {
        return;
    };
    let Some(Value::Object(reasons)) = report.get(&layout.field) else {
        return;
    };

    let rejected = total - seeded;
    let mut enriched = Report::new();
    let derived = |k: &str| numerator_key(k).is_some_and(|n| reasons.contains_key(n));
    for (reason, count) in reasons.iter().filter(|(k, _)| !derived(k.as_str())) {
        let ratio = as_real(count).and_then(|c| safe_ratio(c, rejected));
        enriched.insert(reason.clone(), count.clone());
        enriched.insert(ratio_key_for(reason), real_or_null(ratio));
    }

    report.insert(layout.field.clone(), Value::Object(enriched));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(v: Value) -> Report {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn ratio_follows_each_reason() {
        let mut r = report(json!({
            "macro": 10,
            "macro_seeded": 6,
            "failing_reasons": {"unbalanced": 3, "goto": 1, "note": "n/a"}
        }));
        add_failing_reason_ratios(&mut r, &FailingReasonsLayout::default());
        let fr = r["failing_reasons"].as_object().unwrap();
        assert_eq!(
            fr.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["unbalanced", "unbalanced_ratio", "goto", "goto_ratio", "note", "note_ratio"]
        );
        assert_eq!(fr["unbalanced_ratio"], json!(0.75));
        assert_eq!(fr["goto_ratio"], json!(0.25));
        assert_eq!(fr["note_ratio"], Value::Null);
    }

    #[test]
    fn zero_rejected_yields_null() {
        let mut r = report(json!({
            "macro": 5, "macro_seeded": 5, "failing_reasons": {"x": 0}
        }));
        add_failing_reason_ratios(&mut r, &FailingReasonsLayout::default());
        assert_eq!(r["failing_reasons"]["x_ratio"], Value::Null);
    }

    #[test]
    fn skipped_without_totals_or_object() {
        let mut r = report(json!({"macro": 5, "failing_reasons": {"x": 1}}));
        let before = r.clone();
        add_failing_reason_ratios(&mut r, &FailingReasonsLayout::default());
        assert_eq!(r, before);

        let mut r = report(json!({"macro": 5, "macro_seeded": 1, "failing_reasons": 3}));
        let before = r.clone();
        add_failing_reason_ratios(&mut r, &FailingReasonsLayout::default());
        assert_eq!(r, before);
    }

    #[test]
    fn ratio_named_reason_without_sibling_is_kept() {
        let mut r = report(json!({
            "macro": 4, "macro_seeded": 2, "failing_reasons": {"bad_ratio": 2}
        }));
        let layout = FailingReasonsLayout::default();
        add_failing_reason_ratios(&mut r, &layout);
        assert_eq!(r["failing_reasons"], json!({"bad_ratio": 2, "bad_ratio_ratio": 1.0}));

        add_failing_reason_ratios(&mut r, &layout);
        assert_eq!(r["failing_reasons"], json!({"bad_ratio": 2, "bad_ratio_ratio": 1.0}));
    }

    #[test]
    fn enrichment_is_idempotent() {
        let mut r = report(json!({
            "macro": 8, "macro_seeded": 4, "failing_reasons": {"a": 1, "a_ratio": null, "b": 3}
        }));
        let layout = FailingReasonsLayout::default();
        add_failing_reason_ratios(&mut r, &layout);
        let once = r.clone();
        add_failing_reason_ratios(&mut r, &layout);
        assert_eq!(r, once);
        assert_eq!(r["failing_reasons"], json!({"a": 1, "a_ratio": 0.25, "b": 3, "b_ratio": 0.75}));
    }
}
