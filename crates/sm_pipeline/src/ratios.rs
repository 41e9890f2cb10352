//! Pass 2: derive top-level `_ratio` keys from merged totals.
//!
//! `K_ratio = merged(K) / merged(denominator(K))`. Input ratio values were
//! already discarded by the accumulator.

use log::{debug, warn};
use serde_json::Value;
use sm_core::{
    ratio::{numerator_key, DenominatorRule, DenominatorSource},
    value::{real_at, real_or_null, safe_ratio, Report},
};

/// Recompute every key in `ratio_keys` in place. Keys already present keep
/// their position; missing ones are appended.
pub fn recompute_ratios(
    mut report: Report,
    ratio_keys: &[String],
    rule: &dyn DenominatorRule,
) -> Report {
    for ratio_key in ratio_keys {
        let value = compute_ratio(&report, ratio_key, rule);
        report.insert(ratio_key.clone(), value);
    }
    report
}

fn compute_ratio(report: &Report, ratio_key: &str, rule: &dyn DenominatorRule) -> Value {
    let Some(numerator) = numerator_key(ratio_key) else {
        return Value::Null;
    };
    let Some(denominator) = rule.denominator_for(numerator) else {
        debug!("{ratio_key}: numerator {numerator:?} has no denominator");
        return Value::Null;
    };

    if !report.contains_key(&denominator.key) {
        match denominator.source {
            DenominatorSource::Heuristic => warn!(
                "{ratio_key}: inferred denominator {:?} is not in the merged report",
                denominator.key
            ),
            DenominatorSource::Declared => warn!(
                "{ratio_key}: declared denominator {:?} is not in the merged report",
                denominator.key
            ),
        }
        return Value::Null;
    }

    let num = real_at(report, numerator);
    let den = real_at(report, &denominator.key);
    match (num, den) {
        (Some(n), Some(d)) => real_or_null(safe_ratio(n, d)),
        _ => Value::Null,
    }
}
