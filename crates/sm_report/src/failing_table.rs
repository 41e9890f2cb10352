//! Failing-reasons comparison table: one column per aggregated statistics
//! document. Row order comes from the first document (descending count,
//! then name).

use std::cmp::Ordering;

use serde_json::{Map, Value};
use sm_core::{
    ratio::{is_ratio_key, ratio_key_for},
    value::as_real,
};

use crate::latex::{capitalize, escape, render_table, stored_or_computed, Cells, Row, TableSpec};
use crate::{Column, ReportError};

const FIELD: &str = "failing_reasons";
const REJECTED_KEY: &str = "macro_rejected";

/// Reason keys of `reasons` by descending count, ties by name. Non-numeric
/// counts sort as zero.
pub fn reason_order(reasons: &Map<String, Value>) -> Vec<String> {
    let mut sortable: Vec<(f64, &str)> = reasons
        .iter()
        .filter(|(k, _)| !is_ratio_key(k))
        .map(|(k, v)| (as_real(v).unwrap_or(0.0), k.as_str()))
        .collect();
    sortable.sort_by(|a, b| match b.0.total_cmp(&a.0) {
        Ordering::Equal => a.1.cmp(b.1),
        other => other,
    });
    sortable.into_iter().map(|(_, k)| k.to_owned()).collect()
}

pub fn render_failing_table(columns: &[Column]) -> Result<String, ReportError> {
    let order = match columns.first() {
        Some(first) => reason_order(first.nested(FIELD)?),
        None => Vec::new(),
    };

    let mut cells = Cells::new();
    let mut grid: Vec<Vec<String>> = vec![Vec::with_capacity(columns.len()); order.len()];
    for col in columns {
        let reasons = col.nested(FIELD)?;
        let rejected = col.object()?.get(REJECTED_KEY).and_then(as_real);
        for (row, reason) in grid.iter_mut().zip(&order) {
            let count = reasons.get(reason).and_then(as_real);
            let stored = reasons.get(&ratio_key_for(reason)).and_then(as_real);
            row.push(cells.entry(count, stored_or_computed(count, stored, rejected)));
        }
    }

    let rows = order
        .iter()
        .zip(grid)
        .map(|(reason, row)| Row::new(escape(&capitalize(reason)), row))
        .collect();

    let mut header = vec![r"\textbf{Failing reason}".to_string()];
    header.extend(columns.iter().map(|c| format!(r"\textbf{{{}}}", c.title)));

    render_table(&TableSpec {
        caption: "Comparison of macro translation failing reasons across benchmarks. \
                  Percentages are relative to all rejected macros in each benchmark."
            .into(),
        label: "tab:failing-reasons".into(),
        colspec: format!("l{}", "r".repeat(columns.len())),
        header,
        rows,
        resize: false,
        footnote: cells.footnote(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn order_is_count_desc_then_name() {
        let reasons = json!({
            "b": 3, "b_ratio": 0.3, "a": 3, "z": 7, "note": "n/a", "c": 1
        });
        assert_eq!(reason_order(reasons.as_object().unwrap()), vec!["z", "a", "b", "c", "note"]);
    }

    #[test]
    fn stored_ratio_then_rejected_fallback() {
        let first = json!({
            "macro_rejected": 10,
            "failing_reasons": {"conditional": 6, "conditional_ratio": 0.55, "token_paste": 4}
        });
        let second = json!({
            "failing_reasons": {"conditional": 2}
        });
        let out = render_failing_table(&[Column::new("A", first), Column::new("B", second)]).unwrap();
        assert!(out.contains(r"\textbf{Failing reason} & \textbf{A} & \textbf{B} \\"));
        assert!(out.contains(r"Conditional & 6 (55\%) & 2 (0$^\dagger$\%) \\"));
        assert!(out.contains(r"Token\_paste & 4 (40\%) & 0$^\dagger$ (0$^\dagger$\%) \\"));
        assert!(out.contains(r"\footnotesize"));
    }

    #[test]
    fn every_column_needs_failing_reasons() {
        let ok = json!({"failing_reasons": {}});
        let bad = json!({"macro": 1});
        let err = render_failing_table(&[Column::new("ok", ok), Column::new("bad", bad)]).unwrap_err();
        assert_eq!(err.to_string(), "bad has no `failing_reasons` object");
    }
}
