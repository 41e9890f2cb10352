//! Macro outcome table for one aggregated statistics document, split by
//! syntactic category.

use serde_json::{Map, Value};
use sm_core::{ratio::ratio_key_for, value::as_real};

use crate::latex::{render_table, stored_or_computed, Cells, Row, TableSpec, ROW_END_GAP};
use crate::{Column, ReportError};

/// Column label → key prefix of that category's counters.
pub const CATEGORIES: [(&str, &str); 7] = [
    ("All", "macro"),
    ("Syntactical", "macro_syntactic"),
    ("Expr.", "macro_expr"),
    ("Stmt.", "macro_stmt"),
    ("Decl.", "macro_decl"),
    ("Type", "macro_typeloc"),
    ("Non-syn.", "macro_non_syntactic"),
];

/// Categories that are never translated: "left expanded" is the whole category.
const UNTRANSLATABLE: [&str; 2] = ["macro_typeloc", "macro_non_syntactic"];

struct Stats<'a>(&'a Map<String, Value>);

impl Stats<'_> {
    fn real(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(as_real)
    }

    /// `(count, ratio)` where a stored `<key>_ratio` wins over `count / whole`.
    fn share(&self, key: &str, whole: Option<f64>) -> (Option<f64>, Option<f64>) {
        let count = self.real(key);
        let stored = self.real(&ratio_key_for(key));
        (count, stored_or_computed(count, stored, whole))
    }
}

pub fn render_outcome_table(column: &Column) -> Result<String, ReportError> {
    let stats = Stats(column.object()?);
    let mut cells = Cells::new();

    let mut totals = Vec::with_capacity(CATEGORIES.len());
    let mut translated = Vec::with_capacity(CATEGORIES.len());
    let mut to_fn = Vec::with_capacity(CATEGORIES.len());
    let mut to_macro = Vec::with_capacity(CATEGORIES.len());
    let mut expanded = Vec::with_capacity(CATEGORIES.len());

    for (_, prefix) in CATEGORIES {
        let total = stats.real(prefix);
        let seeded_key = format!("{prefix}_seeded");
        let seeded = stats.real(&seeded_key);

        totals.push(cells.int(total));

        let (count, ratio) = stats.share(&seeded_key, total);
        translated.push(cells.entry(count, ratio));

        let (count, ratio) = stats.share(&format!("{prefix}_seeded_fn"), seeded);
        to_fn.push(cells.entry(count, ratio));

        let (count, ratio) = stats.share(&format!("{prefix}_seeded_macro"), seeded);
        to_macro.push(cells.entry(count, ratio));

        let left_key = if UNTRANSLATABLE.contains(&prefix) {
            prefix.to_owned()
        } else {
            format!("{prefix}_rejected")
        };
        let (count, ratio) = stats.share(&left_key, total);
        expanded.push(cells.entry(count, ratio));
    }

    let mut total_row = Row::new("Total macros", totals);
    total_row.end = ROW_END_GAP;
    let rows = vec![
        total_row,
        Row::new("Successfully translated", translated),
        Row::new(r"\quad$\rightarrow$ Rust function", to_fn),
        Row::new(r"\quad$\rightarrow$ Rust macro", to_macro),
        Row::new("Left expanded", expanded),
    ];

    let mut header = vec![r"\textbf{Outcome}".to_string()];
    header.extend(CATEGORIES.iter().map(|(label, _)| format!(r"\textbf{{{label}}}")));

    render_table(&TableSpec {
        caption: format!("Macro translation outcomes for {} by syntactic category", column.title),
        label: "tab:macro-outcomes".into(),
        colspec: format!("l{}", "r".repeat(CATEGORIES.len())),
        header,
        rows,
        resize: true,
        footnote: cells.footnote(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stats() -> Value {
        json!({
            "macro": 100, "macro_seeded": 60, "macro_seeded_ratio": 0.6,
            "macro_seeded_fn": 45, "macro_seeded_macro": 15, "macro_rejected": 40,
            "macro_syntactic": 80, "macro_syntactic_seeded": 60, "macro_syntactic_seeded_fn": 45,
            "macro_syntactic_seeded_macro": 15, "macro_syntactic_rejected": 20,
            "macro_expr": 50, "macro_expr_seeded": 40, "macro_expr_seeded_fn": 30,
            "macro_expr_seeded_macro": 10, "macro_expr_rejected": 10,
            "macro_stmt": 20, "macro_stmt_seeded": 15, "macro_stmt_seeded_fn": 15,
            "macro_stmt_seeded_macro": 0, "macro_stmt_rejected": 5,
            "macro_decl": 5, "macro_decl_seeded": 5, "macro_decl_seeded_fn": 0,
            "macro_decl_seeded_macro": 5, "macro_decl_rejected": 0,
            "macro_typeloc": 5, "macro_typeloc_ratio": 0.05, "macro_typeloc_seeded": 0,
            "macro_typeloc_seeded_fn": 0, "macro_typeloc_seeded_macro": 0,
            "macro_non_syntactic": 20, "macro_non_syntactic_seeded": 0,
            "macro_non_syntactic_seeded_fn": 0, "macro_non_syntactic_seeded_macro": 0
        })
    }

    #[test]
    fn rows_and_categories() {
        let out = render_outcome_table(&Column::new("CBench", stats())).unwrap();
        assert!(out.contains(r"\resizebox{\linewidth}{!}{"));
        assert!(out.contains(r"\begin{tabular}{lrrrrrrr}"));
        assert!(out.contains(
            r"\textbf{Outcome} & \textbf{All} & \textbf{Syntactical} & \textbf{Expr.} & \textbf{Stmt.} & \textbf{Decl.} & \textbf{Type} & \textbf{Non-syn.} \\"
        ));
        assert!(out.contains(r"Total macros & 100 & 80 & 50 & 20 & 5 & 5 & 20 \\[2pt]"));
        assert!(out.contains(
            r"Successfully translated & 60 (60\%) & 60 (75\%) & 40 (80\%) & 15 (75\%) & 5 (100\%) & 0 (0\%) & 0 (0\%) \\"
        ));
        assert!(out.contains(
            r"\quad$\rightarrow$ Rust function & 45 (75\%) & 45 (75\%) & 30 (75\%) & 15 (100\%) & 0 (0\%)"
        ));
        // Type uses its stored ratio; Non-syn. falls back to count / total.
        assert!(out.contains(
            r"Left expanded & 40 (40\%) & 20 (25\%) & 10 (20\%) & 5 (25\%) & 0 (0\%) & 5 (5\%) & 20 (100\%) \\"
        ));
        assert!(out.contains(r"\end{tabular}}"));
        assert!(out.contains("CBench"));
    }

    #[test]
    fn zero_seeded_yields_footnoted_share() {
        let out = render_outcome_table(&Column::new("CBench", stats())).unwrap();
        // Type has 0 seeded macros, so fn/macro shares are undefined.
        assert!(out.contains(r"0 (0$^\dagger$\%) & 0 (0$^\dagger$\%) \\"));
        assert!(out.contains(r"\footnotesize"));
    }

    #[test]
    fn empty_document_renders_all_zeros() {
        let out = render_outcome_table(&Column::new("empty", json!({}))).unwrap();
        assert!(out.contains(r"Total macros & 0$^\dagger$ & 0$^\dagger$"));
        assert!(render_outcome_table(&Column::new("bad", json!(3))).is_err());
    }
}
