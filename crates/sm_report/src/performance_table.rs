//! Per-stage runtime table: one column per aggregated performance document,
//! cells `ms (share\%)`, and a bold Aggregate row for `total_ms`.

use sm_core::{ratio::ratio_key_for, value::as_real};

use crate::latex::{render_table, Cells, Row, TableSpec};
use crate::{Column, ReportError};

/// Stage key in `stages` → row label.
pub const STAGE_LAYOUT: [(&str, &str); 8] = [
    ("Pioneer", "Pioneer (symbolic eval)"),
    ("Splitter", "Splitter"),
    ("Maki", "Maki (C macro analysis)"),
    ("Seeder", "Seeder"),
    ("C2Rust", "C2Rust"),
    ("Reaper", "Reaper"),
    ("Merger", "Merger"),
    ("Cleaner", "Cleaner"),
];

pub fn render_performance_table(columns: &[Column]) -> Result<String, ReportError> {
    let mut cells = Cells::new();
    let mut stage_rows: Vec<Vec<String>> = vec![Vec::with_capacity(columns.len()); STAGE_LAYOUT.len()];
    let mut totals = Vec::with_capacity(columns.len());

    for col in columns {
        let stages = col.nested("stages")?;
        for (row, (key, _)) in stage_rows.iter_mut().zip(STAGE_LAYOUT.iter()) {
            let ms = stages.get(*key).and_then(as_real);
            let share = stages.get(&ratio_key_for(key)).and_then(as_real);
            row.push(cells.entry(ms, share));
        }
        let total = col.object()?.get("total_ms").and_then(as_real);
        totals.push(format!(r"\textbf{{{} (100\%)}}", cells.int(total)));
    }

    let mut rows: Vec<Row> = STAGE_LAYOUT
        .iter()
        .zip(stage_rows)
        .map(|((_, label), row)| Row::new(*label, row))
        .collect();
    let mut aggregate = Row::new(r"\textbf{Aggregate}", totals);
    aggregate.space_before = true;
    rows.push(aggregate);

    let mut header = vec![r"\textbf{Component}".to_string()];
    header.extend(columns.iter().map(|c| format!(r"\textbf{{{}}}", c.title)));

    render_table(&TableSpec {
        caption: "Pipeline performance per component (ms/CU, share of total runtime).".into(),
        label: "tab:perf".into(),
        colspec: format!("l{}", "r".repeat(columns.len())),
        header,
        rows,
        resize: false,
        footnote: cells.footnote(),
    })
}
