//! Whole-table checks over documents shaped like `statmerge aggregate` output.

use serde_json::json;
use sm_report::{render_failing_table, render_outcome_table, render_performance_table, Column};

#[test]
fn performance_table_full_text() {
    let doc = json!({
        "project_count": 1, "task_count": 4, "total_ms": 10,
        "stages": {
            "Pioneer": 1, "Pioneer_ratio": 0.1, "Splitter": 1, "Splitter_ratio": 0.1,
            "Maki": 1, "Maki_ratio": 0.1, "Seeder": 1, "Seeder_ratio": 0.1,
            "C2Rust": 2, "C2Rust_ratio": 0.2, "Reaper": 2, "Reaper_ratio": 0.2,
            "Merger": 1, "Merger_ratio": 0.1, "Cleaner": 1, "Cleaner_ratio": 0.1
        }
    });
    let out = render_performance_table(&[Column::new("O2", doc)]).unwrap();
    let expected = "\
\\begin{table}[t]
\\centering
\\caption{Pipeline performance per component (ms/CU, share of total runtime).}
\\label{tab:perf}
\\begin{tabular}{lr}
\\toprule
\\textbf{Component} & \\textbf{O2} \\\\
\\midrule
Pioneer (symbolic eval) & 1 (10\\%) \\\\
Splitter & 1 (10\\%) \\\\
Maki (C macro analysis) & 1 (10\\%) \\\\
Seeder & 1 (10\\%) \\\\
C2Rust & 2 (20\\%) \\\\
Reaper & 2 (20\\%) \\\\
Merger & 1 (10\\%) \\\\
Cleaner & 1 (10\\%) \\\\
\\addlinespace
\\textbf{Aggregate} & \\textbf{10 (100\\%)} \\\\
\\bottomrule
\\end{tabular}
\\end{table}
";
    assert_eq!(out, expected);
}

#[test]
fn rendering_is_deterministic() {
    let stats = json!({
        "macro": 10, "macro_seeded": 6, "macro_rejected": 4,
        "failing_reasons": {"goto": 1, "goto_ratio": 0.25, "asm": 3, "asm_ratio": 0.75}
    });
    let cols = Column::placeholders([stats.clone(), stats.clone()]);
    assert_eq!(render_failing_table(&cols).unwrap(), render_failing_table(&cols).unwrap());

    let col = Column::new("x", stats);
    let a = render_outcome_table(&col).unwrap();
    assert_eq!(a, render_outcome_table(&col).unwrap());
    assert!(a.ends_with("\\end{table}\n"));
}
