//! sm_pipeline: merge per-project statistics and performance reports.
//!
//! Statistics: ACCUMULATE → insert `count` → RECOMPUTE RATIOS → ENRICH
//! failing reasons. Performance: weighted fold over `task_count`.
//! The two pipelines share no state. Both are pure and synchronous; any
//! error aborts the call with nothing produced.

pub mod accumulate;
pub mod failing_reasons;
pub mod filter;
pub mod performance;
pub mod ratios;

use serde_json::Value;
use sm_core::{DenominatorRule, LastSegment, Report, SourcedReport};
use thiserror::Error;

pub use accumulate::{accumulate_statistics, Accumulated, StatisticsAccumulator};
pub use failing_reasons::{add_failing_reason_ratios, FailingReasonsLayout};
pub use filter::{failing_projects, filter_failing_programs, ProjectOutcome};
pub use performance::{PerformanceAggregate, PerformanceAggregator};
pub use ratios::recompute_ratios;

/// Key injected into the statistics document with the number of merged files.
pub const COUNT_KEY: &str = "count";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("conflicting values for non-numeric field {}: {first} vs {second}", field_path(.key, .inner))]
    Conflict {
        key: String,
        inner: Option<String>,
        first: String,
        second: String,
    },
    #[error("{source_name}: {msg}")]
    Schema { source_name: String, msg: String },
}

fn field_path(key: &str, inner: &Option<String>) -> String {
    match inner {
        Some(inner) => format!("{key:?}[{inner:?}]"),
        None => format!("{key:?}"),
    }
}

/// Knobs for the statistics pipeline.
pub struct StatisticsOptions<'a> {
    pub denominators: &'a dyn DenominatorRule,
    pub failing: FailingReasonsLayout,
}

impl Default for StatisticsOptions<'static> {
    fn default() -> Self {
        Self { denominators: &LastSegment, failing: FailingReasonsLayout::default() }
    }
}

#[derive(Clone, Debug)]
pub struct StatisticsOutcome {
    pub document: Report,
    pub file_count: usize,
    pub ratio_keys: Vec<String>,
}

impl StatisticsOutcome {
    pub fn into_value(self) -> Value {
        Value::Object(self.document)
    }
}

/// Run the full statistics pipeline over records in fold order.
pub fn aggregate_statistics(
    records: &[SourcedReport],
    opts: &StatisticsOptions<'_>,
) -> Result<StatisticsOutcome, PipelineError> {
    let mut acc = StatisticsAccumulator::new();
    for rec in records {
        log::debug!("folding statistics from {}", rec.source);
        acc.fold(&rec.report)?;
    }
    let Accumulated { mut report, file_count, ratio_keys } = acc.finish();

    report.insert(COUNT_KEY.into(), Value::from(file_count));
    let mut document = recompute_ratios(report, &ratio_keys, opts.denominators);
    add_failing_reason_ratios(&mut document, &opts.failing);

    log::info!(
        "merged {file_count} statistics file(s): {} key(s), {} ratio(s) recomputed",
        document.len(),
        ratio_keys.len()
    );
    Ok(StatisticsOutcome { document, file_count, ratio_keys })
}

/// Run the weighted performance fold over records in fold order.
pub fn aggregate_performance(
    records: &[SourcedReport],
) -> Result<PerformanceAggregate, PipelineError> {
    let mut agg = PerformanceAggregator::new();
    for rec in records {
        log::debug!("folding performance from {}", rec.source);
        agg.fold(&rec.source, &rec.report)?;
    }
    let out = agg.finish();
    log::info!(
        "merged {} performance file(s) covering {} task(s)",
        out.project_count,
        out.task_count
    );
    Ok(out)
}
