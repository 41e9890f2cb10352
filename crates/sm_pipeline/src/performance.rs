//! Weighted aggregation of per-project performance timings.
//!
//! Every record is weighted by its `task_count`. Stage weights accrue per
//! stage, so a stage missing from some projects is averaged only over the
//! projects that timed it.

use std::collections::HashMap;

use serde_json::Value;
use sm_core::{
    determinism::SeenOrder,
    ratio::ratio_key_for,
    value::{as_real, normalize_total, real_or_null, safe_ratio, Report},
};

use crate::PipelineError;

/// Output document. `to_value` emits the fields in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct PerformanceAggregate {
    pub project_count: usize,
    pub task_count: Value,
    pub total_ms: Value,
    pub stages: Report,
}

impl PerformanceAggregate {
    pub fn to_value(&self) -> Value {
        let mut out = Report::new();
        out.insert("project_count".into(), Value::from(self.project_count));
        out.insert("task_count".into(), self.task_count.clone());
        out.insert("total_ms".into(), self.total_ms.clone());
        out.insert("stages".into(), Value::Object(self.stages.clone()));
        Value::Object(out)
    }
}

#[derive(Clone, Debug, Default)]
pub struct PerformanceAggregator {
    project_count: usize,
    total_task_weight: f64,
    total_ms_weighted: f64,
    total_ms_weight: f64,
    stage_order: SeenOrder,
    stage_totals: HashMap<String, f64>,
    stage_weights: HashMap<String, f64>,
}

impl PerformanceAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record. `source` names it in schema errors.
    pub fn fold(&mut self, source: &str, record: &Report) -> Result<(), PipelineError> {
        let schema = |msg: String| PipelineError::Schema { source_name: source.to_owned(), msg };

        let Some(Value::Object(stages)) = record.get("stages") else {
            return Err(schema("missing stage data".into()));
        };
        let task_count = record.get("task_count").unwrap_or(&Value::Null);
        let weight = as_real(task_count)
            .ok_or_else(|| schema(format!("non-numeric task_count {task_count}")))?;
        if weight < 0.0 {
            return Err(schema(format!("negative task_count {task_count}")));
        }

        // Validate every stage before touching any totals.
        let mut timed = Vec::with_capacity(stages.len());
        for (stage, value) in stages {
            match value {
                Value::Null => timed.push((stage, None)),
                v => match as_real(v) {
                    Some(ms) => timed.push((stage, Some(ms))),
                    None => {
                        return Err(schema(format!(
                            "non-numeric value {v} for stage {stage:?}"
                        )))
                    }
                },
            }
        }

        self.project_count += 1;
        self.total_task_weight += weight;

        if let Some(ms) = record.get("total_ms").and_then(as_real) {
            self.total_ms_weighted += ms * weight;
            self.total_ms_weight += weight;
        }

        for (stage, ms) in timed {
            self.stage_order.observe(stage);
            if let Some(ms) = ms {
                *self.stage_totals.entry(stage.clone()).or_insert(0.0) += ms * weight;
                *self.stage_weights.entry(stage.clone()).or_insert(0.0) += weight;
            }
        }
        Ok(())
    }

    pub fn finish(self) -> PerformanceAggregate {
        let averages: Vec<(&str, Option<f64>)> = self
            .stage_order
            .iter()
            .map(|stage| {
                let weight = self.stage_weights.get(stage).copied().unwrap_or(0.0);
                let total = self.stage_totals.get(stage).copied().unwrap_or(0.0);
                (stage, safe_ratio(total, weight))
            })
            .collect();

        let stage_sum: f64 = averages.iter().filter_map(|(_, avg)| *avg).sum();

        let mut stages = Report::new();
        for (stage, avg) in &averages {
            let share = avg.and_then(|a| safe_ratio(a, stage_sum));
            stages.insert((*stage).to_owned(), avg.map(normalize_total).unwrap_or(Value::Null));
            stages.insert(ratio_key_for(stage), real_or_null(share));
        }

        let total_ms = if self.total_ms_weight > 0.0 {
            normalize_total(self.total_ms_weighted / self.total_ms_weight)
        } else {
            Value::Null
        };

        let task_count = if self.project_count == 0 {
            Value::from(0)
        } else {
            normalize_total(self.total_task_weight)
        };

        PerformanceAggregate { project_count: self.project_count, task_count, total_ms, stages }
    }
}
