//! Drop failing projects from a benchmark metadata document.
//!
//! The benchmark summary maps each project name to its outcome; only
//! `status == "passed"` survives. Everything else in the metadata document
//! is left untouched.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;
use sm_core::value::Report;

use crate::PipelineError;

pub const STATUS_PASSED: &str = "passed";

/// The two summary fields the filter consumes; anything else is ignored.
/// Both are kept as raw values so an oddly typed field never fails the read;
/// only a string `status` of `"passed"` counts as passing.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ProjectOutcome {
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub failed_stage: Option<Value>,
}

impl ProjectOutcome {
    /// Read an entry of the summary. Non-object entries have no outcome.
    pub fn from_entry(payload: &Value) -> Self {
        match payload {
            Value::Object(_) => Self::deserialize(payload).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    #[inline]
    pub fn passed(&self) -> bool {
        self.status.as_ref().and_then(Value::as_str) == Some(STATUS_PASSED)
    }
}

/// Names of every project in `summary` that did not pass.
///
/// An entry that is not an outcome object counts as failing.
pub fn failing_projects(summary: &Value, source: &str) -> Result<BTreeSet<String>, PipelineError> {
    let entries = summary.as_object().ok_or_else(|| PipelineError::Schema {
        source_name: source.to_owned(),
        msg: "benchmark summary must be a JSON object".into(),
    })?;

    let mut failing = BTreeSet::new();
    for (name, payload) in entries {
        let outcome = ProjectOutcome::from_entry(payload);
        if !outcome.passed() {
            log::debug!(
                "{name}: status {} (stage {})",
                outcome.status.as_ref().map_or_else(|| "missing".to_owned(), Value::to_string),
                outcome.failed_stage.as_ref().map_or_else(|| "-".to_owned(), Value::to_string)
            );
            failing.insert(name.clone());
        }
    }
    Ok(failing)
}

/// Remove programs named in `failing` from `metadata.programs`.
/// Returns the filtered document and the number of programs removed.
pub fn filter_failing_programs(
    mut metadata: Report,
    failing: &BTreeSet<String>,
    source: &str,
) -> Result<(Report, usize), PipelineError> {
    let slot = metadata.entry("programs").or_insert(Value::Null);
    let programs = match std::mem::take(slot) {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => {
            return Err(PipelineError::Schema {
                source_name: source.to_owned(),
                msg: format!("`programs` must be an array, found {other}"),
            })
        }
    };

    let before = programs.len();
    let kept: Vec<Value> = programs
        .into_iter()
        .filter(|entry| {
            let name = entry.get("name").and_then(Value::as_str);
            !name.is_some_and(|n| failing.contains(n))
        })
        .collect();
    let removed = before - kept.len();

    *slot = Value::Array(kept);
    Ok((metadata, removed))
}
