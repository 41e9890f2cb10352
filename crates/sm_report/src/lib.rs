//! sm_report: LaTeX tables over aggregated statmerge documents.
//!
//! Determinism rules:
//! - No I/O here. Callers supply already-aggregated documents in memory.
//! - Renderers never aggregate or recompute merged totals; the only arithmetic
//!   is a fallback percent when a stored `_ratio` is absent.
//! - A missing/null/non-numeric field renders as `0` with a footnote marker;
//!   only a document that is not an object, or lacks the nested object a
//!   table is built from, is an error.

#![deny(unsafe_code)]

use serde_json::Value;
use thiserror::Error;

pub mod failing_table;
pub mod latex;
pub mod outcome_table;
pub mod performance_table;

pub use failing_table::render_failing_table;
pub use outcome_table::render_outcome_table;
pub use performance_table::{render_performance_table, STAGE_LAYOUT};

// ===== Errors =====
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{0} is not a JSON object")]
    NotAnObject(String),
    #[error("{doc} has no `{field}` object")]
    MissingField { doc: String, field: &'static str },
    #[error("template error: {0}")]
    Template(String),
}

/// One table column: an aggregated document and the heading it is shown under.
#[derive(Clone, Debug)]
pub struct Column {
    pub title: String,
    pub doc: Value,
}

impl Column {
    pub fn new(title: impl Into<String>, doc: Value) -> Self {
        Self { title: title.into(), doc }
    }

    /// Columns titled `Placeholder 1..n`, for callers without names.
    pub fn placeholders(docs: impl IntoIterator<Item = Value>) -> Vec<Column> {
        docs.into_iter()
            .enumerate()
            .map(|(i, doc)| Column::new(format!("Placeholder {}", i + 1), doc))
            .collect()
    }

    pub(crate) fn object(&self) -> Result<&serde_json::Map<String, Value>, ReportError> {
        self.doc.as_object().ok_or_else(|| ReportError::NotAnObject(self.title.clone()))
    }

    pub(crate) fn nested(&self, field: &'static str) -> Result<&serde_json::Map<String, Value>, ReportError> {
        self.object()?
            .get(field)
            .and_then(Value::as_object)
            .ok_or_else(|| ReportError::MissingField { doc: self.title.clone(), field })
    }
}
