//! sm_core: Report value helpers, ratio-key conventions, and ordering helpers.
//!
//! This crate is **I/O-free**. It defines the small vocabulary shared by the
//! rest of the workspace (`sm_io`, `sm_pipeline`, `sm_report`, `sm_cli`):
//!
//! - `Report`: an insertion-ordered JSON object (serde_json `preserve_order`)
//! - Numeric classification and integer normalization of merged totals
//! - The `_ratio` suffix convention and the numerator→denominator rule
//! - `SeenOrder`: first-seen key ordering owned by one aggregation call

pub mod determinism;
pub mod ratio;
pub mod value;

pub mod errors {
    use core::fmt;

    /// Minimal error set for core-level parsing (denominator tables).
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub enum CoreError {
        NotAnObject(&'static str),
        NonStringEntry(String),
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::NotAnObject(what) => write!(f, "{what} must be a JSON object"),
                CoreError::NonStringEntry(k) => {
                    write!(f, "denominator table entry {k:?} must map to a string")
                }
            }
        }
    }

    impl std::error::Error for CoreError {}
}

pub use determinism::SeenOrder;
pub use errors::CoreError;
pub use ratio::{Denominator, DenominatorRule, DenominatorSource, ExplicitTable, LastSegment};
pub use value::{Report, SourcedReport};
