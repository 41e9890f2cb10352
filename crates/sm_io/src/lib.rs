//! sm_io: the filesystem side of statmerge.
//!
//! - `discovery`: find per-project report files under a search root
//! - `loader`: read and parse them (bounded parallel pool, discovery order kept)
//! - `canonical_json`: deterministic document bytes and atomic writes
//! - `hasher`: SHA-256 digests of written documents
//!
//! Nothing here knows how reports are merged; that lives in `sm_pipeline`.

#![forbid(unsafe_code)]

use thiserror::Error;

pub mod canonical_json;
pub mod discovery;
pub mod hasher;
pub mod loader;

/// Unified error for sm_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors (read, create_dir_all, rename, fsync, walk).
    #[error("io/path error at {path}: {msg}")]
    Path { path: String, msg: String },

    /// A file that is not valid JSON.
    #[error("json error in {path}: {msg}")]
    Json { path: String, msg: String },

    /// Valid JSON with the wrong document shape (root not an object).
    #[error("schema error in {path}: {msg}")]
    Schema { path: String, msg: String },

    /// Generic invalid configuration (bad pool size, unserializable value).
    #[error("invalid: {0}")]
    Invalid(String),
}

pub type IoResult<T> = Result<T, IoError>;

impl IoError {
    pub(crate) fn path(path: &std::path::Path, e: impl std::fmt::Display) -> Self {
        IoError::Path { path: path.display().to_string(), msg: e.to_string() }
    }
}

pub use canonical_json::{render_document, write_atomic, write_document, WriteOptions};
pub use discovery::{discover_reports, ReportKind, DEFAULT_DIR_PREFIX};
pub use hasher::{sha256_file, sha256_hex};
pub use loader::{load_reports, read_json, read_object};
