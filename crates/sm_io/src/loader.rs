//! Read discovered report files into `SourcedReport`s.
//!
//! Files are read and parsed on a bounded rayon pool; the returned vector is
//! always in the order of `paths`, so the downstream fold is reproducible no
//! matter how reads were scheduled.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde_json::Value;
use sm_core::{Report, SourcedReport};

use crate::{IoError, IoResult};

/// Parse one JSON file.
pub fn read_json(path: &Path) -> IoResult<Value> {
    let text = fs::read_to_string(path).map_err(|e| IoError::path(path, e))?;
    serde_json::from_str(&text).map_err(|e| IoError::Json {
        path: path.display().to_string(),
        msg: e.to_string(),
    })
}

/// Parse one JSON file whose root must be an object.
pub fn read_object(path: &Path) -> IoResult<Report> {
    match read_json(path)? {
        Value::Object(map) => Ok(map),
        other => Err(IoError::Schema {
            path: path.display().to_string(),
            msg: format!("document root must be an object, found {}", kind_of(&other)),
        }),
    }
}

/// Load every path, in order. `jobs = None` uses rayon's default width.
pub fn load_reports(paths: &[PathBuf], jobs: Option<usize>) -> IoResult<Vec<SourcedReport>> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = jobs {
        builder = builder.num_threads(n.max(1));
    }
    let pool = builder
        .build()
        .map_err(|e| IoError::Invalid(format!("failed to build reader pool: {e}")))?;

    let reports = pool.install(|| {
        paths
            .par_iter()
            .map(|p| {
                log::debug!("reading {}", p.display());
                read_object(p).map(|r| SourcedReport::new(p.display().to_string(), r))
            })
            .collect::<IoResult<Vec<_>>>()
    })?;

    Ok(reports)
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
