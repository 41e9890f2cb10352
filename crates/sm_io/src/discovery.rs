//! Locate per-project report files.
//!
//! A report counts only when it sits *directly* inside a directory whose name
//! starts with the output prefix (`hayroll_out`, `hayroll_out_O2`, ...).
//! Results are sorted by path, which fixes the fold order.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{IoError, IoResult};

pub const STATISTICS_FILENAME: &str = "statistics.json";
pub const PERFORMANCE_FILENAME: &str = "performance.json";
pub const DEFAULT_DIR_PREFIX: &str = "hayroll_out";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportKind {
    Statistics,
    Performance,
}

impl ReportKind {
    pub fn file_name(self) -> &'static str {
        match self {
            ReportKind::Statistics => STATISTICS_FILENAME,
            ReportKind::Performance => PERFORMANCE_FILENAME,
        }
    }
}

/// Every `kind` report under `root` whose parent directory name starts with
/// `dir_prefix`, sorted by full path. Unreadable subdirectories are skipped
/// with a warning.
pub fn discover_reports(root: &Path, kind: ReportKind, dir_prefix: &str) -> IoResult<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(IoError::path(root, "search root is not a directory"));
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                log::warn!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() || entry.file_name() != kind.file_name() {
            continue;
        }
        let in_output_dir = entry
            .path()
            .parent()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(dir_prefix));
        if in_output_dir {
            found.push(entry.into_path());
        }
    }

    found.sort();
    log::debug!("found {} {} file(s) under {}", found.len(), kind.file_name(), root.display());
    Ok(found)
}
