//! Deterministic JSON documents.
//! - Objects: source (insertion) order by default, recursively sorted on request
//! - Arrays: order preserved
//! - Output: pretty-printed with `indent` spaces, trailing newline
//! - Atomic write: temp file in same dir + fsync(temp) + rename; fsync(dir) on Unix
//! - Fallback: if rename fails (e.g., cross-device), write directly to target,
//!   fsync(target), then remove temp, fsync(dir).

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};
use sm_core::determinism::sort_keys_recursive;

use crate::{IoError, IoResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteOptions {
    /// Spaces per nesting level. `0` still breaks lines.
    pub indent: usize,
    /// Sort every object's keys instead of keeping source order.
    pub sort_keys: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { indent: 2, sort_keys: false }
    }
}

/// Render `v` to document bytes (with trailing newline).
pub fn render_document(v: &Value, opts: &WriteOptions) -> IoResult<Vec<u8>> {
    let sorted;
    let v = if opts.sort_keys {
        sorted = sort_keys_recursive(v.clone());
        &sorted
    } else {
        v
    };

    let indent = vec![b' '; opts.indent];
    let mut out = Vec::with_capacity(1024);
    let mut ser = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(&indent));
    v.serialize(&mut ser).map_err(|e| IoError::Invalid(e.to_string()))?;
    out.push(b'\n');
    Ok(out)
}

/// Render and write `v` atomically; returns the bytes written.
pub fn write_document(path: &Path, v: &Value, opts: &WriteOptions) -> IoResult<Vec<u8>> {
    let bytes = render_document(v, opts)?;
    write_atomic(path, &bytes)?;
    Ok(bytes)
}

/// Write `bytes` to `path` atomically (with safe cross-device fallback).
pub fn write_atomic(path: &Path, bytes: &[u8]) -> IoResult<()> {
    write_atomic_io(path, bytes).map_err(|e| IoError::path(path, e))
}

fn write_atomic_io(path: &Path, bytes: &[u8]) -> io::Result<()> {
    // A bare file name has an empty parent; that means the current directory.
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let tmp = make_unique_tmp_path(path, parent);
    let mut tf = OpenOptions::new()
        .write(true)
        .create_new(true) // avoid clobbering another writer's temp
        .open(&tmp)?;
    tf.write_all(bytes)?;
    tf.sync_all()?;
    drop(tf);

    match fs::rename(&tmp, path) {
        Ok(()) => {
            let _ = fsync_dir(parent);
            Ok(())
        }
        Err(_e) => {
            let res: io::Result<()> = (|| {
                let mut f = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)?;
                f.write_all(bytes)?;
                f.sync_all()?;
                Ok(())
            })();

            let _ = fs::remove_file(&tmp);
            res?;
            let _ = fsync_dir(parent);
            Ok(())
        }
    }
}

/// Create a unique temp path next to `target`: "<filename>.<pid>.<counter>.tmp"
fn make_unique_tmp_path(target: &Path, dir: &Path) -> PathBuf {
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let pid = std::process::id();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let fname = target
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    dir.join(format!(".{fname}.{pid}.{n}.tmp"))
}

/// Fsync the directory containing the file (Unix only). No-op on other platforms.
#[cfg(unix)]
fn fsync_dir(dir: &Path) -> io::Result<()> {
    let df = OpenOptions::new().read(true).open(dir)?;
    df.sync_all()
}

#[cfg(not(unix))]
#[inline]
fn fsync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
