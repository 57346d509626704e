//! Writing patched bundles to disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("path has no parent directory: {0}")]
    NoParent(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "WriteOutcome reports whether the file was touched"]
pub enum WriteOutcome {
    Written,
    /// The file already held exactly this content.
    Unchanged,
}

/// Content fingerprint used to detect no-op writes.
pub fn fingerprint(text: &str) -> u64 {
    xxh3_64(text.as_bytes())
}

/// Write `content` to `path` unless the file already holds it.
pub fn write_if_changed(path: &Path, content: &str) -> Result<WriteOutcome, OutputError> {
    if let Ok(existing) = fs::read_to_string(path) {
        if fingerprint(&existing) == fingerprint(content) && existing == content {
            return Ok(WriteOutcome::Unchanged);
        }
    }
    write_atomic(path, content.as_bytes())?;
    Ok(WriteOutcome::Written)
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or the target is left as it was.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), OutputError> {
    let io = |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    };
    let parent = match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
        Some(parent) => parent,
        None => return Err(OutputError::NoParent(path.to_path_buf())),
    };

    // Same directory keeps the rename on one filesystem
    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(io)?;
    temp.write_all(content).map_err(io)?;
    temp.as_file().sync_all().map_err(io)?;
    temp.persist(path).map_err(|e| io(e.error))?;
    Ok(())
}
