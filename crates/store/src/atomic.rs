//! Atomic file overwrite.

use std::path::Path;

use crate::error::{StoreError, StoreResult};

/// Write `contents` to `path` without ever leaving a partially written
/// target: data goes to a temp file in the same directory first, then a
/// rename swaps it in. If anything fails midway the old content survives.
pub fn write_atomic(path: &Path, contents: &str) -> StoreResult<()> {
    let temp_path = path.with_extension("json.tmp");

    std::fs::write(&temp_path, contents.as_bytes()).map_err(|e| {
        tracing::error!(path = %temp_path.display(), error = %e, "Failed to write temp file");
        StoreError::Io(e)
    })?;

    std::fs::rename(&temp_path, path).map_err(|e| {
        // If rename fails, try to clean up the temp file (best effort).
        let _ = std::fs::remove_file(&temp_path);
        tracing::error!(
            from = %temp_path.display(),
            to = %path.display(),
            error = %e,
            "Failed to rename temp file to target"
        );
        StoreError::Io(e)
    })
}
