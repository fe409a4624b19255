//! Pre-trial hooks that control cache state
//!
//! A trainer that builds a cache on first read is measured "cold" by
//! deleting the cache before every trial and "warm" by leaving it alone.

use crate::orchestrator::PreTrialHook;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Delete `path` if it is a file; absence is not an error.
///
/// Returns whether a file was removed.
///
/// # Errors
///
/// Returns the IO error for anything other than "not found"
/// (e.g. permission denied).
pub fn remove_quietly(path: impl AsRef<Path>) -> io::Result<bool> {
    let path = path.as_ref();
    if !path.is_file() {
        return Ok(false);
    }
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Remove every path in `paths`, logging failures instead of returning them.
pub fn remove_all_quietly(paths: &[PathBuf]) {
    for path in paths {
        match remove_quietly(path) {
            Ok(true) => debug!(path = %path.display(), "removed"),
            Ok(false) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove"),
        }
    }
}

/// Hook that deletes `paths` before each trial (cold-cache measurement).
#[must_use]
pub fn remove_files_hook(paths: Vec<PathBuf>) -> PreTrialHook {
    Box::new(move || remove_all_quietly(&paths))
}
