use std::path::{Path, PathBuf};

use crate::errors::M2PushError;

/// The current user's home directory, falling back to `.` when unknown.
pub fn home_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return home_dir();
    }
    match path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        Some(rest) => home_dir().join(rest),
        None => PathBuf::from(path),
    }
}

/// Check that `path` exists and is a directory.
pub fn require_dir(path: &Path) -> Result<(), M2PushError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(M2PushError::InvalidRepositoryRoot {
            path: path.to_path_buf(),
            reason: "not a directory".to_string(),
        }),
        Err(e) => Err(M2PushError::InvalidRepositoryRoot {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}
