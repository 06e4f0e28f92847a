//! Repository tree scanning.

use std::path::Path;

use m2push_core::artifact::{is_snapshot_name, ArtifactFile, ArtifactKind, SnapshotFilter};
use m2push_util::errors::M2PushError;
use walkdir::WalkDir;

/// What a scan saw, beyond the candidates it handed out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub candidates: u64,
    /// JAR/POM files excluded by the snapshot filter.
    pub filtered_out: u64,
    /// Files that are not publishable artifacts.
    pub ignored: u64,
    /// Entries that could not be read.
    pub errors: u64,
}

/// Walk `root` and call `visit` for every JAR/POM the filter accepts.
///
/// Symlinks are not followed. Entries are visited in file-name order.
/// Unreadable entries are logged and skipped; an error from `visit` stops
/// the walk and is returned.
pub fn scan<F>(
    root: &Path,
    filter: SnapshotFilter,
    mut visit: F,
) -> Result<ScanStats, M2PushError>
where
    F: FnMut(ArtifactFile) -> Result<(), M2PushError>,
{
    let mut stats = ScanStats::default();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {e}");
                stats.errors += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(kind) = ArtifactKind::classify(&name) else {
            stats.ignored += 1;
            continue;
        };
        if !filter.accepts(&name) {
            stats.filtered_out += 1;
            continue;
        }

        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                tracing::warn!("Skipping {}: {e}", entry.path().display());
                stats.errors += 1;
                continue;
            }
        };

        stats.candidates += 1;
        visit(ArtifactFile {
            path: entry.into_path(),
            kind,
            size,
            snapshot: is_snapshot_name(&name),
        })?;
    }

    Ok(stats)
}
