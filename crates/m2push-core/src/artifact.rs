use std::path::PathBuf;

/// The kinds of file m2push publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Jar,
    Pom,
}

impl ArtifactKind {
    /// Classify a file name. Source JARs and everything that is neither a
    /// `.jar` nor a `.pom` yield `None`.
    pub fn classify(file_name: &str) -> Option<Self> {
        if file_name.ends_with(".jar") && !file_name.ends_with("-sources.jar") {
            Some(Self::Jar)
        } else if file_name.ends_with(".pom") {
            Some(Self::Pom)
        } else {
            None
        }
    }

    /// File extension used in the remote file name.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jar => "jar",
            Self::Pom => "pom",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Whether a file name marks a snapshot build (case-insensitive).
pub fn is_snapshot_name(file_name: &str) -> bool {
    file_name.to_lowercase().contains("snapshot")
}

/// Which half of the repository a run publishes. There is no "both" mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotFilter {
    #[default]
    ReleasesOnly,
    SnapshotsOnly,
}

impl SnapshotFilter {
    pub fn from_snapshots_only(snapshots_only: bool) -> Self {
        if snapshots_only {
            Self::SnapshotsOnly
        } else {
            Self::ReleasesOnly
        }
    }

    pub fn accepts(self, file_name: &str) -> bool {
        match self {
            Self::SnapshotsOnly => is_snapshot_name(file_name),
            Self::ReleasesOnly => !is_snapshot_name(file_name),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ReleasesOnly => "releases only",
            Self::SnapshotsOnly => "snapshots only",
        }
    }
}

/// A file discovered in the local repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub path: PathBuf,
    pub kind: ArtifactKind,
    pub size: u64,
    pub snapshot: bool,
}

impl ArtifactFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
