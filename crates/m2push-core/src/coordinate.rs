use std::path::{Component, Path};

use m2push_util::errors::M2PushError;

/// Maven coordinates derived from an artifact's place in a repository tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactCoordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl ArtifactCoordinate {
    /// Resolve coordinates from `file`'s location under `root`.
    ///
    /// The layout is `group/segments/artifactId/version/file`: the two
    /// directories directly above the file are the version and artifactId,
    /// and everything between the root and the artifactId joins with `.`
    /// into the groupId.
    ///
    /// `file` may be prefixed by `root` or already relative to it.
    pub fn from_repository_path(root: &Path, file: &Path) -> Result<Self, M2PushError> {
        let relative = match file.strip_prefix(root) {
            Ok(rel) => rel,
            Err(_) if file.is_relative() => file,
            Err(_) => return Err(layout_error(file, "not under the repository root")),
        };

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    let part = part
                        .to_str()
                        .ok_or_else(|| layout_error(file, "path segment is not valid UTF-8"))?;
                    segments.push(part);
                }
                Component::CurDir => {}
                _ => return Err(layout_error(file, "unexpected path component")),
            }
        }

        // file name, version, artifactId, and at least one group segment
        if segments.len() < 4 {
            return Err(layout_error(
                file,
                &format!(
                    "expected group/artifact/version/file, found {} segment(s)",
                    segments.len()
                ),
            ));
        }

        let n = segments.len();
        Ok(Self {
            group_id: segments[..n - 3].join("."),
            artifact_id: segments[n - 3].to_string(),
            version: segments[n - 2].to_string(),
        })
    }
}

impl std::fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

fn layout_error(file: &Path, reason: &str) -> M2PushError {
    M2PushError::InvalidArtifactLayout {
        path: file.to_path_buf(),
        reason: reason.to_string(),
    }
}
