//! Remote Maven repository: URL layout and credentials.

use m2push_core::artifact::ArtifactKind;
use m2push_core::coordinate::ArtifactCoordinate;

/// The remote repository artifacts are deployed to.
#[derive(Clone)]
pub struct RemoteRepository {
    /// Base URL, always ending in exactly one `/`.
    pub url: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for RemoteRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteRepository")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl RemoteRepository {
    pub fn new(url: &str, username: &str, password: &str) -> Self {
        Self {
            url: normalize_base_url(url),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Standard Maven layout path for a given coordinate.
    ///
    /// `org.jetbrains.kotlinx:kotlinx-coroutines-core:1.8.0` becomes
    /// `org/jetbrains/kotlinx/kotlinx-coroutines-core/1.8.0`
    pub fn coordinate_path(group: &str, artifact: &str, version: &str) -> String {
        format!("{}/{}/{}", group.replace('.', "/"), artifact, version)
    }

    /// Full URL to a specific file within the repository.
    pub fn file_url(&self, coord: &ArtifactCoordinate, filename: &str) -> String {
        format!(
            "{}{}/{}",
            self.url,
            Self::coordinate_path(&coord.group_id, &coord.artifact_id, &coord.version),
            filename
        )
    }

    /// Deploy URL of the main JAR or POM: `{artifactId}-{version}.{ext}`.
    pub fn deploy_url(&self, coord: &ArtifactCoordinate, kind: ArtifactKind) -> String {
        let filename = format!(
            "{}-{}.{}",
            coord.artifact_id,
            coord.version,
            kind.extension()
        );
        self.file_url(coord, &filename)
    }
}

/// Trim whitespace and force exactly one trailing `/`.
pub fn normalize_base_url(url: &str) -> String {
    format!("{}/", url.trim().trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord() -> ArtifactCoordinate {
        ArtifactCoordinate {
            group_id: "com.acme".to_string(),
            artifact_id: "lib".to_string(),
            version: "1.0.0".to_string(),
        }
    }

    #[test]
    fn coordinate_path_replaces_dots() {
        let path = RemoteRepository::coordinate_path(
            "org.jetbrains.kotlinx",
            "kotlinx-coroutines-core",
            "1.8.0",
        );
        assert_eq!(path, "org/jetbrains/kotlinx/kotlinx-coroutines-core/1.8.0");
    }

    #[test]
    fn base_url_gets_exactly_one_slash() {
        assert_eq!(normalize_base_url("http://host/repo"), "http://host/repo/");
        assert_eq!(normalize_base_url("http://host/repo/"), "http://host/repo/");
        assert_eq!(normalize_base_url(" http://host/repo// "), "http://host/repo/");
    }

    #[test]
    fn jar_deploy_url() {
        let repo = RemoteRepository::new("http://host/repo/", "user", "pass");
        assert_eq!(
            repo.deploy_url(&coord(), ArtifactKind::Jar),
            "http://host/repo/com/acme/lib/1.0.0/lib-1.0.0.jar"
        );
    }

    #[test]
    fn pom_deploy_url_without_trailing_slash() {
        let repo = RemoteRepository::new("http://host/repo", "user", "pass");
        assert_eq!(
            repo.deploy_url(&coord(), ArtifactKind::Pom),
            "http://host/repo/com/acme/lib/1.0.0/lib-1.0.0.pom"
        );
    }

    #[test]
    fn deploy_url_uses_coordinates_not_file_name() {
        let repo = RemoteRepository::new("http://host/repo", "user", "pass");
        let snapshot = ArtifactCoordinate {
            group_id: "com.acme".to_string(),
            artifact_id: "lib".to_string(),
            version: "1.1.0-SNAPSHOT".to_string(),
        };
        assert!(repo
            .deploy_url(&snapshot, ArtifactKind::Jar)
            .ends_with("/com/acme/lib/1.1.0-SNAPSHOT/lib-1.1.0-SNAPSHOT.jar"));
    }

    #[test]
    fn debug_masks_the_password() {
        let repo = RemoteRepository::new("http://host", "user", "hunter2");
        let shown = format!("{repo:?}");
        assert!(shown.contains("user"));
        assert!(!shown.contains("hunter2"));
    }
}
