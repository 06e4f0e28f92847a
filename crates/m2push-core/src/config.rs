use std::path::{Path, PathBuf};
use std::time::Duration;

use m2push_util::errors::M2PushError;
use serde::{Deserialize, Serialize};

use crate::artifact::SnapshotFilter;

/// Default local repository, relative to the home directory.
pub const DEFAULT_REPOSITORY_ROOT: &str = "~/.m2/repository";
pub const DEFAULT_REMOTE_URL: &str = "http://localhost:8081/repository/maven-releases/";
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "admin123";

/// Global user configuration loaded from `~/.m2push/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

/// Worker pool and retry settings from `[upload]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_threads", rename = "max-threads")]
    pub max_threads: usize,
    #[serde(default = "default_queue_capacity", rename = "queue-capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_max_file_size", rename = "max-file-size")]
    pub max_file_size: u64,
    #[serde(default = "default_max_attempts", rename = "max-attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_ms", rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_threads: default_max_threads(),
            queue_capacity: default_queue_capacity(),
            max_file_size: default_max_file_size(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl UploadConfig {
    /// Worker count: twice the available parallelism, capped at `max_threads`.
    pub fn worker_count(&self) -> usize {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        (parallelism * 2).min(self.max_threads).max(1)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

fn default_max_threads() -> usize {
    20
}

fn default_queue_capacity() -> usize {
    1000
}

fn default_max_file_size() -> u64 {
    1024 * 1024 * 1024
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

/// Drain and shutdown timing from `[run]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_drain_poll_ms", rename = "drain-poll-ms")]
    pub drain_poll_ms: u64,
    #[serde(default = "default_shutdown_timeout_secs", rename = "shutdown-timeout-secs")]
    pub shutdown_timeout_secs: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            drain_poll_ms: default_drain_poll_ms(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl RunConfig {
    pub fn drain_poll_interval(&self) -> Duration {
        Duration::from_millis(self.drain_poll_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn default_drain_poll_ms() -> u64 {
    1000
}

fn default_shutdown_timeout_secs() -> u64 {
    60 * 60
}

/// HTTP client settings from `[http]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout_secs", rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_timeout_secs", rename = "timeout-secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent", rename = "user-agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_user_agent() -> String {
    format!("m2push/{}", env!("CARGO_PKG_VERSION"))
}

impl GlobalConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist and parse. Without one, the default
    /// `~/.m2push/config.toml` is used if present, otherwise defaults.
    pub fn load(path: Option<&Path>) -> miette::Result<Self> {
        match path {
            Some(p) => Self::from_path(p),
            None => {
                let default = Self::default_path();
                if default.is_file() {
                    Self::from_path(&default)
                } else {
                    tracing::debug!("No configuration file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_path(path: &Path) -> miette::Result<Self> {
        tracing::debug!("Loading configuration from {}", path.display());
        let content =
            std::fs::read_to_string(path).map_err(|e| M2PushError::InvalidConfiguration {
                message: format!("Failed to read config {}: {e}", path.display()),
            })?;
        Self::parse(&content).map_err(|e| {
            M2PushError::InvalidConfiguration {
                message: format!("Failed to parse config {}: {e}", path.display()),
            }
            .into()
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }
}

/// Returns the path to the m2push data directory (`~/.m2push/`).
pub fn dirs_path() -> PathBuf {
    m2push_util::fs::home_dir().join(".m2push")
}

/// The five entry parameters of a run.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadParams {
    pub repository_root: PathBuf,
    pub remote_url: String,
    pub username: String,
    pub password: String,
    pub snapshots_only: bool,
}

impl std::fmt::Debug for UploadParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadParams")
            .field("repository_root", &self.repository_root)
            .field("remote_url", &self.remote_url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("snapshots_only", &self.snapshots_only)
            .finish()
    }
}

impl Default for UploadParams {
    fn default() -> Self {
        Self {
            repository_root: m2push_util::fs::expand_home(DEFAULT_REPOSITORY_ROOT),
            remote_url: DEFAULT_REMOTE_URL.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            snapshots_only: false,
        }
    }
}

impl UploadParams {
    /// Build from positional values. All five are required together; with
    /// fewer the defaults are returned and `None` signals the caller to print
    /// usage.
    pub fn from_positional(values: &[String]) -> Option<Self> {
        match values {
            [root, url, user, pass, snapshots, ..] => Some(Self {
                repository_root: m2push_util::fs::expand_home(root),
                remote_url: url.clone(),
                username: user.clone(),
                password: pass.clone(),
                snapshots_only: parse_flag(snapshots),
            }),
            _ => None,
        }
    }

    pub fn filter(&self) -> SnapshotFilter {
        SnapshotFilter::from_snapshots_only(self.snapshots_only)
    }

    /// Reject blank parameters.
    pub fn validate(&self) -> Result<(), M2PushError> {
        let checks = [
            (
                "repository root",
                self.repository_root.as_os_str().is_empty()
                    || self.repository_root.to_string_lossy().trim().is_empty(),
            ),
            ("remote URL", self.remote_url.trim().is_empty()),
            ("username", self.username.trim().is_empty()),
            ("password", self.password.trim().is_empty()),
        ];
        for (name, blank) in checks {
            if blank {
                return Err(M2PushError::InvalidConfiguration {
                    message: format!("{name} cannot be empty"),
                });
            }
        }
        Ok(())
    }
}

/// `"true"` in any case is true; everything else is false.
pub fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}
