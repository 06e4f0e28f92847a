use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all m2push operations.
#[derive(Debug, Error, Diagnostic)]
pub enum M2PushError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required parameter is missing or blank, or the config file is unusable.
    #[error("Invalid configuration: {message}")]
    #[diagnostic(help(
        "Usage: m2push <REPOSITORY_ROOT> <REMOTE_URL> <USERNAME> <PASSWORD> <SNAPSHOTS_ONLY>"
    ))]
    InvalidConfiguration { message: String },

    /// The local repository root is missing or not a directory.
    #[error("Invalid repository root {}: {reason}", path.display())]
    #[diagnostic(help("Point REPOSITORY_ROOT at a Maven repository, e.g. ~/.m2/repository"))]
    InvalidRepositoryRoot { path: PathBuf, reason: String },

    /// A file does not sit in a `group/.../artifact/version/file` layout.
    #[error("Invalid artifact layout for {}: {reason}", path.display())]
    InvalidArtifactLayout { path: PathBuf, reason: String },

    /// A file exceeds the configured upload size limit.
    #[error("{} is {size} bytes, exceeding the {limit} byte limit", path.display())]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    /// The remote answered an upload attempt with a non-success status.
    #[error("HTTP {status} uploading to {url}")]
    TransientUploadFailure { url: String, status: u16 },

    /// Network request failed at the transport level.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Every upload attempt for a file failed.
    #[error("Upload to {url} failed after {attempts} attempts: {last}")]
    UploadExhausted {
        url: String,
        attempts: u32,
        last: String,
    },

    /// The run was cancelled while waiting.
    #[error("Interrupted")]
    Interrupted,

    /// Strict mode: the run finished but some uploads failed permanently.
    #[error("{count} upload(s) failed")]
    UploadsFailed { count: u64 },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type M2PushResult<T> = miette::Result<T>;
