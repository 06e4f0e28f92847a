//! CLI argument definitions for m2push.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "m2push",
    version,
    about = "Publish the JARs and POMs of a local Maven repository to a remote repository",
    long_about = "m2push walks a local Maven repository (by default ~/.m2/repository) and \
                  uploads every main JAR and POM to a remote Maven repository with HTTP PUT, \
                  using a bounded pool of upload workers.\n\n\
                  Either all five positional arguments are given or none; with fewer the \
                  built-in defaults are used."
)]
pub struct Cli {
    /// Local repository root
    #[arg(value_name = "REPOSITORY_ROOT")]
    pub repository_root: Option<String>,

    /// Remote repository base URL
    #[arg(value_name = "REMOTE_URL")]
    pub remote_url: Option<String>,

    /// Username for HTTP basic auth
    #[arg(value_name = "USERNAME")]
    pub username: Option<String>,

    /// Password for HTTP basic auth
    #[arg(value_name = "PASSWORD")]
    pub password: Option<String>,

    /// "true" to upload only snapshot artifacts, anything else for releases only
    #[arg(value_name = "SNAPSHOTS_ONLY")]
    pub snapshots_only: Option<String>,

    /// Configuration file (default: ~/.m2push/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Upper bound on upload workers
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Upload queue capacity
    #[arg(long, value_name = "N")]
    pub queue_capacity: Option<usize>,

    /// Largest file that will be uploaded, in bytes
    #[arg(long, value_name = "BYTES")]
    pub max_file_size: Option<u64>,

    /// Exit non-zero if any upload failed
    #[arg(long)]
    pub strict: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Positional values in order, stopping at the first one not given.
    pub fn positionals(&self) -> Vec<String> {
        [
            &self.repository_root,
            &self.remote_url,
            &self.username,
            &self.password,
            &self.snapshots_only,
        ]
        .into_iter()
        .map_while(|v| v.clone())
        .collect()
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
