//! Blocking HTTP transport for artifact uploads.

use std::time::Duration;

use bytes::Bytes;
use m2push_core::config::HttpConfig;
use m2push_util::errors::M2PushError;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use crate::repository::RemoteRepository;

/// Content type sent with every upload, POMs included.
pub const JAR_CONTENT_TYPE: &str = "application/java-archive";

/// A blocking, synchronous file uploader.
///
/// `put` returns the HTTP status the server answered with, or a
/// [`M2PushError::Network`] when no response was received. Interpreting the
/// status is the caller's job. `body` is shared, so retries resend the same
/// buffer.
pub trait ArtifactUploader: Send + Sync {
    fn put(&self, url: &str, body: Bytes) -> Result<u16, M2PushError>;
}

/// Build a shared blocking client for uploads.
pub fn build_client(config: &HttpConfig, max_idle_per_host: usize) -> miette::Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .timeout(Duration::from_secs(config.timeout_secs))
        .pool_max_idle_per_host(max_idle_per_host)
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| {
            M2PushError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            }
            .into()
        })
}

/// [`ArtifactUploader`] backed by `reqwest`'s blocking client, sending the
/// repository's credentials as HTTP basic auth.
#[derive(Debug, Clone)]
pub struct HttpUploader {
    client: Client,
    repo: RemoteRepository,
}

impl HttpUploader {
    pub fn new(client: Client, repo: RemoteRepository) -> Self {
        Self { client, repo }
    }
}

impl ArtifactUploader for HttpUploader {
    fn put(&self, url: &str, body: Bytes) -> Result<u16, M2PushError> {
        let resp = self
            .client
            .put(url)
            .header(CONTENT_TYPE, JAR_CONTENT_TYPE)
            .basic_auth(&self.repo.username, Some(&self.repo.password))
            .body(body)
            .send()
            .map_err(|e| M2PushError::Network {
                message: format!("PUT {url} failed: {e}"),
            })?;
        Ok(resp.status().as_u16())
    }
}
