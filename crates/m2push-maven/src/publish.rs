//! Publishing a single artifact with retry.
//!
//! The file is read into memory once; each attempt resends the same bytes.
//! Attempts are separated by a linear backoff (`attempt × base_delay`). A
//! cancelled backoff ends the task immediately with
//! [`M2PushError::Interrupted`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;

use m2push_core::artifact::ArtifactFile;
use m2push_core::coordinate::ArtifactCoordinate;
use m2push_core::metrics::RunMetrics;
use m2push_util::cancel::CancelToken;
use m2push_util::errors::M2PushError;
use m2push_util::progress::{format_bytes, format_speed};

use crate::repository::RemoteRepository;
use crate::upload::ArtifactUploader;

/// Waits between attempts. Returning an error aborts the task.
pub trait Pause: Send + Sync {
    fn pause(&self, duration: Duration) -> Result<(), M2PushError>;
}

impl Pause for CancelToken {
    fn pause(&self, duration: Duration) -> Result<(), M2PushError> {
        self.sleep(duration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay after the failed `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// One file to publish under its resolved coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub coordinate: ArtifactCoordinate,
    pub file: ArtifactFile,
}

/// What a successful upload reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub url: String,
    pub bytes: u64,
    pub attempts: u32,
    pub bytes_per_second: u64,
}

/// Runs the upload-with-retry protocol for [`UploadTask`]s.
pub struct Publisher {
    uploader: Arc<dyn ArtifactUploader>,
    repo: RemoteRepository,
    policy: RetryPolicy,
    max_file_size: u64,
    metrics: Arc<RunMetrics>,
}

impl Publisher {
    pub fn new(
        uploader: Arc<dyn ArtifactUploader>,
        repo: RemoteRepository,
        policy: RetryPolicy,
        max_file_size: u64,
        metrics: Arc<RunMetrics>,
    ) -> Self {
        Self {
            uploader,
            repo,
            policy,
            max_file_size,
            metrics,
        }
    }

    /// Publish one artifact.
    ///
    /// Every permanent failure (unreadable file, oversized file, exhausted
    /// attempts) increments the failure counter exactly once. Interruption
    /// is counted as cancelled instead.
    pub fn publish(
        &self,
        task: &UploadTask,
        pause: &dyn Pause,
    ) -> Result<UploadReceipt, M2PushError> {
        let url = self.repo.deploy_url(&task.coordinate, task.file.kind);
        match self.try_publish(task, &url, pause) {
            Ok(receipt) => Ok(receipt),
            Err(M2PushError::Interrupted) => {
                self.metrics.record_cancelled();
                Err(M2PushError::Interrupted)
            }
            Err(e) => {
                self.metrics.record_failure();
                Err(e)
            }
        }
    }

    fn try_publish(
        &self,
        task: &UploadTask,
        url: &str,
        pause: &dyn Pause,
    ) -> Result<UploadReceipt, M2PushError> {
        let path = &task.file.path;
        let size = std::fs::metadata(path)?.len();
        if size > self.max_file_size {
            return Err(M2PushError::FileTooLarge {
                path: path.clone(),
                size,
                limit: self.max_file_size,
            });
        }

        let body = Bytes::from(std::fs::read(path)?);
        let bytes = body.len() as u64;
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_err: Option<M2PushError> = None;

        for attempt in 1..=max_attempts {
            let started = Instant::now();
            match self.uploader.put(url, body.clone()) {
                Ok(200) | Ok(201) => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    let bytes_per_second = if elapsed_ms > 0 {
                        bytes.saturating_mul(1000) / elapsed_ms
                    } else {
                        0
                    };
                    let (files, total) = self.metrics.record_upload(bytes);
                    tracing::info!(
                        "Uploaded {} ({}) - {}, total {} in {} file(s), {:.2}s elapsed",
                        task.file.file_name(),
                        format_bytes(bytes),
                        format_speed(bytes_per_second),
                        format_bytes(total),
                        files,
                        self.metrics.elapsed().as_secs_f64(),
                    );
                    return Ok(UploadReceipt {
                        url: url.to_string(),
                        bytes,
                        attempts: attempt,
                        bytes_per_second,
                    });
                }
                Ok(status) => {
                    last_err = Some(M2PushError::TransientUploadFailure {
                        url: url.to_string(),
                        status,
                    });
                }
                Err(e) => last_err = Some(e),
            }

            if let Some(e) = &last_err {
                tracing::warn!(
                    "Upload attempt {attempt}/{max_attempts} failed for {}: {e}",
                    task.file.file_name()
                );
            }
            if attempt < max_attempts {
                pause.pause(self.policy.delay_after(attempt))?;
            }
        }

        Err(M2PushError::UploadExhausted {
            url: url.to_string(),
            attempts: max_attempts,
            last: last_err.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::Mutex;

    use m2push_core::artifact::ArtifactKind;
    use tempfile::TempDir;

    enum Reply {
        Status(u16),
        Drop,
    }

    struct ScriptedUploader {
        replies: Mutex<VecDeque<Reply>>,
        calls: Mutex<Vec<(String, Vec<u8>)>>,
        buffers: Mutex<Vec<usize>>,
    }

    impl ScriptedUploader {
        fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
                buffers: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, Vec<u8>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ArtifactUploader for ScriptedUploader {
        fn put(&self, url: &str, body: Bytes) -> Result<u16, M2PushError> {
            self.calls.lock().unwrap().push((url.to_string(), body.to_vec()));
            self.buffers.lock().unwrap().push(body.as_ptr() as usize);
            match self.replies.lock().unwrap().pop_front() {
                Some(Reply::Status(s)) => Ok(s),
                Some(Reply::Drop) | None => Err(M2PushError::Network {
                    message: "connection reset".to_string(),
                }),
            }
        }
    }

    #[derive(Default)]
    struct RecordingPause {
        waits: Mutex<Vec<Duration>>,
        interrupt: bool,
    }

    impl Pause for RecordingPause {
        fn pause(&self, duration: Duration) -> Result<(), M2PushError> {
            self.waits.lock().unwrap().push(duration);
            if self.interrupt {
                Err(M2PushError::Interrupted)
            } else {
                Ok(())
            }
        }
    }

    struct Fixture {
        _tmp: TempDir,
        task: UploadTask,
        metrics: Arc<RunMetrics>,
    }

    fn fixture(contents: &[u8]) -> Fixture {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("com/acme/lib/1.0.0");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("lib-1.0.0.jar");
        std::fs::write(&path, contents).unwrap();
        Fixture {
            task: task_for(&path, contents.len() as u64),
            _tmp: tmp,
            metrics: Arc::new(RunMetrics::new()),
        }
    }

    fn task_for(path: &Path, size: u64) -> UploadTask {
        UploadTask {
            coordinate: ArtifactCoordinate {
                group_id: "com.acme".to_string(),
                artifact_id: "lib".to_string(),
                version: "1.0.0".to_string(),
            },
            file: ArtifactFile {
                path: path.to_path_buf(),
                kind: ArtifactKind::Jar,
                size,
                snapshot: false,
            },
        }
    }

    fn publisher(
        uploader: Arc<ScriptedUploader>,
        metrics: &Arc<RunMetrics>,
        limit: u64,
    ) -> Publisher {
        Publisher::new(
            uploader,
            RemoteRepository::new("http://host/repo/", "user", "pass"),
            RetryPolicy::default(),
            limit,
            Arc::clone(metrics),
        )
    }

    const URL: &str = "http://host/repo/com/acme/lib/1.0.0/lib-1.0.0.jar";

    #[test]
    fn first_attempt_success() {
        let fx = fixture(b"jar-bytes");
        let uploader = Arc::new(ScriptedUploader::new(vec![Reply::Status(201)]));
        let pause = RecordingPause::default();
        let receipt = publisher(Arc::clone(&uploader), &fx.metrics, 1024)
            .publish(&fx.task, &pause)
            .unwrap();

        assert_eq!(receipt.url, URL);
        assert_eq!(receipt.bytes, 9);
        assert_eq!(receipt.attempts, 1);
        assert_eq!(uploader.calls(), vec![(URL.to_string(), b"jar-bytes".to_vec())]);
        assert!(pause.waits.lock().unwrap().is_empty());
        assert_eq!(fx.metrics.uploaded_files(), 1);
        assert_eq!(fx.metrics.uploaded_bytes(), 9);
    }

    #[test]
    fn retries_resend_the_buffer_read_once() {
        let fx = fixture(b"jar-bytes");
        let uploader = Arc::new(ScriptedUploader::new(vec![
            Reply::Status(500),
            Reply::Drop,
            Reply::Status(201),
        ]));
        publisher(Arc::clone(&uploader), &fx.metrics, 1024)
            .publish(&fx.task, &RecordingPause::default())
            .unwrap();

        let buffers = uploader.buffers.lock().unwrap().clone();
        assert_eq!(buffers.len(), 3);
        assert!(buffers.iter().all(|&ptr| ptr == buffers[0]));
    }

    #[test]
    fn two_failures_then_success_backs_off_linearly() {
        let fx = fixture(b"abc");
        let uploader = Arc::new(ScriptedUploader::new(vec![
            Reply::Status(500),
            Reply::Drop,
            Reply::Status(200),
        ]));
        let pause = RecordingPause::default();
        let receipt = publisher(Arc::clone(&uploader), &fx.metrics, 1024)
            .publish(&fx.task, &pause)
            .unwrap();

        assert_eq!(receipt.attempts, 3);
        assert_eq!(
            *pause.waits.lock().unwrap(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
        let calls = uploader.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|(_, body)| body == b"abc"));
        assert_eq!(fx.metrics.failed_uploads(), 0);
        assert_eq!(fx.metrics.uploaded_files(), 1);
    }

    #[test]
    fn exhausted_after_three_attempts() {
        let fx = fixture(b"abc");
        let uploader = Arc::new(ScriptedUploader::new(vec![
            Reply::Status(503),
            Reply::Status(503),
            Reply::Status(401),
            Reply::Status(201),
        ]));
        let pause = RecordingPause::default();
        let err = publisher(Arc::clone(&uploader), &fx.metrics, 1024)
            .publish(&fx.task, &pause)
            .unwrap_err();

        match err {
            M2PushError::UploadExhausted { url, attempts, last } => {
                assert_eq!(url, URL);
                assert_eq!(attempts, 3);
                assert!(last.contains("401"), "{last}");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(uploader.calls().len(), 3);
        assert_eq!(pause.waits.lock().unwrap().len(), 2);
        assert_eq!(fx.metrics.failed_uploads(), 1);
        assert_eq!(fx.metrics.uploaded_files(), 0);
    }

    #[test]
    fn oversized_file_is_a_counted_failure_without_upload() {
        let fx = fixture(b"0123456789");
        let uploader = Arc::new(ScriptedUploader::new(vec![Reply::Status(201)]));
        let pause = RecordingPause::default();
        let err = publisher(Arc::clone(&uploader), &fx.metrics, 5)
            .publish(&fx.task, &pause)
            .unwrap_err();

        assert!(matches!(
            err,
            M2PushError::FileTooLarge {
                size: 10,
                limit: 5,
                ..
            }
        ));
        assert!(uploader.calls().is_empty());
        assert_eq!(fx.metrics.failed_uploads(), 1);
    }

    #[test]
    fn file_at_limit_is_uploaded() {
        let fx = fixture(b"12345");
        let uploader = Arc::new(ScriptedUploader::new(vec![Reply::Status(200)]));
        let pause = RecordingPause::default();
        assert!(publisher(uploader, &fx.metrics, 5)
            .publish(&fx.task, &pause)
            .is_ok());
    }

    #[test]
    fn interrupted_backoff_stops_immediately() {
        let fx = fixture(b"abc");
        let uploader = Arc::new(ScriptedUploader::new(vec![
            Reply::Status(500),
            Reply::Status(201),
        ]));
        let pause = RecordingPause {
            interrupt: true,
            ..Default::default()
        };
        let err = publisher(Arc::clone(&uploader), &fx.metrics, 1024)
            .publish(&fx.task, &pause)
            .unwrap_err();

        assert!(matches!(err, M2PushError::Interrupted));
        assert_eq!(uploader.calls().len(), 1);
        assert_eq!(fx.metrics.failed_uploads(), 0);
        assert_eq!(fx.metrics.snapshot().cancelled_uploads, 1);
    }

    #[test]
    fn missing_file_is_a_counted_failure() {
        let fx = fixture(b"abc");
        std::fs::remove_file(&fx.task.file.path).unwrap();
        let uploader = Arc::new(ScriptedUploader::new(vec![]));
        let pause = RecordingPause::default();
        let err = publisher(Arc::clone(&uploader), &fx.metrics, 1024)
            .publish(&fx.task, &pause)
            .unwrap_err();

        assert!(matches!(err, M2PushError::Io(_)));
        assert!(uploader.calls().is_empty());
        assert_eq!(fx.metrics.failed_uploads(), 1);
    }

    #[test]
    fn delay_grows_linearly() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(250),
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(250));
        assert_eq!(policy.delay_after(4), Duration::from_secs(1));
    }

    #[test]
    fn cancel_token_pause_reports_interruption() {
        let (canceller, token) = m2push_util::cancel::cancel_pair();
        canceller.cancel();
        assert!(matches!(
            token.pause(Duration::from_secs(10)),
            Err(M2PushError::Interrupted)
        ));
    }
}
