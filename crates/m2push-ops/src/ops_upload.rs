//! Operation: publish a local repository tree to a remote repository.
//!
//! A run moves through `Idle → Scanning → Draining → ShuttingDown →
//! Terminated`. The scan happens on the calling thread and feeds the worker
//! pool; once the tree is walked the coordinator waits for the pool to go
//! idle, shuts it down with a bounded wait, and reports the totals.

use std::sync::Arc;
use std::time::Duration;

use m2push_core::config::{GlobalConfig, UploadParams};
use m2push_core::coordinate::ArtifactCoordinate;
use m2push_core::metrics::{MetricsSnapshot, RunMetrics};
use m2push_maven::publish::{Publisher, RetryPolicy, UploadTask};
use m2push_maven::repository::RemoteRepository;
use m2push_maven::upload::{build_client, ArtifactUploader, HttpUploader};
use m2push_util::cancel::{cancel_pair, CancelToken, Canceller};
use m2push_util::errors::{M2PushError, M2PushResult};
use m2push_util::progress::{format_bytes, spinner, status, status_info, status_warn};

use crate::pool::WorkerPool;
use crate::scan::{scan, ScanStats};

/// How long an aborted run waits for workers before giving up on them.
const ABORT_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Scanning,
    Draining,
    ShuttingDown,
    Terminated,
}

/// Totals reported at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub metrics: MetricsSnapshot,
    pub scan: ScanStats,
    /// `false` if the shutdown wait timed out and workers were abandoned.
    pub clean_shutdown: bool,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.metrics.failed_uploads > 0
    }
}

/// One publishing run against one remote repository.
pub struct UploadRun {
    params: UploadParams,
    config: GlobalConfig,
    uploader: Arc<dyn ArtifactUploader>,
    state: RunState,
    canceller: Canceller,
    cancel: CancelToken,
}

impl UploadRun {
    pub fn new(
        params: UploadParams,
        config: GlobalConfig,
        uploader: Arc<dyn ArtifactUploader>,
    ) -> Self {
        let (canceller, cancel) = cancel_pair();
        Self {
            params,
            config,
            uploader,
            state: RunState::Idle,
            canceller,
            cancel,
        }
    }

    /// A run that uploads over HTTP with the parameters' credentials.
    pub fn with_http(params: UploadParams, config: GlobalConfig) -> M2PushResult<Self> {
        let client = build_client(&config.http, config.upload.worker_count())?;
        let repo = remote_repository(&params);
        let uploader = Arc::new(HttpUploader::new(client, repo));
        Ok(Self::new(params, config, uploader))
    }

    /// Handle for cancelling the run from another thread (e.g. Ctrl-C).
    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn enter(&mut self, next: RunState) {
        tracing::debug!("Run state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Execute the run to completion.
    ///
    /// Configuration and repository-root problems fail before any worker is
    /// started. Per-file failures are counted in the summary, never returned.
    /// Cancellation returns [`M2PushError::Interrupted`] after a best-effort
    /// shutdown of the pool.
    pub fn execute(&mut self) -> M2PushResult<RunSummary> {
        self.params.validate()?;
        let root = self.params.repository_root.clone();
        m2push_util::fs::require_dir(&root)?;

        let metrics = Arc::new(RunMetrics::new());
        let publisher = Arc::new(Publisher::new(
            Arc::clone(&self.uploader),
            remote_repository(&self.params),
            RetryPolicy {
                max_attempts: self.config.upload.max_attempts,
                base_delay: self.config.upload.retry_delay(),
            },
            self.config.upload.max_file_size,
            Arc::clone(&metrics),
        ));

        let workers = self.config.upload.worker_count();
        let capacity = self.config.upload.queue_capacity;
        let handler = {
            let metrics = Arc::clone(&metrics);
            let cancel = self.cancel.clone();
            move |task: UploadTask| run_task(&publisher, &metrics, &cancel, &task)
        };
        let mut pool = WorkerPool::start(workers, capacity, self.cancel.clone(), handler)?;

        self.enter(RunState::Scanning);
        tracing::info!("Starting upload from repository: {}", root.display());
        let scanned = scan(&root, self.params.filter(), |file| {
            match ArtifactCoordinate::from_repository_path(&root, &file.path) {
                Ok(coordinate) => {
                    tracing::debug!("Submitting upload task for {}", file.path.display());
                    pool.submit(UploadTask { coordinate, file })
                }
                Err(e) => {
                    tracing::warn!("Skipping {e}");
                    metrics.record_skipped();
                    Ok(())
                }
            }
        });
        let scan_stats = match scanned {
            Ok(stats) => stats,
            Err(e) => return Err(self.abort(&mut pool, e).into()),
        };
        tracing::debug!(
            "Scan finished: {} candidate(s), {} filtered out, {} ignored, {} unreadable",
            scan_stats.candidates,
            scan_stats.filtered_out,
            scan_stats.ignored,
            scan_stats.errors
        );

        self.enter(RunState::Draining);
        let sp = spinner("Waiting for uploads to complete...");
        let drained = pool.wait_idle(self.config.run.drain_poll_interval(), |active, pending| {
            tracing::debug!("Waiting for {active} active upload(s), {pending} pending");
            sp.set_message(format!(
                "Waiting for {active} active upload(s), {pending} pending..."
            ));
        });
        sp.finish_and_clear();
        if let Err(e) = drained {
            return Err(self.abort(&mut pool, e).into());
        }

        self.enter(RunState::ShuttingDown);
        let clean_shutdown = pool.shutdown(self.config.run.shutdown_timeout());
        if !clean_shutdown {
            tracing::warn!("Timeout while waiting for uploads to complete");
        }

        self.enter(RunState::Terminated);
        if !pool.is_terminated() {
            self.canceller.cancel();
        }

        Ok(RunSummary {
            metrics: metrics.snapshot(),
            scan: scan_stats,
            clean_shutdown,
        })
    }

    /// Cancel in-flight work, give workers a short grace period, and hand
    /// back the error that caused the abort.
    fn abort<T: Send + 'static>(
        &mut self,
        pool: &mut WorkerPool<T>,
        cause: M2PushError,
    ) -> M2PushError {
        tracing::error!("Upload process aborted: {cause}");
        self.canceller.cancel();
        self.enter(RunState::ShuttingDown);
        if !pool.shutdown(ABORT_GRACE) {
            tracing::warn!("Some uploads were still running when the run was aborted");
        }
        self.enter(RunState::Terminated);
        cause
    }
}

fn run_task(
    publisher: &Publisher,
    metrics: &RunMetrics,
    cancel: &CancelToken,
    task: &UploadTask,
) {
    if cancel.is_cancelled() {
        metrics.record_cancelled();
        return;
    }
    match publisher.publish(task, cancel) {
        Ok(_) => {}
        Err(M2PushError::Interrupted) => {
            tracing::debug!("Upload of {} cancelled", task.file.path.display());
        }
        Err(e) => {
            tracing::error!(
                "Failed to upload {} file {}: {e}",
                task.file.kind.extension().to_uppercase(),
                task.file.file_name()
            );
        }
    }
}

fn remote_repository(params: &UploadParams) -> RemoteRepository {
    RemoteRepository::new(&params.remote_url, &params.username, &params.password)
}

/// Print the settings a run is about to use. The password is never shown.
pub fn print_banner(params: &UploadParams, config: &GlobalConfig) {
    status_info("Repository", &params.repository_root.display().to_string());
    status_info("Remote", &params.remote_url);
    status_info("User", &params.username);
    status_info("Mode", params.filter().label());
    status_info(
        "Workers",
        &format!(
            "{} (queue capacity {})",
            config.upload.worker_count(),
            config.upload.queue_capacity
        ),
    );
    status_info("Size limit", &format_bytes(config.upload.max_file_size));
}

/// Print the end-of-run summary.
pub fn report_summary(summary: &RunSummary) {
    let m = &summary.metrics;
    status(
        "Uploaded",
        &format!(
            "{} file(s), {} in {:.2}s",
            m.uploaded_files,
            format_bytes(m.uploaded_bytes),
            m.elapsed.as_secs_f64()
        ),
    );
    if m.failed_uploads > 0 {
        status_warn("Failed", &format!("{} file(s)", m.failed_uploads));
    }
    if m.skipped_paths > 0 {
        status_warn(
            "Skipped",
            &format!(
                "{} file(s) outside the group/artifact/version layout",
                m.skipped_paths
            ),
        );
    }
    if m.cancelled_uploads > 0 {
        status_warn("Cancelled", &format!("{} upload(s)", m.cancelled_uploads));
    }
}
