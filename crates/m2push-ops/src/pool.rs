//! Fixed-size worker pool draining a bounded queue.
//!
//! Submission blocks while the queue is full, so a producer can never get
//! more than `capacity` jobs ahead of the workers. Jobs are neither dropped
//! nor rejected; the only way out of a blocked submit is cancellation.
//!
//! ```text
//! producer ──submit──▶ [ bounded queue ] ──▶ worker 0..N ──▶ handler(job)
//!                                              │
//!                                  active / pending counters
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, select, Receiver, RecvTimeoutError, Sender};
use m2push_util::cancel::CancelToken;
use m2push_util::errors::M2PushError;

#[derive(Debug, Default)]
struct Counters {
    /// Jobs held by a worker right now.
    active: AtomicUsize,
    /// Jobs submitted and not yet finished, queued or active.
    pending: AtomicUsize,
}

/// Marks a job active for as long as it lives, so the counters are restored
/// even if the handler panics.
struct ActiveGuard<'a>(&'a Counters);

impl<'a> ActiveGuard<'a> {
    fn enter(counters: &'a Counters) -> Self {
        counters.active.fetch_add(1, Ordering::SeqCst);
        Self(counters)
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
        self.0.pending.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct WorkerPool<T: Send + 'static> {
    sender: Option<Sender<T>>,
    counters: Arc<Counters>,
    exited_rx: Receiver<usize>,
    exited: usize,
    handles: Vec<JoinHandle<()>>,
    workers: usize,
    cancel: CancelToken,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Spawn `workers` threads running `handler` over a queue of `capacity`.
    pub fn start<F>(
        workers: usize,
        capacity: usize,
        cancel: CancelToken,
        handler: F,
    ) -> Result<Self, M2PushError>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let workers = workers.max(1);
        let (sender, receiver) = bounded::<T>(capacity.max(1));
        let (exited_tx, exited_rx) = bounded::<usize>(workers);
        let counters = Arc::new(Counters::default());
        let handler = Arc::new(handler);

        let mut pool = Self {
            sender: Some(sender),
            counters: Arc::clone(&counters),
            exited_rx,
            exited: 0,
            handles: Vec::with_capacity(workers),
            workers,
            cancel,
        };

        for id in 0..workers {
            let receiver = receiver.clone();
            let exited_tx = exited_tx.clone();
            let counters = Arc::clone(&counters);
            let handler = Arc::clone(&handler);

            let handle = thread::Builder::new()
                .name(format!("upload-{id}"))
                .spawn(move || {
                    for job in receiver.iter() {
                        let _active = ActiveGuard::enter(&counters);
                        if catch_unwind(AssertUnwindSafe(|| (*handler)(job))).is_err() {
                            tracing::error!("Upload worker {id} recovered from a panicking task");
                        }
                    }
                    let _ = exited_tx.send(id);
                })?;
            pool.handles.push(handle);
        }

        tracing::debug!("Started {workers} upload worker(s), queue capacity {capacity}");
        Ok(pool)
    }

    /// Queue a job, blocking while the queue is full.
    ///
    /// Fails with [`M2PushError::Interrupted`] if cancelled while waiting.
    pub fn submit(&self, job: T) -> Result<(), M2PushError> {
        let sender = self.sender.as_ref().ok_or_else(|| M2PushError::Generic {
            message: "worker pool is shut down".to_string(),
        })?;
        if self.cancel.is_cancelled() {
            return Err(M2PushError::Interrupted);
        }

        self.counters.pending.fetch_add(1, Ordering::SeqCst);
        let result = select! {
            send(sender, job) -> res => res.map_err(|_| M2PushError::Generic {
                message: "all upload workers have exited".to_string(),
            }),
            recv(self.cancel.receiver()) -> _ => Err(M2PushError::Interrupted),
        };
        if result.is_err() {
            self.counters.pending.fetch_sub(1, Ordering::SeqCst);
        }
        result
    }

    pub fn active(&self) -> usize {
        self.counters.active.load(Ordering::SeqCst)
    }

    pub fn pending(&self) -> usize {
        self.counters.pending.load(Ordering::SeqCst)
    }

    /// Poll every `interval` until no job is queued or running.
    ///
    /// `on_poll(active, pending)` runs before each wait.
    pub fn wait_idle<P>(&self, interval: Duration, mut on_poll: P) -> Result<(), M2PushError>
    where
        P: FnMut(usize, usize),
    {
        loop {
            let pending = self.pending();
            if pending == 0 {
                return Ok(());
            }
            on_poll(self.active(), pending);
            self.cancel.sleep(interval)?;
        }
    }

    /// Stop accepting jobs and wait up to `timeout` for every worker to exit.
    ///
    /// Workers finish whatever is still queued first. Returns `false` on
    /// timeout; the remaining threads are left detached. A timeout too large
    /// to form a deadline waits without one.
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        self.sender.take();
        let deadline = Instant::now().checked_add(timeout);

        while self.exited < self.workers {
            let notice = match deadline {
                Some(deadline) => self
                    .exited_rx
                    .recv_timeout(deadline.saturating_duration_since(Instant::now())),
                None => self
                    .exited_rx
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };
            match notice {
                Ok(_) => self.exited += 1,
                Err(RecvTimeoutError::Timeout) => return false,
                // every worker dropped its sender: all gone
                Err(RecvTimeoutError::Disconnected) => self.exited = self.workers,
            }
        }

        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
        true
    }

    pub fn is_terminated(&self) -> bool {
        self.exited >= self.workers
    }
}
