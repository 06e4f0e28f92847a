//! Cooperative cancellation shared between the coordinator, the producer and
//! the worker threads.
//!
//! A [`Canceller`] owns the only sender of an otherwise silent channel.
//! Cancelling drops that sender, which disconnects every [`CancelToken`] at
//! once: blocked waits wake immediately and later checks observe it without
//! locking.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::errors::M2PushError;

/// Create a connected canceller/token pair.
pub fn cancel_pair() -> (Canceller, CancelToken) {
    let (tx, rx) = bounded::<()>(0);
    (
        Canceller {
            tx: Arc::new(Mutex::new(Some(tx))),
        },
        CancelToken { rx },
    )
}

/// Triggers cancellation. Cheap to clone; every clone cancels the same tokens.
#[derive(Debug, Clone)]
pub struct Canceller {
    tx: Arc<Mutex<Option<Sender<()>>>>,
}

impl Canceller {
    /// Cancel all tokens. Idempotent.
    pub fn cancel(&self) {
        let taken = match self.tx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if taken.is_some() {
            tracing::debug!("Cancellation requested");
        }
    }
}

/// Observes cancellation.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: Receiver<()>,
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        let (canceller, token) = cancel_pair();
        std::mem::forget(canceller);
        token
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Sleep for `duration`, waking early with [`M2PushError::Interrupted`]
    /// if cancelled first.
    pub fn sleep(&self, duration: Duration) -> Result<(), M2PushError> {
        match self.rx.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => Ok(()),
            _ => Err(M2PushError::Interrupted),
        }
    }

    /// Receiver that becomes ready (disconnected) on cancellation, for use in
    /// `crossbeam_channel::select!`.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}
