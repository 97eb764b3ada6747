//! Depth-1 delayed task queue
//!
//! ```text
//! schedule(a) ──▶ [sleep ── a]
//! schedule(b) ──▶   abort ✗       [sleep ── b]     (last write wins)
//! ```

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::task::{AbortHandle, JoinHandle};

/// Runs at most one delayed task at a time.
///
/// Scheduling a task aborts the pending one, whether it is still waiting out
/// the delay or already running. Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<AbortHandle>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `task` once the delay has elapsed, superseding any pending task
    pub fn schedule<F, T>(&self, task: F) -> Pending<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await
        });

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle.abort_handle());
        if let Some(previous) = previous {
            previous.abort();
        }

        Pending { handle }
    }

    /// Abort the pending task, if any. Returns true if one was still running.
    pub fn cancel(&self) -> bool {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match pending {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Handle to a scheduled task
#[derive(Debug)]
pub struct Pending<T> {
    handle: JoinHandle<T>,
}

impl<T> Pending<T> {
    /// Abort the task. Has no effect once it finished.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the task; `None` if it was superseded or cancelled
    pub async fn wait(self) -> Option<T> {
        self.handle.await.ok()
    }
}
