//! # Search Debounce
//!
//! Holds a task back until input has been quiet for the debounce delay.
//!
//! ```text
//!   keypress  c      o      l      a
//!   time      0ms    80ms   150ms  210ms ─────── 300ms quiet ──► search("cola")
//!             ✗      ✗      ✗      ✓
//! ```
//!
//! Scheduling again cancels the pending timer. Once the timer fires the
//! task runs detached, so a later keypress never aborts a request that is
//! already in flight.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

#[derive(Debug)]
pub struct SearchDebouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl SearchDebouncer {
    pub fn new(delay: Duration) -> Self {
        SearchDebouncer {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `task` after the delay unless `schedule` or `cancel` is called
    /// again first. Must be called inside a tokio runtime.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(task);
        }));
    }

    /// Drops the pending task, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                trace!("Pending debounced task cancelled");
            }
            handle.abort();
        }
    }

    /// Returns true while a task is waiting for its delay to pass.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
