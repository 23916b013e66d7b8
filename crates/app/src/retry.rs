//! Retry controller — delayed re-invocation of a failed sync attempt.
//!
//! At most one retry is outstanding at a time: scheduling a new one cancels
//! the previous one, and a cancelled retry never runs its callback.

use std::future::Future;
use std::time::Duration;

use presence_domain::lock_state::LockState;
use tokio::task::JoinHandle;

/// Default delay before a failed sync is retried.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);

/// Identifies one scheduled retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RetryHandle(u64);

#[derive(Debug)]
struct PendingRetry {
    handle: RetryHandle,
    retry_state: LockState,
    timer: JoinHandle<()>,
}

/// Owns the single pending retry timer of a sync engine.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Default)]
pub struct RetryController {
    pending: Option<PendingRetry>,
    next_id: u64,
}

impl RetryController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `on_fire` after `after`, superseding any pending retry.
    ///
    /// The callback receives the handle it was scheduled under. When the
    /// callback needs exclusive access to state shared with the canceller,
    /// it should call [`claim`](Self::claim) first: a superseded retry whose
    /// timer already elapsed is then recognised and dropped.
    pub fn schedule_retry<F, Fut>(
        &mut self,
        after: Duration,
        retry_state: LockState,
        on_fire: F,
    ) -> RetryHandle
    where
        F: FnOnce(RetryHandle) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel_pending();

        self.next_id += 1;
        let handle = RetryHandle(self.next_id);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            on_fire(handle).await;
        });

        tracing::debug!(
            delay_ms = u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
            state = %retry_state,
            "retry scheduled"
        );
        self.pending = Some(PendingRetry {
            handle,
            retry_state,
            timer,
        });
        handle
    }

    /// Cancel `handle` if it is still the pending retry.
    ///
    /// Returns `false` when `handle` already fired, was claimed, or was
    /// superseded.
    pub fn cancel(&mut self, handle: RetryHandle) -> bool {
        if self.pending() != Some(handle) {
            return false;
        }
        self.cancel_pending().is_some()
    }

    /// Cancel whatever retry is pending, returning its handle.
    pub fn cancel_pending(&mut self) -> Option<RetryHandle> {
        let pending = self.pending.take()?;
        pending.timer.abort();
        tracing::trace!(state = %pending.retry_state, "pending retry cancelled");
        Some(pending.handle)
    }

    /// Called by a firing retry: forget `handle` without aborting its task.
    ///
    /// Returns `false` if `handle` is no longer the pending retry, in which
    /// case the caller must not act.
    pub fn claim(&mut self, handle: RetryHandle) -> bool {
        if self.pending() != Some(handle) {
            return false;
        }
        self.pending = None;
        true
    }

    /// Handle of the pending retry, if any.
    #[must_use]
    pub fn pending(&self) -> Option<RetryHandle> {
        self.pending.as_ref().map(|pending| pending.handle)
    }

    /// Lock state the pending retry would replay, if any.
    #[must_use]
    pub fn pending_state(&self) -> Option<LockState> {
        self.pending.as_ref().map(|pending| pending.retry_state)
    }
}

impl Drop for RetryController {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
