//! Sync engine — reacts to lock-state changes by dispatching automations.
//!
//! The engine is a small state machine over [`SyncStatus`]. Each pass
//! selects the eligible rules, builds one request per rule, sends them in
//! order and settles the status. A failed pass schedules a retry that
//! re-runs the whole pass for the same lock state.
//!
//! All passes are serialised behind one lock: a retry firing or a fresh
//! [`initiate_sync`](SyncEngine::initiate_sync) waits for the pass in flight
//! to finish before it may observe or change the status.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::time::Duration;

use presence_domain::automation::AutomationRule;
use presence_domain::lock_state::LockState;
use presence_domain::sync_status::SyncStatus;
use tokio::sync::{Mutex, watch};

use crate::action_builder::ActionBuilder;
use crate::matcher::AutomationMatcher;
use crate::ports::{ActionTransport, ChoiceSource, Clock};
use crate::retry::{DEFAULT_BACKOFF, RetryController, RetryHandle};

/// How the outcomes of several requests in one pass combine into a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    /// Each outcome overwrites the status; the last request decides.
    #[default]
    LastWrite,
    /// The pass fails if any of its requests failed.
    AllMustSucceed,
}

/// Returned when a string does not name a [`StatusPolicy`].
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown status policy {0:?}, expected \"last_write\" or \"all_must_succeed\"")]
pub struct UnknownStatusPolicy(pub String);

impl std::str::FromStr for StatusPolicy {
    type Err = UnknownStatusPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last_write" => Ok(Self::LastWrite),
            "all_must_succeed" => Ok(Self::AllMustSucceed),
            other => Err(UnknownStatusPolicy(other.to_string())),
        }
    }
}

/// Tunables of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Delay between a failed pass and its retry.
    pub backoff: Duration,
    /// Retries allowed after a failure before giving up; `None` retries forever.
    pub max_retries: Option<u32>,
    pub status_policy: StatusPolicy,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            backoff: DEFAULT_BACKOFF,
            max_retries: None,
            status_policy: StatusPolicy::default(),
        }
    }
}

/// Drives automation passes for lock-state changes.
///
/// Cloning is cheap and clones share the same state.
pub struct SyncEngine<T, C, R> {
    inner: Arc<Inner<T, C, R>>,
}

impl<T, C, R> Clone for SyncEngine<T, C, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<T, C, R> {
    rules: Arc<[AutomationRule]>,
    transport: T,
    clock: C,
    builder: ActionBuilder<R>,
    settings: SyncSettings,
    state: Mutex<EngineState>,
    status_tx: watch::Sender<SyncStatus>,
}

struct EngineState {
    status: SyncStatus,
    retry: RetryController,
    /// Retries scheduled since the last success or fresh sync.
    retries: u32,
}

#[derive(Debug, Default)]
struct PassOutcome {
    dispatched: usize,
    failed: usize,
}

impl<T, C, R> SyncEngine<T, C, R>
where
    T: ActionTransport + 'static,
    C: Clock + 'static,
    R: ChoiceSource + 'static,
{
    /// Create an idle engine over a fixed set of rules.
    pub fn new(
        rules: impl Into<Arc<[AutomationRule]>>,
        transport: T,
        clock: C,
        choice: R,
        settings: SyncSettings,
    ) -> Self {
        let (status_tx, _) = watch::channel(SyncStatus::default());
        Self {
            inner: Arc::new(Inner {
                rules: rules.into(),
                transport,
                clock,
                builder: ActionBuilder::new(choice),
                settings,
                state: Mutex::new(EngineState {
                    status: SyncStatus::default(),
                    retry: RetryController::new(),
                    retries: 0,
                }),
                status_tx,
            }),
        }
    }

    /// Start a sync pass for a new lock state.
    ///
    /// Supersedes any pending retry. Request failures are never returned:
    /// they are handled by the engine's retry loop.
    #[tracing::instrument(skip(self))]
    pub async fn initiate_sync(&self, state: LockState) {
        let mut guard = self.inner.state.lock().await;
        guard.retries = 0;
        self.inner
            .commit(&mut guard, SyncStatus::Pending { next_state: state });
        self.inner.handle_locked(&mut guard).await;
    }

    /// Advance the state machine once from its current status.
    ///
    /// A no-op while the status is [`SyncStatus::Success`].
    pub async fn handle_sync(&self) {
        let mut guard = self.inner.state.lock().await;
        self.inner.handle_locked(&mut guard).await;
    }

    /// Last committed status.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        *self.inner.status_tx.borrow()
    }

    /// Watch every committed status transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Whether a retry timer is outstanding.
    pub async fn has_pending_retry(&self) -> bool {
        self.inner.state.lock().await.retry.pending().is_some()
    }

    /// Cancel any pending retry. The status is left as is.
    pub async fn shutdown(&self) {
        let mut guard = self.inner.state.lock().await;
        if let Some(state) = guard.retry.pending_state() {
            guard.retry.cancel_pending();
            tracing::info!(%state, "pending retry cancelled on shutdown");
        }
    }

    #[must_use]
    pub fn rules(&self) -> &[AutomationRule] {
        &self.inner.rules
    }
}

impl<T, C, R> Inner<T, C, R>
where
    T: ActionTransport + 'static,
    C: Clock + 'static,
    R: ChoiceSource + 'static,
{
    async fn handle_locked(self: &Arc<Self>, guard: &mut EngineState) {
        guard.retry.cancel_pending();

        let current = guard.status;
        let Some(state) = current.target_state() else {
            tracing::trace!("in sync, nothing to do");
            return;
        };
        if let SyncStatus::Failure { .. } = current {
            self.commit(guard, SyncStatus::Pending { next_state: state });
        }

        let outcome = self.dispatch(guard, state).await;
        self.settle(guard, state, &outcome);
    }

    /// Send one request per matched and buildable rule.
    async fn dispatch(&self, guard: &mut EngineState, state: LockState) -> PassOutcome {
        let now = self.clock.now();
        let last_write = self.settings.status_policy == StatusPolicy::LastWrite;
        let mut outcome = PassOutcome::default();

        for rule in AutomationMatcher.select(&now, state, &self.rules) {
            let Some(built) = self.builder.build(rule) else {
                continue;
            };
            outcome.dispatched += 1;

            match self
                .transport
                .post(built.action.endpoint(), &built.payload)
                .await
            {
                Ok(()) => {
                    tracing::info!(
                        rule = %built.rule_id,
                        action = %built.action,
                        "request succeeded"
                    );
                    if last_write {
                        self.commit(guard, SyncStatus::Success);
                    }
                }
                Err(err) => {
                    outcome.failed += 1;
                    tracing::warn!(
                        rule = %built.rule_id,
                        action = %built.action,
                        %err,
                        "request failed"
                    );
                    if last_write {
                        self.commit(guard, SyncStatus::Failure { retry_state: state });
                    }
                }
            }
        }

        if outcome.dispatched == 0 {
            tracing::debug!(%state, %now, "no automation dispatched");
        }
        outcome
    }

    fn settle(self: &Arc<Self>, guard: &mut EngineState, state: LockState, outcome: &PassOutcome) {
        if outcome.dispatched == 0 {
            return;
        }
        if self.settings.status_policy == StatusPolicy::AllMustSucceed {
            let status = if outcome.failed == 0 {
                SyncStatus::Success
            } else {
                SyncStatus::Failure { retry_state: state }
            };
            self.commit(guard, status);
        }
        if let SyncStatus::Failure { retry_state } = guard.status {
            self.schedule_retry(guard, retry_state);
        }
    }

    fn schedule_retry(self: &Arc<Self>, guard: &mut EngineState, retry_state: LockState) {
        let max_retries = self.settings.max_retries;
        if max_retries.is_some_and(|max| guard.retries >= max) {
            tracing::error!(
                retries = guard.retries,
                state = %retry_state,
                "retry limit reached, giving up"
            );
            return;
        }
        guard.retries += 1;

        let engine = Arc::downgrade(self);
        let on_fire = move |handle: RetryHandle| fire_retry(engine, handle);
        let backoff = self.settings.backoff;
        guard.retry.schedule_retry(backoff, retry_state, on_fire);
    }

    fn commit(&self, guard: &mut EngineState, status: SyncStatus) {
        if guard.status != status {
            tracing::debug!(from = %guard.status, to = %status, "sync status changed");
        }
        guard.status = status;
        if status == SyncStatus::Success {
            guard.retries = 0;
        }
        self.status_tx.send_replace(status);
    }
}

/// Body of a retry timer. Boxed because it re-enters the pass that scheduled it.
fn fire_retry<T, C, R>(
    engine: Weak<Inner<T, C, R>>,
    handle: RetryHandle,
) -> Pin<Box<dyn Future<Output = ()> + Send>>
where
    T: ActionTransport + 'static,
    C: Clock + 'static,
    R: ChoiceSource + 'static,
{
    Box::pin(async move {
        let Some(inner) = engine.upgrade() else {
            return;
        };
        let mut guard = inner.state.lock().await;
        if !guard.retry.claim(handle) {
            tracing::debug!("superseded retry dropped");
            return;
        }
        tracing::info!(attempt = guard.retries, "retrying sync");
        inner.handle_locked(&mut guard).await;
    })
}
