//! Sync status — the outcome of the most recent synchronization attempt.

use serde::{Deserialize, Serialize};

use crate::lock_state::LockState;

/// Current state of the sync engine.
///
/// The engine starts out idle in [`Success`](Self::Success).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncStatus {
    /// A pass for `next_state` is due or in flight.
    Pending { next_state: LockState },
    #[default]
    Success,
    /// The last pass failed; `retry_state` is replayed on retry.
    Failure { retry_state: LockState },
}

impl SyncStatus {
    /// The lock state a pass would run for, if any.
    #[must_use]
    pub fn target_state(&self) -> Option<LockState> {
        match self {
            Self::Pending { next_state } => Some(*next_state),
            Self::Failure { retry_state } => Some(*retry_state),
            Self::Success => None,
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending { next_state } => write!(f, "pending({next_state})"),
            Self::Success => f.write_str("success"),
            Self::Failure { retry_state } => write!(f, "failure({retry_state})"),
        }
    }
}
