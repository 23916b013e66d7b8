//! Lock state — the external signal that gates which automations fire.

use serde::{Deserialize, Serialize};

/// Whether the device session is locked or unlocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockState {
    Locked,
    Unlocked,
}

impl LockState {
    /// The string form used in rule configuration (`"locked"`, `"unlocked"`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
        }
    }
}

impl std::fmt::Display for LockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known [`LockState`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown lock state {0:?}")]
pub struct UnknownLockState(pub String);

impl std::str::FromStr for LockState {
    type Err = UnknownLockState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "locked" => Ok(Self::Locked),
            "unlocked" => Ok(Self::Unlocked),
            _ => Err(UnknownLockState(s.to_string())),
        }
    }
}
