//! Action kind — which upstream API method an automation calls.

use serde::{Deserialize, Serialize};

/// The upstream API method an automation invokes.
///
/// Configured as the raw method name; names this client does not know are
/// kept verbatim in [`Unknown`](Self::Unknown) so they can be reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    /// `chat.postMessage` — post a message to a channel.
    PostMessage,
    /// `users.profile.set` — set the profile status emoji and text.
    SetProfileStatus,
    Unknown(String),
}

impl ActionKind {
    /// Method path appended to the API base URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        match self {
            Self::PostMessage => "chat.postMessage",
            Self::SetProfileStatus => "users.profile.set",
            Self::Unknown(name) => name,
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<&str> for ActionKind {
    fn from(value: &str) -> Self {
        match value {
            "chat.postMessage" => Self::PostMessage,
            "users.profile.set" => Self::SetProfileStatus,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<String> for ActionKind {
    fn from(value: String) -> Self {
        match Self::from(value.as_str()) {
            Self::Unknown(_) => Self::Unknown(value),
            known => known,
        }
    }
}

impl From<ActionKind> for String {
    fn from(value: ActionKind) -> Self {
        match value {
            ActionKind::Unknown(name) => name,
            known => known.endpoint().to_string(),
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.endpoint())
    }
}
