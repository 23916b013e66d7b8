//! Upstream API configuration.

use std::time::Duration;

use serde::Deserialize;

/// Where and how to reach the upstream API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL the action name is appended to, e.g. `https://slack.com/api/`.
    pub url: String,
    /// Static bearer token.
    pub api_key: String,
    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl ApiConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            request_timeout_secs: 10,
        }
    }
}
