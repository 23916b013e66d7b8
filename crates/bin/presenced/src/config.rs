//! Configuration loading — TOML or JSON file with environment variable overrides.
//!
//! The file path comes from `PRESENCE_CONFIG` and defaults to `presence.toml`
//! in the working directory. Files ending in `.json` use the JSON layout of
//! older installs, anything else is TOML. Unlike the sync and logging
//! sections, the API `url` and `api_key` have no usable default and must be
//! provided by the file or the environment.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use presence_adapter_http_ureq::ApiConfig;
use presence_app::sync_engine::{StatusPolicy, SyncSettings, UnknownStatusPolicy};
use presence_domain::automation::AutomationRule;
use serde::Deserialize;

const DEFAULT_PATH: &str = "presence.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upstream API settings, at the top level of the file.
    #[serde(flatten)]
    pub api: ApiConfig,
    /// Rule groups; each entry maps rule ids to rule bodies.
    pub automations: Vec<BTreeMap<String, RuleConfig>>,
    /// Sync engine tuning.
    pub sync: SyncConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// One automation rule as written in the config file.
///
/// Every field is optional so that a half-written rule is skipped at match
/// time instead of aborting startup.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub starts: String,
    pub ends: String,
    pub action: String,
    pub state: String,
    pub channel: Option<String>,
    pub phrases: Vec<String>,
    pub emojis: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Delay before retrying a failed pass.
    pub backoff_secs: u64,
    /// Give up after this many retries. Unset means retry forever.
    pub max_retries: Option<u32>,
    /// `last_write` or `all_must_succeed`.
    pub status_policy: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from the configured file then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting configuration is incomplete.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("PRESENCE_CONFIG");
        let mut config = Self::from_file(path.as_deref().unwrap_or(DEFAULT_PATH))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => return Err(ConfigError::Io(err)),
        };
        let is_json = Path::new(path)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_toml(&content)
        }
    }

    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("PRESENCE_URL") {
            self.api.url = val;
        }
        if let Ok(val) = std::env::var("PRESENCE_API_KEY") {
            self.api.api_key = val;
        }
        if let Ok(val) = std::env::var("PRESENCE_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api.url.trim().is_empty() {
            return Err(ConfigError::Validation("`url` is required".to_string()));
        }
        if self.api.api_key.trim().is_empty() {
            return Err(ConfigError::Validation("`api_key` is required".to_string()));
        }
        self.sync_settings()?;
        Ok(())
    }

    /// Flatten the rule groups into an ordered rule list.
    ///
    /// Groups keep file order; ids inside a group are sorted. Rules with an
    /// empty id are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if a rule cannot be built.
    pub fn rules(&self) -> Result<Vec<AutomationRule>, ConfigError> {
        let mut rules = Vec::new();
        for group in &self.automations {
            for (id, body) in group {
                if id.trim().is_empty() {
                    tracing::warn!("ignoring automation with an empty id");
                    continue;
                }
                let rule = body.to_rule(id)?;
                if !rule.action.is_known() {
                    tracing::warn!(
                        rule = %rule.id,
                        action = %rule.action,
                        "unknown action, rule will be skipped"
                    );
                }
                rules.push(rule);
            }
        }
        Ok(rules)
    }

    /// Engine settings derived from the `sync` section.
    ///
    /// # Errors
    ///
    /// Returns an error if the backoff is zero or the status policy is
    /// unknown.
    pub fn sync_settings(&self) -> Result<SyncSettings, ConfigError> {
        let status_policy: StatusPolicy = self.sync.status_policy.parse()?;
        if self.sync.backoff_secs == 0 {
            let reason = "`sync.backoff_secs` must be non-zero".to_string();
            return Err(ConfigError::Validation(reason));
        }
        Ok(SyncSettings {
            backoff: Duration::from_secs(self.sync.backoff_secs),
            max_retries: self.sync.max_retries,
            status_policy,
        })
    }
}

impl RuleConfig {
    fn to_rule(&self, id: &str) -> Result<AutomationRule, ConfigError> {
        let mut builder = AutomationRule::builder(id)
            .window(self.starts.as_str(), self.ends.as_str())
            .trigger_state(self.state.as_str())
            .action(self.action.as_str());
        if let Some(channel) = &self.channel {
            builder = builder.channel(channel.as_str());
        }
        for phrase in &self.phrases {
            builder = builder.phrase(phrase.as_str());
        }
        for emoji in &self.emojis {
            builder = builder.emoji(emoji.as_str());
        }
        match builder.build() {
            Ok(rule) => Ok(rule),
            Err(err) => Err(ConfigError::Validation(format!("automation {id:?}: {err}"))),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            backoff_secs: 2,
            max_retries: None,
            status_policy: "last_write".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "presenced=info,presence=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// JSON parse failure.
    #[error("failed to parse config file: {0}")]
    ParseJson(#[from] serde_json::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Unknown `sync.status_policy`.
    #[error("invalid configuration: {0}")]
    StatusPolicy(#[from] UnknownStatusPolicy),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
