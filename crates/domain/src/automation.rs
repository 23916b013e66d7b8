//! Automation — time-window + trigger-state + action rules.
//!
//! A rule fires when the device enters its trigger lock state on a weekday
//! while the local wall-clock time is inside its window. Rules are loaded
//! once from configuration and never mutated afterwards.

mod action_kind;
mod window;

pub use action_kind::ActionKind;
pub use window::TimeWindow;

use serde::{Deserialize, Serialize};

use crate::error::{PresenceError, ValidationError};
use crate::lock_state::LockState;
use crate::time::{self, Timestamp};

/// A configured automation.
///
/// Time bounds are kept as written in the configuration; a rule whose bounds
/// do not parse is simply never eligible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationRule {
    pub id: String,
    pub starts: String,
    pub ends: String,
    /// Lock state (`"locked"`, `"unlocked"`) that triggers the rule.
    pub trigger_state: String,
    pub action: ActionKind,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub phrases: Vec<String>,
    #[serde(default)]
    pub emojis: Vec<String>,
}

/// Why a rule did not apply at a given instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligibility {
    Weekend,
    InvalidWindow(ValidationError),
    OtherState,
    OutsideWindow(TimeWindow),
}

impl AutomationRule {
    /// Create a builder for constructing an [`AutomationRule`].
    #[must_use]
    pub fn builder(id: impl Into<String>) -> AutomationRuleBuilder {
        AutomationRuleBuilder {
            id: id.into(),
            ..AutomationRuleBuilder::default()
        }
    }

    /// Parsed time window of the rule.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTime`] when a bound is empty or malformed.
    pub fn window(&self) -> Result<TimeWindow, ValidationError> {
        TimeWindow::parse(&self.starts, &self.ends)
    }

    #[must_use]
    pub fn is_triggered_by(&self, state: LockState) -> bool {
        self.trigger_state == state.as_str()
    }

    /// Check whether the rule applies at `now` for `state`.
    ///
    /// # Errors
    ///
    /// Returns the first [`Ineligibility`] reason found.
    pub fn check(&self, now: &Timestamp, state: LockState) -> Result<(), Ineligibility> {
        if !time::is_weekday(now) {
            return Err(Ineligibility::Weekend);
        }
        let window = self.window().map_err(Ineligibility::InvalidWindow)?;
        if !self.is_triggered_by(state) {
            return Err(Ineligibility::OtherState);
        }
        if !window.contains(now) {
            return Err(Ineligibility::OutsideWindow(window));
        }
        Ok(())
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] when `id` is empty.
    pub fn validate(&self) -> Result<(), PresenceError> {
        if self.id.is_empty() {
            return Err(ValidationError::MissingField("id").into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`AutomationRule`].
#[derive(Debug, Default)]
pub struct AutomationRuleBuilder {
    id: String,
    starts: String,
    ends: String,
    trigger_state: String,
    action: Option<ActionKind>,
    channel: Option<String>,
    phrases: Vec<String>,
    emojis: Vec<String>,
}

impl AutomationRuleBuilder {
    #[must_use]
    pub fn window(mut self, starts: impl Into<String>, ends: impl Into<String>) -> Self {
        self.starts = starts.into();
        self.ends = ends.into();
        self
    }

    #[must_use]
    pub fn trigger_state(mut self, state: impl Into<String>) -> Self {
        self.trigger_state = state.into();
        self
    }

    #[must_use]
    pub fn action(mut self, action: impl Into<ActionKind>) -> Self {
        self.action = Some(action.into());
        self
    }

    #[must_use]
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    #[must_use]
    pub fn phrase(mut self, phrase: impl Into<String>) -> Self {
        self.phrases.push(phrase.into());
        self
    }

    #[must_use]
    pub fn emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emojis.push(emoji.into());
        self
    }

    /// Consume the builder, validate, and return an [`AutomationRule`].
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::Validation`] if the id is empty.
    pub fn build(self) -> Result<AutomationRule, PresenceError> {
        let rule = AutomationRule {
            id: self.id,
            starts: self.starts,
            ends: self.ends,
            trigger_state: self.trigger_state,
            action: self
                .action
                .unwrap_or_else(|| ActionKind::Unknown(String::new())),
            channel: self.channel,
            phrases: self.phrases,
            emojis: self.emojis,
        };
        rule.validate()?;
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    // 2024-03-04 is a Monday, 2024-03-09 a Saturday.
    fn at(rfc3339: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    fn standup() -> AutomationRule {
        AutomationRule::builder("standup")
            .window("09:00", "10:00")
            .trigger_state("unlocked")
            .action("chat.postMessage")
            .channel("#general")
            .phrase("Morning!")
            .emoji(":wave:")
            .build()
            .unwrap()
    }

    #[test]
    fn should_build_rule_with_all_fields() {
        let rule = standup();
        assert_eq!(rule.id, "standup");
        assert_eq!(rule.action, ActionKind::PostMessage);
        assert_eq!(rule.channel.as_deref(), Some("#general"));
        assert_eq!(rule.phrases, vec!["Morning!"]);
        assert_eq!(rule.emojis, vec![":wave:"]);
    }

    #[test]
    fn should_return_validation_error_when_id_is_empty() {
        let result = AutomationRule::builder("").build();
        assert!(matches!(
            result,
            Err(PresenceError::Validation(ValidationError::MissingField("id")))
        ));
    }

    #[test]
    fn should_default_to_unknown_action_when_not_specified() {
        let rule = AutomationRule::builder("bare").build().unwrap();
        assert!(!rule.action.is_known());
    }

    #[test]
    fn should_be_eligible_inside_window_on_weekday() {
        let rule = standup();
        assert_eq!(
            rule.check(&at("2024-03-04T09:30:00+01:00"), LockState::Unlocked),
            Ok(())
        );
    }

    #[test]
    fn should_reject_weekend_before_anything_else() {
        let rule = AutomationRule::builder("broken").build().unwrap();
        assert_eq!(
            rule.check(&at("2024-03-09T09:30:00+01:00"), LockState::Unlocked),
            Err(Ineligibility::Weekend)
        );
    }

    #[test]
    fn should_reject_rule_with_unparsable_window() {
        let rule = AutomationRule::builder("broken")
            .window("", "10:00")
            .trigger_state("unlocked")
            .build()
            .unwrap();
        assert!(matches!(
            rule.check(&at("2024-03-04T09:30:00+01:00"), LockState::Unlocked),
            Err(Ineligibility::InvalidWindow(_))
        ));
    }

    #[test]
    fn should_reject_other_lock_state() {
        let rule = standup();
        assert_eq!(
            rule.check(&at("2024-03-04T09:30:00+01:00"), LockState::Locked),
            Err(Ineligibility::OtherState)
        );
    }

    #[test]
    fn should_reject_instant_outside_window() {
        let rule = standup();
        assert!(matches!(
            rule.check(&at("2024-03-04T10:00:01+01:00"), LockState::Unlocked),
            Err(Ineligibility::OutsideWindow(_))
        ));
    }

    #[test]
    fn should_roundtrip_rule_through_serde_json() {
        let rule = standup();
        let json = serde_json::to_string(&rule).unwrap();
        let parsed: AutomationRule = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, rule);
    }
}
