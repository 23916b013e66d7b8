//! Action builder — turns a matched rule into a concrete API request.

use presence_domain::automation::{ActionKind, AutomationRule};
use serde_json::json;

use crate::ports::ChoiceSource;

/// A request ready to be handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltAction {
    pub rule_id: String,
    pub action: ActionKind,
    pub payload: serde_json::Value,
}

/// Builds request payloads, drawing phrases and emojis from a [`ChoiceSource`].
pub struct ActionBuilder<R> {
    choice: R,
}

impl<R: ChoiceSource> ActionBuilder<R> {
    pub fn new(choice: R) -> Self {
        Self { choice }
    }

    /// Build the request for `rule`, or `None` when the rule cannot produce one.
    ///
    /// - `chat.postMessage` needs a channel and at least one phrase or emoji.
    ///   The text is `"<phrase> <emoji>"`, a missing side being empty.
    /// - `users.profile.set` needs at least one emoji; the status text is
    ///   empty when there are no phrases.
    /// - Unknown actions never build.
    #[must_use]
    pub fn build(&self, rule: &AutomationRule) -> Option<BuiltAction> {
        let payload = match &rule.action {
            ActionKind::PostMessage => self.post_message(rule)?,
            ActionKind::SetProfileStatus => self.profile_status(rule)?,
            ActionKind::Unknown(name) => {
                tracing::warn!(rule = %rule.id, action = %name, "unknown action, ignoring rule");
                return None;
            }
        };

        Some(BuiltAction {
            rule_id: rule.id.clone(),
            action: rule.action.clone(),
            payload,
        })
    }

    fn post_message(&self, rule: &AutomationRule) -> Option<serde_json::Value> {
        let channel = rule.channel.as_deref().filter(|c| !c.is_empty());
        let Some(channel) = channel else {
            tracing::debug!(rule = %rule.id, "post message without channel, skipping");
            return None;
        };
        if rule.phrases.is_empty() && rule.emojis.is_empty() {
            tracing::debug!(rule = %rule.id, "no phrase or emoji to post, skipping");
            return None;
        }

        let phrase = self.choose(&rule.phrases).unwrap_or_default();
        let emoji = self.choose(&rule.emojis).unwrap_or_default();

        Some(json!({
            "channel": channel,
            "as_user": true,
            "text": format!("{phrase} {emoji}"),
        }))
    }

    fn profile_status(&self, rule: &AutomationRule) -> Option<serde_json::Value> {
        let Some(emoji) = self.choose(&rule.emojis) else {
            tracing::debug!(rule = %rule.id, "no status emoji, skipping");
            return None;
        };
        let phrase = self.choose(&rule.phrases).unwrap_or_default();

        Some(json!({
            "profile": {
                "status_emoji": emoji,
                "status_text": phrase,
            }
        }))
    }

    fn choose<'a>(&self, items: &'a [String]) -> Option<&'a str> {
        if items.is_empty() {
            return None;
        }
        let index = self.choice.pick(items.len()) % items.len();
        items.get(index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays a fixed list of indexes, then keeps returning the last one.
    struct ScriptedChoice {
        picks: Mutex<Vec<usize>>,
    }

    impl ScriptedChoice {
        fn new(picks: &[usize]) -> Self {
            let mut picks = picks.to_vec();
            picks.reverse();
            Self {
                picks: Mutex::new(picks),
            }
        }
    }

    impl ChoiceSource for ScriptedChoice {
        fn pick(&self, _len: usize) -> usize {
            let mut picks = self.picks.lock().unwrap();
            if picks.len() > 1 {
                picks.pop().unwrap()
            } else {
                picks.last().copied().unwrap_or_default()
            }
        }
    }

    fn builder(picks: &[usize]) -> ActionBuilder<ScriptedChoice> {
        ActionBuilder::new(ScriptedChoice::new(picks))
    }

    fn post_message(phrases: &[&str], emojis: &[&str]) -> AutomationRule {
        let mut b = AutomationRule::builder("post")
            .window("09:00", "17:00")
            .trigger_state("unlocked")
            .action("chat.postMessage")
            .channel("#standup");
        for p in phrases {
            b = b.phrase(*p);
        }
        for e in emojis {
            b = b.emoji(*e);
        }
        b.build().unwrap()
    }

    fn profile_status(phrases: &[&str], emojis: &[&str]) -> AutomationRule {
        let mut b = AutomationRule::builder("status")
            .window("09:00", "17:00")
            .trigger_state("locked")
            .action("users.profile.set");
        for p in phrases {
            b = b.phrase(*p);
        }
        for e in emojis {
            b = b.emoji(*e);
        }
        b.build().unwrap()
    }

    #[test]
    fn should_build_post_message_with_chosen_phrase_and_emoji() {
        let rule = post_message(&["Morning", "Hello"], &[":sun:", ":wave:"]);
        let built = builder(&[1, 0]).build(&rule).unwrap();
        assert_eq!(built.rule_id, "post");
        assert_eq!(built.action, ActionKind::PostMessage);
        assert_eq!(
            built.payload,
            json!({"channel": "#standup", "as_user": true, "text": "Hello :sun:"})
        );
    }

    #[test]
    fn should_not_build_post_message_without_phrases_and_emojis() {
        let rule = post_message(&[], &[]);
        assert!(builder(&[0]).build(&rule).is_none());
    }

    #[test]
    fn should_build_post_message_with_phrases_only() {
        let rule = post_message(&["Back"], &[]);
        let built = builder(&[0]).build(&rule).unwrap();
        assert_eq!(built.payload["text"], "Back ");
    }

    #[test]
    fn should_build_post_message_with_emojis_only() {
        let rule = post_message(&[], &[":coffee:"]);
        let built = builder(&[0]).build(&rule).unwrap();
        assert_eq!(built.payload["text"], " :coffee:");
    }

    #[test]
    fn should_not_build_post_message_without_channel() {
        let rule = AutomationRule::builder("no_channel")
            .action("chat.postMessage")
            .phrase("hi")
            .build()
            .unwrap();
        assert!(builder(&[0]).build(&rule).is_none());
    }

    #[test]
    fn should_build_profile_status() {
        let rule = profile_status(&["Away", "Lunch"], &[":zzz:", ":pizza:"]);
        let built = builder(&[1, 1]).build(&rule).unwrap();
        assert_eq!(built.action, ActionKind::SetProfileStatus);
        assert_eq!(
            built.payload,
            json!({"profile": {"status_emoji": ":pizza:", "status_text": "Lunch"}})
        );
    }

    #[test]
    fn should_build_profile_status_with_empty_text_when_no_phrases() {
        let rule = profile_status(&[], &[":zzz:"]);
        let built = builder(&[0]).build(&rule).unwrap();
        assert_eq!(built.payload["profile"]["status_text"], "");
    }

    #[test]
    fn should_not_build_profile_status_without_emojis() {
        let rule = profile_status(&["Away", "Gone"], &[]);
        assert!(builder(&[0]).build(&rule).is_none());
    }

    #[test]
    fn should_not_build_unknown_action() {
        let rule = AutomationRule::builder("mystery")
            .action("reactions.add")
            .channel("#general")
            .phrase("hi")
            .emoji(":tada:")
            .build()
            .unwrap();
        assert!(builder(&[0]).build(&rule).is_none());
    }

    #[test]
    fn should_wrap_out_of_range_choice() {
        let rule = profile_status(&[], &[":a:", ":b:"]);
        let built = builder(&[3]).build(&rule).unwrap();
        assert_eq!(built.payload["profile"]["status_emoji"], ":b:");
    }
}
