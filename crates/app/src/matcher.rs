//! Automation matcher — selects the rules that apply at a given instant.
//!
//! Matching is pure: no clock reads, no IO. Rules that are not eligible are
//! skipped silently (a skip is the steady state, not an error).

use presence_domain::automation::{AutomationRule, Ineligibility};
use presence_domain::lock_state::LockState;
use presence_domain::time::{self, Timestamp};

/// Selects eligible automation rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutomationMatcher;

impl AutomationMatcher {
    /// Return the rules that apply at `now` for `state`, in configuration order.
    ///
    /// On Saturdays and Sundays nothing applies. Otherwise a rule applies
    /// when both of its `HH:MM` bounds parse, its trigger state equals
    /// `state`, and `now` lies in `[start, end]` of the same day.
    #[must_use]
    pub fn select<'a>(
        &self,
        now: &Timestamp,
        state: LockState,
        rules: &'a [AutomationRule],
    ) -> Vec<&'a AutomationRule> {
        if !time::is_weekday(now) {
            tracing::debug!(%now, "weekend, no automation applies");
            return Vec::new();
        }

        rules
            .iter()
            .filter(|rule| match rule.check(now, state) {
                Ok(()) => true,
                Err(reason) => {
                    trace_skip(rule, &reason);
                    false
                }
            })
            .collect()
    }
}

fn trace_skip(rule: &AutomationRule, reason: &Ineligibility) {
    match reason {
        Ineligibility::InvalidWindow(err) => {
            tracing::trace!(rule = %rule.id, %err, "skipping rule with invalid window");
        }
        Ineligibility::OutsideWindow(window) => {
            tracing::trace!(rule = %rule.id, %window, "outside rule window");
        }
        Ineligibility::OtherState | Ineligibility::Weekend => {
            tracing::trace!(rule = %rule.id, ?reason, "rule not eligible");
        }
    }
}
