//! Time window — the same-day wall-clock range during which a rule applies.

use chrono::NaiveTime;

use crate::error::ValidationError;
use crate::time::Timestamp;

/// Closed `[start, end]` range of local wall-clock time.
///
/// Windows never wrap past midnight: a window whose `end` is before its
/// `start` contains no instant at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    /// Parse a window from two `HH:MM` strings.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTime`] if either bound is empty or
    /// not a valid `HH:MM` time.
    pub fn parse(starts: &str, ends: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            start: parse_hh_mm(starts)?,
            end: parse_hh_mm(ends)?,
        })
    }

    /// Whether the wall-clock time of `now` lies within the window, bounds
    /// included.
    #[must_use]
    pub fn contains(&self, now: &Timestamp) -> bool {
        let time = now.time();
        self.start <= time && time <= self.end
    }
}

fn parse_hh_mm(value: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ValidationError::InvalidTime(value.to_string()))
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn at(rfc3339: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    #[test]
    fn should_parse_valid_window() {
        let window = TimeWindow::parse("08:30", "17:00").unwrap();
        assert_eq!(window.to_string(), "08:30..17:00");
    }

    #[test]
    fn should_reject_empty_bound() {
        assert_eq!(
            TimeWindow::parse("", "17:00"),
            Err(ValidationError::InvalidTime(String::new()))
        );
    }

    #[test]
    fn should_reject_malformed_bound() {
        assert!(TimeWindow::parse("8h30", "17:00").is_err());
        assert!(TimeWindow::parse("08:30", "24:15").is_err());
    }

    #[test]
    fn should_include_both_bounds() {
        let window = TimeWindow::parse("09:00", "10:00").unwrap();
        assert!(window.contains(&at("2024-03-04T09:00:00+01:00")));
        assert!(window.contains(&at("2024-03-04T10:00:00+01:00")));
    }

    #[test]
    fn should_exclude_instants_outside_window() {
        let window = TimeWindow::parse("09:00", "10:00").unwrap();
        assert!(!window.contains(&at("2024-03-04T08:59:59+01:00")));
        assert!(!window.contains(&at("2024-03-04T10:00:01+01:00")));
    }

    #[test]
    fn should_not_wrap_overnight() {
        let window = TimeWindow::parse("22:00", "06:00").unwrap();
        assert!(!window.contains(&at("2024-03-04T23:00:00+01:00")));
        assert!(!window.contains(&at("2024-03-04T05:00:00+01:00")));
    }
}
