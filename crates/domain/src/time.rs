//! Time and timestamp helpers.
//!
//! Automation windows are expressed in local wall-clock time, so timestamps
//! carry their UTC offset instead of being normalised to UTC.

use chrono::{DateTime, Datelike, FixedOffset, Local, Weekday};

/// Local wall-clock timestamp, with the offset it was observed at.
pub type Timestamp = DateTime<FixedOffset>;

/// Return the current local time.
#[must_use]
pub fn now() -> Timestamp {
    Local::now().fixed_offset()
}

/// Whether `ts` falls on Monday through Friday in its own offset.
#[must_use]
pub fn is_weekday(ts: &Timestamp) -> bool {
    !matches!(ts.weekday(), Weekday::Sat | Weekday::Sun)
}
