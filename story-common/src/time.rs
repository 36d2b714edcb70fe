//! Timestamp utilities

use chrono::{DateTime, Utc};
use std::time::Duration;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Compact elapsed-time label for the story overlay ("now", "5m", "3h", "2d", "4w")
///
/// Timestamps in the future (clock skew between CMS and viewer) render as "now".
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use story_common::time::format_elapsed_label;
///
/// let now = Utc::now();
/// assert_eq!(format_elapsed_label(now - Duration::minutes(5), now), "5m");
/// assert_eq!(format_elapsed_label(now - Duration::hours(30), now), "1d");
/// ```
pub fn format_elapsed_label(published_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - published_at).num_seconds();

    if seconds < MINUTE {
        "now".to_string()
    } else if seconds < HOUR {
        format!("{}m", seconds / MINUTE)
    } else if seconds < DAY {
        format!("{}h", seconds / HOUR)
    } else if seconds < WEEK {
        format!("{}d", seconds / DAY)
    } else {
        format!("{}w", seconds / WEEK)
    }
}
