//! Playback progress derivation

use std::time::Duration;

/// Percentage of `duration` played at `position`, clamped to [0, 100]
///
/// Unknown or zero durations report 0.
pub fn progress_percent(position: Duration, duration: Option<Duration>) -> f64 {
    match duration {
        Some(duration) if !duration.is_zero() => {
            let ratio = position.as_secs_f64() / duration.as_secs_f64();
            (ratio * 100.0).clamp(0.0, 100.0)
        }
        _ => 0.0,
    }
}

/// Per-item progress for the segmented bar above a story
///
/// Items before the active one are complete, items after it are untouched.
pub fn segment_progress(item_count: usize, active_index: usize, active_percent: f64) -> Vec<f64> {
    (0..item_count)
        .map(|i| match i.cmp(&active_index) {
            std::cmp::Ordering::Less => 100.0,
            std::cmp::Ordering::Equal => active_percent.clamp(0.0, 100.0),
            std::cmp::Ordering::Greater => 0.0,
        })
        .collect()
}
