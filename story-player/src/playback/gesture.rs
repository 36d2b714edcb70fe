//! Pointer gesture classification for tap navigation
//!
//! A pointer-down/pointer-up pair is a tap when it comes from the same
//! pointer, moves no more than the movement threshold on either axis, and
//! completes within the duration threshold. Taps are then zoned by their
//! horizontal position on the player surface.

use std::time::{Duration, Instant};
use story_common::config::PlayerConfig;
use story_common::events::Navigation;
use tracing::debug;

/// One pointer event, positioned relative to the player surface's top-left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub pointer_id: i64,
    pub x: f64,
    pub y: f64,
    pub at: Instant,
}

/// Horizontal zone of a tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapZone {
    Previous,
    Middle,
    Next,
}

impl TapZone {
    pub fn navigation(self) -> Option<Navigation> {
        match self {
            TapZone::Previous => Some(Navigation::Previous),
            TapZone::Next => Some(Navigation::Next),
            TapZone::Middle => None,
        }
    }
}

/// Result of classifying a down/up pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Tap(TapZone),
    /// Moved beyond the movement threshold
    Drag,
    /// Held beyond the duration threshold
    LongPress,
    /// Up event from a different pointer than the tracked down event
    ForeignPointer,
}

/// Tracks pointer-down and classifies the matching pointer-up
#[derive(Debug, Clone)]
pub struct GestureClassifier {
    max_movement_px: f64,
    max_duration: Duration,
    zone_fraction: f64,
    down: Option<PointerSample>,
}

impl GestureClassifier {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            max_movement_px: config.tap_max_movement_px,
            max_duration: config.tap_max_duration(),
            zone_fraction: config.tap_zone_fraction,
            down: None,
        }
    }

    pub fn pointer_down(&mut self, sample: PointerSample) {
        self.down = Some(sample);
    }

    pub fn pointer_cancel(&mut self) {
        self.down = None;
    }

    /// Classify the pointer-up against the tracked pointer-down
    ///
    /// Returns `None` when no pointer-down is tracked. The tracked down event
    /// is consumed only when the pointer ids match.
    pub fn pointer_up(&mut self, up: PointerSample, surface_width: f64) -> Option<GestureKind> {
        let down = self.down?;
        if down.pointer_id != up.pointer_id {
            return Some(GestureKind::ForeignPointer);
        }
        self.down = None;

        let dx = (up.x - down.x).abs();
        let dy = (up.y - down.y).abs();
        if dx > self.max_movement_px || dy > self.max_movement_px {
            debug!("Pointer moved {:.1}x{:.1}px, not a tap", dx, dy);
            return Some(GestureKind::Drag);
        }

        if up.at.saturating_duration_since(down.at) > self.max_duration {
            return Some(GestureKind::LongPress);
        }

        Some(GestureKind::Tap(self.zone(up.x, surface_width)))
    }

    /// Zone for horizontal offset `x` on a surface `surface_width` wide
    pub fn zone(&self, x: f64, surface_width: f64) -> TapZone {
        if surface_width.is_nan() || surface_width <= 0.0 {
            return TapZone::Middle;
        }

        let fraction = x / surface_width;
        if fraction <= self.zone_fraction {
            TapZone::Previous
        } else if fraction >= 1.0 - self.zone_fraction {
            TapZone::Next
        } else {
            TapZone::Middle
        }
    }
}
