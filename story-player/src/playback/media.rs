//! Media capability interface
//!
//! The state machine never touches a real video element. Each slot owns one
//! [`MediaResource`]; the host implements it over whatever actually decodes
//! video, and tests inject [`super::SimulatedMedia`].

use crate::Result;
use std::time::{Duration, Instant};

/// Identifies one binding of a slot to a source
///
/// Every `assign` hands the resource a fresh binding. Readiness or ended
/// notifications reported against an older binding are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Binding(pub u64);

impl std::fmt::Display for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Notifications a media resource reports back to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    /// Duration and dimensions known
    LoadedMetadata,
    /// Enough data buffered to play without stalling
    CanPlayThrough,
    /// Playback reached the natural end of the source
    Ended,
}

impl MediaEvent {
    /// Whether this event signals buffering readiness
    pub fn is_readiness(self) -> bool {
        matches!(self, MediaEvent::LoadedMetadata | MediaEvent::CanPlayThrough)
    }
}

/// Playback capability for one slot
pub trait MediaResource {
    /// Bind to a new source and start buffering it
    fn load(&mut self, source_url: &str, binding: Binding);

    /// Release the current source
    fn unload(&mut self);

    /// Start or resume playback
    ///
    /// Returns [`crate::Error::AutoplayRejected`] when the environment refuses
    /// programmatic playback; the player retries on the next frame.
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    fn seek(&mut self, position: Duration);

    /// Current playback position
    fn position(&self) -> Duration;

    /// Source duration, once known
    fn duration(&self) -> Option<Duration>;

    fn set_muted(&mut self, muted: bool);

    /// Visual opacity (0.0 hidden, 1.0 visible)
    fn set_opacity(&mut self, opacity: f32);

    /// Drain notifications the resource produced on its own
    ///
    /// Hosts that receive callbacks instead feed them through
    /// [`super::StoryPlayer::on_media_event`] and keep this default.
    fn poll_events(&mut self, _now: Instant) -> Vec<MediaEvent> {
        Vec::new()
    }
}
