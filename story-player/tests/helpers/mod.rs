//! Shared fixtures for story player integration tests
//!
//! Players run against `SimulatedMedia` with an explicit clock: every test
//! owns a [`FrameClock`] and advances it one animation frame at a time.

#![allow(dead_code)]

use std::time::{Duration, Instant};
use story_common::config::{MediaRef, PlayerConfig};
use story_common::events::StoryEvent;
use story_player::playback::{SimulatedMedia, SimulatedMediaConfig, StoryPlayer};

pub const FRAME: Duration = Duration::from_millis(16);

/// `https://cdn.example.com/stories/{i}.mp4` for i in 0..count
pub fn story_url(i: usize) -> String {
    format!("https://cdn.example.com/stories/{i}.mp4")
}

pub fn media_refs(count: usize) -> Vec<MediaRef> {
    (0..count).map(|i| MediaRef::new(story_url(i))).collect()
}

pub fn media_config(item_ms: u64) -> SimulatedMediaConfig {
    SimulatedMediaConfig {
        item_duration: Duration::from_millis(item_ms),
        load_latency: Duration::from_millis(100),
        ..SimulatedMediaConfig::default()
    }
}

pub fn build_player(count: usize, media: SimulatedMediaConfig) -> StoryPlayer<SimulatedMedia> {
    StoryPlayer::new(
        Some(&media_refs(count)),
        PlayerConfig::default(),
        SimulatedMedia::new(media.clone()),
        SimulatedMedia::new(media),
    )
    .unwrap()
}

/// Frame-stepping clock with an event log
pub struct FrameClock {
    pub start: Instant,
    pub now: Instant,
    pub events: Vec<(Duration, StoryEvent)>,
}

impl FrameClock {
    pub fn new() -> Self {
        let start = Instant::now();
        Self {
            start,
            now: start,
            events: Vec::new(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.now - self.start
    }

    /// Tick at the current instant, then advance one frame
    pub fn frame(&mut self, player: &mut StoryPlayer<SimulatedMedia>) {
        player.tick(self.now);
        self.collect(player);
        assert_invariants(player);
        self.now += FRAME;
    }

    /// Record events produced outside of `frame` (navigation, gate changes)
    pub fn collect(&mut self, player: &mut StoryPlayer<SimulatedMedia>) {
        let at = self.elapsed();
        self.events
            .extend(player.drain_events().into_iter().map(|e| (at, e)));
    }

    /// Run frames until `elapsed() >= until`
    pub fn run_until(&mut self, player: &mut StoryPlayer<SimulatedMedia>, until: Duration) {
        while self.elapsed() < until {
            self.frame(player);
        }
    }

    /// Run frames until `pred` matches a newly recorded event, up to `limit`
    ///
    /// Returns the elapsed time at which the matching event was recorded.
    pub fn run_until_event(
        &mut self,
        player: &mut StoryPlayer<SimulatedMedia>,
        limit: Duration,
        pred: impl Fn(&StoryEvent) -> bool,
    ) -> Option<Duration> {
        let seen = self.events.len();
        while self.elapsed() < limit {
            self.frame(player);
            if let Some((at, _)) = self.events[seen..].iter().find(|(_, e)| pred(e)) {
                return Some(*at);
            }
        }
        None
    }

    pub fn count(&self, pred: impl Fn(&StoryEvent) -> bool) -> usize {
        self.events.iter().filter(|(_, e)| pred(e)).count()
    }
}

/// Checks that must hold after every frame
pub fn assert_invariants(player: &StoryPlayer<SimulatedMedia>) {
    let state = player.state();

    if let Some(pending) = &state.pending_transition {
        assert_ne!(
            pending.target_slot, state.active_slot,
            "target slot must never be the active slot"
        );
    }

    assert!(
        (0.0..=100.0).contains(&state.progress_percent),
        "progress out of bounds: {}",
        state.progress_percent
    );
}
