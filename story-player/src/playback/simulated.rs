//! Clock-driven simulated media resource
//!
//! Stands in for a real video element in tests and in the `story-sim`
//! binary. Time only advances through [`MediaResource::poll_events`], so a
//! caller that feeds explicit instants gets fully deterministic playback.
//!
//! Model:
//! - a source becomes ready `load_latency` after the first poll following
//!   `load` (never, for stalled sources)
//! - position advances only while playing AND ready
//! - reaching the duration pauses and reports `Ended` once

use super::media::{Binding, MediaEvent, MediaResource};
use crate::{Error, Result};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Behaviour of a simulated resource
#[derive(Debug, Clone)]
pub struct SimulatedMediaConfig {
    /// Duration of every source
    pub item_duration: Duration,

    /// Time from load to readiness
    pub load_latency: Duration,

    /// Sources that never become ready
    pub stalled_sources: HashSet<String>,

    /// Number of `play` calls to refuse before accepting
    pub autoplay_rejections: u32,
}

impl Default for SimulatedMediaConfig {
    fn default() -> Self {
        Self {
            item_duration: Duration::from_secs(3),
            load_latency: Duration::from_millis(100),
            stalled_sources: HashSet::new(),
            autoplay_rejections: 0,
        }
    }
}

/// Simulated playback resource
#[derive(Debug)]
pub struct SimulatedMedia {
    config: SimulatedMediaConfig,
    source: Option<String>,
    binding: Option<Binding>,
    load_started: Option<Instant>,
    ready: bool,
    playing: bool,
    position: Duration,
    last_poll: Option<Instant>,
    ended_reported: bool,
    muted: bool,
    opacity: f32,
    rejections_left: u32,
    load_count: u32,
}

impl SimulatedMedia {
    pub fn new(config: SimulatedMediaConfig) -> Self {
        let rejections_left = config.autoplay_rejections;
        Self {
            config,
            source: None,
            binding: None,
            load_started: None,
            ready: false,
            playing: false,
            position: Duration::ZERO,
            last_poll: None,
            ended_reported: false,
            muted: false,
            opacity: 0.0,
            rejections_left,
            load_count: 0,
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn binding(&self) -> Option<Binding> {
        self.binding
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Number of `load` calls so far
    pub fn load_count(&self) -> u32 {
        self.load_count
    }

    fn is_stalled(&self) -> bool {
        self.source
            .as_ref()
            .is_some_and(|s| self.config.stalled_sources.contains(s))
    }
}

impl MediaResource for SimulatedMedia {
    fn load(&mut self, source_url: &str, binding: Binding) {
        self.source = Some(source_url.to_string());
        self.binding = Some(binding);
        self.load_started = None;
        self.ready = false;
        self.playing = false;
        self.position = Duration::ZERO;
        self.ended_reported = false;
        self.load_count += 1;
    }

    fn unload(&mut self) {
        self.source = None;
        self.binding = None;
        self.load_started = None;
        self.ready = false;
        self.playing = false;
        self.position = Duration::ZERO;
        self.ended_reported = false;
    }

    fn play(&mut self) -> Result<()> {
        if self.rejections_left > 0 {
            self.rejections_left -= 1;
            return Err(Error::AutoplayRejected(
                "play() requires a user gesture".to_string(),
            ));
        }
        if self.source.is_some() {
            self.playing = true;
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek(&mut self, position: Duration) {
        self.position = position.min(self.config.item_duration);
        if self.position < self.config.item_duration {
            self.ended_reported = false;
        }
    }

    fn position(&self) -> Duration {
        self.position
    }

    fn duration(&self) -> Option<Duration> {
        if self.ready {
            Some(self.config.item_duration)
        } else {
            None
        }
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    fn poll_events(&mut self, now: Instant) -> Vec<MediaEvent> {
        let mut events = Vec::new();
        let elapsed = self
            .last_poll
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        self.last_poll = Some(now);

        if self.source.is_none() {
            return events;
        }

        let load_started = *self.load_started.get_or_insert(now);
        if !self.ready
            && !self.is_stalled()
            && now.saturating_duration_since(load_started) >= self.config.load_latency
        {
            self.ready = true;
            events.push(MediaEvent::LoadedMetadata);
            events.push(MediaEvent::CanPlayThrough);
            // Decoding starts from the readiness instant, not the last poll
            return events;
        }

        if self.playing && self.ready {
            self.position = (self.position + elapsed).min(self.config.item_duration);
            if self.position >= self.config.item_duration && !self.ended_reported {
                self.playing = false;
                self.ended_reported = true;
                events.push(MediaEvent::Ended);
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SimulatedMediaConfig {
        SimulatedMediaConfig {
            item_duration: Duration::from_millis(500),
            load_latency: Duration::from_millis(100),
            ..SimulatedMediaConfig::default()
        }
    }

    #[test]
    fn test_ready_after_latency() {
        let start = Instant::now();
        let mut media = SimulatedMedia::new(config());
        media.load("a.mp4", Binding(1));

        assert!(media.poll_events(start).is_empty());
        assert!(media.poll_events(start + Duration::from_millis(50)).is_empty());

        let events = media.poll_events(start + Duration::from_millis(100));
        assert_eq!(events, vec![MediaEvent::LoadedMetadata, MediaEvent::CanPlayThrough]);
        assert_eq!(media.duration(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_position_advances_only_when_ready_and_playing() {
        let start = Instant::now();
        let mut media = SimulatedMedia::new(config());
        media.load("a.mp4", Binding(1));
        media.play().unwrap();

        media.poll_events(start);
        media.poll_events(start + Duration::from_millis(60));
        assert_eq!(media.position(), Duration::ZERO);

        media.poll_events(start + Duration::from_millis(100)); // ready
        media.poll_events(start + Duration::from_millis(150));
        assert_eq!(media.position(), Duration::from_millis(50));

        media.pause();
        media.poll_events(start + Duration::from_millis(300));
        assert_eq!(media.position(), Duration::from_millis(50));
    }

    #[test]
    fn test_ended_reported_once() {
        let start = Instant::now();
        let mut media = SimulatedMedia::new(config());
        media.load("a.mp4", Binding(1));
        media.play().unwrap();
        media.poll_events(start);
        media.poll_events(start + Duration::from_millis(100));

        let events = media.poll_events(start + Duration::from_millis(700));
        assert_eq!(events, vec![MediaEvent::Ended]);
        assert_eq!(media.position(), Duration::from_millis(500));
        assert!(!media.is_playing());
        assert!(media.poll_events(start + Duration::from_millis(800)).is_empty());
    }

    #[test]
    fn test_stalled_source_never_ready() {
        let start = Instant::now();
        let mut cfg = config();
        cfg.stalled_sources.insert("stuck.mp4".to_string());
        let mut media = SimulatedMedia::new(cfg);
        media.load("stuck.mp4", Binding(1));

        for ms in (0..5000).step_by(100) {
            assert!(media.poll_events(start + Duration::from_millis(ms)).is_empty());
        }
        assert!(!media.is_ready());
    }

    #[test]
    fn test_autoplay_rejections_then_accept() {
        let mut cfg = config();
        cfg.autoplay_rejections = 2;
        let mut media = SimulatedMedia::new(cfg);
        media.load("a.mp4", Binding(1));

        assert!(matches!(media.play(), Err(Error::AutoplayRejected(_))));
        assert!(media.play().is_err());
        assert!(media.play().is_ok());
        assert!(media.is_playing());
    }
}
