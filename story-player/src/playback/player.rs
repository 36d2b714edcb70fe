//! Story player
//!
//! Top-level component: resolves the story list, owns the transition
//! coordinator, and routes pointer input and visibility signals into it.
//! Everything is driven by the host: call [`StoryPlayer::tick`] once per
//! animation frame and forward input as it happens.

use super::coordinator::{PlaybackState, TransitionCoordinator, TransitionPhase};
use super::gesture::{GestureClassifier, GestureKind, PointerSample};
use super::media::{Binding, MediaEvent, MediaResource};
use super::progress::segment_progress;
use super::slots::SlotState;
use super::source::{resolve_items, StoryItem};
use super::visibility::{GateChange, VisibilityGate};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use story_common::config::{MediaRef, PlayerConfig, StoryOverlay};
use story_common::events::{Navigation, SlotId, StoryEvent};
use story_common::time::format_elapsed_label;
use tracing::{debug, info};

/// Serializable view of a transition in flight
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingSnapshot {
    pub target_slot: SlotId,
    pub target_item_index: usize,
    pub transition_token: u64,
    pub is_pending_visible: bool,
}

/// Serializable view of the player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub active_slot: SlotId,
    pub active_item_index: usize,
    pub item_count: usize,
    pub token: u64,
    pub pending: Option<PendingSnapshot>,
    pub progress_percent: f64,
    pub segments: Vec<f64>,
    pub playback_allowed: bool,
}

/// Dual-slot story player
pub struct StoryPlayer<M: MediaResource> {
    coordinator: TransitionCoordinator<M>,
    gestures: GestureClassifier,
    gate: VisibilityGate,
    overlay: Option<StoryOverlay>,
}

impl<M: MediaResource> StoryPlayer<M> {
    /// Build a player over two media resources and start the first story
    ///
    /// `media` is the CMS-supplied list; `None` or an unusable list selects
    /// the built-in stories.
    pub fn new(media: Option<&[MediaRef]>, config: PlayerConfig, slot_a: M, slot_b: M) -> Result<Self> {
        config.validate()?;

        let items = resolve_items(media);
        info!("Story player created with {} stories", items.len());

        let gestures = GestureClassifier::new(&config);
        let mut coordinator = TransitionCoordinator::new(items, slot_a, slot_b, config);
        coordinator.start();

        Ok(Self {
            coordinator,
            gestures,
            gate: VisibilityGate::new(),
            overlay: None,
        })
    }

    /// Attach passive overlay metadata
    pub fn with_overlay(mut self, overlay: Option<StoryOverlay>) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn overlay(&self) -> Option<&StoryOverlay> {
        self.overlay.as_ref()
    }

    /// Overlay elapsed-time label, when a publish time is known
    pub fn elapsed_label(&self, now: DateTime<Utc>) -> Option<String> {
        self.overlay
            .as_ref()
            .and_then(|o| o.published_at)
            .map(|published_at| format_elapsed_label(published_at, now))
    }

    /// One animation frame
    pub fn tick(&mut self, now: Instant) {
        self.coordinator.tick(now);
    }

    /// Navigate to the previous or next story
    ///
    /// Returns `false` when the request was dropped.
    pub fn navigate(&mut self, navigation: Navigation, now: Instant) -> bool {
        self.coordinator.request(navigation, now)
    }

    pub fn pointer_down(&mut self, sample: PointerSample) {
        self.gestures.pointer_down(sample);
    }

    pub fn pointer_cancel(&mut self) {
        self.gestures.pointer_cancel();
    }

    /// Classify a pointer-up and navigate on a zoned tap
    ///
    /// Returns the navigation that was requested, if any (whether or not the
    /// coordinator accepted it).
    pub fn pointer_up(&mut self, sample: PointerSample, surface_width: f64) -> Option<Navigation> {
        let navigation = match self.gestures.pointer_up(sample, surface_width)? {
            GestureKind::Tap(zone) => zone.navigation()?,
            other => {
                debug!("Pointer gesture {:?} ignored", other);
                return None;
            }
        };

        self.coordinator.request(navigation, sample.at);
        Some(navigation)
    }

    pub fn set_intersecting(&mut self, intersecting: bool, now: Instant) {
        let change = self.gate.set_intersecting(intersecting);
        self.apply_gate(change, now);
    }

    pub fn set_document_visible(&mut self, visible: bool, now: Instant) {
        let change = self.gate.set_document_visible(visible);
        self.apply_gate(change, now);
    }

    fn apply_gate(&mut self, change: GateChange, now: Instant) {
        match change {
            GateChange::Closed => {
                info!(
                    "Playback gated (intersecting={}, document_visible={})",
                    self.gate.intersecting(),
                    self.gate.document_visible()
                );
                self.coordinator.suspend(now);
                self.coordinator.push_event(StoryEvent::PlaybackGated {
                    intersecting: self.gate.intersecting(),
                    document_visible: self.gate.document_visible(),
                });
            }
            GateChange::Opened => {
                info!("Playback resumed");
                self.coordinator.resume(now);
                self.coordinator.push_event(StoryEvent::PlaybackResumed);
            }
            GateChange::Unchanged => {}
        }
    }

    /// Media notification pushed by the host for `slot` under `binding`
    pub fn on_media_event(&mut self, slot: SlotId, binding: Binding, event: MediaEvent, now: Instant) {
        self.coordinator.on_media_event(slot, binding, event, now);
    }

    pub fn state(&self) -> &PlaybackState {
        self.coordinator.state()
    }

    pub fn phase(&self) -> TransitionPhase {
        self.coordinator.phase()
    }

    pub fn token(&self) -> u64 {
        self.coordinator.token()
    }

    pub fn items(&self) -> &[StoryItem] {
        self.coordinator.items()
    }

    pub fn slot_state(&self, slot: SlotId) -> &SlotState {
        self.coordinator.slots().state(slot)
    }

    pub fn media(&self, slot: SlotId) -> &M {
        self.coordinator.slots().media(slot)
    }

    pub fn config(&self) -> &PlayerConfig {
        self.coordinator.config()
    }

    pub fn playback_allowed(&self) -> bool {
        self.coordinator.playback_allowed()
    }

    /// Progress of every story for the segmented bar
    pub fn segment_progress(&self) -> Vec<f64> {
        let state = self.coordinator.state();
        segment_progress(
            self.coordinator.items().len(),
            state.active_item_index,
            state.progress_percent,
        )
    }

    pub fn drain_events(&mut self) -> Vec<StoryEvent> {
        self.coordinator.drain_events()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        let state = self.coordinator.state();
        PlayerSnapshot {
            active_slot: state.active_slot,
            active_item_index: state.active_item_index,
            item_count: self.coordinator.items().len(),
            token: self.coordinator.token(),
            pending: state.pending_transition.as_ref().map(|p| PendingSnapshot {
                target_slot: p.target_slot,
                target_item_index: p.target_item_index,
                transition_token: p.transition_token,
                is_pending_visible: p.is_pending_visible,
            }),
            progress_percent: state.progress_percent,
            segments: self.segment_progress(),
            playback_allowed: self.coordinator.playback_allowed(),
        }
    }

    /// Pause and unload both slots
    pub fn teardown(&mut self) {
        info!("Story player torn down");
        self.coordinator.teardown();
    }
}
