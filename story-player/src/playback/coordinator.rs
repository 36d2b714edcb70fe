//! Transition coordinator
//!
//! Owns the story list, both slots, and the playback state, and runs the
//! transition state machine:
//!
//! ```text
//!          request / ended / near end
//!   Idle ─────────────────────────────▶ Preparing(target, token)
//!    ▲                                     │          │
//!    │ abort (reveal timeout)              │          │ target ready AND
//!    └─────────────────────────────────────┘          │ position > 0
//!    ▲                                                ▼
//!    └──────────── commit (crossfade elapsed) ── CrossfadingVisible(token)
//! ```
//!
//! Tokens:
//! - entering Preparing increments the token
//! - committing increments it again to close the transition
//! - aborting leaves it unchanged
//!
//! Only one transition is ever in flight. Requests made meanwhile are
//! dropped, not queued; a natural end of the active item is remembered and
//! re-checked on the next frame once the coordinator is idle again.

use super::media::{Binding, MediaEvent, MediaResource};
use super::progress::progress_percent;
use super::slots::SlotManager;
use super::source::{resolve_items, StoryItem};
use std::time::{Duration, Instant};
use story_common::config::PlayerConfig;
use story_common::events::{Navigation, SlotId, StoryEvent, TransitionTrigger};
use tracing::{debug, info};

/// Observable phase of the transition state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    Idle,
    Preparing {
        target_slot: SlotId,
        target_item_index: usize,
        token: u64,
    },
    CrossfadingVisible {
        token: u64,
    },
}

/// A navigation in flight
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransition {
    pub target_slot: SlotId,
    pub target_item_index: usize,
    pub transition_token: u64,
    /// Target slot has been revealed and the crossfade is running
    pub is_pending_visible: bool,
    pub trigger: TransitionTrigger,
    /// Start of the reveal-timeout window
    pub started_at: Instant,
    /// Start of the crossfade
    pub revealed_at: Option<Instant>,
    /// Target slot's `play` was refused and must be retried
    play_pending: bool,
}

/// Playback state of the player instance
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub active_slot: SlotId,
    pub active_item_index: usize,
    pub pending_transition: Option<PendingTransition>,
    /// Active item progress in [0, 100]
    pub progress_percent: f64,
}

/// Drives slot bindings and transitions for one player instance
pub struct TransitionCoordinator<M: MediaResource> {
    items: Vec<StoryItem>,
    slots: SlotManager<M>,
    state: PlaybackState,
    token: u64,
    config: PlayerConfig,

    /// Visibility gate is open
    playback_allowed: bool,

    /// When the gate closed, for shifting the in-flight transition's windows
    suspended_at: Option<Instant>,

    /// Active slot's `play` was refused and must be retried
    active_play_pending: bool,

    /// Active item ended while a transition was in flight
    ended_pending: bool,

    events: Vec<StoryEvent>,
}

impl<M: MediaResource> TransitionCoordinator<M> {
    /// Bind slot A to item 0 and slot B to item 1 (item 0 for a single item)
    ///
    /// Playback does not start until [`start`](Self::start).
    pub fn new(items: Vec<StoryItem>, slot_a: M, slot_b: M, config: PlayerConfig) -> Self {
        let items = if items.is_empty() {
            resolve_items(None)
        } else {
            items
        };

        let mut slots = SlotManager::new(slot_a, slot_b);
        let second = if items.len() > 1 { 1 } else { 0 };
        slots.assign(SlotId::A, 0, &items[0].source_url);
        slots.assign(SlotId::B, second, &items[second].source_url);

        // Only the visible slot may be audible
        let active = slots.media_mut(SlotId::A);
        active.set_muted(config.muted);
        active.set_opacity(1.0);
        let background = slots.media_mut(SlotId::B);
        background.set_muted(true);
        background.set_opacity(0.0);

        Self {
            items,
            slots,
            state: PlaybackState {
                active_slot: SlotId::A,
                active_item_index: 0,
                pending_transition: None,
                progress_percent: 0.0,
            },
            token: 0,
            config,
            playback_allowed: false,
            suspended_at: None,
            active_play_pending: false,
            ended_pending: false,
            events: Vec::new(),
        }
    }

    /// Allow playback and start the active slot
    pub fn start(&mut self) {
        self.playback_allowed = true;
        self.active_play_pending = !self.try_play(self.state.active_slot, true);
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Current transition token
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn items(&self) -> &[StoryItem] {
        &self.items
    }

    pub fn slots(&self) -> &SlotManager<M> {
        &self.slots
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn playback_allowed(&self) -> bool {
        self.playback_allowed
    }

    pub fn phase(&self) -> TransitionPhase {
        match &self.state.pending_transition {
            None => TransitionPhase::Idle,
            Some(p) if !p.is_pending_visible => TransitionPhase::Preparing {
                target_slot: p.target_slot,
                target_item_index: p.target_item_index,
                token: p.transition_token,
            },
            Some(p) => TransitionPhase::CrossfadingVisible {
                token: p.transition_token,
            },
        }
    }

    /// Take the events recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<StoryEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn push_event(&mut self, event: StoryEvent) {
        self.events.push(event);
    }

    fn step(&self, from: usize, navigation: Navigation) -> usize {
        let len = self.items.len();
        match navigation {
            Navigation::Next => (from + 1) % len,
            Navigation::Previous => (from + len - 1) % len,
        }
    }

    /// Explicit navigation request
    ///
    /// Returns `false` when the request was dropped (transition in flight or
    /// nothing to navigate to).
    pub fn request(&mut self, navigation: Navigation, now: Instant) -> bool {
        let trigger = TransitionTrigger::Manual(navigation);

        if self.state.pending_transition.is_some() {
            debug!("Dropping {:?} request: transition in flight", navigation);
            self.events.push(StoryEvent::TransitionRejected { trigger });
            return false;
        }

        if self.items.len() <= 1 {
            debug!("Dropping {:?} request: single story", navigation);
            return false;
        }

        self.begin(trigger, now);
        true
    }

    /// Media notification for `slot` under `binding`
    pub fn on_media_event(&mut self, slot: SlotId, binding: Binding, event: MediaEvent, now: Instant) {
        let current = self.slots.state(slot).binding;
        if current != binding {
            debug!(
                "Ignoring {:?} for slot {}: binding {} superseded by {}",
                event, slot, binding, current
            );
            return;
        }

        if event.is_readiness() {
            self.slots.mark_ready(slot, binding);
        } else if event == MediaEvent::Ended {
            self.on_ended(slot, now);
        }
    }

    fn on_ended(&mut self, slot: SlotId, now: Instant) {
        if slot != self.state.active_slot {
            debug!("Ignoring ended on inactive slot {}", slot);
            return;
        }

        if self.items.len() <= 1 {
            let index = self.state.active_item_index;
            self.slots.media_mut(slot).seek(Duration::ZERO);
            if self.playback_allowed {
                self.active_play_pending = !self.try_play(slot, true);
            }
            info!("Looping single story {}", index);
            self.events.push(StoryEvent::ItemLooped { index });
            return;
        }

        if self.state.pending_transition.is_none() && self.playback_allowed {
            self.begin(TransitionTrigger::Ended, now);
        } else {
            self.ended_pending = true;
        }
    }

    /// One animation frame
    pub fn tick(&mut self, now: Instant) {
        self.poll_media(now);

        if self.playback_allowed {
            if self.active_play_pending {
                self.active_play_pending = !self.try_play(self.state.active_slot, false);
            }

            match self
                .state
                .pending_transition
                .as_ref()
                .map(|p| p.is_pending_visible)
            {
                None => self.check_auto_advance(now),
                Some(false) => self.advance_preparing(now),
                Some(true) => self.advance_crossfade(now),
            }
        }

        self.refresh_progress();
    }

    fn poll_media(&mut self, now: Instant) {
        for slot in [SlotId::A, SlotId::B] {
            let binding = self.slots.state(slot).binding;
            let events = self.slots.media_mut(slot).poll_events(now);
            for event in events {
                self.on_media_event(slot, binding, event, now);
            }
        }
    }

    fn check_auto_advance(&mut self, now: Instant) {
        if self.items.len() <= 1 {
            return;
        }

        if self.ended_pending {
            self.begin(TransitionTrigger::Ended, now);
            return;
        }

        let media = self.slots.media(self.state.active_slot);
        if let Some(duration) = media.duration() {
            let remaining = duration.saturating_sub(media.position());
            if remaining < self.config.lead_time() {
                self.begin(TransitionTrigger::NearEnd, now);
            }
        }
    }

    fn begin(&mut self, trigger: TransitionTrigger, now: Instant) {
        let from_index = self.state.active_item_index;
        let target_item_index = self.step(from_index, trigger.navigation());
        let target_slot = self.state.active_slot.other();

        self.token += 1;
        let token = self.token;

        // The eager preload usually already holds the target
        if self.slots.state(target_slot).assigned_item_index == Some(target_item_index) {
            self.slots.media_mut(target_slot).seek(Duration::ZERO);
        } else {
            let source_url = self.items[target_item_index].source_url.clone();
            self.slots.assign(target_slot, target_item_index, &source_url);
        }

        let media = self.slots.media_mut(target_slot);
        media.set_muted(true);
        media.set_opacity(0.0);

        let play_pending = if self.playback_allowed {
            !self.try_play(target_slot, true)
        } else {
            true
        };

        self.ended_pending = false;
        self.state.pending_transition = Some(PendingTransition {
            target_slot,
            target_item_index,
            transition_token: token,
            is_pending_visible: false,
            trigger,
            started_at: now,
            revealed_at: None,
            play_pending,
        });

        info!(
            "Transition {} started ({:?}): story {} -> {} on slot {}",
            token, trigger, from_index, target_item_index, target_slot
        );
        self.events.push(StoryEvent::TransitionStarted {
            token,
            trigger,
            from_index,
            target_index: target_item_index,
            target_slot,
        });
    }

    fn advance_preparing(&mut self, now: Instant) {
        let (target_slot, token, started_at, play_pending) = match &self.state.pending_transition {
            Some(p) => (p.target_slot, p.transition_token, p.started_at, p.play_pending),
            None => return,
        };

        if play_pending {
            let started = self.try_play(target_slot, false);
            if let Some(p) = self.state.pending_transition.as_mut() {
                p.play_pending = !started;
            }
        }

        // Readiness alone is not enough: the target must actually be decoding
        if self.slots.is_ready(target_slot) && self.slots.position(target_slot) > Duration::ZERO {
            self.reveal(token, now);
            return;
        }

        let waited = now.saturating_duration_since(started_at);
        if waited >= self.config.reveal_timeout() {
            self.abort(token, waited);
        }
    }

    fn reveal(&mut self, token: u64, now: Instant) {
        let Some(pending) = self
            .state
            .pending_transition
            .as_mut()
            .filter(|p| p.transition_token == token)
        else {
            return;
        };

        pending.is_pending_visible = true;
        pending.revealed_at = Some(now);
        let target_slot = pending.target_slot;

        debug!("Transition {} revealing slot {}", token, target_slot);
        self.events.push(StoryEvent::TransitionRevealed { token, target_slot });
    }

    fn advance_crossfade(&mut self, now: Instant) {
        let (target_slot, token, revealed_at) = match &self.state.pending_transition {
            Some(p) => (p.target_slot, p.transition_token, p.revealed_at.unwrap_or(now)),
            None => return,
        };

        let crossfade = self.config.crossfade();
        let elapsed = now.saturating_duration_since(revealed_at);
        if elapsed >= crossfade {
            self.commit(token);
            return;
        }

        let t = elapsed.as_secs_f32() / crossfade.as_secs_f32();
        let curve = self.config.fade_curve;
        let active_slot = self.state.active_slot;
        self.slots
            .media_mut(target_slot)
            .set_opacity(curve.fade_in_opacity(t));
        self.slots
            .media_mut(active_slot)
            .set_opacity(curve.fade_out_opacity(t));
    }

    fn commit(&mut self, token: u64) {
        let matches = self
            .state
            .pending_transition
            .as_ref()
            .is_some_and(|p| p.transition_token == token && p.is_pending_visible);
        if !matches {
            debug!("Ignoring commit for superseded transition {}", token);
            return;
        }
        let Some(pending) = self.state.pending_transition.take() else {
            return;
        };

        let old_slot = self.state.active_slot;
        let old_media = self.slots.media_mut(old_slot);
        old_media.pause();
        old_media.set_muted(true);
        old_media.set_opacity(0.0);
        let new_media = self.slots.media_mut(pending.target_slot);
        new_media.set_muted(self.config.muted);
        new_media.set_opacity(1.0);

        self.state.active_slot = pending.target_slot;
        self.state.active_item_index = pending.target_item_index;
        self.token += 1;
        self.ended_pending = false;
        self.active_play_pending = pending.play_pending;
        self.refresh_progress();

        // Keep the following transition warm
        let next_index = self.step(pending.target_item_index, Navigation::Next);
        let source_url = self.items[next_index].source_url.clone();
        self.slots.assign(old_slot, next_index, &source_url);

        info!(
            "Transition {} committed: story {} active on slot {}",
            token, pending.target_item_index, pending.target_slot
        );
        self.events.push(StoryEvent::TransitionCommitted {
            token,
            active_slot: pending.target_slot,
            active_index: pending.target_item_index,
        });
    }

    fn abort(&mut self, token: u64, waited: Duration) {
        let matches = self
            .state
            .pending_transition
            .as_ref()
            .is_some_and(|p| p.transition_token == token);
        if !matches {
            return;
        }
        let Some(pending) = self.state.pending_transition.take() else {
            return;
        };

        self.slots.release(pending.target_slot);

        debug!(
            "Transition {} aborted: slot {} not decoding story {} after {}ms",
            token,
            pending.target_slot,
            pending.target_item_index,
            waited.as_millis()
        );
        self.events.push(StoryEvent::TransitionAborted {
            token,
            target_index: pending.target_item_index,
            waited_ms: waited.as_millis() as u64,
        });
    }

    fn try_play(&mut self, slot: SlotId, report: bool) -> bool {
        match self.slots.media_mut(slot).play() {
            Ok(()) => true,
            Err(e) => {
                debug!("Play on slot {} refused: {}", slot, e);
                if report {
                    self.events.push(StoryEvent::AutoplayRejected { slot });
                }
                false
            }
        }
    }

    /// Visibility gate closed: pause everything that plays
    pub fn suspend(&mut self, now: Instant) {
        if !self.playback_allowed {
            return;
        }
        self.playback_allowed = false;
        self.suspended_at = Some(now);

        self.slots.media_mut(self.state.active_slot).pause();
        if let Some(target_slot) = self.state.pending_transition.as_ref().map(|p| p.target_slot) {
            self.slots.media_mut(target_slot).pause();
        }
    }

    /// Visibility gate opened: resume from the current positions
    ///
    /// An in-flight transition's timeout and crossfade windows are shifted by
    /// the part of the suspension that overlapped them.
    pub fn resume(&mut self, now: Instant) {
        if self.playback_allowed {
            return;
        }
        self.playback_allowed = true;

        let suspended_at = self.suspended_at.take().unwrap_or(now);

        self.active_play_pending = !self.try_play(self.state.active_slot, true);

        let Some(target_slot) = self.state.pending_transition.as_ref().map(|p| p.target_slot) else {
            return;
        };
        let started = self.try_play(target_slot, false);
        if let Some(pending) = self.state.pending_transition.as_mut() {
            pending.started_at = shift_past_suspension(pending.started_at, suspended_at, now);
            pending.revealed_at = pending
                .revealed_at
                .map(|at| shift_past_suspension(at, suspended_at, now));
            pending.play_pending = !started;
        }
    }

    fn refresh_progress(&mut self) {
        let media = self.slots.media(self.state.active_slot);
        self.state.progress_percent = progress_percent(media.position(), media.duration());
    }

    /// Abandon any transition and release both slots
    pub fn teardown(&mut self) {
        self.state.pending_transition = None;
        self.playback_allowed = false;
        self.slots.teardown();
    }
}

/// Move a window start `mark` forward by the suspended time that followed it
fn shift_past_suspension(mark: Instant, suspended_at: Instant, resumed_at: Instant) -> Instant {
    mark + resumed_at.saturating_duration_since(mark.max(suspended_at))
}
