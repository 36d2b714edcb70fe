//! Event types for the story player event system
//!
//! The player state machine records a [`StoryEvent`] for every observable
//! state change. The async engine wraps each one in a [`PlayerEvent`]
//! envelope and publishes it on an [`EventBus`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Identity of one of the two playback slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotId {
    A,
    B,
}

impl SlotId {
    /// The other slot
    pub fn other(self) -> SlotId {
        match self {
            SlotId::A => SlotId::B,
            SlotId::B => SlotId::A,
        }
    }

    /// Array index for per-slot storage (A = 0, B = 1)
    pub fn index(self) -> usize {
        match self {
            SlotId::A => 0,
            SlotId::B => 1,
        }
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotId::A => write!(f, "A"),
            SlotId::B => write!(f, "B"),
        }
    }
}

/// Direction of a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Navigation {
    Previous,
    Next,
}

/// What caused a transition to be requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionTrigger {
    /// Explicit navigation (tap zone or API call)
    Manual(Navigation),
    /// Active item reached its natural end
    Ended,
    /// Active item's remaining duration fell below the lead time
    NearEnd,
}

impl TransitionTrigger {
    /// Direction the trigger navigates in
    pub fn navigation(self) -> Navigation {
        match self {
            TransitionTrigger::Manual(direction) => direction,
            TransitionTrigger::Ended | TransitionTrigger::NearEnd => Navigation::Next,
        }
    }
}

/// Story player event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoryEvent {
    /// A transition entered the preparing state
    TransitionStarted {
        token: u64,
        trigger: TransitionTrigger,
        from_index: usize,
        target_index: usize,
        target_slot: SlotId,
    },

    /// The target slot was ready and advancing; crossfade began
    TransitionRevealed { token: u64, target_slot: SlotId },

    /// Crossfade finished; target slot is now active
    TransitionCommitted {
        token: u64,
        active_slot: SlotId,
        active_index: usize,
    },

    /// Target slot never became ready within the reveal timeout
    TransitionAborted {
        token: u64,
        target_index: usize,
        waited_ms: u64,
    },

    /// Request dropped because a transition was already in flight
    TransitionRejected { trigger: TransitionTrigger },

    /// Single-item list replayed its only item
    ItemLooped { index: usize },

    /// Playback suspended by the visibility gate
    PlaybackGated {
        intersecting: bool,
        document_visible: bool,
    },

    /// Playback allowed again by the visibility gate
    PlaybackResumed,

    /// The media resource refused to start playback (autoplay policy)
    AutoplayRejected { slot: SlotId },
}

/// Envelope published on the event bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerEvent {
    pub player_id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: StoryEvent,
}

impl PlayerEvent {
    pub fn new(player_id: Uuid, event: StoryEvent) -> Self {
        Self {
            player_id,
            timestamp: crate::time::now(),
            event,
        }
    }
}

/// Broadcast bus for player events
///
/// Every subscriber receives every event emitted after it subscribed. Slow
/// subscribers lose the oldest events once `capacity` is exceeded.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use story_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// assert_eq!(event_bus.capacity(), 256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PlayerEvent,
    ) -> Result<usize, broadcast::error::SendError<PlayerEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
