//! Story playback: slots, transitions, input, and the async engine

pub mod coordinator;
pub mod engine;
pub mod gesture;
pub mod media;
pub mod player;
pub mod progress;
pub mod simulated;
pub mod slots;
pub mod source;
pub mod visibility;

pub use coordinator::{PendingTransition, PlaybackState, TransitionCoordinator, TransitionPhase};
pub use engine::{EngineCommand, EngineHandle, StoryEngine};
pub use gesture::{GestureClassifier, GestureKind, PointerSample, TapZone};
pub use media::{Binding, MediaEvent, MediaResource};
pub use player::{PendingSnapshot, PlayerSnapshot, StoryPlayer};
pub use simulated::{SimulatedMedia, SimulatedMediaConfig};
pub use slots::{SlotManager, SlotState};
pub use source::{resolve_items, StoryItem, DEFAULT_STORY_SOURCES};
pub use story_common::events::{Navigation, SlotId, StoryEvent, TransitionTrigger};
pub use visibility::{GateChange, VisibilityGate};
