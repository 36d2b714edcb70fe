//! Dual-slot buffer manager
//!
//! Owns the two playback slots and tracks, per slot, which story item it is
//! bound to and whether that binding has buffered enough to play.
//!
//! Slot identity (A/B) never changes; only bindings and readiness do.

use super::media::{Binding, MediaResource};
use std::time::Duration;
use story_common::events::SlotId;
use tracing::debug;

/// Binding and readiness of one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotState {
    /// Story item this slot holds (`None` after release)
    pub assigned_item_index: Option<usize>,

    /// Current binding has buffered enough to play
    pub is_ready: bool,

    /// Binding handed to the resource on the last assign/release
    pub binding: Binding,
}

struct ManagedSlot<M> {
    media: M,
    state: SlotState,
}

/// Manages the two playback slots
pub struct SlotManager<M: MediaResource> {
    slots: [ManagedSlot<M>; 2],

    /// Next binding number; shared by both slots so bindings are unique
    next_binding: u64,
}

impl<M: MediaResource> SlotManager<M> {
    /// Create a manager over two unbound resources
    pub fn new(slot_a: M, slot_b: M) -> Self {
        let unbound = SlotState {
            assigned_item_index: None,
            is_ready: false,
            binding: Binding(0),
        };

        Self {
            slots: [
                ManagedSlot {
                    media: slot_a,
                    state: unbound,
                },
                ManagedSlot {
                    media: slot_b,
                    state: unbound,
                },
            ],
            next_binding: 1,
        }
    }

    fn allocate_binding(&mut self) -> Binding {
        let binding = Binding(self.next_binding);
        self.next_binding += 1;
        binding
    }

    /// Rebind `slot` to a story item and start loading it
    ///
    /// Readiness resets to false. Readiness reported for the previous binding
    /// is ignored from here on.
    pub fn assign(&mut self, slot: SlotId, item_index: usize, source_url: &str) -> Binding {
        let binding = self.allocate_binding();
        let managed = &mut self.slots[slot.index()];

        managed.state = SlotState {
            assigned_item_index: Some(item_index),
            is_ready: false,
            binding,
        };
        managed.media.load(source_url, binding);

        debug!(
            "Slot {} assigned item {} ({}) binding {}",
            slot, item_index, source_url, binding
        );
        binding
    }

    /// Record that `slot` has buffered its current binding
    ///
    /// Idempotent. Returns `false` (and changes nothing) when `binding` is not
    /// the slot's current binding.
    pub fn mark_ready(&mut self, slot: SlotId, binding: Binding) -> bool {
        let state = &mut self.slots[slot.index()].state;

        if state.binding != binding || state.assigned_item_index.is_none() {
            debug!(
                "Ignoring readiness for slot {} stale binding {} (current {})",
                slot, binding, state.binding
            );
            return false;
        }

        state.is_ready = true;
        true
    }

    /// Drop the slot's binding: pause, hide, unload
    pub fn release(&mut self, slot: SlotId) {
        let binding = self.allocate_binding();
        let managed = &mut self.slots[slot.index()];

        managed.media.pause();
        managed.media.set_opacity(0.0);
        managed.media.unload();
        managed.state = SlotState {
            assigned_item_index: None,
            is_ready: false,
            binding,
        };

        debug!("Slot {} released", slot);
    }

    pub fn state(&self, slot: SlotId) -> &SlotState {
        &self.slots[slot.index()].state
    }

    pub fn is_ready(&self, slot: SlotId) -> bool {
        self.slots[slot.index()].state.is_ready
    }

    pub fn media(&self, slot: SlotId) -> &M {
        &self.slots[slot.index()].media
    }

    pub fn media_mut(&mut self, slot: SlotId) -> &mut M {
        &mut self.slots[slot.index()].media
    }

    /// Position of the slot's media
    pub fn position(&self, slot: SlotId) -> Duration {
        self.media(slot).position()
    }

    /// Pause and unload both slots
    pub fn teardown(&mut self) {
        for managed in self.slots.iter_mut() {
            if managed.state.assigned_item_index.is_some() {
                managed.media.pause();
                managed.media.unload();
                managed.state.assigned_item_index = None;
                managed.state.is_ready = false;
            }
        }
    }
}

impl<M: MediaResource> Drop for SlotManager<M> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::simulated::{SimulatedMedia, SimulatedMediaConfig};

    fn manager() -> SlotManager<SimulatedMedia> {
        let config = SimulatedMediaConfig::default();
        SlotManager::new(SimulatedMedia::new(config.clone()), SimulatedMedia::new(config))
    }

    #[test]
    fn test_assign_resets_readiness_and_loads() {
        let mut slots = manager();
        let first = slots.assign(SlotId::A, 0, "a.mp4");
        assert!(slots.mark_ready(SlotId::A, first));
        assert!(slots.is_ready(SlotId::A));

        let second = slots.assign(SlotId::A, 3, "d.mp4");
        assert_ne!(first, second);
        assert!(!slots.is_ready(SlotId::A));
        assert_eq!(slots.state(SlotId::A).assigned_item_index, Some(3));
        assert_eq!(slots.media(SlotId::A).source(), Some("d.mp4"));
    }

    #[test]
    fn test_mark_ready_is_idempotent() {
        let mut slots = manager();
        let binding = slots.assign(SlotId::B, 1, "b.mp4");
        assert!(slots.mark_ready(SlotId::B, binding));
        assert!(slots.mark_ready(SlotId::B, binding));
        assert!(slots.is_ready(SlotId::B));
    }

    #[test]
    fn test_stale_binding_readiness_is_ignored() {
        let mut slots = manager();
        let old = slots.assign(SlotId::B, 1, "b.mp4");
        slots.assign(SlotId::B, 2, "c.mp4");

        assert!(!slots.mark_ready(SlotId::B, old));
        assert!(!slots.is_ready(SlotId::B));
    }

    #[test]
    fn test_bindings_unique_across_slots() {
        let mut slots = manager();
        let a = slots.assign(SlotId::A, 0, "a.mp4");
        let b = slots.assign(SlotId::B, 0, "a.mp4");
        assert_ne!(a, b);
        assert!(!slots.mark_ready(SlotId::A, b));
    }

    #[test]
    fn test_release_clears_assignment() {
        let mut slots = manager();
        let binding = slots.assign(SlotId::B, 1, "b.mp4");
        slots.mark_ready(SlotId::B, binding);

        slots.release(SlotId::B);

        let state = slots.state(SlotId::B);
        assert_eq!(state.assigned_item_index, None);
        assert!(!state.is_ready);
        assert!(!slots.mark_ready(SlotId::B, binding));
        assert_eq!(slots.media(SlotId::B).source(), None);
    }
}
