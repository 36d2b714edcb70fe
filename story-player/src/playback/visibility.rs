//! Visibility/lifecycle gate
//!
//! Playback is allowed only while the player intersects the viewport AND the
//! document is visible. The host supplies both signals; the intersection
//! signal should already include a generous root margin so scroll jitter
//! does not flap the gate.

/// Edge produced by a gate update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateChange {
    /// Playback just became allowed
    Opened,
    /// Playback just became disallowed
    Closed,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityGate {
    intersecting: bool,
    document_visible: bool,
}

impl Default for VisibilityGate {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityGate {
    /// Gate starts open (mounted in view, document visible)
    pub fn new() -> Self {
        Self {
            intersecting: true,
            document_visible: true,
        }
    }

    pub fn is_open(&self) -> bool {
        self.intersecting && self.document_visible
    }

    pub fn intersecting(&self) -> bool {
        self.intersecting
    }

    pub fn document_visible(&self) -> bool {
        self.document_visible
    }

    pub fn set_intersecting(&mut self, intersecting: bool) -> GateChange {
        self.update(|gate| gate.intersecting = intersecting)
    }

    pub fn set_document_visible(&mut self, visible: bool) -> GateChange {
        self.update(|gate| gate.document_visible = visible)
    }

    fn update(&mut self, apply: impl FnOnce(&mut Self)) -> GateChange {
        let was_open = self.is_open();
        apply(self);
        match (was_open, self.is_open()) {
            (false, true) => GateChange::Opened,
            (true, false) => GateChange::Closed,
            _ => GateChange::Unchanged,
        }
    }
}
