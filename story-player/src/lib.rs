//! # Story Player Library
//!
//! Dual-slot story video player with preloading and crossfade transitions.
//!
//! **Purpose:** Play an ordered list of short story videos the way a social
//! "stories" strip does: one slot is visible and playing while the other
//! preloads the next item, and navigation crossfades between the two.
//!
//! **Architecture:** A deterministic, frame-driven state machine
//! ([`playback::StoryPlayer`]) behind a media capability trait
//! ([`playback::MediaResource`]), plus a Tokio engine that drives it on a
//! frame interval and publishes events on a broadcast bus.

pub mod error;
pub mod playback;

pub use error::{Error, Result};
pub use playback::{StoryEngine, StoryPlayer};
