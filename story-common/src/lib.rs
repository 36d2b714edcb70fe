//! # Story Common Library
//!
//! Shared code for the story player crates:
//! - Configuration loading (TOML bootstrap + built-in defaults)
//! - Event types (StoryEvent enum) and the broadcast event bus
//! - Fade curve definitions for the slot crossfade
//! - Time helpers for the overlay elapsed-time label

pub mod config;
pub mod error;
pub mod events;
pub mod fade_curves;
pub mod time;

pub use error::{Error, Result};
pub use fade_curves::FadeCurve;
