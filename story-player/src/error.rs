//! Error types for story-player
//!
//! None of these are fatal to the state machine: media failures degrade to
//! "keep showing the current item". They surface only from constructors,
//! media resources, and the async engine handle.

use thiserror::Error;

/// Main error type for story-player
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(#[from] story_common::Error),

    /// Programmatic playback refused by the media environment
    #[error("Autoplay rejected: {0}")]
    AutoplayRejected(String),

    /// Engine task is no longer running
    #[error("Engine stopped")]
    EngineStopped,

    /// Engine task panicked or was cancelled
    #[error("Engine task failed: {0}")]
    EngineJoin(#[from] tokio::task::JoinError),
}

/// Convenience Result type using story-player Error
pub type Result<T> = std::result::Result<T, Error>;
