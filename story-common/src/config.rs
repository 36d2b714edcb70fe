//! Configuration loading and config file resolution
//!
//! Configuration is a single TOML document:
//!
//! ```toml
//! [player]
//! crossfade_ms = 180
//! reveal_timeout_ms = 1200
//!
//! [[stories]]
//! source_url = "https://cdn.example.com/stories/studio-tour.mp4"
//! title = "Studio tour"
//!
//! [overlay]
//! username = "creator"
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! Every key is optional; missing keys fall back to built-in defaults.
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Platform config directory (`<config_dir>/story-player/config.toml`)
//! 4. Built-in defaults (no file)

use crate::time::millis_to_duration;
use crate::{Error, FadeCurve, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "STORY_PLAYER_CONFIG";

/// Complete configuration document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryConfig {
    /// Timing and gesture constants for the player state machine
    #[serde(default)]
    pub player: PlayerConfig,

    /// Ordered media list supplied by the CMS export (empty = built-in defaults)
    #[serde(default)]
    pub stories: Vec<MediaRef>,

    /// Passive overlay metadata
    #[serde(default)]
    pub overlay: Option<StoryOverlay>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Player timing and gesture configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Remaining duration below which the next item is prepared pre-emptively
    #[serde(default = "default_lead_time_ms")]
    pub lead_time_ms: u64,

    /// Crossfade duration between the outgoing and incoming slot
    #[serde(default = "default_crossfade_ms")]
    pub crossfade_ms: u64,

    /// Bound on how long a target slot may take to become ready and advance
    #[serde(default = "default_reveal_timeout_ms")]
    pub reveal_timeout_ms: u64,

    /// Frame tick interval used by the async engine
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Maximum pointer movement (either axis) still classified as a tap
    #[serde(default = "default_tap_max_movement_px")]
    pub tap_max_movement_px: f64,

    /// Maximum pointer down/up interval still classified as a tap
    #[serde(default = "default_tap_max_duration_ms")]
    pub tap_max_duration_ms: u64,

    /// Width fraction of each navigation zone (left = previous, right = next)
    #[serde(default = "default_tap_zone_fraction")]
    pub tap_zone_fraction: f64,

    /// Whether slots play muted
    #[serde(default = "default_muted")]
    pub muted: bool,

    /// Opacity curve applied during the crossfade
    #[serde(default)]
    pub fade_curve: FadeCurve,
}

fn default_lead_time_ms() -> u64 {
    250
}

fn default_crossfade_ms() -> u64 {
    180
}

fn default_reveal_timeout_ms() -> u64 {
    1200
}

fn default_frame_interval_ms() -> u64 {
    16
}

fn default_tap_max_movement_px() -> f64 {
    14.0
}

fn default_tap_max_duration_ms() -> u64 {
    350
}

fn default_tap_zone_fraction() -> f64 {
    0.35
}

fn default_muted() -> bool {
    true
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            lead_time_ms: default_lead_time_ms(),
            crossfade_ms: default_crossfade_ms(),
            reveal_timeout_ms: default_reveal_timeout_ms(),
            frame_interval_ms: default_frame_interval_ms(),
            tap_max_movement_px: default_tap_max_movement_px(),
            tap_max_duration_ms: default_tap_max_duration_ms(),
            tap_zone_fraction: default_tap_zone_fraction(),
            muted: default_muted(),
            fade_curve: FadeCurve::default(),
        }
    }
}

impl PlayerConfig {
    pub fn lead_time(&self) -> Duration {
        millis_to_duration(self.lead_time_ms)
    }

    pub fn crossfade(&self) -> Duration {
        millis_to_duration(self.crossfade_ms)
    }

    pub fn reveal_timeout(&self) -> Duration {
        millis_to_duration(self.reveal_timeout_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        millis_to_duration(self.frame_interval_ms)
    }

    pub fn tap_max_duration(&self) -> Duration {
        millis_to_duration(self.tap_max_duration_ms)
    }

    /// Reject values the state machine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.crossfade_ms == 0 {
            return Err(Error::Config("crossfade_ms must be greater than 0".to_string()));
        }
        if self.reveal_timeout_ms == 0 {
            return Err(Error::Config(
                "reveal_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.frame_interval_ms == 0 {
            return Err(Error::Config(
                "frame_interval_ms must be greater than 0".to_string(),
            ));
        }
        if !self.tap_max_movement_px.is_finite() || self.tap_max_movement_px < 0.0 {
            return Err(Error::Config(format!(
                "tap_max_movement_px must be a non-negative number, got {}",
                self.tap_max_movement_px
            )));
        }
        if !(self.tap_zone_fraction > 0.0 && self.tap_zone_fraction <= 0.5) {
            return Err(Error::Config(format!(
                "tap_zone_fraction must be in (0, 0.5], got {}",
                self.tap_zone_fraction
            )));
        }
        Ok(())
    }
}

/// One media reference as exported by the CMS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub source_url: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl MediaRef {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            title: None,
        }
    }
}

/// Passive overlay metadata rendered over the story
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryOverlay {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Publish timestamp used for the elapsed-time label
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Parse and validate a configuration document
pub fn parse_config(toml_content: &str) -> Result<StoryConfig> {
    let config: StoryConfig = toml::from_str(toml_content)?;
    config.player.validate()?;
    Ok(config)
}

/// Load and validate the configuration file at `path`
pub fn load_config(path: &Path) -> Result<StoryConfig> {
    let toml_content = std::fs::read_to_string(path)?;
    let config = parse_config(&toml_content)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Resolve which config file to load, if any
///
/// An explicitly named file (CLI argument or environment variable) is
/// returned even if it does not exist so that loading reports the error. The
/// platform default location is only returned when the file exists.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path().filter(|path| path.exists())
}

/// Resolve and load configuration, falling back to built-in defaults
pub fn load_or_default(cli_arg: Option<&Path>, env_var_name: &str) -> Result<StoryConfig> {
    match resolve_config_path(cli_arg, env_var_name) {
        Some(path) => load_config(&path),
        None => {
            warn!("No config file found, using built-in defaults");
            Ok(StoryConfig::default())
        }
    }
}

/// Get default configuration file path for the platform
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("story-player").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.player, PlayerConfig::default());
        assert!(config.stories.is_empty());
        assert!(config.overlay.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_default_durations() {
        let player = PlayerConfig::default();
        assert_eq!(player.lead_time(), Duration::from_millis(250));
        assert_eq!(player.crossfade(), Duration::from_millis(180));
        assert_eq!(player.reveal_timeout(), Duration::from_millis(1200));
        assert_eq!(player.tap_max_duration(), Duration::from_millis(350));
        assert!(player.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_crossfade() {
        let result = parse_config("[player]\ncrossfade_ms = 0\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_wide_tap_zone() {
        let player = PlayerConfig {
            tap_zone_fraction: 0.6,
            ..PlayerConfig::default()
        };
        assert!(matches!(player.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let result = parse_config("[player\ncrossfade_ms = ");
        assert!(matches!(result, Err(Error::TomlParse(_))));
    }

    #[test]
    fn test_cli_argument_wins() {
        let path = resolve_config_path(Some(Path::new("/tmp/explicit.toml")), "STORY_TEST_UNSET_VAR");
        assert_eq!(path, Some(PathBuf::from("/tmp/explicit.toml")));
    }
}
