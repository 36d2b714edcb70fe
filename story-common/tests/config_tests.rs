//! Configuration loading and config file resolution tests
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate STORY_PLAYER_CONFIG are marked with #[serial].

use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use story_common::config::{
    load_config, load_or_default, resolve_config_path, PlayerConfig, CONFIG_ENV_VAR,
};
use story_common::{Error, FadeCurve};
use tempfile::{NamedTempFile, TempDir};

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_full_document_loads() {
    let file = write_config(
        r#"
[player]
lead_time_ms = 300
crossfade_ms = 240
fade_curve = "s_curve"
muted = false

[[stories]]
source_url = "https://cdn.example.com/stories/studio-tour.mp4"
title = "Studio tour"

[[stories]]
source_url = "https://cdn.example.com/stories/behind-the-scenes.mp4"

[overlay]
username = "creator"
avatar_url = "https://cdn.example.com/avatar.jpg"
published_at = "2026-10-01T12:00:00Z"

[logging]
level = "debug"
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.player.lead_time_ms, 300);
    assert_eq!(config.player.crossfade_ms, 240);
    assert_eq!(config.player.fade_curve, FadeCurve::SCurve);
    assert!(!config.player.muted);
    // Unset keys keep their defaults
    assert_eq!(config.player.reveal_timeout_ms, 1200);
    assert_eq!(config.player.tap_zone_fraction, 0.35);

    assert_eq!(config.stories.len(), 2);
    assert_eq!(config.stories[0].title.as_deref(), Some("Studio tour"));
    assert_eq!(config.stories[1].title, None);

    let overlay = config.overlay.unwrap();
    assert_eq!(overlay.username.as_deref(), Some("creator"));
    assert!(overlay.published_at.is_some());

    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_cosine_alias_for_fade_curve() {
    let file = write_config("[player]\nfade_curve = \"cosine\"\n");
    let config = load_config(file.path()).unwrap();
    assert_eq!(config.player.fade_curve, FadeCurve::SCurve);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = load_config(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_invalid_player_values_rejected() {
    let file = write_config("[player]\ntap_zone_fraction = 0.0\n");
    assert!(matches!(load_config(file.path()), Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_env_var_used_without_cli_argument() {
    env::set_var(CONFIG_ENV_VAR, "/srv/story/config.toml");

    let resolved = resolve_config_path(None, CONFIG_ENV_VAR);
    assert_eq!(resolved, Some(PathBuf::from("/srv/story/config.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_argument_overrides_env_var() {
    env::set_var(CONFIG_ENV_VAR, "/srv/story/config.toml");

    let resolved = resolve_config_path(Some(Path::new("/opt/cli.toml")), CONFIG_ENV_VAR);
    assert_eq!(resolved, Some(PathBuf::from("/opt/cli.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_load_or_default_reads_env_file() {
    let file = write_config("[player]\ncrossfade_ms = 90\n");
    env::set_var(CONFIG_ENV_VAR, file.path());

    let config = load_or_default(None, CONFIG_ENV_VAR).unwrap();
    assert_eq!(config.player.crossfade_ms, 90);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_explicit_missing_file_is_an_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let result = load_or_default(Some(&missing), CONFIG_ENV_VAR);
    assert!(result.is_err());
}

#[test]
fn test_defaults_are_valid() {
    assert!(PlayerConfig::default().validate().is_ok());
}
