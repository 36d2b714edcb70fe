//! Story simulator (story-sim) - Main entry point
//!
//! Runs the story player engine against simulated media for a fixed
//! wall-clock time and logs every player event. Useful for tuning lead time,
//! crossfade, and timeout settings without a browser.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use story_common::config::{self, MediaRef, CONFIG_ENV_VAR};
use story_common::events::EventBus;
use story_player::playback::{SimulatedMedia, SimulatedMediaConfig};
use story_player::{StoryEngine, StoryPlayer};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

/// Surface width used for simulated taps
const SURFACE_WIDTH_PX: f64 = 1000.0;

/// Command-line arguments for story-sim
#[derive(Parser, Debug)]
#[command(name = "story-sim")]
#[command(about = "Simulate the dual-slot story player")]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Story source URL (repeatable, replaces the configured list)
    #[arg(short, long = "source")]
    sources: Vec<String>,

    /// Simulated duration of every story, in seconds
    #[arg(long, default_value = "3.0")]
    item_secs: f64,

    /// Simulated load latency, in milliseconds
    #[arg(long, default_value = "120")]
    load_latency_ms: u64,

    /// Source URL that never finishes buffering (repeatable)
    #[arg(long = "stall")]
    stalled: Vec<String>,

    /// Number of refused play() calls per slot
    #[arg(long, default_value = "0")]
    autoplay_rejections: u32,

    /// Tap at SECONDS:FRACTION of the surface width, e.g. 2.5:0.9 (repeatable)
    #[arg(long = "tap", value_parser = parse_tap)]
    taps: Vec<(f64, f64)>,

    /// Hide the player between START:END seconds
    #[arg(long, value_parser = parse_window)]
    hidden: Option<(f64, f64)>,

    /// How long to run, in seconds
    #[arg(long, default_value = "10")]
    run_secs: f64,

    /// Print events as JSON lines instead of log records
    #[arg(long)]
    json: bool,
}

fn parse_pair(s: &str) -> std::result::Result<(f64, f64), String> {
    let (left, right) = s
        .split_once(':')
        .ok_or_else(|| format!("expected A:B, got '{s}'"))?;
    let left: f64 = left.trim().parse().map_err(|e| format!("'{left}': {e}"))?;
    let right: f64 = right.trim().parse().map_err(|e| format!("'{right}': {e}"))?;
    Ok((left, right))
}

fn parse_tap(s: &str) -> std::result::Result<(f64, f64), String> {
    let (at, fraction) = parse_pair(s)?;
    if at < 0.0 || !(0.0..=1.0).contains(&fraction) {
        return Err(format!("tap '{s}' out of range"));
    }
    Ok((at, fraction))
}

fn parse_window(s: &str) -> std::result::Result<(f64, f64), String> {
    let (start, end) = parse_pair(s)?;
    if start < 0.0 || end < start {
        return Err(format!("window '{s}' out of range"));
    }
    Ok((start, end))
}

/// Filter used when `RUST_LOG` is not set
fn default_filter(level: &str) -> EnvFilter {
    format!("story_player={level},story_common={level},story_sim={level}").into()
}

fn secs(value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("invalid duration {value}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing before loading configuration so its messages are
    // kept; the configured level replaces the bootstrap filter afterwards
    let env_filter = EnvFilter::try_from_default_env().ok();
    let filter_from_env = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| default_filter("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::load_or_default(args.config.as_deref(), CONFIG_ENV_VAR)
        .context("Failed to load configuration")?;

    if !filter_from_env {
        filter_handle
            .reload(default_filter(&config.logging.level))
            .context("Failed to apply configured log level")?;
    }

    if args.item_secs <= 0.0 {
        bail!("--item-secs must be positive");
    }

    let media_refs: Vec<MediaRef> = if args.sources.is_empty() {
        config.stories.clone()
    } else {
        args.sources.iter().map(MediaRef::new).collect()
    };

    let media_config = SimulatedMediaConfig {
        item_duration: secs(args.item_secs)?,
        load_latency: Duration::from_millis(args.load_latency_ms),
        stalled_sources: args.stalled.iter().cloned().collect::<HashSet<_>>(),
        autoplay_rejections: args.autoplay_rejections,
    };

    let player = StoryPlayer::new(
        Some(&media_refs),
        config.player.clone(),
        SimulatedMedia::new(media_config.clone()),
        SimulatedMedia::new(media_config),
    )
    .context("Failed to create story player")?
    .with_overlay(config.overlay.clone());

    if let Some(label) = player.elapsed_label(story_common::time::now()) {
        info!("Overlay elapsed label: {}", label);
    }

    let bus = Arc::new(EventBus::new(256));
    let mut events = bus.subscribe();
    let engine = StoryEngine::spawn(player, Arc::clone(&bus));
    let handle = engine.handle();

    let json = args.json;
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) if json => match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!("Failed to serialize event: {}", e),
                },
                Ok(event) => info!("{:?}", event.event),
                Err(RecvError::Lagged(skipped)) => warn!("Event printer lagged, {} events lost", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let start = tokio::time::Instant::now();

    let taps = args.taps.clone();
    let scripted_input = {
        let handle = handle.clone();
        let hidden = args.hidden;
        async move {
            let mut schedule: Vec<(f64, Input)> = taps
                .into_iter()
                .map(|(at, fraction)| (at, Input::Tap(fraction)))
                .collect();
            if let Some((from, to)) = hidden {
                schedule.push((from, Input::Visible(false)));
                schedule.push((to, Input::Visible(true)));
            }
            schedule.sort_by(|a, b| a.0.total_cmp(&b.0));

            for (pointer_id, (at, input)) in schedule.into_iter().enumerate() {
                tokio::time::sleep_until(start + secs(at)?).await;
                match input {
                    Input::Tap(fraction) => {
                        let x = fraction * SURFACE_WIDTH_PX;
                        info!("Tap at {:.0}px", x);
                        handle.tap(pointer_id as i64, x, 400.0, SURFACE_WIDTH_PX).await?;
                    }
                    Input::Visible(visible) => {
                        info!("Player {}", if visible { "scrolled into view" } else { "scrolled away" });
                        handle.set_intersecting(visible).await?;
                    }
                }
            }
            anyhow::Ok(())
        }
    };

    let run_for = secs(args.run_secs)?;
    tokio::select! {
        result = scripted_input => {
            result.context("Scripted input failed")?;
            tokio::time::sleep_until(start + run_for).await;
        }
        _ = tokio::time::sleep_until(start + run_for) => {}
    }

    let snapshot = handle.snapshot().await.context("Failed to read player snapshot")?;
    info!(
        "Finished on story {}/{} (token {}, progress {:.1}%)",
        snapshot.active_item_index + 1,
        snapshot.item_count,
        snapshot.token,
        snapshot.progress_percent
    );
    if json {
        println!("{}", serde_json::to_string(&snapshot)?);
    }

    engine.shutdown().await.context("Engine shutdown failed")?;
    drop(bus);
    printer.await.context("Event printer failed")?;
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Input {
    Tap(f64),
    Visible(bool),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_covers_all_crates() {
        let filter = default_filter("debug").to_string();
        assert!(filter.contains("story_common=debug"));
        assert!(filter.contains("story_player=debug"));
        assert!(filter.contains("story_sim=debug"));
    }

    #[test]
    fn test_parse_tap() {
        assert_eq!(parse_tap("2.5:0.9"), Ok((2.5, 0.9)));
        assert!(parse_tap("1:1.5").is_err());
        assert!(parse_tap("nope").is_err());
    }

    #[test]
    fn test_parse_window_rejects_reversed_range() {
        assert_eq!(parse_window("1:3"), Ok((1.0, 3.0)));
        assert!(parse_window("3:1").is_err());
    }
}
