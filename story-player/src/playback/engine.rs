//! Async engine driving a story player on a Tokio task
//!
//! The task owns the player. A frame interval drives `tick`; commands arrive
//! over an mpsc channel; every recorded event is republished on the shared
//! [`EventBus`].

use super::media::{Binding, MediaEvent, MediaResource};
use super::player::{PlayerSnapshot, StoryPlayer};
use super::gesture::PointerSample;
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use story_common::events::{EventBus, Navigation, PlayerEvent, SlotId};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant as TokioInstant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

const COMMAND_CAPACITY: usize = 64;

/// Commands accepted by the engine task
#[derive(Debug)]
pub enum EngineCommand {
    Navigate(Navigation),
    PointerDown {
        pointer_id: i64,
        x: f64,
        y: f64,
    },
    PointerUp {
        pointer_id: i64,
        x: f64,
        y: f64,
        surface_width: f64,
    },
    PointerCancel,
    SetIntersecting(bool),
    SetDocumentVisible(bool),
    MediaEvent {
        slot: SlotId,
        binding: Binding,
        event: MediaEvent,
    },
    Snapshot(oneshot::Sender<PlayerSnapshot>),
    Shutdown,
}

/// Cloneable sender side of a running engine
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
    player_id: Uuid,
}

impl EngineHandle {
    pub fn player_id(&self) -> Uuid {
        self.player_id
    }

    pub async fn send(&self, command: EngineCommand) -> Result<()> {
        self.tx.send(command).await.map_err(|_| Error::EngineStopped)
    }

    pub async fn navigate(&self, navigation: Navigation) -> Result<()> {
        self.send(EngineCommand::Navigate(navigation)).await
    }

    /// Pointer down followed by pointer up at the same spot
    pub async fn tap(&self, pointer_id: i64, x: f64, y: f64, surface_width: f64) -> Result<()> {
        self.send(EngineCommand::PointerDown { pointer_id, x, y }).await?;
        self.send(EngineCommand::PointerUp {
            pointer_id,
            x,
            y,
            surface_width,
        })
        .await
    }

    pub async fn set_intersecting(&self, intersecting: bool) -> Result<()> {
        self.send(EngineCommand::SetIntersecting(intersecting)).await
    }

    pub async fn set_document_visible(&self, visible: bool) -> Result<()> {
        self.send(EngineCommand::SetDocumentVisible(visible)).await
    }

    pub async fn snapshot(&self) -> Result<PlayerSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(EngineCommand::Snapshot(reply_tx)).await?;
        reply_rx.await.map_err(|_| Error::EngineStopped)
    }
}

/// A story player running on its own Tokio task
#[derive(Debug)]
pub struct StoryEngine {
    handle: EngineHandle,
    task: JoinHandle<()>,
}

impl StoryEngine {
    /// Spawn the engine task; must be called from within a Tokio runtime
    pub fn spawn<M>(player: StoryPlayer<M>, bus: Arc<EventBus>) -> Self
    where
        M: MediaResource + Send + 'static,
    {
        let player_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let frame_interval = player.config().frame_interval();

        let task = tokio::spawn(run(player, rx, bus, player_id, frame_interval));
        info!("Story engine {} started", player_id);

        Self {
            handle: EngineHandle { tx, player_id },
            task,
        }
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    pub fn player_id(&self) -> Uuid {
        self.handle.player_id
    }

    /// Stop the task and wait for it to tear the player down
    pub async fn shutdown(self) -> Result<()> {
        // Task may already be gone; joining reports the outcome either way
        let _ = self.handle.tx.send(EngineCommand::Shutdown).await;
        self.task.await?;
        Ok(())
    }
}

fn frame_now() -> std::time::Instant {
    TokioInstant::now().into_std()
}

async fn run<M>(
    mut player: StoryPlayer<M>,
    mut rx: mpsc::Receiver<EngineCommand>,
    bus: Arc<EventBus>,
    player_id: Uuid,
    frame_interval: Duration,
) where
    M: MediaResource,
{
    let mut frames = time::interval(frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = frames.tick() => {
                player.tick(frame_now());
            }
            command = rx.recv() => {
                match command {
                    None | Some(EngineCommand::Shutdown) => break,
                    Some(command) => apply(&mut player, command),
                }
            }
        }

        for event in player.drain_events() {
            bus.emit_lossy(PlayerEvent::new(player_id, event));
        }
    }

    player.teardown();
    for event in player.drain_events() {
        bus.emit_lossy(PlayerEvent::new(player_id, event));
    }
    info!("Story engine {} stopped", player_id);
}

fn apply<M: MediaResource>(player: &mut StoryPlayer<M>, command: EngineCommand) {
    let now = frame_now();
    match command {
        EngineCommand::Navigate(navigation) => {
            player.navigate(navigation, now);
        }
        EngineCommand::PointerDown { pointer_id, x, y } => {
            player.pointer_down(PointerSample {
                pointer_id,
                x,
                y,
                at: now,
            });
        }
        EngineCommand::PointerUp {
            pointer_id,
            x,
            y,
            surface_width,
        } => {
            let sample = PointerSample {
                pointer_id,
                x,
                y,
                at: now,
            };
            if let Some(navigation) = player.pointer_up(sample, surface_width) {
                debug!("Tap requested {:?}", navigation);
            }
        }
        EngineCommand::PointerCancel => player.pointer_cancel(),
        EngineCommand::SetIntersecting(intersecting) => player.set_intersecting(intersecting, now),
        EngineCommand::SetDocumentVisible(visible) => player.set_document_visible(visible, now),
        EngineCommand::MediaEvent {
            slot,
            binding,
            event,
        } => player.on_media_event(slot, binding, event, now),
        EngineCommand::Snapshot(reply) => {
            // Requester may have given up waiting
            let _ = reply.send(player.snapshot());
        }
        EngineCommand::Shutdown => {}
    }
}
