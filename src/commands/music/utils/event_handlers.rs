//! Reaction to audio engine notifications.
//!
//! Every engine event travels through one channel and is handled by a single dispatcher task,
//! so the end-of-track transition of a guild never runs twice at the same time.

use serenity::model::id::GuildId;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::audio_engine::EngineEvent;
use super::playback::PlaybackController;
use super::session::TrackEndAction;
use crate::commands::music::audio_sources::Track;

pub struct EventDispatcher {
    controller: Arc<PlaybackController>,
}

impl EventDispatcher {
    pub fn new(controller: Arc<PlaybackController>) -> Self {
        Self { controller }
    }

    /// Drains `events` on a background task until every sender is dropped.
    pub fn spawn(self, events: UnboundedReceiver<EngineEvent>) -> JoinHandle<()> {
        tokio::spawn(self.run(events))
    }

    pub async fn run(self, mut events: UnboundedReceiver<EngineEvent>) {
        while let Some(event) = events.recv().await {
            self.dispatch(event).await;
        }
        debug!("Engine event channel closed, dispatcher exiting");
    }

    /// Handles one event. Never fails: errors are logged.
    pub async fn dispatch(&self, event: EngineEvent) -> Option<TrackEndAction> {
        match event {
            EngineEvent::TrackStarted { guild_id, track } => {
                info!("Track start in guild {}: {}", guild_id, track.title);
                None
            }
            EngineEvent::TrackException {
                guild_id,
                track,
                error,
            } => {
                error!("Exception on '{}' in guild {}: {}", track.title, guild_id, error);
                None
            }
            EngineEvent::TrackEnded { guild_id, track } => {
                Some(self.on_track_end(guild_id, track).await)
            }
        }
    }

    async fn on_track_end(&self, guild_id: GuildId, track: Track) -> TrackEndAction {
        let action = {
            let session = self.controller.session(guild_id);
            let mut session = session.lock().await;
            let loop_state = session.loop_state();
            let action = session.on_track_end(track);
            if let TrackEndAction::Replay(track) = &action {
                info!(
                    "Loop ({}) replaying '{}' in guild {}",
                    loop_state, track.title, guild_id
                );
            }
            action
        };

        match &action {
            TrackEndAction::SkipConsumed => {
                debug!("Track end after a manual transition in guild {}", guild_id);
            }
            TrackEndAction::Replay(track) => {
                if let Err(e) = self.controller.play_track(guild_id, track).await {
                    error!("Failed to replay '{}' in guild {}: {}", track.title, guild_id, e);
                }
            }
            TrackEndAction::Advance(next) => {
                info!("Playing next track from queue in guild {}: {}", guild_id, next.title);
                if let Err(e) = self.controller.play_popped(guild_id, next).await {
                    error!("Failed to play '{}' in guild {}: {}", next.title, guild_id, e);
                }
            }
            TrackEndAction::Idle => {
                info!("Queue is empty, playback ended in guild {}", guild_id);
            }
        }

        action
    }
}
