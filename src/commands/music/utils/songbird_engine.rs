//! `AudioEngine` implementation on top of songbird.

use dashmap::DashMap;
use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use songbird::input::YoutubeDl;
use songbird::tracks::TrackHandle;
use songbird::{Event, EventContext, EventHandler, Songbird, TrackEvent};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use super::audio_engine::{AudioEngine, EngineError, EngineEvent, EngineResult, PlayerState};
use crate::commands::music::audio_sources::Track;

/// The track loaded in a guild's player.
struct ActiveTrack {
    handle: TrackHandle,
    track: Track,
    paused: bool,
}

/// Drives songbird calls and forwards track events to the dispatcher channel.
pub struct SongbirdEngine {
    songbird: Arc<Songbird>,
    http: reqwest::Client,
    /// Songbird keeps the program name as `&'static str`; leaked once per engine.
    ytdlp_path: &'static str,
    active: Arc<DashMap<GuildId, ActiveTrack>>,
    events: UnboundedSender<EngineEvent>,
}

impl SongbirdEngine {
    pub fn new(
        songbird: Arc<Songbird>,
        http: reqwest::Client,
        ytdlp_path: impl Into<String>,
        events: UnboundedSender<EngineEvent>,
    ) -> Self {
        let ytdlp_path: String = ytdlp_path.into();
        Self {
            songbird,
            http,
            ytdlp_path: ytdlp_path.leak(),
            active: Arc::new(DashMap::new()),
            events,
        }
    }

    fn handle(&self, guild_id: GuildId) -> EngineResult<TrackHandle> {
        self.active
            .get(&guild_id)
            .map(|active| active.handle.clone())
            .ok_or_else(|| EngineError::Playback("No track loaded".to_string()))
    }
}

#[async_trait]
impl AudioEngine for SongbirdEngine {
    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> EngineResult<()> {
        info!("Joining channel {} in guild {}", channel_id, guild_id);
        self.songbird
            .join(guild_id, channel_id)
            .await
            .map_err(|e| EngineError::Connect(e.to_string()))?;
        Ok(())
    }

    async fn disconnect(&self, guild_id: GuildId) -> EngineResult<()> {
        if self.songbird.get(guild_id).is_none() {
            return Err(EngineError::NotConnected);
        }
        self.active.remove(&guild_id);
        self.songbird
            .remove(guild_id)
            .await
            .map_err(|e| EngineError::Disconnect(e.to_string()))?;
        info!("Left voice channel in guild {}", guild_id);
        Ok(())
    }

    async fn play(&self, guild_id: GuildId, track: &Track) -> EngineResult<()> {
        let call = self.songbird.get(guild_id).ok_or(EngineError::NotConnected)?;

        if let Some((_, previous)) = self.active.remove(&guild_id) {
            debug!("Replacing '{}' in guild {}", previous.track.title, guild_id);
            if let Err(e) = previous.handle.stop() {
                debug!("Replaced track was already stopped: {}", e);
            }
        }

        let input = YoutubeDl::new_ytdl_like(self.ytdlp_path, self.http.clone(), track.uri.clone());
        let handle = call.lock().await.play_input(input.into());

        for kind in [TrackEvent::Play, TrackEvent::End, TrackEvent::Error] {
            let notifier = TrackNotifier {
                guild_id,
                track: track.clone(),
                handle: handle.clone(),
                kind,
                active: self.active.clone(),
                events: self.events.clone(),
            };
            handle
                .add_event(Event::Track(kind), notifier)
                .map_err(|e| EngineError::Playback(e.to_string()))?;
        }

        self.active.insert(
            guild_id,
            ActiveTrack {
                handle,
                track: track.clone(),
                paused: false,
            },
        );
        Ok(())
    }

    async fn stop(&self, guild_id: GuildId) -> EngineResult<()> {
        // The End event removes the entry; stopping twice is harmless.
        self.handle(guild_id)?
            .stop()
            .map_err(|e| EngineError::Playback(e.to_string()))
    }

    async fn pause(&self, guild_id: GuildId, paused: bool) -> EngineResult<()> {
        let handle = self.handle(guild_id)?;
        let result = if paused { handle.pause() } else { handle.play() };
        result.map_err(|e| EngineError::Playback(e.to_string()))?;

        if let Some(mut active) = self.active.get_mut(&guild_id) {
            active.paused = paused;
        }
        Ok(())
    }

    async fn state(&self, guild_id: GuildId) -> PlayerState {
        let connected = match self.songbird.get(guild_id) {
            Some(call) => call.lock().await.current_channel().is_some(),
            None => false,
        };

        let (current, paused) = self
            .active
            .get(&guild_id)
            .map(|active| (Some(active.track.clone()), active.paused))
            .unwrap_or((None, false));

        PlayerState {
            connected,
            current,
            paused,
        }
    }
}

/// Forwards one kind of songbird track event for one track.
struct TrackNotifier {
    guild_id: GuildId,
    track: Track,
    handle: TrackHandle,
    kind: TrackEvent,
    active: Arc<DashMap<GuildId, ActiveTrack>>,
    events: UnboundedSender<EngineEvent>,
}

impl TrackNotifier {
    /// Forgets the active track, unless it was already replaced by a newer one.
    fn release(&self) {
        self.active
            .remove_if(&self.guild_id, |_, active| active.handle.uuid() == self.handle.uuid());
    }

    fn send(&self, event: EngineEvent) {
        if self.events.send(event).is_err() {
            error!("Event dispatcher is gone, dropping track event for guild {}", self.guild_id);
        }
    }
}

#[async_trait]
impl EventHandler for TrackNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let guild_id = self.guild_id;
        let track = self.track.clone();

        match self.kind {
            TrackEvent::Play => self.send(EngineEvent::TrackStarted { guild_id, track }),
            TrackEvent::End => {
                self.release();
                self.send(EngineEvent::TrackEnded { guild_id, track });
            }
            TrackEvent::Error => {
                let error = match ctx {
                    EventContext::Track(states) => states
                        .first()
                        .map(|(state, _)| format!("{:?}", state.playing))
                        .unwrap_or_else(|| "unknown error".to_string()),
                    _ => "unknown error".to_string(),
                };
                self.release();
                // Songbird emits no End for an errored track.
                self.send(EngineEvent::TrackException {
                    guild_id,
                    track: track.clone(),
                    error,
                });
                self.send(EngineEvent::TrackEnded { guild_id, track });
            }
            _ => {}
        }

        None
    }
}
