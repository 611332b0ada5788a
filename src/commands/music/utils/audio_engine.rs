//! The seam between the playback core and the external audio engine.
//!
//! The core never talks to songbird directly: every engine command goes through
//! [`AudioEngine`], and every engine notification comes back as an [`EngineEvent`].

use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use thiserror::Error;

use crate::commands::music::audio_sources::Track;

/// Errors reported by an audio engine implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Not connected to a voice channel")]
    NotConnected,

    #[error("Failed to join voice channel: {0}")]
    Connect(String),

    #[error("Failed to leave voice channel: {0}")]
    Disconnect(String),

    #[error("Playback control failed: {0}")]
    Playback(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Snapshot of the engine's player for one guild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerState {
    /// A voice connection exists for the guild.
    pub connected: bool,
    /// The track currently loaded in the player, paused or not.
    pub current: Option<Track>,
    /// The loaded track is paused.
    pub paused: bool,
}

impl PlayerState {
    /// Something is loaded in the player (paused counts as playing).
    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused && self.current.is_some()
    }
}

/// Notifications emitted by the engine, scoped to a guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    TrackStarted {
        guild_id: GuildId,
        track: Track,
    },
    TrackEnded {
        guild_id: GuildId,
        track: Track,
    },
    TrackException {
        guild_id: GuildId,
        track: Track,
        error: String,
    },
}

impl EngineEvent {
    pub fn guild_id(&self) -> GuildId {
        match self {
            EngineEvent::TrackStarted { guild_id, .. }
            | EngineEvent::TrackEnded { guild_id, .. }
            | EngineEvent::TrackException { guild_id, .. } => *guild_id,
        }
    }
}

/// Commands and state accessors of the external audio engine.
///
/// Implementations own the per-guild player handle; it is created by `connect` and dropped by
/// `disconnect`.
#[async_trait]
pub trait AudioEngine: Send + Sync {
    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> EngineResult<()>;

    async fn disconnect(&self, guild_id: GuildId) -> EngineResult<()>;

    /// Starts `track`, replacing whatever is loaded.
    async fn play(&self, guild_id: GuildId, track: &Track) -> EngineResult<()>;

    async fn stop(&self, guild_id: GuildId) -> EngineResult<()>;

    async fn pause(&self, guild_id: GuildId, paused: bool) -> EngineResult<()>;

    async fn state(&self, guild_id: GuildId) -> PlayerState;
}
