//! Error taxonomy of the music surface and the per-guild session registry.

use dashmap::DashMap;
use serenity::model::id::GuildId;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use super::audio_engine::EngineError;
use super::session::GuildSession;

/// Errors that can occur during music operations
#[derive(Error, Debug)]
pub enum MusicError {
    #[error("Not in a guild")]
    NotInGuild,

    #[error("User is not in a voice channel")]
    UserNotInVoiceChannel,

    #[error("Not connected to a voice channel")]
    NotConnected,

    #[error("Unrecognized playlist URL: {0}")]
    InvalidPlaylistUrl(String),

    #[error("A playlist is already loading")]
    AlreadyLoading,

    #[error("No tracks in history yet")]
    EmptyHistory,

    #[error("The queue is empty")]
    QueueEmpty,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("No results found for: {0}")]
    NoMatch(String),

    #[error("Audio source error: {0}")]
    AudioSourceError(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("No track is currently playing")]
    NotPlaying,

    #[error("Music is already paused")]
    AlreadyPaused,

    #[error("Music is not paused")]
    NotPaused,

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Broad category of a `MusicError`. None of them is fatal to the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad caller input or missing precondition; nothing was mutated.
    Precondition,
    /// The resolver found nothing or the provider call failed.
    Resolution,
    /// The player is not in a state that allows the operation.
    State,
    /// The audio engine failed.
    Engine,
}

impl MusicError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MusicError::NotInGuild
            | MusicError::UserNotInVoiceChannel
            | MusicError::NotConnected
            | MusicError::InvalidPlaylistUrl(_)
            | MusicError::AlreadyLoading
            | MusicError::EmptyHistory
            | MusicError::QueueEmpty
            | MusicError::ConfigError(_) => ErrorKind::Precondition,
            MusicError::NoMatch(_)
            | MusicError::AudioSourceError(_)
            | MusicError::ExternalApiError(_) => ErrorKind::Resolution,
            MusicError::NotPlaying | MusicError::AlreadyPaused | MusicError::NotPaused => {
                ErrorKind::State
            }
            MusicError::Engine(_) => ErrorKind::Engine,
        }
    }
}

/// Result type for music operations
pub type MusicResult<T> = Result<T, MusicError>;

/// Handle to one guild's session. Lock it, mutate, and drop the guard before any `.await`
/// on the engine or the resolver.
pub type SessionHandle = Arc<Mutex<GuildSession>>;

/// Owns every guild's `GuildSession`. Sessions are created lazily and live for the process.
#[derive(Default)]
pub struct MusicManager {
    sessions: DashMap<GuildId, SessionHandle>,
}

impl MusicManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the session for this guild, creating it on first use
    pub fn session(&self, guild_id: GuildId) -> SessionHandle {
        self.sessions
            .entry(guild_id)
            .or_insert_with(|| {
                debug!("Creating session for guild {}", guild_id);
                Arc::new(Mutex::new(GuildSession::new()))
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
