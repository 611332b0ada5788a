//! The playback controller: every user-facing playback operation for a guild.
//!
//! Each operation reads the engine state and mutates the `GuildSession` in short critical
//! sections, so no session lock is held across an engine call. Stopping an active track raises
//! the skip flag first, which makes the resulting end notification a no-op; queue and history
//! are only rearranged once the engine has accepted the stop.

use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::audio_engine::{AudioEngine, PlayerState};
use super::loop_state::LoopState;
use super::music_manager::{MusicError, MusicManager, MusicResult, SessionHandle};
use super::session::{SessionSnapshot, ShuffleOutcome};
use crate::commands::music::audio_sources::Track;

/// What a playback operation did, for the presentation layer to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Nothing was active, the track started right away.
    Started(Track),
    /// Something was active, the track was appended. `position` is 1-based.
    Queued { track: Track, position: usize },
    /// Skipped to the next queued track.
    Advanced(Track),
    /// Nothing left to play after a skip.
    StoppedEmpty,
    /// Playback stopped and the voice channel was left.
    Stopped,
    /// The most recent history entry is playing again.
    PlayingPrevious(Track),
    Paused,
    Resumed,
    /// Rejoined the voice channel and started the queue front.
    Reconnected(Track),
    /// Already playing, nothing to resume.
    NothingToResume,
    /// Nothing to resume and nothing queued.
    QueueEmpty,
}

/// Read-only view of a guild for the queue display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStatus {
    pub current: Option<Track>,
    pub paused: bool,
    pub session: SessionSnapshot,
}

/// Mediates between the per-guild sessions and the audio engine.
pub struct PlaybackController {
    engine: Arc<dyn AudioEngine>,
    sessions: MusicManager,
}

impl PlaybackController {
    pub fn new(engine: Arc<dyn AudioEngine>) -> Self {
        Self {
            engine,
            sessions: MusicManager::new(),
        }
    }

    pub fn session(&self, guild_id: GuildId) -> SessionHandle {
        self.sessions.session(guild_id)
    }

    pub async fn player_state(&self, guild_id: GuildId) -> PlayerState {
        self.engine.state(guild_id).await
    }

    /// Joins `channel_id` unless the guild already has a voice connection.
    pub async fn ensure_connected(&self, guild_id: GuildId, channel_id: ChannelId) -> MusicResult<()> {
        if !self.engine.state(guild_id).await.connected {
            info!("Connecting to channel {} in guild {}", channel_id, guild_id);
            self.engine.connect(guild_id, channel_id).await?;
        }
        Ok(())
    }

    /// Plays a track that was already taken out of the session.
    pub(crate) async fn play_track(&self, guild_id: GuildId, track: &Track) -> MusicResult<()> {
        debug!("Playing '{}' in guild {}", track.title, guild_id);
        self.engine.play(guild_id, track).await?;
        Ok(())
    }

    /// Plays a track popped from the queue, putting it back at the front if the engine refuses.
    pub(crate) async fn play_popped(&self, guild_id: GuildId, track: &Track) -> MusicResult<()> {
        if let Err(e) = self.play_track(guild_id, track).await {
            warn!("Failed to start '{}' in guild {}: {}", track.title, guild_id, e);
            let session = self.session(guild_id);
            session.lock().await.insert_front(track.clone());
            return Err(e);
        }
        Ok(())
    }

    /// Starts `track` if nothing is active, otherwise queues it. The loop setting only applies
    /// to a track that starts right away and replaces any previous loop setting.
    pub async fn play_or_enqueue(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        track: Track,
        loop_state: LoopState,
    ) -> MusicResult<PlaybackOutcome> {
        self.ensure_connected(guild_id, channel_id).await?;
        self.start_or_queue(guild_id, track, Some(loop_state)).await
    }

    /// Same as `play_or_enqueue` without loop handling. A paused track counts as active.
    pub async fn add_or_enqueue(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        track: Track,
    ) -> MusicResult<PlaybackOutcome> {
        self.ensure_connected(guild_id, channel_id).await?;
        self.start_or_queue(guild_id, track, None).await
    }

    async fn start_or_queue(
        &self,
        guild_id: GuildId,
        track: Track,
        loop_state: Option<LoopState>,
    ) -> MusicResult<PlaybackOutcome> {
        if self.engine.state(guild_id).await.is_playing() {
            let session = self.session(guild_id);
            let position = session.lock().await.push_queue(track.clone());
            info!("Queued '{}' at #{} in guild {}", track.title, position, guild_id);
            return Ok(PlaybackOutcome::Queued { track, position });
        }

        self.play_track(guild_id, &track).await?;
        if let Some(loop_state) = loop_state {
            let session = self.session(guild_id);
            session.lock().await.set_loop(loop_state);
            if loop_state.is_looping() {
                info!("Loop set to {} for guild {}", loop_state, guild_id);
            }
        }
        info!("Started '{}' in guild {}", track.title, guild_id);
        Ok(PlaybackOutcome::Started(track))
    }

    /// Moves on to the next queued track. Always clears the loop setting.
    ///
    /// The session is only rearranged once the engine has stopped the active track; a failed
    /// stop leaves queue and history as they were.
    pub async fn skip_to_next(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> MusicResult<PlaybackOutcome> {
        let state = self.engine.state(guild_id).await;
        let session = self.session(guild_id);

        {
            let mut session = session.lock().await;
            if session.queue_len() == 0 && !state.is_playing() {
                session.set_loop(LoopState::NoLoop);
                debug!("Nothing to skip in guild {}", guild_id);
                return Ok(PlaybackOutcome::StoppedEmpty);
            }
        }

        if state.is_playing() {
            self.stop_active(guild_id).await?;
        }

        let next = {
            let mut session = session.lock().await;
            session.set_loop(LoopState::NoLoop);
            if let Some(current) = state.current.clone() {
                session.push_history(current);
            }
            session.pop_front()
        };

        let Some(next) = next else {
            info!("Skipped the last track in guild {}", guild_id);
            return Ok(PlaybackOutcome::StoppedEmpty);
        };

        if let Err(e) = self.ensure_connected(guild_id, channel_id).await {
            session.lock().await.insert_front(next);
            return Err(e);
        }
        self.play_popped(guild_id, &next).await?;
        info!("Skipped to '{}' in guild {}", next.title, guild_id);
        Ok(PlaybackOutcome::Advanced(next))
    }

    /// Plays the most recent history entry again. An active track is requeued at the front so
    /// it plays right after.
    pub async fn play_previous(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> MusicResult<PlaybackOutcome> {
        let session = self.session(guild_id);
        if !session.lock().await.has_history() {
            return Err(MusicError::EmptyHistory);
        }

        self.ensure_connected(guild_id, channel_id).await?;
        let state = self.engine.state(guild_id).await;

        if state.is_playing() {
            self.stop_active(guild_id).await?;
        }

        let previous = {
            let mut session = session.lock().await;
            let previous = session.pop_history().ok_or(MusicError::EmptyHistory)?;
            session.set_loop(LoopState::NoLoop);
            if let Some(current) = state.current.clone() {
                session.insert_front(current);
            }
            previous
        };

        if let Err(e) = self.play_track(guild_id, &previous).await {
            warn!("Failed to restart '{}' in guild {}: {}", previous.title, guild_id, e);
            session.lock().await.push_history(previous);
            return Err(e);
        }
        info!("Playing previous track '{}' in guild {}", previous.title, guild_id);
        Ok(PlaybackOutcome::PlayingPrevious(previous))
    }

    /// Stops playback and leaves the voice channel. Queue and history are kept, and a running
    /// playlist ingestion keeps appending.
    pub async fn stop(&self, guild_id: GuildId) -> MusicResult<PlaybackOutcome> {
        let state = self.engine.state(guild_id).await;
        if !state.connected {
            return Err(MusicError::NotConnected);
        }

        self.session(guild_id).lock().await.set_loop(LoopState::NoLoop);

        // Leaving the channel ends playback as well, so a failed stop is not fatal here.
        if state.is_playing() {
            if let Err(e) = self.stop_active(guild_id).await {
                warn!("Stop failed in guild {}, leaving anyway: {}", guild_id, e);
            }
        }
        self.engine.disconnect(guild_id).await?;
        info!("Stopped playback in guild {}", guild_id);
        Ok(PlaybackOutcome::Stopped)
    }

    /// Stops the active track with the skip flag raised, so that its end notification is
    /// absorbed. The flag is lowered again when the engine refuses.
    async fn stop_active(&self, guild_id: GuildId) -> MusicResult<()> {
        let session = self.session(guild_id);
        session.lock().await.set_skip_flag(true);

        if let Err(e) = self.engine.stop(guild_id).await {
            warn!("Failed to stop the active track in guild {}: {}", guild_id, e);
            session.lock().await.set_skip_flag(false);
            return Err(e.into());
        }
        Ok(())
    }

    /// Unpauses, or reconnects and restarts from the queue after a stop.
    ///
    /// `channel_id` is the caller's voice channel; it is only needed to reconnect.
    pub async fn resume_or_reconnect(
        &self,
        guild_id: GuildId,
        channel_id: Option<ChannelId>,
    ) -> MusicResult<PlaybackOutcome> {
        let state = self.engine.state(guild_id).await;

        if state.is_paused() {
            self.engine.pause(guild_id, false).await?;
            info!("Resumed playback in guild {}", guild_id);
            return Ok(PlaybackOutcome::Resumed);
        }
        if state.is_playing() {
            return Ok(PlaybackOutcome::NothingToResume);
        }
        let session = self.session(guild_id);
        if session.lock().await.queue_len() == 0 {
            return Ok(PlaybackOutcome::QueueEmpty);
        }

        if !state.connected {
            let channel_id = channel_id.ok_or(MusicError::UserNotInVoiceChannel)?;
            self.engine.connect(guild_id, channel_id).await?;
        }

        let Some(next) = session.lock().await.pop_front() else {
            return Ok(PlaybackOutcome::QueueEmpty);
        };
        self.play_popped(guild_id, &next).await?;

        if state.connected {
            info!("Started queue front '{}' in guild {}", next.title, guild_id);
            Ok(PlaybackOutcome::Started(next))
        } else {
            info!("Reconnected and playing '{}' in guild {}", next.title, guild_id);
            Ok(PlaybackOutcome::Reconnected(next))
        }
    }

    pub async fn pause(&self, guild_id: GuildId) -> MusicResult<PlaybackOutcome> {
        let state = self.engine.state(guild_id).await;
        if !state.is_playing() {
            return Err(MusicError::NotPlaying);
        }
        if state.is_paused() {
            return Err(MusicError::AlreadyPaused);
        }

        self.engine.pause(guild_id, true).await?;
        info!("Paused playback in guild {}", guild_id);
        Ok(PlaybackOutcome::Paused)
    }

    pub async fn unpause(&self, guild_id: GuildId) -> MusicResult<PlaybackOutcome> {
        let state = self.engine.state(guild_id).await;
        if !state.is_playing() {
            return Err(MusicError::NotPlaying);
        }
        if !state.is_paused() {
            return Err(MusicError::NotPaused);
        }

        self.engine.pause(guild_id, false).await?;
        info!("Resumed playback in guild {}", guild_id);
        Ok(PlaybackOutcome::Resumed)
    }

    /// Removes the first queued track matching `identifier` by title or URI.
    pub async fn remove(&self, guild_id: GuildId, identifier: &str) -> MusicResult<Track> {
        let session = self.session(guild_id);
        let mut session = session.lock().await;
        if session.queue_len() == 0 {
            return Err(MusicError::QueueEmpty);
        }
        let removed = session
            .remove_matching(identifier)
            .ok_or_else(|| MusicError::NoMatch(identifier.to_string()))?;
        info!("Removed '{}' from the queue in guild {}", removed.title, guild_id);
        Ok(removed)
    }

    /// Shuffles the queue, deferred until the end of a running playlist ingestion.
    pub async fn shuffle(&self, guild_id: GuildId) -> ShuffleOutcome {
        let session = self.session(guild_id);
        let outcome = session.lock().await.request_shuffle();
        debug!("Shuffle in guild {}: {:?}", guild_id, outcome);
        outcome
    }

    /// Clears the queue; history and the current track are untouched.
    pub async fn empty(&self, guild_id: GuildId) -> MusicResult<usize> {
        let session = self.session(guild_id);
        let dropped = session.lock().await.clear_queue();
        if dropped == 0 {
            return Err(MusicError::QueueEmpty);
        }
        info!("Emptied {} tracks from the queue in guild {}", dropped, guild_id);
        Ok(dropped)
    }

    pub async fn queue_status(&self, guild_id: GuildId) -> QueueStatus {
        let state = self.engine.state(guild_id).await;
        let session = self.session(guild_id);
        let session = session.lock().await.snapshot();
        QueueStatus {
            paused: state.is_paused(),
            current: state.current,
            session,
        }
    }
}
