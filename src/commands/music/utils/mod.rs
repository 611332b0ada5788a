use poise::serenity_prelude as serenity;
use serenity::model::id::{ChannelId, GuildId, UserId};
use std::time::Duration;

use music_manager::{MusicError, MusicResult};

pub mod audio_engine;
pub mod embedded_messages;
pub mod event_handlers;
pub mod loop_state;
pub mod music_manager;
pub mod playback;
pub mod playlist_ingestor;
pub mod session;
#[cfg(feature = "music")]
pub mod songbird_engine;

/// Format a duration into a human-readable string (e.g., "3:45" or "1:23:45")
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Get the voice channel ID that the user is currently in
pub fn user_voice_channel(
    ctx: &serenity::Context,
    guild_id: GuildId,
    user_id: UserId,
) -> MusicResult<ChannelId> {
    let guild = ctx.cache.guild(guild_id).ok_or(MusicError::NotInGuild)?;

    guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id)
        .ok_or(MusicError::UserNotInVoiceChannel)
}
