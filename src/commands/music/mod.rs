pub mod add;
pub mod cancel;
pub mod empty;
pub mod next;
pub mod pause;
pub mod play;
pub mod playlist;
pub mod previous;
pub mod queue;
pub mod remove;
pub mod resume;
pub mod shuffle;
pub mod stop;

pub mod audio_sources;
pub mod utils;

use crate::{CommandResult, Context, Error};
use poise::serenity_prelude::{ChannelId, GuildId};
use tracing::warn;
use utils::{
    embedded_messages,
    music_manager::{MusicError, MusicResult},
    playback::PlaybackOutcome,
};

/// The guild the command was invoked in.
fn guild_id(ctx: Context<'_>) -> Result<GuildId, Error> {
    ctx.guild_id()
        .ok_or_else(|| Box::new(MusicError::NotInGuild) as Error)
}

/// The voice channel of the invoking user.
fn author_voice_channel(ctx: Context<'_>, guild_id: GuildId) -> MusicResult<ChannelId> {
    utils::user_voice_channel(ctx.serenity_context(), guild_id, ctx.author().id)
}

/// Replies with the rendered outcome, or with the error when the operation failed.
async fn reply_outcome(ctx: Context<'_>, result: MusicResult<PlaybackOutcome>) -> CommandResult {
    match result {
        Ok(outcome) => {
            ctx.send(embedded_messages::outcome(&outcome)).await?;
            Ok(())
        }
        Err(err) => reply_error(ctx, err).await,
    }
}

/// Recoverable errors are shown to the user rather than bubbled up to poise.
async fn reply_error(ctx: Context<'_>, err: MusicError) -> CommandResult {
    warn!("{} failed: {}", ctx.command().name, err);
    ctx.send(embedded_messages::error(&err)).await?;
    Ok(())
}
