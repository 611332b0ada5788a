use super::*;
use crate::commands::music::audio_sources::resolve_query;

/// Add a song to the queue, or play it right away when nothing is playing
#[poise::command(slash_command, prefix_command, aliases("ad"), category = "Music")]
pub async fn add(
    ctx: Context<'_>,
    #[description = "URL or search query"]
    #[rest]
    query: String,
) -> CommandResult {
    let guild_id = guild_id(ctx)?;
    let channel_id = match author_voice_channel(ctx, guild_id) {
        Ok(channel_id) => channel_id,
        Err(err) => return reply_error(ctx, err).await,
    };

    ctx.defer().await?;

    let data = ctx.data();
    let track = match resolve_query(data.resolver.as_ref(), &query).await {
        Ok(track) => track,
        Err(err) => return reply_error(ctx, err).await,
    };

    let result = data.controller.add_or_enqueue(guild_id, channel_id, track).await;
    reply_outcome(ctx, result).await
}
