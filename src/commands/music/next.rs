use super::*;

/// Skip to the next song in the queue
#[poise::command(slash_command, prefix_command, aliases(">>", "skip"), category = "Music")]
pub async fn next(ctx: Context<'_>) -> CommandResult {
    let guild_id = guild_id(ctx)?;
    let channel_id = match author_voice_channel(ctx, guild_id) {
        Ok(channel_id) => channel_id,
        Err(err) => return reply_error(ctx, err).await,
    };

    let result = ctx.data().controller.skip_to_next(guild_id, channel_id).await;
    reply_outcome(ctx, result).await
}
