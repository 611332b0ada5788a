use super::*;

/// Play the previous song again; the current one plays right after
#[poise::command(slash_command, prefix_command, aliases("<<"), category = "Music")]
pub async fn previous(ctx: Context<'_>) -> CommandResult {
    let guild_id = guild_id(ctx)?;
    let channel_id = match author_voice_channel(ctx, guild_id) {
        Ok(channel_id) => channel_id,
        Err(err) => return reply_error(ctx, err).await,
    };

    let result = ctx.data().controller.play_previous(guild_id, channel_id).await;
    reply_outcome(ctx, result).await
}
