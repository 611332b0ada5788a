use super::*;

/// Resume paused music, or rejoin and play the queue after a stop
#[poise::command(slash_command, prefix_command, aliases("resume", ">"), category = "Music")]
pub async fn music(ctx: Context<'_>) -> CommandResult {
    let guild_id = guild_id(ctx)?;
    // Only needed when reconnecting; the controller reports it if missing.
    let channel_id = author_voice_channel(ctx, guild_id).ok();

    let result = ctx
        .data()
        .controller
        .resume_or_reconnect(guild_id, channel_id)
        .await;
    reply_outcome(ctx, result).await
}
