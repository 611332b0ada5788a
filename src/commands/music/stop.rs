use super::*;

/// Stop the music and leave the voice channel, keeping the queue
#[poise::command(slash_command, prefix_command, category = "Music")]
pub async fn stop(ctx: Context<'_>) -> CommandResult {
    let guild_id = guild_id(ctx)?;
    let result = ctx.data().controller.stop(guild_id).await;
    reply_outcome(ctx, result).await
}
