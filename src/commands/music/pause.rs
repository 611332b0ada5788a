use super::*;

/// Pause the current track
#[poise::command(slash_command, prefix_command, aliases("="), category = "Music")]
pub async fn pause(ctx: Context<'_>) -> CommandResult {
    let guild_id = guild_id(ctx)?;
    let result = ctx.data().controller.pause(guild_id).await;
    reply_outcome(ctx, result).await
}
