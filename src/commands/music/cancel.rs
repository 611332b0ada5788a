use super::*;

/// Stop loading the current playlist; tracks already added stay queued
#[poise::command(slash_command, prefix_command, category = "Music")]
pub async fn cancel(ctx: Context<'_>) -> CommandResult {
    let guild_id = guild_id(ctx)?;
    let was_loading = ctx.data().ingestor.cancel(guild_id).await;
    ctx.send(embedded_messages::cancelled(was_loading)).await?;
    Ok(())
}
