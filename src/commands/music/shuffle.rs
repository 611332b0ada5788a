use super::*;

/// Shuffle the queue (after the playlist being loaded, if any, is complete)
#[poise::command(slash_command, prefix_command, aliases("sh"), category = "Music")]
pub async fn shuffle(ctx: Context<'_>) -> CommandResult {
    let guild_id = guild_id(ctx)?;
    let outcome = ctx.data().controller.shuffle(guild_id).await;
    ctx.send(embedded_messages::shuffled(outcome)).await?;
    Ok(())
}
