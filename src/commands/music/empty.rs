use super::*;

/// Remove every song from the queue; the current song keeps playing
#[poise::command(slash_command, prefix_command, category = "Music")]
pub async fn empty(ctx: Context<'_>) -> CommandResult {
    let guild_id = guild_id(ctx)?;

    match ctx.data().controller.empty(guild_id).await {
        Ok(dropped) => {
            ctx.send(embedded_messages::queue_emptied(dropped)).await?;
            Ok(())
        }
        Err(err) => reply_error(ctx, err).await,
    }
}
