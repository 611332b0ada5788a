use super::*;

/// Remove a song from the queue by (part of) its title or URL
#[poise::command(slash_command, prefix_command, aliases("re", "rm"), category = "Music")]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Title or URL of the song to remove"]
    #[rest]
    identifier: String,
) -> CommandResult {
    let guild_id = guild_id(ctx)?;

    match ctx.data().controller.remove(guild_id, identifier.trim()).await {
        Ok(track) => {
            ctx.send(embedded_messages::track_removed(&track)).await?;
            Ok(())
        }
        Err(err) => reply_error(ctx, err).await,
    }
}
