use super::*;
use poise::CreateReply;

/// Show the current queue, the recent history and playlist loading progress
#[poise::command(slash_command, prefix_command, aliases("qu"), category = "Music")]
pub async fn queue(ctx: Context<'_>) -> CommandResult {
    let guild_id = guild_id(ctx)?;
    let data = ctx.data();

    let status = data.controller.queue_status(guild_id).await;
    let ingestion = data.ingestor.status(guild_id);

    ctx.send(
        CreateReply::default().embed(embedded_messages::music_queue(&status, ingestion.as_ref())),
    )
    .await?;
    Ok(())
}
