use super::*;
use poise::serenity_prelude::CreateMessage;
use tracing::{info, warn};

/// Load a YouTube or Spotify playlist (or album) into the queue
///
/// Tracks are added as they are found; the first one starts right away when nothing is playing.
#[poise::command(slash_command, prefix_command, aliases("pl"), category = "Music")]
pub async fn playlist(
    ctx: Context<'_>,
    #[description = "Playlist or album URL"] url: String,
) -> CommandResult {
    let guild_id = guild_id(ctx)?;
    let channel_id = match author_voice_channel(ctx, guild_id) {
        Ok(channel_id) => channel_id,
        Err(err) => return reply_error(ctx, err).await,
    };

    let handle = match ctx.data().ingestor.ingest(guild_id, channel_id, &url).await {
        Ok(handle) => handle,
        Err(err) => return reply_error(ctx, err).await,
    };
    ctx.send(embedded_messages::playlist_loading(&url)).await?;

    // The ingestion runs on its own task; report back in this channel when it is done.
    let http = ctx.serenity_context().http.clone();
    let channel = ctx.channel_id();
    tokio::spawn(async move {
        let embed = match handle.await {
            Ok(Ok(report)) => embedded_messages::playlist_loaded(&report),
            Ok(Err(err)) => embedded_messages::error_embed(&err),
            Err(_) => embedded_messages::playlist_cancelled(),
        };
        let message = CreateMessage::new().embed(embed);
        if let Err(e) = channel.send_message(&http, message).await {
            warn!("Failed to report playlist result in guild {}: {}", guild_id, e);
        } else {
            info!("Reported playlist result in guild {}", guild_id);
        }
    });

    Ok(())
}
