use super::*;
use crate::commands::music::{
    audio_sources::resolve_query,
    utils::loop_state::LoopState,
};
use regex::Regex;
use std::sync::LazyLock;
use tracing::info;

/// Matches the `-loop [n]` option anywhere in the query.
static LOOP_OPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)-loop(?:\s+(\d+))?(?:\s|$)").unwrap());

/// Splits the `-loop` option off a play query.
///
/// `-loop n` replays the track n times after the first play, a bare `-loop` repeats it until
/// skipped. A count too large for `u32` is treated as infinite.
pub fn parse_loop_option(input: &str) -> (String, LoopState) {
    let Some(captures) = LOOP_OPTION.captures(input) else {
        return (input.trim().to_string(), LoopState::NoLoop);
    };

    let loop_state = match captures.get(1) {
        Some(count) => count
            .as_str()
            .parse()
            .map(LoopState::Finite)
            .unwrap_or(LoopState::Infinite),
        None => LoopState::Infinite,
    };

    let query = LOOP_OPTION.replace(input, " ");
    let query = query.split_whitespace().collect::<Vec<_>>().join(" ");
    (query, loop_state)
}

/// Play a song from a search, a YouTube link or a Spotify track link
///
/// Add `-loop` to repeat it, or `-loop n` to replay it n more times.
#[poise::command(slash_command, prefix_command, category = "Music")]
pub async fn play(
    ctx: Context<'_>,
    #[description = "URL or search query, optionally followed by -loop [n]"]
    #[rest]
    query: String,
) -> CommandResult {
    info!("Received play command with query: {}", query);
    let guild_id = guild_id(ctx)?;

    let channel_id = match author_voice_channel(ctx, guild_id) {
        Ok(channel_id) => channel_id,
        Err(err) => return reply_error(ctx, err).await,
    };

    let (query, loop_state) = parse_loop_option(&query);
    if query.is_empty() {
        return reply_error(ctx, MusicError::NoMatch("an empty query".to_string())).await;
    }

    // Defer the response since resolving might take time
    ctx.defer().await?;

    let data = ctx.data();
    let track = match resolve_query(data.resolver.as_ref(), &query).await {
        Ok(track) => track,
        Err(err) => return reply_error(ctx, err).await,
    };

    let result = data
        .controller
        .play_or_enqueue(guild_id, channel_id, track, loop_state)
        .await;
    reply_outcome(ctx, result).await
}
