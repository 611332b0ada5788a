use poise::CreateReply;
use poise::serenity_prelude::CreateEmbed;
use std::time::Duration;
use thousands::Separable;

use super::format_duration;
use super::music_manager::{ErrorKind, MusicError};
use super::playback::{PlaybackOutcome, QueueStatus};
use super::playlist_ingestor::{IngestReport, IngestionStatus};
use super::session::ShuffleOutcome;
use crate::commands::music::audio_sources::Track;

const SUCCESS: u32 = 0x00ff00;
const FAILURE: u32 = 0xff0000;
const NOTICE: u32 = 0xffa500;

/// Queue entries listed before the rest is summarized.
const QUEUE_PREVIEW: usize = 10;

/// Parse the track for the now playing and added to queue embeds
fn parse_track(track: &Track) -> (String, String, String) {
    let duration_str = track
        .duration
        .map(format_duration)
        .unwrap_or_else(|| "Unknown duration".to_string());

    (track.title.clone(), track.uri.clone(), duration_str)
}

fn link(track: &Track) -> String {
    format!("[{}]({})", track.title, track.uri)
}

fn simple_embed(title: &str, description: impl Into<String>, color: u32) -> CreateEmbed {
    CreateEmbed::new()
        .title(title)
        .description(description)
        .color(color)
}

fn simple(title: &str, description: impl Into<String>, color: u32) -> CreateReply {
    CreateReply::default().embed(simple_embed(title, description, color))
}

/// Create an embed for when a song is now playing
pub fn now_playing(track: &Track) -> CreateEmbed {
    let (title, url, duration_str) = parse_track(track);

    let embed = CreateEmbed::new()
        .title("🎵 Now Playing")
        .description(format!("[{}]({})", title, url))
        .field("Duration", format!("`{}`", duration_str), true)
        .color(SUCCESS);

    match &track.thumbnail {
        Some(thumbnail) => embed.thumbnail(thumbnail),
        None => embed,
    }
}

/// Create an embed for when a song is added to the queue
pub fn added_to_queue(track: &Track, position: usize) -> CreateEmbed {
    let (title, url, duration_str) = parse_track(track);

    CreateEmbed::new()
        .title("🎵 Added to Queue")
        .description(format!("[{}]({})", title, url))
        .field("Duration", format!("`{}`", duration_str), true)
        .field("Position", format!("`#{}`", position), true)
        .color(SUCCESS)
}

/// Reply for the outcome of a playback operation.
pub fn outcome(outcome: &PlaybackOutcome) -> CreateReply {
    match outcome {
        PlaybackOutcome::Started(track) => CreateReply::default().embed(now_playing(track)),
        PlaybackOutcome::Queued { track, position } => {
            CreateReply::default().embed(added_to_queue(track, *position))
        }
        PlaybackOutcome::Advanced(track) => simple(
            "⏭️ Skipped",
            format!("Now playing {}", link(track)),
            SUCCESS,
        ),
        PlaybackOutcome::StoppedEmpty => simple(
            "⏹️ Queue Finished",
            "Nothing left in the queue",
            NOTICE,
        ),
        PlaybackOutcome::Stopped => simple(
            "⏹️ Stopped",
            "Playback stopped. The queue is kept, use `music` to pick up where you left off",
            SUCCESS,
        ),
        PlaybackOutcome::PlayingPrevious(track) => simple(
            "⏮️ Previous",
            format!("Playing {} again", link(track)),
            SUCCESS,
        ),
        PlaybackOutcome::Paused => simple("⏸️ Paused", "Playback paused", SUCCESS),
        PlaybackOutcome::Resumed => simple("▶️ Resumed", "Playback resumed", SUCCESS),
        PlaybackOutcome::Reconnected(track) => simple(
            "▶️ Back On",
            format!("Reconnected and playing {}", link(track)),
            SUCCESS,
        ),
        PlaybackOutcome::NothingToResume => {
            simple("ℹ️ Already Playing", "Music is already playing", NOTICE)
        }
        PlaybackOutcome::QueueEmpty => simple("📭 Queue Empty", "There is nothing to play", NOTICE),
    }
}

pub fn error_embed(err: &MusicError) -> CreateEmbed {
    let title = match err.kind() {
        ErrorKind::Precondition | ErrorKind::State => "❌ Error",
        ErrorKind::Resolution => "🔍 Not Found",
        ErrorKind::Engine => "🔇 Playback Error",
    };
    simple_embed(title, err.to_string(), FAILURE)
}

/// Reply for a failed operation. Caller mistakes are only shown to the caller.
pub fn error(err: &MusicError) -> CreateReply {
    let reply = CreateReply::default().embed(error_embed(err));
    match err.kind() {
        ErrorKind::Precondition => reply.ephemeral(true),
        _ => reply,
    }
}

pub fn track_removed(track: &Track) -> CreateReply {
    simple(
        "🗑️ Track Removed",
        format!("Removed {} from the queue", link(track)),
        SUCCESS,
    )
}

pub fn queue_emptied(dropped: usize) -> CreateReply {
    simple(
        "🧹 Queue Emptied",
        format!("Removed {} tracks", dropped.separate_with_commas()),
        SUCCESS,
    )
}

pub fn shuffled(outcome: ShuffleOutcome) -> CreateReply {
    match outcome {
        ShuffleOutcome::Shuffled => simple("🔀 Shuffled", "The queue has been shuffled", SUCCESS),
        ShuffleOutcome::Deferred => simple(
            "🔀 Shuffle Pending",
            "A playlist is still loading, the queue will be shuffled once it is done",
            NOTICE,
        ),
        ShuffleOutcome::NotEnoughTracks => simple(
            "❌ Error",
            "Not enough tracks in the queue to shuffle",
            FAILURE,
        ),
    }
}

pub fn playlist_loading(url: &str) -> CreateReply {
    simple(
        "⏳ Loading Playlist",
        format!("Loading <{}>, tracks are added as they are found", url),
        NOTICE,
    )
}

/// Sent as a follow-up message once the background ingestion finishes.
pub fn playlist_loaded(report: &IngestReport) -> CreateEmbed {
    simple_embed("📥 Playlist Loaded", ingest_summary(report), SUCCESS)
}

pub fn playlist_cancelled() -> CreateEmbed {
    simple_embed("🛑 Playlist Cancelled", "Stopped loading the playlist", NOTICE)
}

pub fn cancelled(was_loading: bool) -> CreateReply {
    if was_loading {
        CreateReply::default().embed(playlist_cancelled())
    } else {
        simple("❌ Error", "No playlist is loading", FAILURE)
    }
}

/// Create an embed for the music queue
pub fn music_queue(status: &QueueStatus, ingestion: Option<&IngestionStatus>) -> CreateEmbed {
    CreateEmbed::new()
        .title("🎵 Music Queue")
        .description(queue_description(status, ingestion))
        .color(SUCCESS)
}

fn ingest_summary(report: &IngestReport) -> String {
    let mut summary = String::new();
    if let Some(track) = &report.started {
        summary.push_str(&format!("Now playing {}\n", link(track)));
    }
    summary.push_str(&format!(
        "Added **{}** tracks to the queue",
        report.queued.separate_with_commas()
    ));
    if report.skipped > 0 {
        summary.push_str(&format!(
            "\n{} tracks could not be found",
            report.skipped.separate_with_commas()
        ));
    }
    if report.shuffled {
        summary.push_str("\n🔀 Queue shuffled");
    }
    summary
}

fn queue_description(status: &QueueStatus, ingestion: Option<&IngestionStatus>) -> String {
    let mut description = String::new();
    let session = &status.session;

    if !session.history.is_empty() {
        description.push_str("**🕘 Previously**\n");
        for track in &session.history {
            description.push_str(&format!("• {}\n", link(track)));
        }
        description.push('\n');
    }

    match &status.current {
        Some(track) => {
            let state = if status.paused { "⏸️ Paused" } else { "🎵 Now Playing" };
            description.push_str(&format!("**{}**\n**{}**", state, link(track)));
            if let Some(duration) = track.duration {
                description.push_str(&format!(" `{}`", format_duration(duration)));
            }
            if session.loop_state.is_looping() {
                description.push_str(&format!("\n🔁 Loop: {}", session.loop_state));
            }
            description.push_str("\n\n");
        }
        None => description.push_str("**🔇 Nothing playing**\n\n"),
    }

    if session.queue.is_empty() {
        description.push_str("**📭 Queue is empty**");
    } else {
        description.push_str(&format!(
            "**📋 Queue - {} tracks**\n",
            session.queue.len().separate_with_commas()
        ));
        for (index, track) in session.queue.iter().take(QUEUE_PREVIEW).enumerate() {
            description.push_str(&format!("`{}.` {}", index + 1, link(track)));
            if let Some(duration) = track.duration {
                description.push_str(&format!(" `{}`", format_duration(duration)));
            }
            description.push('\n');
        }
        if session.queue.len() > QUEUE_PREVIEW {
            description.push_str(&format!(
                "… and {} more\n",
                (session.queue.len() - QUEUE_PREVIEW).separate_with_commas()
            ));
        }

        let total_duration: Duration = session.queue.iter().filter_map(|t| t.duration).sum();
        if total_duration.as_secs() > 0 {
            description.push_str(&format!(
                "\n**⏱️ Total Duration:** `{}`",
                format_duration(total_duration)
            ));
        }
    }

    if let Some(ingestion) = ingestion {
        description.push_str(&format!(
            "\n\n⏳ Loading playlist since {} ({} tracks so far)",
            ingestion.started_at.format("%H:%M:%S UTC"),
            ingestion.queued.separate_with_commas()
        ));
    }

    description
}
