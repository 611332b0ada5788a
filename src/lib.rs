use std::sync::{Arc, LazyLock};

pub mod commands;
pub mod config;

use commands::music::audio_sources::TrackResolver;
use commands::music::utils::{playback::PlaybackController, playlist_ingestor::PlaylistIngestor};
use config::Config;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// Shared HTTP client for Spotify and for songbird's `yt-dlp` inputs.
pub static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(reqwest::Client::new);

/// User data, which is stored and accessible in all command invocations
pub struct Data {
    pub controller: Arc<PlaybackController>,
    pub ingestor: Arc<PlaylistIngestor>,
    pub resolver: Arc<dyn TrackResolver>,
    pub config: Config,
}

#[poise::command(slash_command, prefix_command, category = "General")]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            show_context_menu_commands: true,
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.into())
}

#[poise::command(prefix_command, hide_in_help)]
pub async fn register(ctx: Context<'_>) -> CommandResult {
    poise::builtins::register_application_commands_buttons(ctx)
        .await
        .map_err(|e| e.into())
}

/// Every command the bot registers.
pub fn all_commands() -> Vec<poise::Command<Data, Error>> {
    use commands::music::{
        add::*, cancel::*, empty::*, next::*, pause::*, play::*, playlist::*, previous::*,
        queue::*, remove::*, resume::*, shuffle::*, stop::*,
    };

    vec![
        // Default commands
        register(),
        help(),
        // Music commands
        play(),
        add(),
        playlist(),
        cancel(),
        next(),
        previous(),
        stop(),
        music(),
        pause(),
        queue(),
        remove(),
        shuffle(),
        empty(),
    ]
}
