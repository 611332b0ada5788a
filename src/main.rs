use ::serenity::all::ClientBuilder;
use anakin::{
    Data, Error, HTTP_CLIENT, all_commands,
    commands::music::{
        audio_sources::{
            AudioSources, BoundedResolver, TrackResolver, spotify::SpotifyApi, youtube::YoutubeApi,
        },
        utils::{
            event_handlers::EventDispatcher, playback::PlaybackController,
            playlist_ingestor::PlaylistIngestor, songbird_engine::SongbirdEngine,
        },
    },
    config::Config,
};
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize logging with debug level for our crate
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("anakin=debug,warn")),
        )
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .pretty()
        .init();

    dotenv().ok();
    let config = Config::from_env()?;

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    // Track lookups: YouTube through yt-dlp, Spotify when credentials are present
    let spotify = config.spotify.as_ref().map(|credentials| {
        SpotifyApi::new(
            HTTP_CLIENT.clone(),
            &credentials.client_id,
            &credentials.client_secret,
        )
    });
    if spotify.is_none() {
        info!("Spotify credentials not set, Spotify links are disabled");
    }
    let resolver: Arc<dyn TrackResolver> = Arc::new(BoundedResolver::new(
        AudioSources::new(YoutubeApi::new(&config.ytdlp_path), spotify),
        config.resolver_timeout,
    ));

    // Audio engine, with its events drained by a single dispatcher task
    let songbird = Songbird::serenity();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let engine = SongbirdEngine::new(
        songbird.clone(),
        HTTP_CLIENT.clone(),
        &config.ytdlp_path,
        events_tx,
    );
    let controller = Arc::new(PlaybackController::new(Arc::new(engine)));
    let ingestor = Arc::new(PlaylistIngestor::new(controller.clone(), resolver.clone()));
    EventDispatcher::new(controller.clone()).spawn(events_rx);

    let data = Data {
        controller,
        ingestor,
        resolver,
        config: config.clone(),
    };

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: all_commands(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.prefix.clone()),
                ..Default::default()
            },
            on_error: |error| {
                Box::pin(async move {
                    error!("Command error: {}", error);
                    if let Err(e) = poise::builtins::on_error(error).await {
                        error!("Error while handling error: {}", e);
                    }
                })
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Registered {} commands", framework.options().commands.len());
                Ok(data)
            })
        })
        .build();

    let mut client = ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .register_songbird_with(songbird)
        .await?;

    info!("Starting client");
    client.start().await.map_err(Into::into)
}
