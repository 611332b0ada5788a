//! Environment-driven configuration.

use std::env;
use std::time::Duration;

use crate::commands::music::utils::music_manager::{MusicError, MusicResult};

const DEFAULT_PREFIX: &str = "!";
const DEFAULT_YTDLP: &str = "yt-dlp";
const DEFAULT_RESOLVER_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub discord_token: String,
    /// Prefix for text commands.
    pub prefix: String,
    /// `None` when either Spotify variable is missing; Spotify links are then rejected.
    pub spotify: Option<SpotifyCredentials>,
    pub ytdlp_path: String,
    /// Upper bound on every resolver call.
    pub resolver_timeout: Duration,
}

impl Config {
    /// Reads the configuration from the process environment. Call `dotenv` first.
    pub fn from_env() -> MusicResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> MusicResult<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let discord_token = var("DISCORD_TOKEN")
            .ok_or_else(|| MusicError::ConfigError("DISCORD_TOKEN not set".to_string()))?;

        let spotify = match (var("SPOTIFY_CLIENT_ID"), var("SPOTIFY_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(SpotifyCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        let resolver_timeout = match var("RESOLVER_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                MusicError::ConfigError(format!("RESOLVER_TIMEOUT_SECS is not a number: {}", raw))
            })?,
            None => DEFAULT_RESOLVER_TIMEOUT_SECS,
        };

        Ok(Self {
            discord_token,
            prefix: var("PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            spotify,
            ytdlp_path: var("YTDLP_PATH").unwrap_or_else(|| DEFAULT_YTDLP.to_string()),
            resolver_timeout: Duration::from_secs(resolver_timeout),
        })
    }
}
