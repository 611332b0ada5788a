//! Spotify Web API access: client credentials authentication, link parsing and paginated
//! playlist/album listings.
//!
//! Spotify does not serve audio, so every item is turned into a search query that the
//! YouTube side resolves.

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use regex::Regex;
use reqwest::header;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{PlaylistItem, PlaylistPage, ResolveResult};
use crate::commands::music::utils::music_manager::MusicError;

const API_BASE: &str = "https://api.spotify.com/v1";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Page sizes accepted by the playlist and album endpoints.
const PLAYLIST_PAGE_SIZE: usize = 100;
const ALBUM_PAGE_SIZE: usize = 50;

/// Represents the response from Spotify's token endpoint.
#[derive(Debug, Serialize, Deserialize)]
struct SpotifyToken {
    access_token: String,
    token_type: String,
    expires_in: u64,
    /// The time when the token was created, used to check expiry.
    #[serde(skip, default = "Instant::now")]
    created_at: Instant,
}

impl SpotifyToken {
    /// Considers the token expired 30 seconds before its actual expiry time.
    fn is_expired(&self) -> bool {
        let expiry = Duration::from_secs(self.expires_in);
        self.created_at.elapsed() > expiry.saturating_sub(Duration::from_secs(30))
    }
}

static SPOTIFY_LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(open\.spotify\.com|spotify)/(intl-[a-z]+/)?(track|playlist|album)/([a-zA-Z0-9]+)(\?.*)?$")
        .unwrap()
});

/// A recognized Spotify link and the ID it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpotifyLink {
    Track(String),
    Playlist(String),
    Album(String),
}

impl SpotifyLink {
    pub fn parse(url: &str) -> Option<SpotifyLink> {
        let captures = SPOTIFY_LINK_REGEX.captures(url.trim())?;
        let id = captures.get(5)?.as_str().to_string();
        match captures.get(4)?.as_str() {
            "track" => Some(SpotifyLink::Track(id)),
            "playlist" => Some(SpotifyLink::Playlist(id)),
            "album" => Some(SpotifyLink::Album(id)),
            _ => None,
        }
    }
}

/// Client for the Spotify Web API.
pub struct SpotifyApi {
    client_id: String,
    client_secret: String,
    http: reqwest::Client,
    api_base: String,
    token_url: String,
    token: Mutex<Option<SpotifyToken>>,
}

impl SpotifyApi {
    pub fn new(
        http: reqwest::Client,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            http,
            api_base: API_BASE.to_string(),
            token_url: TOKEN_URL.to_string(),
            token: Mutex::new(None),
        }
    }

    /// Points the client at other hosts, e.g. a local mock server.
    pub fn with_endpoints(mut self, api_base: impl Into<String>, token_url: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self.token_url = token_url.into();
        self
    }

    /// Returns a cached access token, requesting a new one when missing or about to expire.
    async fn access_token(&self) -> ResolveResult<String> {
        let mut token_lock = self.token.lock().await;

        if let Some(token) = &*token_lock {
            if !token.is_expired() {
                return Ok(token.access_token.clone());
            }
        }

        debug!("Requesting a new Spotify access token");
        let auth = BASE64_STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret));
        let params = [("grant_type", "client_credentials")];

        let response = self
            .http
            .post(&self.token_url)
            .header(header::AUTHORIZATION, format!("Basic {}", auth))
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                MusicError::ExternalApiError(format!("Failed to request Spotify token: {}", e))
            })?;

        let response = check_status(response).await?;
        let token = response.json::<SpotifyToken>().await.map_err(|e| {
            MusicError::ExternalApiError(format!("Failed to parse Spotify token: {}", e))
        })?;

        let access_token = token.access_token.clone();
        *token_lock = Some(token);
        Ok(access_token)
    }

    async fn get_json(&self, url: &str) -> ResolveResult<Value> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| MusicError::ExternalApiError(format!("Spotify request failed: {}", e)))?;

        check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| MusicError::ExternalApiError(format!("Failed to parse Spotify data: {}", e)))
    }

    /// Fetches a track and returns the search query used to find it on YouTube.
    pub async fn track_query(&self, track_id: &str) -> ResolveResult<String> {
        let url = format!("{}/tracks/{}", self.api_base, track_id);
        let track = self.get_json(&url).await?;
        search_query(&track)
            .ok_or_else(|| MusicError::ExternalApiError("Missing track name".to_string()))
    }

    /// Fetches one page of a playlist or album. Items are search queries.
    pub async fn playlist_page(
        &self,
        link: &SpotifyLink,
        page: Option<String>,
    ) -> ResolveResult<PlaylistPage> {
        let url = match (page, link) {
            (Some(next), _) => next,
            (None, SpotifyLink::Playlist(id)) => format!(
                "{}/playlists/{}/tracks?limit={}",
                self.api_base, id, PLAYLIST_PAGE_SIZE
            ),
            (None, SpotifyLink::Album(id)) => format!(
                "{}/albums/{}/tracks?limit={}",
                self.api_base, id, ALBUM_PAGE_SIZE
            ),
            (None, SpotifyLink::Track(_)) => {
                return Err(MusicError::AudioSourceError(
                    "A Spotify track is not a playlist".to_string(),
                ));
            }
        };

        info!("Fetching Spotify page: {}", url);
        let data = self.get_json(&url).await?;

        let items = data["items"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    // Playlist items wrap the track; album items are the track.
                    .map(|item| match link {
                        SpotifyLink::Playlist(_) => &item["track"],
                        _ => item,
                    })
                    .filter(|track| !track["id"].is_null())
                    .filter_map(search_query)
                    .map(PlaylistItem::Query)
                    .collect()
            })
            .unwrap_or_default();

        Ok(PlaylistPage {
            items,
            next_page: data["next"].as_str().map(str::to_string),
        })
    }
}

/// "Title Artist1, Artist2", the query used to find a Spotify track on YouTube.
fn search_query(track: &Value) -> Option<String> {
    let name = track["name"].as_str()?;
    let artists = track["artists"]
        .as_array()
        .map(|artists| {
            artists
                .iter()
                .filter_map(|a| a["name"].as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();

    if artists.is_empty() {
        Some(name.to_string())
    } else {
        Some(format!("{} {}", name, artists))
    }
}

async fn check_status(response: reqwest::Response) -> ResolveResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Cannot read response".to_string());
    Err(MusicError::ExternalApiError(format!(
        "Spotify API error: {} - {}",
        status, text
    )))
}
