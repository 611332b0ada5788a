//! This module defines the `TrackResolver` seam through which the playback core looks up
//! tracks, and the providers behind it: YouTube through `yt-dlp` and the Spotify Web API.

/// Submodule bounding every resolver call with a timeout.
pub mod bounded;
/// Submodule talking to the Spotify Web API.
pub mod spotify;
/// Submodule defining the `Track` struct used across audio sources.
pub mod track;
/// Submodule resolving YouTube searches, links and playlists through `yt-dlp`.
pub mod youtube;

use serenity::async_trait;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use crate::commands::music::utils::music_manager::MusicError;
use spotify::{SpotifyApi, SpotifyLink};
use youtube::YoutubeApi;

pub use bounded::BoundedResolver;
pub use track::{SourceKind, Track};

/// A specialized `Result` type for resolver operations.
pub type ResolveResult<T> = Result<T, MusicError>;

/// One entry of a playlist page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistItem {
    /// The provider already returned a playable track.
    Track(Track),
    /// The provider only knows a title; the entry is resolved through `search` when ingested.
    Query(String),
}

/// One page of a playlist. `next_page` is the opaque token for the following page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistPage {
    pub items: Vec<PlaylistItem>,
    pub next_page: Option<String>,
}

impl PlaylistPage {
    pub fn is_last(&self) -> bool {
        self.next_page.is_none()
    }
}

/// Lookup of tracks against the external catalogs.
///
/// An empty result means "no match" and is not an error; provider and network failures
/// surface as `MusicError` resolution errors.
#[async_trait]
pub trait TrackResolver: Send + Sync {
    /// Searches by free text, best match first.
    async fn search(&self, query: &str) -> ResolveResult<Vec<Track>>;

    /// Resolves a provider-specific direct link to a single track.
    async fn resolve_url(&self, url: &str) -> ResolveResult<Option<Track>>;

    /// Fetches one page of a playlist. `page` is `None` for the first page and otherwise the
    /// `next_page` token of the previous page.
    async fn resolve_playlist(&self, url: &str, page: Option<String>)
    -> ResolveResult<PlaylistPage>;
}

/// A utility struct providing general helper functions related to audio sources.
pub struct AudioSource;

impl AudioSource {
    /// Performs a basic check if the input string can be parsed as a URL.
    pub fn is_url(input: &str) -> bool {
        Url::parse(input).is_ok()
    }
}

/// The kind of playlist a URL points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistSource {
    Youtube,
    Spotify(SpotifyLink),
}

impl PlaylistSource {
    /// Classifies a playlist URL, rejecting anything that is not a known playlist or album.
    pub fn detect(url: &str) -> ResolveResult<PlaylistSource> {
        if YoutubeApi::is_playlist_url(url) {
            return Ok(PlaylistSource::Youtube);
        }
        match SpotifyLink::parse(url) {
            Some(link @ (SpotifyLink::Playlist(_) | SpotifyLink::Album(_))) => {
                Ok(PlaylistSource::Spotify(link))
            }
            _ => Err(MusicError::InvalidPlaylistUrl(url.to_string())),
        }
    }
}

/// Resolves what a user typed into one track: links go through `resolve_url`, anything else
/// takes the best search match.
pub async fn resolve_query(resolver: &dyn TrackResolver, query: &str) -> ResolveResult<Track> {
    let query = query.trim();
    let found = if AudioSource::is_url(query) {
        resolver.resolve_url(query).await?
    } else {
        resolver.search(query).await?.into_iter().next()
    };

    found.ok_or_else(|| MusicError::NoMatch(query.to_string()))
}

/// The resolver used by the bot: YouTube for searches and YouTube links, Spotify for Spotify
/// links when credentials are configured.
pub struct AudioSources {
    youtube: YoutubeApi,
    spotify: Option<Arc<SpotifyApi>>,
}

impl AudioSources {
    pub fn new(youtube: YoutubeApi, spotify: Option<SpotifyApi>) -> Self {
        Self {
            youtube,
            spotify: spotify.map(Arc::new),
        }
    }

    fn spotify(&self) -> ResolveResult<&SpotifyApi> {
        self.spotify.as_deref().ok_or_else(|| {
            MusicError::ConfigError("Spotify credentials are not configured".to_string())
        })
    }
}

#[async_trait]
impl TrackResolver for AudioSources {
    async fn search(&self, query: &str) -> ResolveResult<Vec<Track>> {
        self.youtube.search(query).await
    }

    async fn resolve_url(&self, url: &str) -> ResolveResult<Option<Track>> {
        match SpotifyLink::parse(url) {
            Some(SpotifyLink::Track(id)) => {
                let query = self.spotify()?.track_query(&id).await?;
                info!("Resolving Spotify track through search: {}", query);
                Ok(self
                    .youtube
                    .search(&query)
                    .await?
                    .into_iter()
                    .next()
                    .map(|track| Track {
                        source: SourceKind::Spotify,
                        ..track
                    }))
            }
            Some(_) => Err(MusicError::AudioSourceError(
                "Spotify playlists and albums must be loaded with the playlist command"
                    .to_string(),
            )),
            None => {
                debug!("Resolving direct link: {}", url);
                self.youtube.resolve_url(url).await
            }
        }
    }

    async fn resolve_playlist(
        &self,
        url: &str,
        page: Option<String>,
    ) -> ResolveResult<PlaylistPage> {
        match PlaylistSource::detect(url)? {
            PlaylistSource::Youtube => self.youtube.resolve_playlist(url).await,
            PlaylistSource::Spotify(link) => self.spotify()?.playlist_page(&link, page).await,
        }
    }
}
