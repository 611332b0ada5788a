//! YouTube lookups through the `yt-dlp` command-line tool.

use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, info, warn};
use url::Url;

use super::{PlaylistItem, PlaylistPage, ResolveResult, Track};
use crate::commands::music::utils::music_manager::MusicError;

/// Number of candidates requested per search.
const SEARCH_RESULTS: usize = 5;

/// Runs `yt-dlp` for searches, single links and playlists.
#[derive(Debug, Clone)]
pub struct YoutubeApi {
    ytdlp_path: String,
}

impl YoutubeApi {
    pub fn new(ytdlp_path: impl Into<String>) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
        }
    }

    /// Checks if the input string is a YouTube URL (watch page, short link or playlist).
    pub fn is_youtube_url(query: &str) -> bool {
        match Url::parse(query) {
            Ok(url) => url.host_str().is_some_and(|host| {
                matches!(
                    host,
                    "www.youtube.com" | "youtube.com" | "m.youtube.com" | "music.youtube.com"
                        | "youtu.be"
                )
            }),
            Err(_) => false,
        }
    }

    /// A YouTube playlist page, or any YouTube link carrying a `list` parameter.
    pub fn is_playlist_url(query: &str) -> bool {
        if !Self::is_youtube_url(query) {
            return false;
        }
        Url::parse(query).is_ok_and(|url| {
            url.path() == "/playlist" || url.query_pairs().any(|(key, _)| key == "list")
        })
    }

    /// Searches YouTube and returns up to five results, best match first.
    pub async fn search(&self, query: &str) -> ResolveResult<Vec<Track>> {
        info!("Searching YouTube for: {}", query);
        let search_param = format!("ytsearch{}:{}", SEARCH_RESULTS, query);
        let stdout = self.run(&["-j", "--flat-playlist", &search_param]).await?;

        let tracks = parse_json_lines(&stdout);
        debug!("Search for '{}' returned {} results", query, tracks.len());
        Ok(tracks)
    }

    /// Fetches metadata for a single video link, ignoring any playlist it belongs to.
    pub async fn resolve_url(&self, url: &str) -> ResolveResult<Option<Track>> {
        info!("Resolving YouTube URL: {}", url);
        let stdout = self.run(&["-j", "--no-playlist", url]).await?;
        Ok(parse_json_lines(&stdout).into_iter().next())
    }

    /// Fetches a whole playlist in one flat listing, delivered as a single page.
    pub async fn resolve_playlist(&self, url: &str) -> ResolveResult<PlaylistPage> {
        info!("Fetching YouTube playlist: {}", url);
        let stdout = self.run(&["-J", "--flat-playlist", url]).await?;
        let playlist: Value = serde_json::from_str(&stdout).map_err(|e| {
            MusicError::AudioSourceError(format!("Failed to parse playlist metadata: {}", e))
        })?;

        let items = parse_playlist_entries(&playlist)
            .into_iter()
            .map(PlaylistItem::Track)
            .collect();

        Ok(PlaylistPage {
            items,
            next_page: None,
        })
    }

    async fn run(&self, args: &[&str]) -> ResolveResult<String> {
        let output = Command::new(&self.ytdlp_path)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| MusicError::AudioSourceError(format!("Failed to run yt-dlp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MusicError::AudioSourceError(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parses `-j` output: one JSON object per line. Lines that do not parse are skipped.
fn parse_json_lines(stdout: &str) -> Vec<Track> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<Value>(line) {
            Ok(value) => Track::from_ytdlp_json(&value),
            Err(e) => {
                warn!("Skipping unparsable yt-dlp line: {}", e);
                None
            }
        })
        .collect()
}

/// Parses the `entries` of a `-J --flat-playlist` document, dropping private or deleted videos.
fn parse_playlist_entries(playlist: &Value) -> Vec<Track> {
    playlist["entries"]
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter(|entry| {
                    !matches!(
                        entry["title"].as_str(),
                        Some("[Private video]" | "[Deleted video]")
                    )
                })
                .filter_map(Track::from_ytdlp_json)
                .collect()
        })
        .unwrap_or_default()
}
