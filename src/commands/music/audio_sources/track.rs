//! Defines the `Track` struct, the immutable descriptor of a playable item shared by the
//! queue, the history and the audio engine, and the conversion from `yt-dlp` JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Where a track was resolved from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Youtube,
    Spotify,
    Direct,
}

/// A resolved, playable item. Cloned freely between the queue, the history and the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    /// Source URI handed to the audio engine.
    pub uri: String,
    /// The title of the track.
    pub title: String,
    /// The duration of the track, if the provider reported one.
    #[serde(with = "humantime_serde")]
    pub duration: Option<Duration>,
    /// The provider the track was resolved from.
    pub source: SourceKind,
    /// URL to a thumbnail image for the track, if available.
    pub thumbnail: Option<String>,
}

impl Track {
    pub fn new(uri: impl Into<String>, title: impl Into<String>, source: SourceKind) -> Self {
        Self {
            uri: uri.into(),
            title: title.into(),
            duration: None,
            source,
            thumbnail: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    /// Duration in whole milliseconds, zero when unknown.
    pub fn duration_ms(&self) -> u64 {
        self.duration.map_or(0, |d| d.as_millis() as u64)
    }

    /// Builds a track from one `yt-dlp` JSON object (`-j` output or a `--flat-playlist` entry).
    ///
    /// Returns `None` when the object carries no usable URL.
    pub fn from_ytdlp_json(value: &Value) -> Option<Track> {
        let uri = value["webpage_url"]
            .as_str()
            .or_else(|| value["url"].as_str())
            .map(str::to_string)
            .or_else(|| {
                value["id"]
                    .as_str()
                    .map(|id| format!("https://www.youtube.com/watch?v={}", id))
            })?;

        let title = value["title"].as_str().unwrap_or("Unknown Title").to_string();
        let duration = value["duration"]
            .as_f64()
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok());

        // Flat playlist entries carry a list of thumbnails instead of a single one.
        let thumbnail = value["thumbnail"]
            .as_str()
            .or_else(|| {
                value["thumbnails"]
                    .as_array()
                    .and_then(|thumbs| thumbs.last())
                    .and_then(|thumb| thumb["url"].as_str())
            })
            .map(str::to_string);

        Some(Track {
            uri,
            title,
            duration,
            source: SourceKind::Youtube,
            thumbnail,
        })
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}
