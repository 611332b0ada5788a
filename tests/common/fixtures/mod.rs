//! Sample guilds, tracks and playlists used across the test suite

use fake::Fake;
use fake::faker::lorem::en::Words;
use poise::serenity_prelude::{ChannelId, GuildId};
use rstest::fixture;

use anakin::commands::music::audio_sources::{PlaylistItem, SourceKind, Track};

pub const SAMPLE_GUILD_ID: u64 = 123456789;
pub const SAMPLE_CHANNEL_ID: u64 = 987654321;
pub const SAMPLE_PLAYLIST_URL: &str = "https://www.youtube.com/playlist?list=PLx0sYbCqOb8TBPRdmBHs5Iftvv9TPboYG";

#[fixture]
pub fn guild() -> GuildId {
    GuildId::new(SAMPLE_GUILD_ID)
}

#[fixture]
pub fn channel() -> ChannelId {
    ChannelId::new(SAMPLE_CHANNEL_ID)
}

pub fn track(title: &str) -> Track {
    Track::new(
        format!("https://www.youtube.com/watch?v={}", title.replace(' ', "_")),
        title,
        SourceKind::Youtube,
    )
}

/// `count` tracks with random titles, each suffixed with its index to keep them distinct.
pub fn tracks(count: usize) -> Vec<Track> {
    (0..count)
        .map(|i| {
            let words: Vec<String> = Words(2..5).fake();
            track(&format!("{} #{}", words.join(" "), i))
        })
        .collect()
}

/// A page of search-resolved items named `prefix-0`, `prefix-1`, ...
pub fn query_page(prefix: &str, count: usize) -> Vec<PlaylistItem> {
    (0..count)
        .map(|i| PlaylistItem::Query(format!("{}-{}", prefix, i)))
        .collect()
}

pub fn titles(tracks: &[Track]) -> Vec<String> {
    tracks.iter().map(|t| t.title.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tracks_are_distinct() {
        let generated = tracks(20);
        let mut unique = titles(&generated);
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 20);
    }
}
