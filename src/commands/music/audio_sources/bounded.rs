//! Timeout wrapper around any `TrackResolver`.

use serenity::async_trait;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

use super::{PlaylistPage, ResolveResult, Track, TrackResolver};

/// Bounds every call of the inner resolver. A call that runs out of time is reported as
/// "no results" rather than as an error.
pub struct BoundedResolver<R> {
    inner: R,
    limit: Duration,
}

impl<R: TrackResolver> BoundedResolver<R> {
    pub fn new(inner: R, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl<R: TrackResolver> TrackResolver for BoundedResolver<R> {
    async fn search(&self, query: &str) -> ResolveResult<Vec<Track>> {
        match timeout(self.limit, self.inner.search(query)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Search for '{}' timed out after {:?}", query, self.limit);
                Ok(Vec::new())
            }
        }
    }

    async fn resolve_url(&self, url: &str) -> ResolveResult<Option<Track>> {
        match timeout(self.limit, self.inner.resolve_url(url)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Resolving {} timed out after {:?}", url, self.limit);
                Ok(None)
            }
        }
    }

    async fn resolve_playlist(
        &self,
        url: &str,
        page: Option<String>,
    ) -> ResolveResult<PlaylistPage> {
        match timeout(self.limit, self.inner.resolve_playlist(url, page)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Playlist page of {} timed out after {:?}", url, self.limit);
                Ok(PlaylistPage::default())
            }
        }
    }
}
