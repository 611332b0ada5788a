//! Background expansion of a playlist URL into the guild's queue.
//!
//! `ingest` validates the request, marks the session as loading and returns right away; a
//! spawned task then walks the playlist page by page. The first resolved track starts playback
//! when the guild is idle, every later one is appended to the queue as soon as it resolves.
//! Stopping playback does not cancel a running ingestion; `cancel` does.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

use super::music_manager::{MusicError, MusicResult};
use super::playback::PlaybackController;
use crate::commands::music::audio_sources::{
    PlaylistItem, PlaylistSource, ResolveResult, Track, TrackResolver,
};

/// Summary of a completed ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub source: String,
    /// Tracks appended to the queue. The track that started playback is not counted.
    pub queued: usize,
    /// The first track, when it started playback right away.
    pub started: Option<Track>,
    /// Items that could not be resolved and were left out.
    pub skipped: usize,
    /// A shuffle requested while loading ran at completion.
    pub shuffled: bool,
}

/// Progress of a running ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionStatus {
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub queued: usize,
}

struct ActiveIngestion {
    id: u64,
    source: String,
    started_at: DateTime<Utc>,
    queued: Arc<AtomicUsize>,
    abort: AbortHandle,
}

/// Receives the outcome of one ingestion. A receive error means it was cancelled.
pub type IngestHandle = oneshot::Receiver<MusicResult<IngestReport>>;

pub struct PlaylistIngestor {
    controller: Arc<PlaybackController>,
    resolver: Arc<dyn TrackResolver>,
    active: Arc<DashMap<GuildId, ActiveIngestion>>,
    next_id: AtomicU64,
}

impl PlaylistIngestor {
    pub fn new(controller: Arc<PlaybackController>, resolver: Arc<dyn TrackResolver>) -> Self {
        Self {
            controller,
            resolver,
            active: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Starts loading `url` into the guild's queue.
    ///
    /// Fails without side effects on an unrecognized URL or when the guild is already loading.
    pub async fn ingest(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        url: &str,
    ) -> MusicResult<IngestHandle> {
        PlaylistSource::detect(url)?;

        let session = self.controller.session(guild_id);
        {
            let mut session = session.lock().await;
            if session.is_loading() {
                return Err(MusicError::AlreadyLoading);
            }
            session.set_loading(true);
            session.set_pending_shuffle(false);
        }

        if let Err(e) = self.controller.ensure_connected(guild_id, channel_id).await {
            let mut session = session.lock().await;
            session.set_loading(false);
            session.set_pending_shuffle(false);
            return Err(e);
        }

        info!("Loading playlist {} for guild {}", url, guild_id);
        let (result_tx, result_rx) = oneshot::channel();
        let (start_tx, start_rx) = oneshot::channel::<()>();
        let queued = Arc::new(AtomicUsize::new(0));
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let job = Ingestion {
            guild_id,
            url: url.to_string(),
            controller: self.controller.clone(),
            resolver: self.resolver.clone(),
            queued: queued.clone(),
        };
        let active = self.active.clone();

        let task = tokio::spawn(async move {
            // Wait until the task is registered so that its own removal cannot run first.
            if start_rx.await.is_err() {
                return;
            }
            let result = job.run().await;
            active.remove_if(&guild_id, |_, entry| entry.id == id);
            let _ = result_tx.send(result);
        });

        self.active.insert(
            guild_id,
            ActiveIngestion {
                id,
                source: url.to_string(),
                started_at: Utc::now(),
                queued,
                abort: task.abort_handle(),
            },
        );
        let _ = start_tx.send(());

        Ok(result_rx)
    }

    pub fn status(&self, guild_id: GuildId) -> Option<IngestionStatus> {
        self.active.get(&guild_id).map(|active| IngestionStatus {
            source: active.source.clone(),
            started_at: active.started_at,
            queued: active.queued.load(Ordering::Relaxed),
        })
    }

    /// Aborts a running ingestion. Tracks already queued stay queued and a deferred shuffle is
    /// dropped. Returns `false` when nothing was loading.
    pub async fn cancel(&self, guild_id: GuildId) -> bool {
        let Some((_, active)) = self.active.remove(&guild_id) else {
            return false;
        };
        active.abort.abort();

        let session = self.controller.session(guild_id);
        let mut session = session.lock().await;
        session.set_loading(false);
        session.set_pending_shuffle(false);
        info!(
            "Cancelled loading of {} in guild {} after {} tracks",
            active.source,
            guild_id,
            active.queued.load(Ordering::Relaxed)
        );
        true
    }
}

/// One running ingestion.
struct Ingestion {
    guild_id: GuildId,
    url: String,
    controller: Arc<PlaybackController>,
    resolver: Arc<dyn TrackResolver>,
    queued: Arc<AtomicUsize>,
}

impl Ingestion {
    async fn run(&self) -> MusicResult<IngestReport> {
        match self.walk().await {
            Ok(mut report) => {
                report.shuffled = self
                    .controller
                    .session(self.guild_id)
                    .lock()
                    .await
                    .finish_loading();
                info!(
                    "Finished loading {} for guild {}: {} queued, {} skipped{}",
                    self.url,
                    self.guild_id,
                    report.queued,
                    report.skipped,
                    if report.shuffled { ", shuffled" } else { "" }
                );
                Ok(report)
            }
            Err(e) => {
                let session = self.controller.session(self.guild_id);
                let mut session = session.lock().await;
                session.set_loading(false);
                session.set_pending_shuffle(false);
                error!("Loading {} failed for guild {}: {}", self.url, self.guild_id, e);
                Err(e)
            }
        }
    }

    async fn walk(&self) -> MusicResult<IngestReport> {
        let mut report = IngestReport {
            source: self.url.clone(),
            ..Default::default()
        };
        let mut first = true;
        let mut page_token = None;

        loop {
            let page = match self.resolver.resolve_playlist(&self.url, page_token.take()).await {
                Ok(page) => page,
                Err(e) if first => return Err(e),
                Err(e) => {
                    warn!(
                        "Stopping early on {} for guild {}: {}",
                        self.url, self.guild_id, e
                    );
                    break;
                }
            };
            debug!(
                "Got {} items from {} (more pages: {})",
                page.items.len(),
                self.url,
                !page.is_last()
            );

            for item in page.items {
                if first {
                    let track = match self.resolve_item(item).await {
                        Ok(Some(track)) => track,
                        Ok(None) => return Err(MusicError::NoMatch(self.url.clone())),
                        Err(e) => return Err(e),
                    };
                    first = false;
                    if self.start_if_idle(&track).await? {
                        report.started = Some(track);
                        continue;
                    }
                    self.append(track, &mut report).await;
                    continue;
                }

                match self.resolve_item(item).await {
                    Ok(Some(track)) => self.append(track, &mut report).await,
                    Ok(None) => report.skipped += 1,
                    Err(e) => {
                        warn!("Skipping playlist item in guild {}: {}", self.guild_id, e);
                        report.skipped += 1;
                    }
                }
            }

            match page.next_page {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        if first {
            return Err(MusicError::NoMatch(format!("{} (empty playlist)", self.url)));
        }
        Ok(report)
    }

    async fn resolve_item(&self, item: PlaylistItem) -> ResolveResult<Option<Track>> {
        match item {
            PlaylistItem::Track(track) => Ok(Some(track)),
            PlaylistItem::Query(query) => {
                let found = self.resolver.search(&query).await?.into_iter().next();
                if found.is_none() {
                    debug!("No match for playlist item '{}'", query);
                }
                Ok(found)
            }
        }
    }

    async fn start_if_idle(&self, track: &Track) -> MusicResult<bool> {
        if self.controller.player_state(self.guild_id).await.is_playing() {
            return Ok(false);
        }
        self.controller.play_track(self.guild_id, track).await?;
        info!("Started '{}' from playlist in guild {}", track.title, self.guild_id);
        Ok(true)
    }

    async fn append(&self, track: Track, report: &mut IngestReport) {
        self.controller
            .session(self.guild_id)
            .lock()
            .await
            .push_queue(track);
        report.queued += 1;
        self.queued.store(report.queued, Ordering::Relaxed);
    }
}
