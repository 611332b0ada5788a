//! Common test utilities, fixtures, and mocks
//! This module contains shared functionality used across different test categories

pub mod fixtures;

use poise::serenity_prelude::GuildId;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anakin::commands::music::audio_sources::TrackResolver;
use anakin::commands::music::utils::event_handlers::EventDispatcher;
use anakin::commands::music::utils::playback::PlaybackController;
use anakin::commands::music::utils::playlist_ingestor::PlaylistIngestor;
use anakin::commands::music::utils::session::TrackEndAction;
use mocks::FakeEngine;

/// A controller and a dispatcher wired to one `FakeEngine`.
pub struct Harness {
    pub engine: Arc<FakeEngine>,
    pub controller: Arc<PlaybackController>,
    pub dispatcher: EventDispatcher,
}

impl Harness {
    pub fn new() -> Self {
        crate::test_utils::init();
        let engine = FakeEngine::new();
        let controller = Arc::new(PlaybackController::new(engine.clone()));
        let dispatcher = EventDispatcher::new(controller.clone());
        Self {
            engine,
            controller,
            dispatcher,
        }
    }

    pub fn ingestor(&self, resolver: Arc<dyn TrackResolver>) -> PlaylistIngestor {
        PlaylistIngestor::new(self.controller.clone(), resolver)
    }

    /// Dispatches every pending engine notification, including the ones emitted while handling
    /// them, and returns the end-of-track decisions in order.
    pub async fn drain(&self) -> Vec<TrackEndAction> {
        let mut actions = Vec::new();
        loop {
            let events = self.engine.take_events();
            if events.is_empty() {
                return actions;
            }
            for event in events {
                if let Some(action) = self.dispatcher.dispatch(event).await {
                    actions.push(action);
                }
            }
        }
    }

    /// Lets the current track end on its own and dispatches the notification.
    pub async fn finish_track(&self, guild_id: GuildId) -> Option<TrackEndAction> {
        self.drain().await;
        let event = self.engine.finish_current(guild_id)?;
        let action = self.dispatcher.dispatch(event).await;
        self.drain().await;
        action
    }

    pub async fn queue_titles(&self, guild_id: GuildId) -> Vec<String> {
        let snapshot = self.controller.session(guild_id).lock().await.snapshot();
        fixtures::titles(&snapshot.queue)
    }

    pub async fn history_titles(&self, guild_id: GuildId) -> Vec<String> {
        let snapshot = self.controller.session(guild_id).lock().await.snapshot();
        fixtures::titles(&snapshot.history)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

#[rstest::fixture]
pub fn harness() -> Harness {
    Harness::new()
}

/// Polls `condition` until it holds, failing the test after five seconds.
pub async fn wait_until<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition().await {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
