use assert_matches::assert_matches;
use poise::serenity_prelude::{ChannelId, GuildId};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Arc;

use crate::common::fixtures::{SAMPLE_PLAYLIST_URL, channel, guild, query_page, track};
use crate::common::mocks::{EngineCall, MockResolver, ScriptedResolver};
use crate::common::{Harness, harness, wait_until};
use anakin::commands::music::audio_sources::{PlaylistItem, PlaylistPage};
use anakin::commands::music::utils::audio_engine::EngineError;
use anakin::commands::music::utils::loop_state::LoopState;
use anakin::commands::music::utils::music_manager::MusicError;
use anakin::commands::music::utils::playback::PlaybackOutcome;
use anakin::commands::music::utils::session::ShuffleOutcome;

async fn wait_for_queue(harness: &Harness, guild: GuildId, len: usize) {
    let controller = harness.controller.clone();
    wait_until(|| {
        let controller = controller.clone();
        async move { controller.session(guild).lock().await.queue_len() == len }
    })
    .await;
}

async fn is_loading(harness: &Harness, guild: GuildId) -> bool {
    harness.controller.session(guild).lock().await.is_loading()
}

#[rstest]
#[tokio::test]
async fn two_pages_start_the_first_track_and_queue_the_rest(
    harness: Harness,
    guild: GuildId,
    channel: ChannelId,
) {
    let resolver = Arc::new(ScriptedResolver::new(vec![
        query_page("first", 100),
        query_page("second", 5),
    ]));
    let ingestor = harness.ingestor(resolver.clone());

    let handle = ingestor.ingest(guild, channel, SAMPLE_PLAYLIST_URL).await.unwrap();
    let report = handle.await.unwrap().unwrap();

    assert_eq!(report.started, Some(track("first-0")));
    assert_eq!(report.queued, 104);
    assert_eq!(report.skipped, 0);
    assert!(!report.shuffled);
    assert_eq!(resolver.searches(), 105);

    let queue = harness.queue_titles(guild).await;
    assert_eq!(queue.len(), 104);
    assert_eq!(queue.first().map(String::as_str), Some("first-1"));
    assert_eq!(queue.last().map(String::as_str), Some("second-4"));
    assert_eq!(
        harness.engine.calls(guild),
        vec![EngineCall::Connect(channel), EngineCall::Play("first-0".to_string())]
    );
    assert!(!is_loading(&harness, guild).await);
    assert!(ingestor.status(guild).is_none());
}

#[rstest]
#[tokio::test]
async fn unresolvable_first_item_fails_without_adding_anything(
    harness: Harness,
    guild: GuildId,
    channel: ChannelId,
) {
    let resolver = ScriptedResolver::new(vec![vec![
        PlaylistItem::Query("gone".to_string()),
        PlaylistItem::Query("fine".to_string()),
    ]])
    .with_miss("gone");
    let ingestor = harness.ingestor(Arc::new(resolver));

    let handle = ingestor.ingest(guild, channel, SAMPLE_PLAYLIST_URL).await.unwrap();

    assert_matches!(handle.await.unwrap(), Err(MusicError::NoMatch(_)));
    assert!(harness.queue_titles(guild).await.is_empty());
    assert!(harness.engine.played(guild).is_empty());
    assert!(!is_loading(&harness, guild).await);
}

#[rstest]
#[tokio::test]
async fn later_misses_are_skipped(harness: Harness, guild: GuildId, channel: ChannelId) {
    let resolver = ScriptedResolver::new(vec![vec![
        PlaylistItem::Query("a".to_string()),
        PlaylistItem::Query("deleted".to_string()),
        PlaylistItem::Track(track("b")),
    ]])
    .with_miss("deleted");
    let ingestor = harness.ingestor(Arc::new(resolver));

    let report = ingestor
        .ingest(guild, channel, SAMPLE_PLAYLIST_URL)
        .await
        .unwrap()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.queued, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(harness.queue_titles(guild).await, vec!["b"]);
}

#[rstest]
#[tokio::test]
async fn empty_playlist_is_a_miss(harness: Harness, guild: GuildId, channel: ChannelId) {
    let ingestor = harness.ingestor(Arc::new(ScriptedResolver::new(vec![Vec::new()])));

    let handle = ingestor.ingest(guild, channel, SAMPLE_PLAYLIST_URL).await.unwrap();

    assert_matches!(handle.await.unwrap(), Err(MusicError::NoMatch(_)));
    assert!(!is_loading(&harness, guild).await);
}

#[rstest]
#[tokio::test]
async fn busy_guild_gets_the_whole_playlist_queued(
    harness: Harness,
    guild: GuildId,
    channel: ChannelId,
) {
    harness
        .controller
        .play_or_enqueue(guild, channel, track("now"), LoopState::NoLoop)
        .await
        .unwrap();
    let ingestor = harness.ingestor(Arc::new(ScriptedResolver::new(vec![query_page("p", 3)])));

    let report = ingestor
        .ingest(guild, channel, SAMPLE_PLAYLIST_URL)
        .await
        .unwrap()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.started, None);
    assert_eq!(report.queued, 3);
    assert_eq!(harness.queue_titles(guild).await, vec!["p-0", "p-1", "p-2"]);
    assert_eq!(harness.engine.current(guild), Some(track("now")));
}

#[rstest]
#[tokio::test]
async fn invalid_url_is_rejected_before_anything_happens(
    harness: Harness,
    guild: GuildId,
    channel: ChannelId,
) {
    let ingestor = harness.ingestor(Arc::new(ScriptedResolver::default()));

    let result = ingestor
        .ingest(guild, channel, "https://example.com/not-a-playlist")
        .await;

    assert_matches!(result, Err(MusicError::InvalidPlaylistUrl(_)));
    assert!(harness.engine.calls(guild).is_empty());
    assert!(!is_loading(&harness, guild).await);
}

#[rstest]
#[tokio::test]
async fn failed_join_drops_loading_and_deferred_shuffle(
    harness: Harness,
    guild: GuildId,
    channel: ChannelId,
) {
    let ingestor = Arc::new(harness.ingestor(Arc::new(ScriptedResolver::new(vec![query_page(
        "p", 2,
    )]))));
    harness.engine.fail_next_connects(true);
    let gate = harness.engine.hold_connect();

    let task = tokio::spawn({
        let ingestor = ingestor.clone();
        async move { ingestor.ingest(guild, channel, SAMPLE_PLAYLIST_URL).await.map(|_| ()) }
    });
    wait_until(|| is_loading(&harness, guild)).await;
    assert_eq!(harness.controller.shuffle(guild).await, ShuffleOutcome::Deferred);

    gate.notify_one();
    assert_matches!(
        task.await.unwrap(),
        Err(MusicError::Engine(EngineError::Connect(_)))
    );
    {
        let session = harness.controller.session(guild);
        let session = session.lock().await;
        assert!(!session.is_loading());
        assert!(!session.pending_shuffle());
    }
    assert!(harness.queue_titles(guild).await.is_empty());

    // The next load starts from a clean slate.
    harness.engine.fail_next_connects(false);
    let report = ingestor
        .ingest(guild, channel, SAMPLE_PLAYLIST_URL)
        .await
        .unwrap()
        .await
        .unwrap()
        .unwrap();
    assert!(!report.shuffled);
}

#[rstest]
#[tokio::test]
async fn second_ingestion_is_refused_while_loading(
    harness: Harness,
    guild: GuildId,
    channel: ChannelId,
) {
    let (resolver, gate) = ScriptedResolver::new(vec![query_page("p", 2)]).hold_page(0);
    let ingestor = harness.ingestor(Arc::new(resolver));

    let handle = ingestor.ingest(guild, channel, SAMPLE_PLAYLIST_URL).await.unwrap();
    assert_matches!(
        ingestor.ingest(guild, channel, SAMPLE_PLAYLIST_URL).await,
        Err(MusicError::AlreadyLoading)
    );

    gate.notify_one();
    assert!(handle.await.unwrap().is_ok());
    assert!(ingestor.ingest(guild, channel, SAMPLE_PLAYLIST_URL).await.is_ok());
}

#[rstest]
#[tokio::test]
async fn tracks_are_playable_while_loading_and_shuffle_waits(
    harness: Harness,
    guild: GuildId,
    channel: ChannelId,
) {
    let (resolver, gate) =
        ScriptedResolver::new(vec![query_page("first", 100), query_page("second", 5)])
            .hold_page(1);
    let ingestor = harness.ingestor(Arc::new(resolver));

    let handle = ingestor.ingest(guild, channel, SAMPLE_PLAYLIST_URL).await.unwrap();
    wait_for_queue(&harness, guild, 99).await;

    let status = ingestor.status(guild).unwrap();
    assert_eq!(status.queued, 99);
    assert_eq!(status.source, SAMPLE_PLAYLIST_URL);
    assert!(is_loading(&harness, guild).await);

    let before = harness.queue_titles(guild).await;
    assert_eq!(harness.controller.shuffle(guild).await, ShuffleOutcome::Deferred);
    assert_eq!(harness.queue_titles(guild).await, before);

    // The queue can already be used while the rest is loading.
    assert_eq!(
        harness.controller.skip_to_next(guild, channel).await.unwrap(),
        PlaybackOutcome::Advanced(track("first-1"))
    );

    gate.notify_one();
    let report = handle.await.unwrap().unwrap();
    assert!(report.shuffled);
    assert_eq!(report.queued, 104);

    let mut after = harness.queue_titles(guild).await;
    let mut expected: Vec<String> = (2..100)
        .map(|i| format!("first-{}", i))
        .chain((0..5).map(|i| format!("second-{}", i)))
        .collect();
    after.sort();
    expected.sort();
    assert_eq!(after, expected);

    let session = harness.controller.session(guild);
    let session = session.lock().await;
    assert!(!session.pending_shuffle());
    assert!(!session.is_loading());
}

#[rstest]
#[tokio::test]
async fn stop_does_not_interrupt_loading(harness: Harness, guild: GuildId, channel: ChannelId) {
    let (resolver, gate) =
        ScriptedResolver::new(vec![query_page("first", 10), query_page("second", 10)])
            .hold_page(1);
    let ingestor = harness.ingestor(Arc::new(resolver));

    let handle = ingestor.ingest(guild, channel, SAMPLE_PLAYLIST_URL).await.unwrap();
    wait_for_queue(&harness, guild, 9).await;
    assert_eq!(
        harness.controller.stop(guild).await.unwrap(),
        PlaybackOutcome::Stopped
    );

    gate.notify_one();
    let report = handle.await.unwrap().unwrap();

    assert_eq!(report.queued, 19);
    assert_eq!(harness.queue_titles(guild).await.len(), 19);
    assert!(harness.engine.current(guild).is_none());
}

#[rstest]
#[tokio::test]
async fn cancel_keeps_what_was_queued(harness: Harness, guild: GuildId, channel: ChannelId) {
    let (resolver, _gate) =
        ScriptedResolver::new(vec![query_page("first", 10), query_page("second", 10)])
            .hold_page(1);
    let ingestor = harness.ingestor(Arc::new(resolver));

    let handle = ingestor.ingest(guild, channel, SAMPLE_PLAYLIST_URL).await.unwrap();
    wait_for_queue(&harness, guild, 9).await;
    harness.controller.shuffle(guild).await;

    assert!(ingestor.cancel(guild).await);
    assert!(handle.await.is_err());
    assert!(!ingestor.cancel(guild).await);

    let session = harness.controller.session(guild);
    let session = session.lock().await;
    assert!(!session.is_loading());
    assert!(!session.pending_shuffle());
    assert_eq!(session.queue_len(), 9);
}

#[rstest]
#[tokio::test]
async fn provider_failure_on_the_first_page_is_reported(
    harness: Harness,
    guild: GuildId,
    channel: ChannelId,
) {
    let mut resolver = MockResolver::new();
    resolver
        .expect_resolve_playlist()
        .withf(|_, page| page.is_none())
        .times(1)
        .returning(|_, _| {
            Err(MusicError::ExternalApiError(
                "429 Too Many Requests".to_string(),
            ))
        });
    resolver.expect_search().never();
    let ingestor = harness.ingestor(Arc::new(resolver));

    let handle = ingestor.ingest(guild, channel, SAMPLE_PLAYLIST_URL).await.unwrap();

    assert_matches!(handle.await.unwrap(), Err(MusicError::ExternalApiError(_)));
    assert!(!is_loading(&harness, guild).await);
}

#[rstest]
#[tokio::test]
async fn provider_failure_on_a_later_page_keeps_the_tracks(
    harness: Harness,
    guild: GuildId,
    channel: ChannelId,
) {
    let mut resolver = MockResolver::new();
    resolver
        .expect_resolve_playlist()
        .withf(|_, page| page.is_none())
        .times(1)
        .returning(|_, _| {
            Ok(PlaylistPage {
                items: vec![
                    PlaylistItem::Track(track("a")),
                    PlaylistItem::Track(track("b")),
                ],
                next_page: Some("offset=100".to_string()),
            })
        });
    resolver
        .expect_resolve_playlist()
        .withf(|_, page| page.as_deref() == Some("offset=100"))
        .times(1)
        .returning(|_, _| Err(MusicError::ExternalApiError("502 Bad Gateway".to_string())));
    let ingestor = harness.ingestor(Arc::new(resolver));

    let report = ingestor
        .ingest(guild, channel, SAMPLE_PLAYLIST_URL)
        .await
        .unwrap()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.started, Some(track("a")));
    assert_eq!(report.queued, 1);
    assert_eq!(harness.queue_titles(guild).await, vec!["b"]);
}
