use assert_matches::assert_matches;
use mockall::predicate::eq;
use pretty_assertions::assert_eq;
use tokio_test::assert_ok;

use crate::common::fixtures::track;
use crate::common::mocks::MockResolver;
use anakin::commands::music::audio_sources::resolve_query;
use anakin::commands::music::utils::music_manager::MusicError;

#[tokio::test]
async fn links_go_through_resolve_url() {
    let url = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
    let mut resolver = MockResolver::new();
    resolver
        .expect_resolve_url()
        .with(eq(url))
        .times(1)
        .returning(|_| Ok(Some(track("rick"))));
    resolver.expect_search().never();

    let found = assert_ok!(resolve_query(&resolver, url).await);
    assert_eq!(found.title, "rick");
}

#[tokio::test]
async fn text_takes_the_best_search_match() {
    let mut resolver = MockResolver::new();
    resolver
        .expect_search()
        .with(eq("daft punk"))
        .times(1)
        .returning(|_| Ok(vec![track("best"), track("worse")]));

    let found = assert_ok!(resolve_query(&resolver, "  daft punk ").await);
    assert_eq!(found.title, "best");
}

#[tokio::test]
async fn empty_results_become_no_match() {
    let mut resolver = MockResolver::new();
    resolver.expect_search().returning(|_| Ok(Vec::new()));

    assert_matches!(
        resolve_query(&resolver, "zzzz").await,
        Err(MusicError::NoMatch(query)) if query == "zzzz"
    );
}
