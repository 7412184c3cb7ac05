//! Ingestion pipeline tests.
//!
//! Cover refresh idempotence, deduplication under concurrent refreshes,
//! resumability after a mid-batch store failure, and the scheduler loop.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::{SubsecRound, Utc};
use tokio::sync::watch;

use common::{create_feed, entry_at, memory_db, FlakyPostStore, StubSource};
use feedhub::feed::{
    FeedRepository, FeedScheduler, IngestError, Ingestor, ParsedEntry, PostRepository,
    RefreshTrigger, TriggerError,
};
use feedhub::Database;

fn ingestor(source: &Arc<StubSource>, db: &Arc<Database>) -> Arc<Ingestor> {
    Arc::new(Ingestor::new(source.clone(), db.clone(), db.clone()))
}

async fn post_count(db: &Database) -> i64 {
    PostRepository::new(db.pool()).count().await.unwrap()
}

// ============================================================================
// Idempotence
// ============================================================================

#[tokio::test]
async fn test_refresh_twice_adds_nothing_new() {
    let db = memory_db().await;
    let feed = create_feed(&db, "https://a.example/feed").await;
    let source = Arc::new(StubSource::new());
    source.set(
        &feed.url,
        vec![
            entry_at("https://a.example/1", 1),
            entry_at("https://a.example/2", 2),
        ],
    );
    let ingestor = ingestor(&source, &db);

    let first = ingestor.refresh_feed(&feed).await.unwrap();
    assert_eq!(first.inserted, 2);

    let second = ingestor.refresh_feed(&feed).await.unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.already_present, 2);

    assert_eq!(post_count(&db).await, 2);
}

#[tokio::test]
async fn test_refresh_does_not_overwrite_existing_post() {
    let db = memory_db().await;
    let feed = create_feed(&db, "https://a.example/feed").await;
    let source = Arc::new(StubSource::new());
    let ingestor = ingestor(&source, &db);

    source.set(
        &feed.url,
        vec![ParsedEntry::new("Original", "https://a.example/1").with_content("v1")],
    );
    ingestor.refresh_feed(&feed).await.unwrap();

    source.set(
        &feed.url,
        vec![ParsedEntry::new("Edited", "https://a.example/1").with_content("v2")],
    );
    ingestor.refresh_feed(&feed).await.unwrap();

    let post = PostRepository::new(db.pool())
        .find_by_link("https://a.example/1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(post.title, "Original");
    assert_eq!(post.content, "v1");
}

#[tokio::test]
async fn test_large_feed_is_stored_in_full() {
    let db = memory_db().await;
    let feed = create_feed(&db, "https://big.example/feed").await;
    let source = Arc::new(StubSource::new());
    source.set(
        &feed.url,
        (0..150)
            .map(|i| entry_at(&format!("https://big.example/{}", i), i))
            .collect(),
    );
    let ingestor = ingestor(&source, &db);

    let first = ingestor.refresh_feed(&feed).await.unwrap();
    assert_eq!(first.seen, 150);
    assert_eq!(first.inserted, 150);

    let second = ingestor.refresh_feed(&feed).await.unwrap();
    assert_eq!(second.seen, 150);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.already_present, 150);

    assert_eq!(post_count(&db).await, 150);
    assert!(PostRepository::new(db.pool())
        .find_by_link("https://big.example/149")
        .await
        .unwrap()
        .is_some());
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refreshes_store_each_link_once() {
    let dir = tempfile::tempdir().unwrap();
    let db = Arc::new(
        Database::open(dir.path().join("feedhub.db"), 5)
            .await
            .unwrap(),
    );
    let feed_a = create_feed(&db, "https://a.example/feed").await;
    let feed_b = create_feed(&db, "https://b.example/feed").await;

    // Both feeds carry the same syndicated stories.
    let shared: Vec<ParsedEntry> = (0..20)
        .map(|i| entry_at(&format!("https://news.example/{}", i), i))
        .collect();
    let source = Arc::new(StubSource::new());
    source.set(&feed_a.url, shared.clone());
    source.set(&feed_b.url, shared);

    let ingestor = ingestor(&source, &db);
    let trigger = RefreshTrigger::new(db.clone(), ingestor.clone());

    let mut handles = Vec::new();
    for feed in [&feed_a, &feed_b, &feed_a, &feed_b] {
        let ingestor = ingestor.clone();
        let feed = feed.clone();
        handles.push(tokio::spawn(
            async move { ingestor.refresh_feed(&feed).await },
        ));
    }
    let manual = trigger.refresh_now(feed_a.id);

    let manual = manual.await.unwrap();
    let mut inserted = manual.inserted;
    for joined in futures::future::join_all(handles).await {
        let summary = joined.unwrap().unwrap();
        assert_eq!(summary.inserted + summary.already_present, 20);
        inserted += summary.inserted;
    }

    // Exactly one refresh won each link.
    assert_eq!(inserted, 20);
    assert_eq!(post_count(&db).await, 20);
}

// ============================================================================
// Partial failure and resumability
// ============================================================================

#[tokio::test]
async fn test_store_failure_mid_batch_is_resumable() {
    let db = memory_db().await;
    let feed = create_feed(&db, "https://a.example/feed").await;
    let source = Arc::new(StubSource::new());
    source.set(
        &feed.url,
        (0..5)
            .map(|i| entry_at(&format!("https://a.example/{}", i), i))
            .collect(),
    );

    let flaky = Arc::new(FlakyPostStore::new(db.clone(), 2));
    let failing = Ingestor::new(source.clone(), db.clone(), flaky);

    let result = failing.refresh_feed(&feed).await;
    assert!(matches!(result, Err(IngestError::StoreFailure(_))));

    // Committed entries remain and the feed is not marked fresh.
    assert_eq!(post_count(&db).await, 2);
    let stored = FeedRepository::new(db.pool())
        .get_by_id(feed.id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.last_fetched_at.is_none());

    // The next refresh picks up the rest without duplicating.
    let summary = ingestor(&source, &db).refresh_feed(&feed).await.unwrap();
    assert_eq!(summary.inserted, 3);
    assert_eq!(summary.already_present, 2);
    assert_eq!(post_count(&db).await, 5);

    let stored = FeedRepository::new(db.pool())
        .get_by_id(feed.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.last_fetched_at, Some(summary.fetched_at));
}

#[tokio::test]
async fn test_source_failure_changes_nothing() {
    let db = memory_db().await;
    let feed = create_feed(&db, "https://down.example/feed").await;
    let source = Arc::new(StubSource::new());
    source.fail(&feed.url);

    let result = ingestor(&source, &db).refresh_feed(&feed).await;
    assert!(matches!(result, Err(IngestError::SourceUnavailable(_))));

    assert_eq!(post_count(&db).await, 0);
    let stored = FeedRepository::new(db.pool())
        .get_by_id(feed.id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.last_fetched_at.is_none());
}

// ============================================================================
// Timestamps
// ============================================================================

#[tokio::test]
async fn test_last_fetched_falls_within_refresh_window() {
    let db = memory_db().await;
    let feed = create_feed(&db, "https://a.example/feed").await;
    let source = Arc::new(StubSource::new());
    source.set(&feed.url, vec![entry_at("https://a.example/1", 0)]);

    let before = Utc::now().trunc_subsecs(6);
    ingestor(&source, &db).refresh_feed(&feed).await.unwrap();
    let after = Utc::now();

    let stored = FeedRepository::new(db.pool())
        .get_by_id(feed.id)
        .await
        .unwrap()
        .unwrap();
    let fetched = stored.last_fetched_at.unwrap();
    assert!(fetched >= before);
    assert!(fetched <= after);
}

#[tokio::test]
async fn test_three_entries_one_without_date() {
    let db = memory_db().await;
    let feed = create_feed(&db, "https://a.example/feed").await;
    let source = Arc::new(StubSource::new());
    source.set(
        &feed.url,
        vec![
            entry_at("https://a.example/1", 10),
            ParsedEntry::new("Undated", "https://a.example/2"),
            entry_at("https://a.example/3", 20),
        ],
    );
    let ingestor = ingestor(&source, &db);

    let before = Utc::now().trunc_subsecs(6);
    let summary = ingestor.refresh_feed(&feed).await.unwrap();
    let after = Utc::now();
    assert_eq!(summary.inserted, 3);

    let undated = PostRepository::new(db.pool())
        .find_by_link("https://a.example/2")
        .await
        .unwrap()
        .unwrap();
    assert!(undated.published_at >= before);
    assert!(undated.published_at <= after);

    let again = ingestor.refresh_feed(&feed).await.unwrap();
    assert_eq!(again.inserted, 0);
    assert_eq!(post_count(&db).await, 3);
}

// ============================================================================
// On-demand trigger
// ============================================================================

#[tokio::test]
async fn test_trigger_unknown_feed() {
    let db = memory_db().await;
    let source = Arc::new(StubSource::new());
    let trigger = RefreshTrigger::new(db.clone(), ingestor(&source, &db));

    let result = trigger.refresh_now(12345).await;
    assert!(matches!(result, Err(TriggerError::NotFound(12345))));
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_trigger_reports_source_failure() {
    let db = memory_db().await;
    let feed = create_feed(&db, "https://down.example/feed").await;
    let source = Arc::new(StubSource::new());
    source.fail(&feed.url);
    let trigger = RefreshTrigger::new(db.clone(), ingestor(&source, &db));

    let result = trigger.refresh_now(feed.id).await;
    assert!(matches!(
        result,
        Err(TriggerError::Ingest(IngestError::SourceUnavailable(_)))
    ));
}

// ============================================================================
// Scheduler
// ============================================================================

#[tokio::test]
async fn test_tick_continues_past_failing_feed() {
    let db = memory_db().await;
    let down = create_feed(&db, "https://down.example/feed").await;
    let up = create_feed(&db, "https://up.example/feed").await;
    let source = Arc::new(StubSource::new());
    source.fail(&down.url);
    source.set(&up.url, vec![entry_at("https://up.example/1", 0)]);

    let scheduler = FeedScheduler::new(db.clone(), ingestor(&source, &db));
    let report = scheduler.run_tick().await.unwrap();

    assert_eq!(report.feeds, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.refreshed, 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(post_count(&db).await, 1);
}

#[tokio::test]
async fn test_scheduler_loop_refreshes_until_shutdown() {
    let db = memory_db().await;
    let feed = create_feed(&db, "https://a.example/feed").await;
    let source = Arc::new(StubSource::new());
    source.set(&feed.url, vec![entry_at("https://a.example/1", 0)]);

    let (tx, rx) = watch::channel(false);
    let handle = FeedScheduler::new(db.clone(), ingestor(&source, &db))
        .with_interval(Duration::from_millis(20))
        .spawn(rx);

    tokio::time::timeout(Duration::from_secs(5), async {
        while source.calls() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("scheduler did not tick");

    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler did not stop")
        .unwrap();

    // Repeated ticks never duplicate.
    assert_eq!(post_count(&db).await, 1);
}
