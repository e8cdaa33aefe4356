//! Integration tests for the expiry sweeper.

mod common;

use common::TestServer;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use txtpages_core::{NewPage, Timestamp};
use txtpages_server::metrics::SWEEP_FAILURES;
use txtpages_server::{ExpirySweeper, SweepOutcome};
use txtpages_store::{PageRepo, SEED_SLUG};

async fn stale_page(server: &TestServer, slug: &str) {
    let long_ago = Timestamp::parse("2020-01-01T00:00:00Z").unwrap();
    server
        .store()
        .create_page(
            &NewPage::new(slug, "body")
                .with_slug(slug)
                .with_timestamps(long_ago, long_ago),
        )
        .await
        .expect("Failed to create stale page");
}

#[tokio::test]
async fn test_run_once_purges_stale_pages() {
    let server = TestServer::new().await;
    stale_page(&server, "stale").await;

    let sweeper = ExpirySweeper::new(
        server.store(),
        Duration::from_secs(3600),
        time::Duration::days(180),
    );
    assert_eq!(
        sweeper.run_once().await,
        SweepOutcome::Completed { purged: 1 }
    );
    assert!(server.store().get_page_by_slug("stale").await.unwrap().is_none());
    assert!(server.store().get_page_by_slug(SEED_SLUG).await.unwrap().is_some());

    assert_eq!(
        sweeper.run_once().await,
        SweepOutcome::Completed { purged: 0 }
    );
}

#[tokio::test]
async fn test_read_page_survives_sweep() {
    let server = TestServer::new().await;
    stale_page(&server, "revived").await;
    assert_eq!(server.get("/revived").await.status, axum::http::StatusCode::OK);

    let sweeper = ExpirySweeper::new(
        server.store(),
        Duration::from_secs(3600),
        time::Duration::days(180),
    );
    assert_eq!(
        sweeper.run_once().await,
        SweepOutcome::Completed { purged: 0 }
    );
    assert!(server.store().get_page_by_slug("revived").await.unwrap().is_some());
}

#[tokio::test]
async fn test_spawned_sweeper_runs_on_startup_and_stops_on_cancel() {
    let server = TestServer::new().await;
    stale_page(&server, "stale").await;

    let shutdown = CancellationToken::new();
    let handle = ExpirySweeper::new(
        server.store(),
        Duration::from_millis(50),
        time::Duration::days(180),
    )
    .run_on_startup(true)
    .spawn(shutdown.clone());

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if server.store().get_page_by_slug("stale").await.unwrap().is_none() {
            break;
        }
        if tokio::time::Instant::now() > deadline {
            panic!("sweeper did not purge in time");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("sweeper did not stop")
        .expect("sweeper task panicked");
}

#[tokio::test]
async fn test_spawned_sweeper_waits_one_interval_by_default() {
    let server = TestServer::new().await;
    stale_page(&server, "stale").await;

    let shutdown = CancellationToken::new();
    let handle = ExpirySweeper::new(
        server.store(),
        Duration::from_secs(3600),
        time::Duration::days(180),
    )
    .spawn(shutdown.clone());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(server.store().get_page_by_slug("stale").await.unwrap().is_some());

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("sweeper did not stop")
        .expect("sweeper task panicked");
}

#[tokio::test]
async fn test_failed_purge_is_reported_and_counted() {
    let (server, flaky) = TestServer::flaky().await;
    stale_page(&server, "stale").await;
    flaky.set_fail_purge(true);

    let sweeper = ExpirySweeper::new(
        server.store(),
        Duration::from_secs(3600),
        time::Duration::days(180),
    );
    let failures_before = SWEEP_FAILURES.get();
    assert_eq!(sweeper.run_once().await, SweepOutcome::Failed);
    assert!(SWEEP_FAILURES.get() > failures_before);
    assert!(server.store().get_page_by_slug("stale").await.unwrap().is_some());

    flaky.set_fail_purge(false);
    assert_eq!(
        sweeper.run_once().await,
        SweepOutcome::Completed { purged: 1 }
    );
}

#[tokio::test]
async fn test_spawned_sweeper_keeps_running_after_failed_tick() {
    let (server, flaky) = TestServer::flaky().await;
    stale_page(&server, "stale").await;
    flaky.set_fail_purge(true);

    let shutdown = CancellationToken::new();
    let handle = ExpirySweeper::new(
        server.store(),
        Duration::from_millis(50),
        time::Duration::days(180),
    )
    .run_on_startup(true)
    .spawn(shutdown.clone());

    // Let several ticks fail before the store recovers.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(server.store().get_page_by_slug("stale").await.unwrap().is_some());
    assert!(!handle.is_finished());
    flaky.set_fail_purge(false);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while server.store().get_page_by_slug("stale").await.unwrap().is_some() {
        if tokio::time::Instant::now() > deadline {
            panic!("sweeper did not purge after the store recovered");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("sweeper did not stop")
        .expect("sweeper task panicked");
}
