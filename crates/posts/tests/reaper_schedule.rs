//! Background reaper scheduling, driven by paused Tokio time.
#![allow(clippy::expect_used, clippy::panic)]

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use postpigeon_posts::Reaper;
use postpigeon_storage::{
    MemoryPostStore, PostStore, StorageError,
    testutil::{FailingStore, StoreOp, make_new_post},
};

const INTERVAL: Duration = Duration::from_secs(300);

async fn seed_expired(store: &MemoryPostStore, count: usize) {
    let past = Utc::now() - chrono::Duration::seconds(1);
    for i in 0..count {
        store
            .create_post(&make_new_post("alice", &format!("expired-{i}"), "x", Some(past)))
            .await
            .expect("seed");
    }
}

#[tokio::test(start_paused = true)]
async fn first_sweep_waits_a_full_interval() {
    let store = MemoryPostStore::new();
    seed_expired(&store, 2).await;

    let handle = Reaper::new(Arc::new(store.clone()), INTERVAL).spawn();

    tokio::time::sleep(INTERVAL - Duration::from_secs(1)).await;
    assert_eq!(handle.sweeps(), 0);
    assert_eq!(store.len(), 2);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(handle.sweeps(), 1);
    assert_eq!(handle.posts_reaped(), 2);
    assert!(store.is_empty());

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn sweeps_repeat_every_interval() {
    let store = MemoryPostStore::new();
    store.create_post(&make_new_post("alice", "keeper", "x", None)).await.expect("seed");

    let handle = Reaper::new(Arc::new(store.clone()), INTERVAL).spawn();
    // Observe one second after each tick.
    tokio::time::sleep(Duration::from_secs(1)).await;
    for round in 1..=3 {
        seed_expired(&store, 1).await;
        tokio::time::sleep(INTERVAL).await;
        assert_eq!(handle.sweeps(), round);
        assert_eq!(handle.posts_reaped(), round);
    }

    assert_eq!(store.len(), 1, "unexpired post must survive every sweep");
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failed_sweeps_do_not_stop_the_reaper() {
    let store = FailingStore::new();
    seed_expired(store.inner(), 1).await;
    store.fail_on(StoreOp::DeleteExpired, StorageError::unavailable("store unreachable"));

    let handle = Reaper::new(Arc::new(store.clone()), INTERVAL).spawn();
    tokio::time::sleep(INTERVAL * 3 + Duration::from_secs(1)).await;

    assert_eq!(handle.failed_sweeps(), 3);
    assert_eq!(handle.sweeps(), 0);
    assert!(!handle.is_finished());

    store.clear_failures();
    tokio::time::sleep(INTERVAL).await;

    assert_eq!(handle.sweeps(), 1);
    assert_eq!(handle.posts_reaped(), 1);
    assert!(store.inner().is_empty());
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn cancel_token_stops_the_task() {
    let store = MemoryPostStore::new();
    let handle = Reaper::new(Arc::new(store.clone()), INTERVAL).spawn();

    handle.cancel_token().cancel();
    tokio::time::sleep(INTERVAL * 2).await;
    assert_eq!(handle.sweeps(), 0);

    handle.shutdown().await;
    assert!(handle.is_finished());
}
