//! Concurrent access tests for `MemoryPostStore`.
//!
//! These exercise the store under multi-task workloads to detect lost
//! inserts and check that racing creates of one identifier have exactly one
//! winner.

#![allow(clippy::expect_used, clippy::panic)]

use chrono::{Duration, Utc};
use postpigeon_storage::{
    Fingerprint, MemoryPostStore, NewPost, Post, PostContent, PostId, PostStore, RenderedBody,
    StorageError,
};
use tokio::task::JoinSet;
use uuid::Uuid;

/// Number of concurrent tasks.
const CONCURRENCY: usize = 16;

/// Number of posts each task creates in the mixed workload.
const POSTS_PER_TASK: usize = 50;

fn new_post(author: &str, title: &str, expires_in: Option<Duration>) -> NewPost {
    let id = PostId::from_uuid(Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        format!("{author}/{title}").as_bytes(),
    ));
    NewPost {
        post: Post {
            id,
            public_key: format!("key-{author}"),
            fingerprint: Fingerprint::new(format!("fp-{author}")),
            created_at: Utc::now(),
            expires_at: expires_in.map(|d| Utc::now() + d),
        },
        content: PostContent {
            post_id: id,
            title: title.to_owned(),
            raw_body: "body".to_owned(),
            rendered: RenderedBody::inline("<p>body</p>"),
        },
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_creates_have_one_winner() {
    let store = MemoryPostStore::new();

    let mut set = JoinSet::new();
    for task_id in 0..CONCURRENCY {
        let store = store.clone();
        set.spawn(async move {
            let mut post = new_post("alice", "same title", None);
            post.content.raw_body = format!("attempt {task_id}");
            store.create_post(&post).await
        });
    }

    let mut winners = 0;
    let mut conflicts = 0;
    while let Some(result) = set.join_next().await {
        match result.expect("task panicked") {
            Ok(_) => winners += 1,
            Err(StorageError::Conflict) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(conflicts, CONCURRENCY - 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_authors_lose_nothing() {
    let store = MemoryPostStore::new();

    let mut set = JoinSet::new();
    for task_id in 0..CONCURRENCY {
        let store = store.clone();
        set.spawn(async move {
            let author = format!("author-{task_id}");
            for i in 0..POSTS_PER_TASK {
                let post = new_post(&author, &format!("post-{i}"), None);
                store.create_post(&post).await.expect("create should succeed");
            }
        });
    }
    while let Some(result) = set.join_next().await {
        result.expect("task panicked");
    }

    assert_eq!(store.len(), CONCURRENCY * POSTS_PER_TASK);
    for task_id in 0..CONCURRENCY {
        let fp = Fingerprint::new(format!("fp-author-{task_id}"));
        let listed = store.list_posts_by_fingerprint(&fp).await.expect("list");
        assert_eq!(listed.len(), POSTS_PER_TASK);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sweep_concurrent_with_creates_only_removes_expired() {
    let store = MemoryPostStore::new();
    for i in 0..POSTS_PER_TASK {
        let expired = new_post("old", &format!("expired-{i}"), Some(Duration::seconds(-1)));
        store.create_post(&expired).await.expect("seed");
    }

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            for i in 0..POSTS_PER_TASK {
                let post = new_post("new", &format!("live-{i}"), Some(Duration::hours(1)));
                store.create_post(&post).await.expect("create should succeed");
            }
        })
    };
    let sweeper = {
        let store = store.clone();
        tokio::spawn(async move { store.delete_expired(Utc::now()).await.expect("sweep").len() })
    };

    writer.await.expect("writer panicked");
    let reaped = sweeper.await.expect("sweeper panicked");

    assert_eq!(reaped, POSTS_PER_TASK);
    let live = store.list_posts_by_fingerprint(&Fingerprint::new("fp-new")).await.expect("list");
    assert_eq!(live.len(), POSTS_PER_TASK);
}
