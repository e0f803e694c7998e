//! Shared test utilities for post store testing.
//!
//! This module provides helpers for building post records, a
//! failure-injecting [`PostStore`] wrapper, and assertions on
//! [`StorageResult`] values. It is feature-gated behind `testutil` to prevent
//! leaking into production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! postpigeon-storage = { path = "../storage", features = ["testutil"] }
//! ```
//!
//! Then import helpers:
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use postpigeon_storage::testutil::{FailingStore, make_new_post};
//! ```

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::{
    backend::PostStore,
    error::{StorageError, StorageResult},
    memory::MemoryPostStore,
    types::{Fingerprint, NewPost, Post, PostContent, PostId, PostSummary, RenderedBody},
};

/// Deterministic identifier for a test post.
///
/// Unrelated to the production identifier scheme; only stable per
/// `(author, title)`.
#[must_use]
pub fn make_post_id(author: &str, title: &str) -> PostId {
    PostId::from_uuid(Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{author}/{title}").as_bytes()))
}

/// Fingerprint used for every post created by `author` in these helpers.
#[must_use]
pub fn make_fingerprint(author: &str) -> Fingerprint {
    Fingerprint::new(format!("fp-{author}"))
}

/// Builds a post and its content with inline HTML equal to `<p>{body}</p>`.
#[must_use]
pub fn make_new_post(
    author: &str,
    title: &str,
    body: &str,
    expires_at: Option<DateTime<Utc>>,
) -> NewPost {
    let id = make_post_id(author, title);
    NewPost {
        post: Post {
            id,
            public_key: format!("key-{author}"),
            fingerprint: make_fingerprint(author),
            created_at: Utc::now(),
            expires_at,
        },
        content: PostContent {
            post_id: id,
            title: title.to_owned(),
            raw_body: body.to_owned(),
            rendered: RenderedBody::inline(format!("<p>{body}</p>")),
        },
    }
}

/// Creates a [`MemoryPostStore`] holding `count` posts by `author`.
///
/// Titles are `"post-000"`, `"post-001"`, ... and no post expires.
///
/// # Panics
///
/// Panics if any insert fails (should not happen with `MemoryPostStore`).
pub async fn populated_store(author: &str, count: usize) -> MemoryPostStore {
    let store = MemoryPostStore::new();
    for i in 0..count {
        let new_post = make_new_post(author, &format!("post-{i:03}"), "body", None);
        store.create_post(&new_post).await.expect("populate create failed");
    }
    store
}

/// Operations of [`PostStore`] that [`FailingStore`] can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// [`PostStore::create_post`].
    Create,
    /// [`PostStore::get_post`].
    GetPost,
    /// [`PostStore::get_post_content`].
    GetContent,
    /// [`PostStore::delete_post`].
    Delete,
    /// [`PostStore::list_posts_by_fingerprint`].
    List,
    /// [`PostStore::delete_expired`].
    DeleteExpired,
}

/// A [`PostStore`] that delegates to a [`MemoryPostStore`] unless told to fail.
///
/// Failures are sticky until [`clear_failures`](Self::clear_failures) is
/// called. Every call is counted, failed or not.
#[derive(Debug, Default, Clone)]
pub struct FailingStore {
    inner: MemoryPostStore,
    failures: Arc<Mutex<HashMap<StoreOp, StorageError>>>,
    calls: Arc<Mutex<HashMap<StoreOp, usize>>>,
}

impl FailingStore {
    /// Wraps a fresh, empty [`MemoryPostStore`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing store.
    #[must_use]
    pub fn wrapping(inner: MemoryPostStore) -> Self {
        Self { inner, ..Self::default() }
    }

    /// Makes every subsequent call of `op` return `error`.
    pub fn fail_on(&self, op: StoreOp, error: StorageError) {
        self.failures.lock().insert(op, error);
    }

    /// Removes every configured failure.
    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    /// Number of times `op` has been called.
    #[must_use]
    pub fn calls(&self, op: StoreOp) -> usize {
        self.calls.lock().get(&op).copied().unwrap_or(0)
    }

    /// The wrapped store.
    #[must_use]
    pub fn inner(&self) -> &MemoryPostStore {
        &self.inner
    }

    fn check(&self, op: StoreOp) -> StorageResult<()> {
        *self.calls.lock().entry(op).or_insert(0) += 1;
        match self.failures.lock().get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PostStore for FailingStore {
    async fn create_post(&self, new_post: &NewPost) -> StorageResult<Option<RenderedBody>> {
        self.check(StoreOp::Create)?;
        self.inner.create_post(new_post).await
    }

    async fn get_post(&self, id: PostId) -> StorageResult<Option<Post>> {
        self.check(StoreOp::GetPost)?;
        self.inner.get_post(id).await
    }

    async fn get_post_content(&self, id: PostId) -> StorageResult<Option<PostContent>> {
        self.check(StoreOp::GetContent)?;
        self.inner.get_post_content(id).await
    }

    async fn delete_post(&self, id: PostId) -> StorageResult<bool> {
        self.check(StoreOp::Delete)?;
        self.inner.delete_post(id).await
    }

    async fn list_posts_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> StorageResult<Vec<PostSummary>> {
        self.check(StoreOp::List)?;
        self.inner.list_posts_by_fingerprint(fingerprint).await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> StorageResult<Vec<RenderedBody>> {
        self.check(StoreOp::DeleteExpired)?;
        self.inner.delete_expired(now).await
    }
}

/// Assert that a [`StorageResult`] is a [`StorageError::Conflict`].
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use postpigeon_storage::assert_conflict;
/// use postpigeon_storage::error::{StorageError, StorageResult};
///
/// let result: StorageResult<()> = Err(StorageError::Conflict);
/// assert_conflict!(result);
/// ```
#[macro_export]
macro_rules! assert_conflict {
    ($result:expr) => {
        assert!(
            matches!($result, Err($crate::error::StorageError::Conflict)),
            "expected StorageError::Conflict, got: {:?}",
            $result,
        );
    };
    ($result:expr, $msg:expr) => {
        assert!(
            matches!($result, Err($crate::error::StorageError::Conflict)),
            "{}: expected StorageError::Conflict, got: {:?}",
            $msg,
            $result,
        );
    };
}

/// Assert that a [`StorageResult`] is `Ok`.
///
/// Returns the inner value on success, panics with a descriptive message
/// on failure.
#[macro_export]
macro_rules! assert_storage_ok {
    ($result:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => panic!("expected Ok, got StorageError: {e:?}"),
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => panic!("{}: expected Ok, got StorageError: {e:?}", $msg),
        }
    };
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_make_post_id_is_stable_per_author_and_title() {
        assert_eq!(make_post_id("a", "t"), make_post_id("a", "t"));
        assert_ne!(make_post_id("a", "t"), make_post_id("a", "u"));
        assert_ne!(make_post_id("a", "t"), make_post_id("b", "t"));
    }

    #[test]
    fn test_make_new_post_links_records() {
        let new_post = make_new_post("a", "t", "b", None);
        assert_eq!(new_post.post.id, new_post.content.post_id);
        assert_eq!(new_post.content.rendered.as_inline(), Some("<p>b</p>"));
    }

    #[tokio::test]
    async fn test_populated_store() {
        let store = populated_store("alice", 5).await;
        assert_eq!(store.len(), 5);
        let listed = store.list_posts_by_fingerprint(&make_fingerprint("alice")).await;
        assert_eq!(assert_storage_ok!(listed).len(), 5);
    }

    #[tokio::test]
    async fn test_failing_store_fails_then_recovers() {
        let store = FailingStore::new();
        let new_post = make_new_post("a", "t", "b", None);

        store.fail_on(StoreOp::Create, StorageError::Conflict);
        assert_conflict!(store.create_post(&new_post).await);
        assert!(store.inner().is_empty());

        store.clear_failures();
        assert_storage_ok!(store.create_post(&new_post).await);
        assert_eq!(store.calls(StoreOp::Create), 2);
        assert_eq!(store.calls(StoreOp::Delete), 0);
    }
}
