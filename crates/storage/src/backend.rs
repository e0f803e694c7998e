//! Post store trait definition.
//!
//! This module defines the [`PostStore`] trait, the persistence collaborator
//! the post manager and the reaper are written against. Implementations own
//! the transactional guarantees: a post and its content are created together
//! and deleted together, and a failure part way through must leave neither
//! behind.
//!
//! # Absence
//!
//! Every read returns `StorageResult<Option<T>>`. `Ok(None)` is the only way
//! a store reports that a record does not exist; `Err` is reserved for the
//! store itself failing.
//!
//! # Implementing a Store
//!
//! 1. Implement the [`PostStore`] trait
//! 2. Map backend-specific errors to [`StorageError`](crate::StorageError)
//! 3. Return [`Conflict`](crate::StorageError::Conflict) from
//!    [`create_post`](PostStore::create_post) when a live post already holds the identifier
//!
//! See [`MemoryPostStore`](crate::MemoryPostStore) for a reference implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::StorageResult,
    types::{Fingerprint, NewPost, Post, PostContent, PostId, PostSummary, RenderedBody},
};

/// Persistent storage for posts.
///
/// | Method | Description |
/// |--------|-------------|
/// | [`create_post`](PostStore::create_post) | Insert a post and its content atomically |
/// | [`get_post`](PostStore::get_post) | Fetch the ownership record |
/// | [`get_post_content`](PostStore::get_post_content) | Fetch the content record |
/// | [`delete_post`](PostStore::delete_post) | Remove a post and its content atomically |
/// | [`list_posts_by_fingerprint`](PostStore::list_posts_by_fingerprint) | List an author's posts |
/// | [`delete_expired`](PostStore::delete_expired) | Bulk-remove expired posts |
///
/// # Example
///
/// ```
/// use postpigeon_storage::{MemoryPostStore, PostStore, testutil::make_new_post};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let store = MemoryPostStore::new();
/// let new_post = make_new_post("author", "Title", "body", None);
///
/// store.create_post(&new_post).await.unwrap();
/// let post = store.get_post(new_post.id()).await.unwrap();
/// assert!(post.is_some());
/// # });
/// ```
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Inserts a post and its content as one unit.
    ///
    /// A logically expired row under the same identifier is replaced; its
    /// rendered body is returned so the caller can retract it.
    ///
    /// # Errors
    ///
    /// Returns [`Conflict`](crate::StorageError::Conflict) if a live post
    /// already exists under the same identifier.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn create_post(&self, new_post: &NewPost) -> StorageResult<Option<RenderedBody>>;

    /// Fetches the ownership record of a post.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn get_post(&self, id: PostId) -> StorageResult<Option<Post>>;

    /// Fetches the content record of a post.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn get_post_content(&self, id: PostId) -> StorageResult<Option<PostContent>>;

    /// Deletes a post and its content as one unit.
    ///
    /// Returns `true` if a post was removed and `false` if none existed.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn delete_post(&self, id: PostId) -> StorageResult<bool>;

    /// Lists the live posts of one author, oldest first.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn list_posts_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> StorageResult<Vec<PostSummary>>;

    /// Deletes every post whose expiry is at or before `now`.
    ///
    /// Returns the rendered bodies of the removed posts, one per post.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn delete_expired(&self, now: DateTime<Utc>) -> StorageResult<Vec<RenderedBody>>;
}
