//! In-memory post store.
//!
//! [`MemoryPostStore`] keeps posts in a [`HashMap`] behind a
//! [`parking_lot::RwLock`]. Each entry holds the ownership record and the
//! content record together, so inserts and deletes are atomic by
//! construction.
//!
//! Posts whose expiry has passed are treated as absent on every read even
//! before [`delete_expired`](PostStore::delete_expired) removes them, and a
//! create may replace such a row. Both hand back the rendered bodies they
//! dropped so externally stored content can be retracted.
//!
//! # Limitations
//!
//! - Data is not persisted; all data is lost when the process exits
//! - Listing scans every entry

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fail::fail_point;
use parking_lot::RwLock;

use crate::{
    backend::PostStore,
    error::{StorageError, StorageResult},
    types::{Fingerprint, NewPost, Post, PostContent, PostId, PostSummary, RenderedBody},
};

/// In-memory implementation of [`PostStore`].
///
/// Cheaply cloneable; all clones share the same data.
#[derive(Debug, Default, Clone)]
pub struct MemoryPostStore {
    posts: Arc<RwLock<HashMap<PostId, (Post, PostContent)>>>,
}

impl MemoryPostStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently held, including expired rows not yet reaped.
    #[must_use]
    pub fn len(&self) -> usize {
        self.posts.read().len()
    }

    /// Returns `true` if the store holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.posts.read().is_empty()
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    #[tracing::instrument(skip(self, new_post), fields(id = %new_post.id()))]
    async fn create_post(&self, new_post: &NewPost) -> StorageResult<Option<RenderedBody>> {
        fail_point!("store-before-create", |_| {
            Err(StorageError::internal("injected failure before post insert"))
        });

        if new_post.post.id != new_post.content.post_id {
            return Err(StorageError::internal(format!(
                "content id {} does not match post id {}",
                new_post.content.post_id, new_post.post.id
            )));
        }

        let now = Utc::now();
        let mut posts = self.posts.write();

        if let Some((existing, _)) = posts.get(&new_post.post.id)
            && !existing.is_expired_at(now)
        {
            return Err(StorageError::conflict());
        }

        let replaced = posts.insert(new_post.post.id, (new_post.post.clone(), new_post.content.clone()));
        Ok(replaced.map(|(_, content)| content.rendered))
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn get_post(&self, id: PostId) -> StorageResult<Option<Post>> {
        let now = Utc::now();
        let posts = self.posts.read();
        Ok(posts.get(&id).filter(|(post, _)| !post.is_expired_at(now)).map(|(post, _)| post.clone()))
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn get_post_content(&self, id: PostId) -> StorageResult<Option<PostContent>> {
        let now = Utc::now();
        let posts = self.posts.read();
        Ok(posts
            .get(&id)
            .filter(|(post, _)| !post.is_expired_at(now))
            .map(|(_, content)| content.clone()))
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn delete_post(&self, id: PostId) -> StorageResult<bool> {
        fail_point!("store-before-delete", |_| {
            Err(StorageError::internal("injected failure before post delete"))
        });

        Ok(self.posts.write().remove(&id).is_some())
    }

    #[tracing::instrument(skip(self), fields(fingerprint = %fingerprint))]
    async fn list_posts_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> StorageResult<Vec<PostSummary>> {
        let now = Utc::now();
        let posts = self.posts.read();

        let mut summaries: Vec<PostSummary> = posts
            .values()
            .filter(|(post, _)| post.fingerprint == *fingerprint && !post.is_expired_at(now))
            .map(|(post, content)| PostSummary {
                id: post.id,
                fingerprint: post.fingerprint.clone(),
                title: content.title.clone(),
                created_at: post.created_at,
            })
            .collect();

        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(summaries)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_expired(&self, now: DateTime<Utc>) -> StorageResult<Vec<RenderedBody>> {
        fail_point!("store-before-delete-expired", |_| {
            Err(StorageError::internal("injected failure before expired sweep"))
        });

        let mut posts = self.posts.write();
        let expired: Vec<PostId> =
            posts.values().filter(|(post, _)| post.is_expired_at(now)).map(|(post, _)| post.id).collect();
        Ok(expired.iter().filter_map(|id| posts.remove(id)).map(|(_, content)| content.rendered).collect())
    }
}
