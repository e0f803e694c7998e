//! Placement of rendered HTML.
//!
//! A [`ContentPublisher`] decides where rendered post HTML lives: inline in
//! the post store row or in an external [`BlobStore`]. The post manager treats
//! both the same way.

use std::sync::Arc;

use async_trait::async_trait;
use postpigeon_storage::{BlobStore, PostId, RenderedBody, StorageResult};

/// Stores rendered HTML and produces the [`RenderedBody`] to persist.
#[async_trait]
pub trait ContentPublisher: Send + Sync {
    /// Publishes `html` for post `id`.
    async fn publish(&self, id: PostId, html: String) -> StorageResult<RenderedBody>;

    /// Removes whatever [`publish`](Self::publish) stored for `body`.
    async fn retract(&self, body: &RenderedBody) -> StorageResult<()>;
}

/// Keeps rendered HTML in the post store row.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlinePublisher;

#[async_trait]
impl ContentPublisher for InlinePublisher {
    async fn publish(&self, _id: PostId, html: String) -> StorageResult<RenderedBody> {
        Ok(RenderedBody::Inline { html })
    }

    async fn retract(&self, _body: &RenderedBody) -> StorageResult<()> {
        Ok(())
    }
}

/// Uploads rendered HTML to a [`BlobStore`] and persists its location.
#[derive(Clone)]
pub struct BlobPublisher {
    blobs: Arc<dyn BlobStore>,
}

impl BlobPublisher {
    /// Creates a publisher over `blobs`.
    #[must_use]
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }
}

impl std::fmt::Debug for BlobPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobPublisher").finish_non_exhaustive()
    }
}

#[async_trait]
impl ContentPublisher for BlobPublisher {
    async fn publish(&self, id: PostId, html: String) -> StorageResult<RenderedBody> {
        let location = self.blobs.upload(id, &html).await?;
        Ok(RenderedBody::External { location })
    }

    async fn retract(&self, body: &RenderedBody) -> StorageResult<()> {
        match body {
            RenderedBody::External { location } => self.blobs.delete(location).await,
            RenderedBody::Inline { .. } => Ok(()),
        }
    }
}
