//! Blob storage for rendered post bodies.
//!
//! Deployments that keep rendered HTML outside the post store upload it to a
//! [`BlobStore`] and persist only the returned location. Every upload gets a
//! fresh location, so two uploads for the same post never overwrite each
//! other and each can be deleted on its own.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{error::StorageResult, types::PostId};

/// Object storage collaborator for rendered HTML.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Uploads `html` for post `id` and returns a location unique to this upload.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn upload(&self, id: PostId, html: &str) -> StorageResult<String>;

    /// Deletes the object at `location`. Deleting a missing object succeeds.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn delete(&self, location: &str) -> StorageResult<()>;
}

/// In-memory [`BlobStore`] producing `memory://<id>/<n>` locations.
#[derive(Debug, Default, Clone)]
pub struct MemoryBlobStore {
    objects: Arc<RwLock<HashMap<String, String>>>,
    uploads: Arc<AtomicU64>,
}

impl MemoryBlobStore {
    /// Creates an empty blob store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the object stored at `location`, if any.
    #[must_use]
    pub fn object(&self, location: &str) -> Option<String> {
        self.objects.read().get(location).cloned()
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Returns `true` if no objects are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    #[tracing::instrument(skip(self, html), fields(id = %id, len = html.len()))]
    async fn upload(&self, id: PostId, html: &str) -> StorageResult<String> {
        let n = self.uploads.fetch_add(1, Ordering::Relaxed);
        let location = format!("memory://{id}/{n}");
        self.objects.write().insert(location.clone(), html.to_owned());
        Ok(location)
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, location: &str) -> StorageResult<()> {
        self.objects.write().remove(location);
        Ok(())
    }
}
