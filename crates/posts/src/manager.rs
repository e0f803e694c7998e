//! Authorization-gated post lifecycle.
//!
//! A post identifier moves through `NonExistent → Active → {Deleted, Expired}`.
//! Creation is gated on a signature over the body by the submitted key;
//! deletion is gated on a signature over the *stored* body by the *stored*
//! key. Ownership failures on delete are reported as
//! [`PostError::Unauthorized`] whether the post is missing or the signature
//! is wrong.

use std::sync::Arc;

use chrono::Utc;
use postpigeon_authn::{deterministic_identifier, fingerprint, verify_signature};
use postpigeon_storage::{
    Fingerprint, NewPost, Post, PostContent, PostId, PostStore, RenderedBody, StorageError,
};
use uuid::Uuid;

use crate::{
    audit::{ANONYMOUS_ACTOR, AuditAction, AuditEvent, AuditLogger, AuditResult, TracingAuditLogger, post_resource},
    cache::ContentCache,
    config::PostsConfig,
    error::{PostError, Result},
    expiration,
    publish::{ContentPublisher, InlinePublisher},
    render::{ListingEntry, PlainRenderer, PostListing, PostPage, Renderer},
    request::{CreatePostRequest, DeletePostRequest},
};

/// Default largest accepted body in bytes.
pub const DEFAULT_MAX_BODY_BYTES: usize = 15_000;

/// Creates, serves, lists and deletes posts.
///
/// Collaborators are injected as trait objects; the cache is shared so the
/// composing layer can inspect it.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use postpigeon_posts::{CacheConfig, ContentCache, CreatePostRequest, PostManager};
/// use postpigeon_storage::MemoryPostStore;
///
/// # async fn example(key_pem: &str, signature: &str) -> Result<(), Box<dyn std::error::Error>> {
/// let namespace = postpigeon_authn::namespace_from_seed("post-pigeon-namespace")?;
/// let manager = PostManager::new(
///     Arc::new(MemoryPostStore::new()),
///     Arc::new(ContentCache::new(CacheConfig::default())),
///     namespace,
/// );
///
/// let id = manager
///     .create_post(&CreatePostRequest::new("Foo", "hello world", key_pem, signature))
///     .await?;
/// let content = manager.fetch_post_content(id).await?;
/// assert!(content.is_some());
/// # Ok(())
/// # }
/// ```
pub struct PostManager {
    store: Arc<dyn PostStore>,
    cache: Arc<ContentCache>,
    renderer: Arc<dyn Renderer>,
    publisher: Arc<dyn ContentPublisher>,
    audit: Arc<dyn AuditLogger>,
    namespace: Uuid,
    max_body_bytes: usize,
}

impl PostManager {
    /// Creates a manager that renders with [`PlainRenderer`], keeps HTML
    /// inline and audits through `tracing`.
    #[must_use]
    pub fn new(store: Arc<dyn PostStore>, cache: Arc<ContentCache>, namespace: Uuid) -> Self {
        Self {
            store,
            cache,
            renderer: Arc::new(PlainRenderer),
            publisher: Arc::new(InlinePublisher),
            audit: Arc::new(TracingAuditLogger),
            namespace,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Creates a manager from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::Config`] if `config` does not validate.
    pub fn from_config(config: &PostsConfig, store: Arc<dyn PostStore>) -> Result<Self> {
        config.validate()?;
        let cache = Arc::new(ContentCache::new(config.cache_config()?));
        Ok(Self::new(store, cache, config.namespace_uuid()?).with_max_body_bytes(config.max_body_bytes))
    }

    /// Replaces the renderer.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Replaces the content publisher.
    #[must_use]
    pub fn with_publisher(mut self, publisher: Arc<dyn ContentPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    /// Replaces the audit logger.
    #[must_use]
    pub fn with_audit_logger(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    /// Sets the largest accepted body.
    #[must_use]
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// The content cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    /// The post store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn PostStore> {
        &self.store
    }

    /// The content identifier namespace.
    #[must_use]
    pub fn namespace(&self) -> Uuid {
        self.namespace
    }

    /// Publishes a post and returns its identifier.
    ///
    /// # Errors
    ///
    /// - [`PostError::InvalidInput`] for empty fields or an oversized body
    /// - [`PostError::Unauthorized`] if the signature does not verify
    /// - [`PostError::DuplicatePost`] if this key already has a post with this title
    /// - [`PostError::Render`] or [`PostError::Storage`] if a collaborator fails
    #[tracing::instrument(skip(self, request), fields(title_len = request.title.len(), body_len = request.body.len()))]
    pub async fn create_post(&self, request: &CreatePostRequest) -> Result<PostId> {
        let mut attempt = CreateAttempt::default();
        let result = self.try_create_post(request, &mut attempt).await;
        let outcome = match &result {
            Ok(_) => AuditResult::Success,
            Err(PostError::Unauthorized) => AuditResult::Denied,
            Err(err) => failure(err),
        };
        self.record(&attempt.actor, AuditAction::CreatePost, attempt.resource, outcome).await;
        result
    }

    async fn try_create_post(&self, request: &CreatePostRequest, attempt: &mut CreateAttempt) -> Result<PostId> {
        request.validate(self.max_body_bytes)?;

        if let Err(err) = verify_signature(&request.public_key, &request.signature, request.body.as_bytes()) {
            tracing::debug!(error = %err, "create rejected");
            return Err(PostError::Unauthorized);
        }

        let author = fingerprint(&request.public_key)?;
        attempt.actor = author.as_str().to_owned();
        let id = deterministic_identifier(&request.public_key, &request.title, &self.namespace)?;
        attempt.resource = post_resource(id);

        if self.store.get_post(id).await?.is_some() {
            return Err(PostError::DuplicatePost { id });
        }

        let now = Utc::now();
        let html = self.renderer.render_post(&PostPage {
            title: request.title.clone(),
            body: request.body.clone(),
            fingerprint: author.clone(),
            created_on: now.date_naive(),
        })?;
        let expires_at = request.expiration.as_deref().and_then(|token| expiration::resolve_at(token, now));

        fail::fail_point!("manager-before-publish", |_| {
            Err(PostError::Storage(StorageError::internal("injected publish failure")))
        });
        let rendered = self.publisher.publish(id, html).await?;

        let new_post = NewPost {
            post: Post {
                id,
                public_key: request.public_key.clone(),
                fingerprint: author,
                created_at: now,
                expires_at,
            },
            content: PostContent {
                post_id: id,
                title: request.title.clone(),
                raw_body: request.body.clone(),
                rendered,
            },
        };

        match self.store.create_post(&new_post).await {
            Ok(replaced) => {
                // The store swapped out an expired, unreaped row.
                if let Some(stale) = replaced {
                    self.retract_quietly(id, &stale).await;
                }
                Ok(id)
            },
            Err(err) => {
                self.retract_quietly(id, &new_post.content.rendered).await;
                Err(match err {
                    StorageError::Conflict => PostError::DuplicatePost { id },
                    other => PostError::Storage(other),
                })
            },
        }
    }

    /// Returns `true` if the request's key already has a post with its title.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::InvalidInput`] for an empty key or title, or
    /// [`PostError::Storage`] if the lookup fails.
    #[tracing::instrument(skip(self, request))]
    pub async fn is_duplicate(&self, request: &CreatePostRequest) -> Result<bool> {
        let id = deterministic_identifier(&request.public_key, &request.title, &self.namespace)?;
        Ok(self.store.get_post(id).await?.is_some())
    }

    /// Returns the content of post `id`, or `None` if there is no such post.
    ///
    /// Reads go through the cache. Misses are filled from the store; absent
    /// posts are not cached.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::Storage`] if the store fails.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn fetch_post_content(&self, id: PostId) -> Result<Option<Arc<PostContent>>> {
        if let Some(content) = self.cache.get(id) {
            tracing::debug!(hit_rate = self.cache.hit_rate(), "serving post from cache");
            return Ok(Some(content));
        }

        let generation = self.cache.generation();
        let Some(post) = self.store.get_post(id).await? else {
            return Ok(None);
        };
        let Some(content) = self.store.get_post_content(id).await? else {
            return Ok(None);
        };

        let content = Arc::new(content);
        let cached = self.cache.insert_if_current(id, Arc::clone(&content), post.expires_at, generation);
        tracing::debug!(cached, "loaded post from store");
        Ok(Some(content))
    }

    /// Deletes a post whose stored body is signed by `request.signature`
    /// under the stored key.
    ///
    /// When this returns `Ok`, no later fetch returns the post.
    ///
    /// # Errors
    ///
    /// - [`PostError::Unauthorized`] if the post does not exist or the signature does not verify
    /// - [`PostError::Storage`] if the store fails
    #[tracing::instrument(skip(self, request), fields(id = %request.id))]
    pub async fn remove_post(&self, request: &DeletePostRequest) -> Result<()> {
        let id = request.id;
        let resource = post_resource(id);

        let Some((post, content)) = self.load_owned(id).await? else {
            self.record(ANONYMOUS_ACTOR, AuditAction::DeletePost, resource, AuditResult::Denied).await;
            return Err(PostError::Unauthorized);
        };

        if let Err(err) = verify_signature(&post.public_key, &request.signature, content.raw_body.as_bytes()) {
            tracing::debug!(error = %err, "delete rejected");
            self.record(ANONYMOUS_ACTOR, AuditAction::DeletePost, resource, AuditResult::Denied).await;
            return Err(PostError::Unauthorized);
        }

        self.cache.invalidate(id);
        fail::fail_point!("manager-before-delete", |_| {
            Err(PostError::Storage(StorageError::internal("injected delete failure")))
        });
        let deleted = match self.store.delete_post(id).await {
            Ok(deleted) => deleted,
            Err(err) => {
                let err = PostError::Storage(err);
                self.record(post.fingerprint.as_str(), AuditAction::DeletePost, resource, failure(&err)).await;
                return Err(err);
            },
        };
        // A read that overlapped the delete may have refilled the cache.
        self.cache.invalidate(id);

        if deleted {
            self.retract_quietly(id, &content.rendered).await;
        } else {
            tracing::debug!("post was removed concurrently");
        }

        self.record(post.fingerprint.as_str(), AuditAction::DeletePost, resource, AuditResult::Success).await;
        Ok(())
    }

    /// Returns `true` if the author has at least one post.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::Storage`] if the store fails.
    #[tracing::instrument(skip(self), fields(fingerprint = %author))]
    pub async fn has_posts(&self, author: &Fingerprint) -> Result<bool> {
        Ok(!self.store.list_posts_by_fingerprint(author).await?.is_empty())
    }

    /// Lists the author's posts, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::Storage`] if the store fails.
    #[tracing::instrument(skip(self), fields(fingerprint = %author))]
    pub async fn get_all_user_posts(&self, author: &Fingerprint) -> Result<PostListing> {
        let summaries = self.store.list_posts_by_fingerprint(author).await?;
        let entries = summaries
            .into_iter()
            .map(|summary| ListingEntry {
                id: summary.id,
                title: summary.title,
                created_on: summary.created_at.date_naive(),
            })
            .collect();
        Ok(PostListing { fingerprint: author.clone(), entries })
    }

    /// Renders the author's listing page.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::NotFound`] if the author has no posts, or
    /// [`PostError::Render`]/[`PostError::Storage`] if a collaborator fails.
    pub async fn render_user_posts(&self, author: &Fingerprint) -> Result<String> {
        let listing = self.get_all_user_posts(author).await?;
        if listing.is_empty() {
            return Err(PostError::NotFound);
        }
        Ok(self.renderer.render_listing(&listing)?)
    }

    /// Lists the posts of the author holding `public_key_pem`.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::NotFound`] if the key cannot be decoded, or
    /// [`PostError::Storage`] if the store fails.
    pub async fn posts_for_key(&self, public_key_pem: &str) -> Result<PostListing> {
        let author = fingerprint(public_key_pem).map_err(|_| PostError::NotFound)?;
        self.get_all_user_posts(&author).await
    }

    async fn load_owned(&self, id: PostId) -> Result<Option<(Post, PostContent)>> {
        let Some(post) = self.store.get_post(id).await? else {
            return Ok(None);
        };
        let Some(content) = self.store.get_post_content(id).await? else {
            return Ok(None);
        };
        Ok(Some((post, content)))
    }

    async fn retract_quietly(&self, id: PostId, body: &RenderedBody) {
        if let Err(err) = self.publisher.retract(body).await {
            tracing::warn!(id = %id, error = %err, "failed to retract published content");
        }
    }

    async fn record(&self, actor: &str, action: AuditAction, resource: String, result: AuditResult) {
        let event = AuditEvent::builder().actor(actor).action(action).resource(resource).result(result).build();
        self.audit.log(&event).await;
    }
}

/// Actor and resource of a create, filled in as they become known.
struct CreateAttempt {
    actor: String,
    resource: String,
}

impl Default for CreateAttempt {
    fn default() -> Self {
        Self { actor: ANONYMOUS_ACTOR.to_owned(), resource: "post:new".to_owned() }
    }
}

fn failure(err: &PostError) -> AuditResult {
    match err {
        PostError::DuplicatePost { .. } => AuditResult::Failure("duplicate".to_owned()),
        other => AuditResult::Failure(other.to_string()),
    }
}

impl std::fmt::Debug for PostManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostManager")
            .field("cache", &self.cache)
            .field("namespace", &self.namespace)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}
