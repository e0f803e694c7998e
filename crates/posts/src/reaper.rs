//! Periodic purge of expired posts.
//!
//! The reaper asks the store to delete every post whose expiry is at or
//! before now, once per interval, independent of request traffic. A failed
//! sweep is logged and retried on the next tick; it never stops the task.
//!
//! The reaper does not touch the content cache. Cache entries already expire
//! no later than their post, see [`ContentCache`](crate::ContentCache).

use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use chrono::Utc;
use parking_lot::Mutex;
use postpigeon_storage::{PostStore, StorageResult};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    audit::{AuditAction, AuditEvent, AuditLogger, AuditResult, TracingAuditLogger},
    config::PostsConfig,
    error::Result,
    publish::{ContentPublisher, InlinePublisher},
};

/// Actor recorded on sweep audit events.
pub const REAPER_ACTOR: &str = "reaper";

/// Resource recorded on sweep audit events.
pub const EXPIRED_POSTS_RESOURCE: &str = "posts:expired";

/// Sweeps expired posts out of a [`PostStore`].
#[derive(Clone)]
pub struct Reaper {
    store: Arc<dyn PostStore>,
    interval: Duration,
    stats: Arc<ReaperStats>,
    audit: Arc<dyn AuditLogger>,
    publisher: Arc<dyn ContentPublisher>,
}

#[derive(Debug, Default)]
struct ReaperStats {
    sweeps: AtomicU64,
    failed_sweeps: AtomicU64,
    posts_reaped: AtomicU64,
}

impl Reaper {
    /// Creates a reaper that sweeps `store` every `interval`.
    #[must_use]
    pub fn new(store: Arc<dyn PostStore>, interval: Duration) -> Self {
        Self {
            store,
            interval,
            stats: Arc::new(ReaperStats::default()),
            audit: Arc::new(TracingAuditLogger),
            publisher: Arc::new(InlinePublisher),
        }
    }

    /// Creates a reaper sweeping every `config.reaper_interval`.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::Config`](crate::PostError::Config) if `config`
    /// does not validate.
    pub fn from_config(config: &PostsConfig, store: Arc<dyn PostStore>) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(store, config.reaper_interval))
    }

    /// Replaces the publisher used to retract the content of reaped posts.
    ///
    /// Must match the publisher the posts were created with.
    #[must_use]
    pub fn with_publisher(mut self, publisher: Arc<dyn ContentPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    /// Replaces the audit logger. Sweeps that delete nothing are not audited.
    #[must_use]
    pub fn with_audit_logger(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    /// The sweep interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs one sweep and returns the number of posts deleted.
    ///
    /// # Errors
    ///
    /// Returns the store error if the bulk delete fails.
    #[tracing::instrument(skip(self))]
    pub async fn sweep(&self) -> StorageResult<u64> {
        fail::fail_point!("reaper-before-sweep", |_| {
            self.stats.failed_sweeps.fetch_add(1, Ordering::Relaxed);
            Err(postpigeon_storage::StorageError::internal("injected sweep failure"))
        });

        match self.store.delete_expired(Utc::now()).await {
            Ok(reaped) => {
                for body in &reaped {
                    if let Err(err) = self.publisher.retract(body).await {
                        tracing::warn!(error = %err, "failed to retract reaped content");
                    }
                }
                let count = reaped.len() as u64;
                self.stats.sweeps.fetch_add(1, Ordering::Relaxed);
                self.stats.posts_reaped.fetch_add(count, Ordering::Relaxed);
                tracing::info!(deleted = count, "reaped expired posts");
                if count > 0 {
                    self.record(AuditResult::Success, count).await;
                }
                Ok(count)
            },
            Err(err) => {
                self.stats.failed_sweeps.fetch_add(1, Ordering::Relaxed);
                tracing::error!(error = %err, "expired post sweep failed");
                self.record(AuditResult::Failure(err.to_string()), 0).await;
                Err(err)
            },
        }
    }

    async fn record(&self, result: AuditResult, deleted: u64) {
        let event = AuditEvent::builder()
            .actor(REAPER_ACTOR)
            .action(AuditAction::ReapExpired)
            .resource(EXPIRED_POSTS_RESOURCE)
            .result(result)
            .metadata(BTreeMap::from([("deleted".to_owned(), deleted.to_string())]))
            .build();
        self.audit.log(&event).await;
    }

    /// Starts sweeping in a background task.
    ///
    /// The first sweep runs one full interval after spawning.
    #[must_use = "dropping the handle leaves the reaper running with no way to stop it"]
    pub fn spawn(self) -> ReaperHandle {
        let token = CancellationToken::new();
        let stats = Arc::clone(&self.stats);
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            // The first tick fires immediately; consume it so we start
            // with a full interval wait.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => {
                        tracing::info!("reaper shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        // Errors are already logged and counted.
                        let _ = self.sweep().await;
                    }
                }
            }
        });

        ReaperHandle { cancel_token: token, handle: Mutex::new(Some(handle)), stats }
    }
}

impl std::fmt::Debug for Reaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reaper").field("interval", &self.interval).finish_non_exhaustive()
    }
}

/// Control handle of a running [`Reaper`].
#[derive(Debug)]
pub struct ReaperHandle {
    cancel_token: CancellationToken,
    /// Wrapped in `Mutex` so `shutdown()` can take ownership via `&self`.
    handle: Mutex<Option<JoinHandle<()>>>,
    stats: Arc<ReaperStats>,
}

impl ReaperHandle {
    /// Token that stops the reaper when cancelled.
    #[must_use]
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    /// Stops the reaper and waits for the task to finish.
    ///
    /// A sweep in progress completes first. Calling this more than once is a no-op.
    pub async fn shutdown(&self) {
        self.cancel_token.cancel();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "reaper task panicked");
            }
        }
    }

    /// Returns `true` once the background task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.lock().as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Number of completed sweeps.
    #[must_use]
    pub fn sweeps(&self) -> u64 {
        self.stats.sweeps.load(Ordering::Relaxed)
    }

    /// Number of sweeps that failed.
    #[must_use]
    pub fn failed_sweeps(&self) -> u64 {
        self.stats.failed_sweeps.load(Ordering::Relaxed)
    }

    /// Total posts deleted across all sweeps.
    #[must_use]
    pub fn posts_reaped(&self) -> u64 {
        self.stats.posts_reaped.load(Ordering::Relaxed)
    }
}
