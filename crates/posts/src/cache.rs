//! Bounded read-through cache of post content.
//!
//! Entries are evicted least-recently-used once the capacity is reached and
//! expire after the configured TTL or at the post's own expiry, whichever
//! comes first. Expired posts are therefore never served from cache, no matter
//! when the reaper next runs.
//!
//! # Invalidation ordering
//!
//! A read that misses the cache fetches from the store and then populates the
//! cache. If a delete runs between the fetch and the populate, the read would
//! put back content that no longer exists. To rule this out the cache keeps an
//! invalidation generation:
//!
//! 1. the reader snapshots [`ContentCache::generation`] before the store fetch
//! 2. [`ContentCache::invalidate`] bumps the generation
//! 3. [`ContentCache::insert_if_current`] only inserts if the generation is
//!    unchanged, atomically with respect to invalidation
//!
//! The generation is shared by all identifiers, so an unrelated delete can
//! cause a populate to be skipped. That costs one extra store read later and
//! never serves stale data.
//!
//! # Example
//!
//! ```no_run
//! # use std::time::Duration;
//! # use postpigeon_posts::{CacheConfig, ContentCache};
//! let config = CacheConfig::builder()
//!     .max_entries(5_000)
//!     .ttl(Duration::from_secs(600))
//!     .build()
//!     .expect("valid config");
//! let cache = ContentCache::new(config);
//! assert_eq!(cache.entry_count(), 0);
//! ```

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use moka::{policy::EvictionPolicy, sync::Cache};
use parking_lot::Mutex;
use postpigeon_storage::{ConfigError, PostContent, PostId};

// ───────────────────────────────────────────────────────────────────────────
// CacheConfig
// ───────────────────────────────────────────────────────────────────────────

/// Default maximum number of cache entries.
pub const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// Default cache TTL.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Minimum allowed cache TTL.
pub const MIN_TTL: Duration = Duration::from_secs(1);

/// Configuration for the content cache.
///
/// # Validation
///
/// - `max_entries` must be >= 1
/// - `ttl` must be >= 1 second
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    max_entries: u64,
    ttl: Duration,
}

impl CacheConfig {
    /// Starts a builder populated with the defaults.
    #[must_use]
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder { max_entries: DEFAULT_MAX_ENTRIES, ttl: DEFAULT_TTL }
    }

    /// Returns the maximum number of cache entries.
    #[must_use]
    pub fn max_entries(&self) -> u64 {
        self.max_entries
    }

    /// Returns the cache TTL.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: DEFAULT_MAX_ENTRIES, ttl: DEFAULT_TTL }
    }
}

/// Builder for [`CacheConfig`].
#[derive(Debug, Clone)]
pub struct CacheConfigBuilder {
    max_entries: u64,
    ttl: Duration,
}

impl CacheConfigBuilder {
    /// Sets the maximum number of entries in the cache.
    #[must_use]
    pub fn max_entries(mut self, max_entries: u64) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Sets the upper bound on how long an entry is kept.
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Builds the [`CacheConfig`], validating all fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BelowMinimum`] if `max_entries` is 0 or `ttl`
    /// is less than 1 second.
    pub fn build(self) -> Result<CacheConfig, ConfigError> {
        if self.max_entries == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "max_entries",
                value: "0".to_owned(),
                min: "1".to_owned(),
            });
        }
        if self.ttl < MIN_TTL {
            return Err(ConfigError::BelowMinimum {
                field: "ttl",
                value: format!("{}ms", self.ttl.as_millis()),
                min: "1s".to_owned(),
            });
        }
        Ok(CacheConfig { max_entries: self.max_entries, ttl: self.ttl })
    }
}

// ───────────────────────────────────────────────────────────────────────────
// ContentCache
// ───────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct CachedEntry {
    content: Arc<PostContent>,
    /// Post expiry; checked on every read.
    deadline: Option<DateTime<Utc>>,
    /// How long the entry may live from insertion.
    lifetime: Duration,
}

/// Per-entry expiry: the lifetime computed at insertion.
struct EntryExpiry;

impl moka::Expiry<PostId, CachedEntry> for EntryExpiry {
    fn expire_after_create(&self, _key: &PostId, value: &CachedEntry, _created_at: Instant) -> Option<Duration> {
        Some(value.lifetime)
    }

    fn expire_after_update(
        &self,
        _key: &PostId,
        value: &CachedEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.lifetime)
    }
}

/// Thread-safe LRU cache of [`PostContent`] keyed by [`PostId`].
///
/// The cache performs no I/O. Callers fetch on a miss and populate through
/// [`insert_if_current`](Self::insert_if_current).
pub struct ContentCache {
    entries: Cache<PostId, CachedEntry>,
    ttl: Duration,
    /// Bumped on every invalidation.
    generation: AtomicU64,
    /// Serializes conditional inserts against invalidations.
    write_lock: Mutex<()>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ContentCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        let entries = Cache::builder()
            .max_capacity(config.max_entries)
            .eviction_policy(EvictionPolicy::lru())
            .expire_after(EntryExpiry)
            .build();
        Self {
            entries,
            ttl: config.ttl,
            generation: AtomicU64::new(0),
            write_lock: Mutex::new(()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns cached content for `id`, if present and not expired.
    pub fn get(&self, id: PostId) -> Option<Arc<PostContent>> {
        let found = self.entries.get(&id).and_then(|entry| {
            if entry.deadline.is_some_and(|at| at <= Utc::now()) {
                self.entries.invalidate(&id);
                None
            } else {
                Some(entry.content)
            }
        });

        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Returns the current invalidation generation.
    ///
    /// Snapshot this before fetching from the store and pass it to
    /// [`insert_if_current`](Self::insert_if_current).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Inserts `content` unless an invalidation happened after `generation`
    /// was taken. Returns `true` if the entry was inserted.
    ///
    /// Content whose `expires_at` has already passed is never inserted.
    pub fn insert_if_current(
        &self,
        id: PostId,
        content: Arc<PostContent>,
        expires_at: Option<DateTime<Utc>>,
        generation: u64,
    ) -> bool {
        let Some(entry) = self.entry(content, expires_at) else {
            return false;
        };

        let _guard = self.write_lock.lock();
        if self.generation.load(Ordering::Acquire) != generation {
            tracing::debug!(id = %id, "skipping cache populate after concurrent invalidation");
            return false;
        }
        self.entries.insert(id, entry);
        true
    }

    /// Inserts `content` unconditionally.
    pub fn put(&self, id: PostId, content: Arc<PostContent>, expires_at: Option<DateTime<Utc>>) {
        if let Some(entry) = self.entry(content, expires_at) {
            let _guard = self.write_lock.lock();
            self.entries.insert(id, entry);
        }
    }

    /// Removes `id` and bumps the invalidation generation.
    ///
    /// When this returns, no populate that started before it can succeed.
    pub fn invalidate(&self, id: PostId) {
        let _guard = self.write_lock.lock();
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.entries.invalidate(&id);
    }

    /// Returns the approximate number of entries.
    ///
    /// This count is eventually consistent. Call
    /// [`run_pending_tasks`](Self::run_pending_tasks) first for an exact
    /// figure in tests.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Flushes pending evictions and expirations.
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }

    /// Number of lookups that returned content.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of lookups that found nothing.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Fraction of lookups that hit, or `0.0` before the first lookup.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 { 0.0 } else { hits as f64 / total as f64 }
    }

    fn entry(&self, content: Arc<PostContent>, expires_at: Option<DateTime<Utc>>) -> Option<CachedEntry> {
        let lifetime = match expires_at {
            Some(at) => (at - Utc::now()).to_std().ok().filter(|left| !left.is_zero())?.min(self.ttl),
            None => self.ttl,
        };
        Some(CachedEntry { content, deadline: expires_at, lifetime })
    }
}

impl std::fmt::Debug for ContentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCache")
            .field("entries", &self.entries.entry_count())
            .field("ttl", &self.ttl)
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}
