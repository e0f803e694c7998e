//! Records shared by the post store, the cache and the post manager.
//!
//! A published post is split into two records that live and die together:
//! [`Post`] carries the ownership material (public key and fingerprint) and
//! the expiry, while [`PostContent`] carries the title, the raw body the
//! author signed, and the rendered output.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content identifier of a post.
///
/// Identifiers are name-based UUIDs derived from the author's key and the
/// post title, so the same pair always maps to the same identifier.
///
/// # Examples
///
/// ```
/// use postpigeon_storage::PostId;
///
/// let id: PostId = "51cd149c-68ee-55a4-b58b-68f918f994a9".parse().unwrap();
/// assert_eq!(id.to_string(), "51cd149c-68ee-55a4-b58b-68f918f994a9");
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(Uuid);

impl PostId {
    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for PostId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<PostId> for Uuid {
    fn from(id: PostId) -> Self {
        id.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for PostId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Non-secret author handle derived from a public key.
///
/// Stored verbatim; equality is plain string equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wraps an already-encoded fingerprint.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the encoded fingerprint.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ownership record of a post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Content identifier.
    pub id: PostId,

    /// PEM-encoded public key the post was created with.
    pub public_key: String,

    /// Fingerprint of [`public_key`](Self::public_key).
    pub fingerprint: Fingerprint,

    /// Creation time.
    pub created_at: DateTime<Utc>,

    /// Absolute expiry, if the author asked for one.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Returns `true` if the post has expired as of `now`.
    ///
    /// A post whose expiry equals `now` counts as expired.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Where the rendered HTML of a post lives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderedBody {
    /// HTML stored alongside the post.
    Inline {
        /// Sanitized HTML.
        html: String,
    },
    /// HTML stored in an external blob store.
    External {
        /// Location returned by the blob store.
        location: String,
    },
}

impl RenderedBody {
    /// Creates an inline body.
    #[must_use]
    pub fn inline(html: impl Into<String>) -> Self {
        Self::Inline { html: html.into() }
    }

    /// Returns the inline HTML, if the body is stored inline.
    #[must_use]
    pub fn as_inline(&self) -> Option<&str> {
        match self {
            Self::Inline { html } => Some(html),
            Self::External { .. } => None,
        }
    }
}

/// Content record of a post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContent {
    /// Content identifier, shared with the owning [`Post`].
    pub post_id: PostId,

    /// Post title.
    pub title: String,

    /// The body exactly as the author signed it.
    ///
    /// Delete requests are verified against these bytes.
    pub raw_body: String,

    /// Rendered output.
    pub rendered: RenderedBody,
}

/// A post and its content, inserted as one unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPost {
    /// Ownership record.
    pub post: Post,
    /// Content record.
    pub content: PostContent,
}

impl NewPost {
    /// Returns the identifier shared by both records.
    #[must_use]
    pub fn id(&self) -> PostId {
        self.post.id
    }
}

/// One row of an author's post listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    /// Content identifier.
    pub id: PostId,
    /// Author fingerprint.
    pub fingerprint: Fingerprint,
    /// Post title.
    pub title: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}
