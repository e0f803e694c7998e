//! Errors returned by post and blob stores.
//!
//! Missing records are not errors: reads return `Ok(None)`. What remains is
//! a small set of failure kinds every backend maps its own errors onto:
//!
//! - [`StorageError::Conflict`]: an insert collided with a live post
//! - [`StorageError::Unavailable`]: the backend could not be reached
//! - [`StorageError::Internal`]: anything else the backend reports
//! - [`StorageError::Timeout`]: the backend did not answer in time
//!
//! ```
//! use postpigeon_storage::{StorageError, StorageResult};
//!
//! fn insert(live: bool) -> StorageResult<()> {
//!     if live { Err(StorageError::conflict()) } else { Ok(()) }
//! }
//!
//! assert!(matches!(insert(true), Err(StorageError::Conflict)));
//! ```

use std::sync::Arc;

use thiserror::Error;

/// Shared, cloneable cause attached to a [`StorageError`].
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result of a store call.
pub type StorageResult<T> = Result<T, StorageError>;

/// Failure reported by a [`PostStore`](crate::PostStore) or
/// [`BlobStore`](crate::BlobStore).
///
/// Marked `#[non_exhaustive]`; match with a wildcard arm.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// An insert targeted an identifier that already has a live post.
    ///
    /// The losing side of two concurrent creates sees this.
    #[error("post already exists")]
    Conflict,

    /// The backend could not be reached.
    #[error("store unavailable: {message}")]
    Unavailable {
        /// What was being attempted.
        message: String,
        /// Cause reported by the backend, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// The backend failed in a way the other variants do not describe.
    #[error("store failure: {message}")]
    Internal {
        /// What went wrong.
        message: String,
        /// Cause reported by the backend, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// The backend did not answer in time.
    #[error("store timed out")]
    Timeout,
}

impl StorageError {
    /// A [`StorageError::Conflict`].
    #[must_use]
    pub fn conflict() -> Self {
        Self::Conflict
    }

    /// An [`StorageError::Unavailable`] without a cause.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into(), source: None }
    }

    /// An [`StorageError::Internal`] without a cause.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// An [`StorageError::Internal`] carrying the backend's own error.
    #[must_use]
    pub fn internal_caused_by(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Internal { message: message.into(), source: Some(Arc::new(cause)) }
    }

    /// A [`StorageError::Timeout`].
    #[must_use]
    pub fn timeout() -> Self {
        Self::Timeout
    }

    /// Whether repeating the call later might succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Timeout)
    }
}

/// Errors raised while validating configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A numeric or duration field is below its allowed minimum.
    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value, rendered for display.
        value: String,
        /// The minimum accepted value, rendered for display.
        min: String,
    },

    /// A required field was not provided.
    #[error("missing required setting: {field}")]
    Missing {
        /// Name of the missing field or environment variable.
        field: &'static str,
    },

    /// A field was provided but could not be interpreted.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}
