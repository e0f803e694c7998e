//! Post manager error types.

use postpigeon_authn::AuthError;
use postpigeon_storage::{ConfigError, PostId, StorageError};
use thiserror::Error;

use crate::render::RenderError;

/// Errors returned by post operations.
///
/// [`Unauthorized`](PostError::Unauthorized) deliberately covers both a
/// failed signature check and a missing post on ownership-gated paths, so a
/// caller cannot use it to probe which identifiers exist.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]`; new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PostError {
    /// Ownership could not be established.
    #[error("could not verify signature")]
    Unauthorized,

    /// The author already has a post with this title.
    #[error("post already exists: {id}")]
    DuplicatePost {
        /// Identifier of the existing post.
        id: PostId,
    },

    /// The request is malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The requested post or listing does not exist.
    #[error("not found")]
    NotFound,

    /// Key-derived identity could not be computed.
    #[error("identity derivation failed: {0}")]
    Identity(#[source] AuthError),

    /// The post store failed.
    #[error("store failure: {0}")]
    Storage(#[from] StorageError),

    /// The renderer failed.
    #[error("render failure: {0}")]
    Render(#[from] RenderError),

    /// Configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PostError {
    /// Creates an `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    /// Returns `true` for errors caused by the caller rather than the system.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized | Self::DuplicatePost { .. } | Self::InvalidInput(_) | Self::NotFound
        )
    }
}

impl From<AuthError> for PostError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidInput(reason) => Self::InvalidInput(reason),
            other => Self::Identity(other),
        }
    }
}

/// Result type alias for post operations.
pub type Result<T> = std::result::Result<T, PostError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_unauthorized_message_is_generic() {
        assert_eq!(PostError::Unauthorized.to_string(), "could not verify signature");
    }

    #[test]
    fn test_auth_invalid_input_maps_to_invalid_input() {
        let err: PostError = AuthError::invalid_input("title must not be empty").into();
        assert!(matches!(err, PostError::InvalidInput(ref r) if r == "title must not be empty"));

        let err: PostError = AuthError::invalid_key("no PEM block found").into();
        assert!(matches!(err, PostError::Identity(AuthError::InvalidKeyEncoding(_))));
    }

    #[test]
    fn test_storage_source_preserved() {
        let err: PostError = StorageError::timeout().into();
        assert!(err.source().is_some());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_client_error_classification() {
        assert!(PostError::Unauthorized.is_client_error());
        assert!(PostError::NotFound.is_client_error());
        assert!(PostError::invalid_input("x").is_client_error());
        assert!(!PostError::Config(ConfigError::Missing { field: "x" }).is_client_error());
    }
}
