//! Author requests accepted by the post manager.

use postpigeon_storage::PostId;
use serde::{Deserialize, Serialize};

use crate::error::{PostError, Result};

/// Request to publish a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePostRequest {
    /// Post title.
    pub title: String,
    /// Post body; the signature covers exactly these bytes.
    pub body: String,
    /// PEM-encoded author public key.
    pub public_key: String,
    /// Base64 ASN.1 signature of `body`.
    pub signature: String,
    /// Lifetime token such as `"1 day"`; anything unrecognized never expires.
    #[serde(default)]
    pub expiration: Option<String>,
}

impl CreatePostRequest {
    /// Creates a request for a post that never expires.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        public_key: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            public_key: public_key.into(),
            signature: signature.into(),
            expiration: None,
        }
    }

    /// Sets the lifetime token.
    #[must_use]
    pub fn with_expiration(mut self, token: impl Into<String>) -> Self {
        self.expiration = Some(token.into());
        self
    }

    /// Checks the fields that do not need the key decoded.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::InvalidInput`] for an empty title, body, key or
    /// signature, or a body longer than `max_body_bytes`.
    pub fn validate(&self, max_body_bytes: usize) -> Result<()> {
        if self.title.is_empty() {
            return Err(PostError::invalid_input("title must not be empty"));
        }
        if self.public_key.is_empty() {
            return Err(PostError::invalid_input("public key must not be empty"));
        }
        if self.signature.is_empty() {
            return Err(PostError::invalid_input("signature must not be empty"));
        }
        if self.body.is_empty() {
            return Err(PostError::invalid_input("body must not be empty"));
        }
        if self.body.len() > max_body_bytes {
            return Err(PostError::invalid_input(format!(
                "body is {} bytes, limit is {max_body_bytes}",
                self.body.len()
            )));
        }
        Ok(())
    }
}

/// Request to delete a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePostRequest {
    /// Post to delete.
    pub id: PostId,
    /// Base64 signature of the stored post body under the stored key.
    pub signature: String,
}

impl DeletePostRequest {
    /// Creates a request for an already-parsed identifier.
    #[must_use]
    pub fn new(id: PostId, signature: impl Into<String>) -> Self {
        Self { id, signature: signature.into() }
    }

    /// Creates a request from identifier text.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::InvalidInput`] if `id` is not a UUID.
    pub fn parse(id: &str, signature: impl Into<String>) -> Result<Self> {
        let id = parse_post_id(id)?;
        Ok(Self::new(id, signature))
    }
}

/// Parses identifier text from a request.
///
/// # Errors
///
/// Returns [`PostError::InvalidInput`] if `text` is not a UUID.
pub fn parse_post_id(text: &str) -> Result<PostId> {
    text.parse().map_err(|_| PostError::invalid_input("malformed post identifier"))
}
