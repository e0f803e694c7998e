//! Authentication error types.
//!
//! This module defines errors that can occur while decoding author keys,
//! verifying signatures and deriving identity values from keys.

use thiserror::Error;

/// Signature and identity errors.
///
/// Messages describe what was malformed but never echo key or signature
/// material.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]`; new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// No PEM block was found, or it does not hold a supported EC public key.
    #[error("Invalid key encoding: {0}")]
    InvalidKeyEncoding(String),

    /// The signature is not valid base64.
    #[error("Invalid signature encoding: {0}")]
    InvalidSignatureEncoding(String),

    /// The signature does not verify against the key and message.
    #[error("Signature mismatch")]
    SignatureMismatch,

    /// A required input was empty or otherwise unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AuthError {
    /// Creates an `InvalidKeyEncoding` error.
    #[must_use]
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKeyEncoding(reason.into())
    }

    /// Creates an `InvalidSignatureEncoding` error.
    #[must_use]
    pub fn invalid_signature(reason: impl Into<String>) -> Self {
        Self::InvalidSignatureEncoding(reason.into())
    }

    /// Creates an `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }
}

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;
