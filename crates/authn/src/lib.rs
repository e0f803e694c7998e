//! # Post Pigeon Authentication
//!
//! Proof of authorship for anonymous posts.
//!
//! Authors never register. They submit an elliptic-curve public key with each
//! post and sign the post body; later, only the holder of the matching
//! private key can delete the post. This crate provides:
//!
//! - **Signature verification**: ECDSA over a SHA-1 digest, P-256/P-384/P-521 keys in PEM
//! - **Fingerprints**: a stable, non-secret handle for listing an author's posts
//! - **Content identifiers**: deterministic UUIDs from `(key, title)`
//!
//! ## Example
//!
//! ```no_run
//! use postpigeon_authn::{deterministic_identifier, fingerprint, namespace_from_seed, verify_signature};
//!
//! # fn example(key_pem: &str, signature: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let body = "hello world";
//! verify_signature(key_pem, signature, body.as_bytes())?;
//!
//! let namespace = namespace_from_seed("post-pigeon-namespace")?;
//! let id = deterministic_identifier(key_pem, "Foo", &namespace)?;
//! let author = fingerprint(key_pem)?;
//! println!("{author} published {id}");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Authentication error types.
pub mod error;
/// Fingerprints and content identifiers.
pub mod identity;
/// PEM and SPKI decoding of author keys.
pub mod key;
/// Signature verification.
pub mod signature;
/// Shared test utilities.
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used, clippy::panic)]
pub mod testutil;

// Re-export key types for convenience
pub use error::{AuthError, Result};
pub use identity::{deterministic_identifier, fingerprint, namespace_from_seed};
pub use key::{Curve, PublicKey};
pub use signature::verify_signature;
