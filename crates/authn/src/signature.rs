//! Signature verification.
//!
//! Authors sign the SHA-1 digest of a message with ECDSA and submit the
//! ASN.1 DER signature as standard base64. Verification treats the message as
//! opaque bytes: no line-ending or Unicode normalization is applied, so the
//! exact bytes that were signed must be the bytes that are checked.

use base64::{Engine, engine::general_purpose::STANDARD};
use sha1::{Digest, Sha1};

use crate::{
    error::{AuthError, Result},
    key::PublicKey,
};

/// Verifies that `message` was signed by the holder of `public_key_pem`.
///
/// The signature is base64 text; CR and LF characters in it are ignored, as
/// produced by tools that wrap their output.
///
/// # Errors
///
/// - [`AuthError::InvalidKeyEncoding`] if the key is not a PEM-encoded EC public key
/// - [`AuthError::InvalidSignatureEncoding`] if the signature is not valid base64
/// - [`AuthError::SignatureMismatch`] if the signature does not verify
///
/// # Examples
///
/// ```
/// use postpigeon_authn::{AuthError, verify_signature};
///
/// let err = verify_signature("not a key", "AAAA", b"hello").unwrap_err();
/// assert!(matches!(err, AuthError::InvalidKeyEncoding(_)));
/// ```
#[tracing::instrument(level = "debug", skip_all, fields(message_len = message.len()))]
pub fn verify_signature(public_key_pem: &str, signature: &str, message: &[u8]) -> Result<()> {
    let key = PublicKey::from_pem(public_key_pem)?;
    let der = decode_signature(signature)?;
    let digest = Sha1::digest(message);
    let result = key.verify_digest(&digest, &der);
    if let Err(ref err) = result {
        tracing::debug!(curve = ?key.curve(), error = %err, "signature rejected");
    }
    result
}

/// Decodes base64 signature text, skipping CR and LF.
///
/// # Errors
///
/// Returns [`AuthError::InvalidSignatureEncoding`] on any other
/// non-alphabet character or bad padding.
pub fn decode_signature(signature: &str) -> Result<Vec<u8>> {
    let compact: String = signature.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|err| AuthError::invalid_signature(err.to_string()))
}
