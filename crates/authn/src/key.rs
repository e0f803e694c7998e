//! PEM decoding of author public keys.
//!
//! Authors submit keys as PEM `PUBLIC KEY` blocks carrying a DER
//! `SubjectPublicKeyInfo`. Keys on NIST P-256, P-384 and P-521 are accepted.

use ecdsa::signature::hazmat::PrehashVerifier;
use p256::pkcs8::DecodePublicKey;
use p521::NistP521;

use crate::error::{AuthError, Result};

/// Curves an author key may be on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    /// NIST P-256 (secp256r1).
    P256,
    /// NIST P-384 (secp384r1).
    P384,
    /// NIST P-521 (secp521r1).
    P521,
}

impl Curve {
    /// Size in bytes of a serialized field element.
    #[must_use]
    pub const fn field_size(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }
}

/// A decoded author public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    /// Key on P-256.
    P256(p256::ecdsa::VerifyingKey),
    /// Key on P-384.
    P384(p384::ecdsa::VerifyingKey),
    /// Key on P-521.
    P521(ecdsa::VerifyingKey<NistP521>),
}

impl PublicKey {
    /// Decodes the first PEM block in `text` as an EC public key.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidKeyEncoding`] if no PEM block is found or
    /// its contents are not an SPKI key on a supported curve.
    pub fn from_pem(text: &str) -> Result<Self> {
        let der = pem_contents(text)?;
        Self::from_spki_der(&der)
    }

    /// Decodes a DER `SubjectPublicKeyInfo`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidKeyEncoding`] if the structure does not
    /// hold a point on a supported curve.
    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        if let Ok(key) = p256::ecdsa::VerifyingKey::from_public_key_der(der) {
            return Ok(Self::P256(key));
        }
        if let Ok(key) = p384::ecdsa::VerifyingKey::from_public_key_der(der) {
            return Ok(Self::P384(key));
        }
        if let Ok(key) = ecdsa::VerifyingKey::<NistP521>::from_public_key_der(der) {
            return Ok(Self::P521(key));
        }
        Err(AuthError::invalid_key("not an EC public key on P-256, P-384 or P-521"))
    }

    /// The curve this key is on.
    #[must_use]
    pub fn curve(&self) -> Curve {
        match self {
            Self::P256(_) => Curve::P256,
            Self::P384(_) => Curve::P384,
            Self::P521(_) => Curve::P521,
        }
    }

    /// Verifies an ASN.1 DER signature over a message digest.
    ///
    /// The digest is converted to a field element the usual ECDSA way: a
    /// digest shorter than the field is read as a big-endian integer, a longer
    /// one is truncated to its leftmost bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SignatureMismatch`] if the signature is not valid
    /// DER or does not verify.
    pub fn verify_digest(&self, digest: &[u8], der_signature: &[u8]) -> Result<()> {
        let outcome = match self {
            Self::P256(key) => p256::ecdsa::Signature::from_der(der_signature)
                .and_then(|sig| key.verify_prehash(&field_prehash::<32>(digest), &sig)),
            Self::P384(key) => p384::ecdsa::Signature::from_der(der_signature)
                .and_then(|sig| key.verify_prehash(&field_prehash::<48>(digest), &sig)),
            Self::P521(key) => ecdsa::Signature::<NistP521>::from_der(der_signature)
                .and_then(|sig| key.verify_prehash(&field_prehash::<66>(digest), &sig)),
        };
        outcome.map_err(|_| AuthError::SignatureMismatch)
    }
}

/// Returns the decoded bytes of the first PEM block in `text`.
///
/// Text before the block is skipped; the block label is not checked.
///
/// # Errors
///
/// Returns [`AuthError::InvalidKeyEncoding`] if no well-formed PEM block is found.
pub fn pem_contents(text: &str) -> Result<Vec<u8>> {
    pem::parse(text)
        .map(pem::Pem::into_contents)
        .map_err(|err| AuthError::invalid_key(format!("no PEM block found: {err}")))
}

// Zero-extends on the left so the integer value of the digest is unchanged.
pub(crate) fn field_prehash<const N: usize>(digest: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    let len = digest.len().min(N);
    out[N - len..].copy_from_slice(&digest[..len]);
    out
}
