//! Shared test utilities for signature and identity testing.
//!
//! This module provides key pairs that sign messages the way clients do
//! (SHA-1 digest, ASN.1 DER signature, standard base64), a fixed P-521 test
//! vector, and the namespace used by regression tests. It is feature-gated
//! behind `testutil` to prevent leaking into production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! postpigeon-authn = { path = "../authn", features = ["testutil"] }
//! ```
//!
//! Then import helpers:
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use postpigeon_authn::testutil::{TestKeyPair, test_namespace};
//! ```

use base64::{Engine, engine::general_purpose::STANDARD};
use ecdsa::signature::hazmat::PrehashSigner;
use p256::pkcs8::{EncodePublicKey, LineEnding};
use rand_core::OsRng;
use sha1::{Digest, Sha1};
use uuid::Uuid;

use crate::{
    identity::namespace_from_seed,
    key::{Curve, field_prehash},
};

/// PEM public key on P-521 used by the fixed test vector.
pub const P521_PUBLIC_KEY_PEM: &str = "-----BEGIN PUBLIC KEY-----\nMIGbMBAGByqGSM49AgEGBSuBBAAjA4GGAAQAdI8T8Vfccs6rWACR3b5o3MuVkYjf\ngN2nnYAXYNC4fIVWgyfEeTYIGIjLxEB9BLquMld4Je+1vITaNQWfuRTD2HcBax6N\nRwxwcNGqwoJNWpCry9AXxRiDACkks9I2f08BIIHlOCLnPUfIWrASmuNGhyWtSUtA\nJrEKBzI+y/fyWp7z09U=\n-----END PUBLIC KEY-----";

/// Message signed by [`P521_SIGNATURE`].
pub const P521_MESSAGE: &str = "HELLO";

/// Base64 signature of [`P521_MESSAGE`] under [`P521_PUBLIC_KEY_PEM`], with
/// the trailing newline a command-line signer leaves behind.
pub const P521_SIGNATURE: &str = "MIGIAkIA1kTl7BljHlrQ6uL04hGavPXWv+g1/NOBhPqRwldmg5pjPhC3YFxxnMtBNkfJcZJPxxNcsu9Ydr8KCej3wR+yHu4CQgH18fTvqze6qo3Z1q13m1Cjwz2BnFf9ZY6cPRLuIP6NIXsi0nbqeAHzcZqaayGa5Rm1ouzBCnCkAoxLn6hN0nT9vQ==\n";

/// Namespace seed used by regression tests.
pub const TEST_NAMESPACE_SEED: &str = "post-pigeon-namespace";

/// The namespace UUID derived from [`TEST_NAMESPACE_SEED`].
///
/// # Panics
///
/// Never in practice; the seed is longer than 16 bytes.
#[must_use]
pub fn test_namespace() -> Uuid {
    namespace_from_seed(TEST_NAMESPACE_SEED).expect("test namespace seed is valid")
}

/// A freshly generated ECDSA key pair.
#[derive(Clone)]
pub enum TestKeyPair {
    /// P-256 key pair.
    P256(p256::ecdsa::SigningKey),
    /// P-384 key pair.
    P384(p384::ecdsa::SigningKey),
}

impl std::fmt::Debug for TestKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TestKeyPair").field(&self.curve()).finish()
    }
}

impl TestKeyPair {
    /// Generates a random key pair on `curve`.
    ///
    /// # Panics
    ///
    /// Panics for [`Curve::P521`]; use the fixed P-521 vector instead.
    #[must_use]
    pub fn generate(curve: Curve) -> Self {
        match curve {
            Curve::P256 => Self::P256(p256::ecdsa::SigningKey::random(&mut OsRng)),
            Curve::P384 => Self::P384(p384::ecdsa::SigningKey::random(&mut OsRng)),
            Curve::P521 => panic!("P-521 key generation is not supported in tests"),
        }
    }

    /// The curve of this key pair.
    #[must_use]
    pub fn curve(&self) -> Curve {
        match self {
            Self::P256(_) => Curve::P256,
            Self::P384(_) => Curve::P384,
        }
    }

    /// The public key as an SPKI PEM block with LF line endings.
    ///
    /// # Panics
    ///
    /// Panics if PEM encoding fails (should not happen for valid keys).
    #[must_use]
    pub fn public_key_pem(&self) -> String {
        match self {
            Self::P256(key) => key.verifying_key().to_public_key_pem(LineEnding::LF),
            Self::P384(key) => key.verifying_key().to_public_key_pem(LineEnding::LF),
        }
        .expect("public key PEM encoding failed")
    }

    /// Signs `message` and returns the base64 DER signature.
    #[must_use]
    pub fn sign(&self, message: &str) -> String {
        self.sign_bytes(message.as_bytes())
    }

    /// Signs raw bytes and returns the base64 DER signature.
    ///
    /// # Panics
    ///
    /// Panics if signing fails (should not happen for valid keys).
    #[must_use]
    pub fn sign_bytes(&self, message: &[u8]) -> String {
        let digest = Sha1::digest(message);
        let der = match self {
            Self::P256(key) => {
                let sig: p256::ecdsa::Signature =
                    key.sign_prehash(&field_prehash::<32>(&digest)).expect("P-256 signing failed");
                sig.to_der().as_bytes().to_vec()
            },
            Self::P384(key) => {
                let sig: p384::ecdsa::Signature =
                    key.sign_prehash(&field_prehash::<48>(&digest)).expect("P-384 signing failed");
                sig.to_der().as_bytes().to_vec()
            },
        };
        STANDARD.encode(der)
    }
}
