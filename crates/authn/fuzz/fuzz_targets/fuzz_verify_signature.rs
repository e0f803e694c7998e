//! Fuzz target for signature verification.
//!
//! Splits arbitrary bytes into a key, a signature and a message and feeds
//! them to the verifier. Every result must be either `Ok(())` or
//! `Err(AuthError)`; panics and hangs are bugs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use postpigeon_authn::{PublicKey, signature::decode_signature, verify_signature};

fuzz_target!(|data: &[u8]| {
    // Inputs arrive as text from the request layer
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let mut parts = text.splitn(3, '\u{0}');
    let key = parts.next().unwrap_or_default();
    let signature = parts.next().unwrap_or_default();
    let message = parts.next().unwrap_or_default();

    let _ = PublicKey::from_pem(key);
    let _ = decode_signature(signature);
    let _ = verify_signature(key, signature, message.as_bytes());
});
