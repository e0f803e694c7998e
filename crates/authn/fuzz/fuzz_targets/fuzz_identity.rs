//! Fuzz target for identity derivation.
//!
//! Feeds arbitrary text as keys, titles and namespace seeds. Derivation must
//! never panic, and identifiers must be reproducible for the same input.

#![no_main]

use libfuzzer_sys::fuzz_target;
use postpigeon_authn::{deterministic_identifier, fingerprint, namespace_from_seed};
use uuid::Uuid;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let (key, title) = text.split_once('\n').unwrap_or((text, ""));

    let _ = fingerprint(key);
    let _ = namespace_from_seed(title);

    let first = deterministic_identifier(key, title, &Uuid::NAMESPACE_OID);
    let second = deterministic_identifier(key, title, &Uuid::NAMESPACE_OID);
    assert_eq!(first, second, "identifier derivation must be deterministic");
});
