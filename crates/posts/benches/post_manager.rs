#![allow(clippy::expect_used)]

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use postpigeon_authn::{
    Curve, deterministic_identifier,
    testutil::{P521_MESSAGE, P521_PUBLIC_KEY_PEM, P521_SIGNATURE, TestKeyPair, test_namespace},
    verify_signature,
};
use postpigeon_posts::{CacheConfig, ContentCache, CreatePostRequest, PostManager};
use postpigeon_storage::{MemoryPostStore, PostId};
use tokio::runtime::Runtime;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn rt() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to create tokio runtime")
}

fn manager() -> PostManager {
    PostManager::new(
        Arc::new(MemoryPostStore::new()),
        Arc::new(ContentCache::new(CacheConfig::default())),
        test_namespace(),
    )
}

fn body(size: usize) -> String {
    "lorem ipsum ".repeat(size / 12 + 1)[..size].to_owned()
}

fn published(rt: &Runtime, manager: &PostManager, key: &TestKeyPair, size: usize) -> PostId {
    let body = body(size);
    let request = CreatePostRequest::new("bench", body.as_str(), key.public_key_pem(), key.sign(&body));
    rt.block_on(manager.create_post(&request)).expect("create failed")
}

// ---------------------------------------------------------------------------
// 1. signature verification
// ---------------------------------------------------------------------------

fn verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("verify_signature");

    for curve in [Curve::P256, Curve::P384] {
        let key = TestKeyPair::generate(curve);
        let pem = key.public_key_pem();
        let signature = key.sign("hello world");
        group.bench_function(format!("{curve:?}"), |b| {
            b.iter(|| verify_signature(&pem, &signature, b"hello world").expect("verify failed"));
        });
    }

    group.bench_function("P521", |b| {
        b.iter(|| {
            verify_signature(P521_PUBLIC_KEY_PEM, P521_SIGNATURE, P521_MESSAGE.as_bytes()).expect("verify failed");
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// 2. identifier derivation
// ---------------------------------------------------------------------------

fn identifiers(c: &mut Criterion) {
    let namespace = test_namespace();
    c.bench_function("deterministic_identifier", |b| {
        b.iter(|| deterministic_identifier(P521_PUBLIC_KEY_PEM, "hello world", &namespace).expect("derive failed"));
    });
}

// ---------------------------------------------------------------------------
// 3. fetch: cache hit vs store read
// ---------------------------------------------------------------------------

fn fetch(c: &mut Criterion) {
    let mut group = c.benchmark_group("fetch_post_content");
    let rt = rt();
    let key = TestKeyPair::generate(Curve::P256);

    for &size in &[256usize, 4_096, 15_000] {
        let manager = manager();
        let id = published(&rt, &manager, &key, size);
        rt.block_on(manager.fetch_post_content(id)).expect("warm failed");

        let manager = &manager;
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("cache_hit", size), &size, |b, _| {
            b.to_async(&rt).iter(move || async move {
                manager.fetch_post_content(id).await.expect("fetch failed");
            });
        });
        group.bench_with_input(BenchmarkId::new("cache_miss", size), &size, |b, _| {
            b.to_async(&rt).iter(move || async move {
                manager.cache().invalidate(id);
                manager.fetch_post_content(id).await.expect("fetch failed");
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// 4. create
// ---------------------------------------------------------------------------

fn create(c: &mut Criterion) {
    let rt = rt();
    let manager = manager();
    let key = TestKeyPair::generate(Curve::P256);
    let pem = key.public_key_pem();
    let body = body(1_024);
    let signature = key.sign(&body);
    let counter = AtomicU64::new(0);
    let manager = &manager;

    c.bench_function("create_post", |b| {
        b.to_async(&rt).iter(|| {
            let title = format!("post-{}", counter.fetch_add(1, Ordering::Relaxed));
            let request = CreatePostRequest::new(title, body.as_str(), pem.as_str(), signature.as_str());
            async move {
                manager.create_post(&request).await.expect("create failed");
            }
        });
    });
}

criterion_group!(benches, verification, identifiers, fetch, create);
criterion_main!(benches);
