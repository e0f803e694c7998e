//! Integration test verifying spans and audit events emitted by `PostManager`.

#![allow(clippy::expect_used)]

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex},
};

use postpigeon_authn::{
    Curve,
    testutil::{TestKeyPair, test_namespace},
};
use postpigeon_posts::{CacheConfig, ContentCache, CreatePostRequest, DeletePostRequest, PostManager, Reaper};
use postpigeon_storage::MemoryPostStore;
use tracing::{
    Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{layer::SubscriberExt, registry::LookupSpan};

// ---------------------------------------------------------------------------
// Collecting layer: records span names and audit event fields
// ---------------------------------------------------------------------------

type Fields = HashMap<String, String>;

#[derive(Clone, Default)]
struct Collector {
    spans: Arc<Mutex<Vec<String>>>,
    events: Arc<Mutex<Vec<Fields>>>,
}

struct FieldVisitor<'a>(&'a mut Fields);

impl Visit for FieldVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_owned(), format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_owned(), value.to_owned());
    }
}

impl<S> tracing_subscriber::Layer<S> for Collector
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        _attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if let Some(span) = ctx.span(id) {
            self.spans.lock().expect("lock poisoned").push(span.name().to_owned());
        }
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut fields = Fields::new();
        event.record(&mut FieldVisitor(&mut fields));
        self.events.lock().expect("lock poisoned").push(fields);
    }
}

impl Collector {
    fn audit_events(&self) -> Vec<Fields> {
        self.events
            .lock()
            .expect("lock poisoned")
            .iter()
            .filter(|fields| fields.get("message").is_some_and(|m| m == "audit_event"))
            .cloned()
            .collect()
    }

    fn spans(&self) -> Vec<String> {
        self.spans.lock().expect("lock poisoned").clone()
    }
}

fn manager() -> PostManager {
    PostManager::new(
        Arc::new(MemoryPostStore::new()),
        Arc::new(ContentCache::new(CacheConfig::default())),
        test_namespace(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn manager_operations_create_spans() {
    let collector = Collector::default();
    let subscriber = tracing_subscriber::registry().with(collector.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let manager = manager();
    let key = TestKeyPair::generate(Curve::P256);
    let id = manager
        .create_post(&CreatePostRequest::new("Foo", "hello", key.public_key_pem(), key.sign("hello")))
        .await
        .expect("create");
    let _ = manager.fetch_post_content(id).await;
    let _ = manager.remove_post(&DeletePostRequest::new(id, key.sign("hello"))).await;

    let recorded = collector.spans();
    for name in ["create_post", "fetch_post_content", "remove_post", "get_post", "delete_post"] {
        assert!(recorded.iter().any(|s| s == name), "expected a '{name}' span, got: {recorded:?}");
    }
}

#[tokio::test]
async fn mutations_emit_audit_events_without_secrets() {
    let collector = Collector::default();
    let subscriber = tracing_subscriber::registry().with(collector.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let manager = manager();
    let key = TestKeyPair::generate(Curve::P256);
    let signature = key.sign("hello");
    let id = manager
        .create_post(&CreatePostRequest::new("Foo", "hello", key.public_key_pem(), signature.clone()))
        .await
        .expect("create");
    let _ = manager.remove_post(&DeletePostRequest::new(id, key.sign("wrong"))).await;
    manager.remove_post(&DeletePostRequest::new(id, signature.clone())).await.expect("delete");

    let events = collector.audit_events();
    let summary: Vec<(String, String)> = events
        .iter()
        .map(|e| (e["audit.action"].clone(), e["audit.result"].clone()))
        .collect();
    assert_eq!(
        summary,
        [
            ("create_post".to_owned(), "success".to_owned()),
            ("delete_post".to_owned(), "denied".to_owned()),
            ("delete_post".to_owned(), "success".to_owned()),
        ]
    );

    let resource = format!("post:{id}");
    assert!(events.iter().all(|e| e["audit.resource"] == resource));
    for event in &events {
        for value in event.values() {
            assert!(!value.contains(&signature), "audit event leaked the signature");
            assert!(!value.contains("BEGIN PUBLIC KEY"), "audit event leaked the key");
        }
    }
}

#[tokio::test]
async fn sweep_logs_deleted_count() {
    let collector = Collector::default();
    let subscriber = tracing_subscriber::registry().with(collector.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let reaper = Reaper::new(Arc::new(MemoryPostStore::new()), std::time::Duration::from_secs(300));
    reaper.sweep().await.expect("sweep");

    assert!(collector.spans().iter().any(|s| s == "sweep"));
    let events = collector.events.lock().expect("lock poisoned");
    assert!(events.iter().any(|e| e.get("deleted").is_some_and(|d| d == "0")));
}
