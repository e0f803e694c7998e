//! Audit trail for post mutations.
//!
//! Every create and delete attempt, successful or not, produces one
//! [`AuditEvent`]. The actor is the author fingerprint when it is known.
//! Signatures, keys and bodies never appear in events.
//!
//! # Usage
//!
//! ```no_run
//! use postpigeon_posts::audit::{AuditAction, AuditEvent, AuditLogger, AuditResult, TracingAuditLogger};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let event = AuditEvent::builder()
//!     .actor("FInWS6T-2_tTfzCteUyK0rQJelfKw7b9vhD6QlFiaoM")
//!     .action(AuditAction::CreatePost)
//!     .resource("post:51cd149c-68ee-55a4-b58b-68f918f994a9")
//!     .result(AuditResult::Success)
//!     .build();
//! TracingAuditLogger.log(&event).await;
//! # });
//! ```

use std::{collections::BTreeMap, fmt};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use postpigeon_storage::PostId;

/// Actor recorded when no fingerprint is available.
pub const ANONYMOUS_ACTOR: &str = "anonymous";

/// Audited post operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    /// A post was published.
    CreatePost,
    /// A post was deleted by its author.
    DeletePost,
    /// Expired posts were swept.
    ReapExpired,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreatePost => write!(f, "create_post"),
            Self::DeletePost => write!(f, "delete_post"),
            Self::ReapExpired => write!(f, "reap_expired"),
        }
    }
}

/// Outcome of an audited operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditResult {
    /// Operation completed.
    Success,
    /// Ownership could not be established.
    Denied,
    /// Operation failed with the given reason.
    Failure(String),
}

impl fmt::Display for AuditResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Denied => write!(f, "denied"),
            Self::Failure(reason) => write!(f, "failure: {reason}"),
        }
    }
}

/// One audited operation.
#[derive(Debug, Clone, bon::Builder)]
pub struct AuditEvent {
    /// When the event occurred (defaults to now).
    #[builder(default = Utc::now())]
    pub timestamp: DateTime<Utc>,
    /// Author fingerprint, or [`ANONYMOUS_ACTOR`].
    #[builder(into)]
    pub actor: String,
    /// The operation.
    pub action: AuditAction,
    /// Affected resource, see [`post_resource`].
    #[builder(into)]
    pub resource: String,
    /// Outcome.
    pub result: AuditResult,
    /// Extra context such as a reaped count.
    #[builder(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Sink for audit events.
#[async_trait]
pub trait AuditLogger: Send + Sync {
    /// Records an event.
    async fn log(&self, event: &AuditEvent);
}

#[async_trait]
impl<L: AuditLogger> AuditLogger for std::sync::Arc<L> {
    async fn log(&self, event: &AuditEvent) {
        (**self).log(event).await;
    }
}

/// Emits events as `INFO` tracing events named `audit_event`.
///
/// Fields: `audit.timestamp`, `audit.actor`, `audit.action`,
/// `audit.resource`, `audit.result`, `audit.metadata`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditLogger;

#[async_trait]
impl AuditLogger for TracingAuditLogger {
    async fn log(&self, event: &AuditEvent) {
        let metadata = event.metadata.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(", ");

        tracing::info!(
            audit.timestamp = %event.timestamp.to_rfc3339(),
            audit.actor = %event.actor,
            audit.action = %event.action,
            audit.resource = %event.resource,
            audit.result = %event.result,
            audit.metadata = %metadata,
            "audit_event"
        );
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditLogger;

#[async_trait]
impl AuditLogger for NoopAuditLogger {
    async fn log(&self, _event: &AuditEvent) {}
}

/// Resource identifier of a post.
#[must_use]
pub fn post_resource(id: PostId) -> String {
    format!("post:{id}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use postpigeon_storage::testutil::make_post_id;

    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<AuditEvent>>);

    #[async_trait]
    impl AuditLogger for Recorder {
        async fn log(&self, event: &AuditEvent) {
            self.0.lock().push(event.clone());
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(AuditAction::CreatePost.to_string(), "create_post");
        assert_eq!(AuditAction::DeletePost.to_string(), "delete_post");
        assert_eq!(AuditAction::ReapExpired.to_string(), "reap_expired");
        assert_eq!(AuditResult::Denied.to_string(), "denied");
        assert_eq!(AuditResult::Failure("store down".to_owned()).to_string(), "failure: store down");
    }

    #[test]
    fn test_builder_defaults() {
        let id = make_post_id("alice", "Foo");
        let event = AuditEvent::builder()
            .actor(ANONYMOUS_ACTOR)
            .action(AuditAction::DeletePost)
            .resource(post_resource(id))
            .result(AuditResult::Denied)
            .build();

        assert_eq!(event.resource, format!("post:{id}"));
        assert!(event.metadata.is_empty());
        assert!((Utc::now() - event.timestamp).num_seconds() < 2);
    }

    #[tokio::test]
    async fn test_arc_logger_forwards() {
        let recorder = Arc::new(Recorder::default());
        let logger: Box<dyn AuditLogger> = Box::new(Arc::clone(&recorder));

        let event = AuditEvent::builder()
            .actor("fp")
            .action(AuditAction::ReapExpired)
            .resource("posts")
            .result(AuditResult::Success)
            .metadata(BTreeMap::from([("count".to_owned(), "3".to_owned())]))
            .build();
        logger.log(&event).await;
        NoopAuditLogger.log(&event).await;

        let recorded = recorder.0.lock();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].metadata.get("count").map(String::as_str), Some("3"));
    }
}
