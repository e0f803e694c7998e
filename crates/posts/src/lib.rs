//! # Post Pigeon Posts
//!
//! Anonymous, signature-gated publishing.
//!
//! Authors publish by signing the post body with an elliptic-curve key and
//! submitting the public key alongside. The same key, and only that key, can
//! later delete the post. Posts may carry an expiry, after which a background
//! [`Reaper`] removes them.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                       PostManager                         │
//! │  create / fetch / remove / list                           │
//! ├──────────────┬──────────────┬──────────────┬──────────────┤
//! │ ContentCache │   Renderer   │  Publisher   │ AuditLogger  │
//! │ (moka, LRU)  │ (PostPage,   │ (inline or   │ (tracing)    │
//! │              │  PostListing)│  BlobStore)  │              │
//! └──────┬───────┴──────────────┴──────────────┴──────────────┘
//!        │                           ▲
//!        ▼                           │ delete_expired
//! ┌──────────────┐            ┌──────┴───────┐
//! │  PostStore   │◄───────────│    Reaper    │
//! └──────────────┘            └──────────────┘
//! ```
//!
//! Signature checks and identifier derivation live in `postpigeon-authn`;
//! the store and blob collaborators live in `postpigeon-storage`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
/// Read-through content cache.
pub mod cache;
/// Service configuration.
pub mod config;
/// Post error types.
pub mod error;
pub mod expiration;
/// The post manager.
pub mod manager;
pub mod publish;
pub mod reaper;
pub mod render;
/// Author request types.
pub mod request;

pub use audit::{AuditLogger, NoopAuditLogger, TracingAuditLogger};
pub use cache::{CacheConfig, ContentCache};
pub use config::PostsConfig;
pub use error::{PostError, Result};
pub use expiration::Expiration;
pub use manager::PostManager;
pub use publish::{BlobPublisher, ContentPublisher, InlinePublisher};
pub use reaper::{Reaper, ReaperHandle};
pub use render::{ListingEntry, PlainRenderer, PostListing, PostPage, RenderError, Renderer};
pub use request::{CreatePostRequest, DeletePostRequest};
