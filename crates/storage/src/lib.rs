//! Post records and storage collaborators for Post Pigeon.
//!
//! This crate defines the records a published post is made of, the
//! [`PostStore`] and [`BlobStore`] traits the rest of the system persists
//! through, and in-memory implementations of both.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    postpigeon-posts                         │
//! │        PostManager │ ContentCache │ Reaper │ Publishers     │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   postpigeon-storage                        │
//! │            PostStore trait │ BlobStore trait                │
//! ├──────────────────────┬──────────────────────────────────────┤
//! │   MemoryPostStore    │        relational store              │
//! │   MemoryBlobStore    │        object storage                │
//! │   (testing)          │        (deployment-provided)         │
//! └──────────────────────┴──────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use postpigeon_storage::{MemoryPostStore, PostStore, testutil::make_new_post};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryPostStore::new();
//!     let new_post = make_new_post("alice", "Foo", "hello world", None);
//!
//!     store.create_post(&new_post).await?;
//!     let content = store.get_post_content(new_post.id()).await?;
//!     assert_eq!(content.map(|c| c.raw_body), Some("hello world".to_owned()));
//!
//!     assert!(store.delete_post(new_post.id()).await?);
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! All operations return [`StorageResult<T>`]. Absence is `Ok(None)`, never
//! an error.
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` module with record builders, a failure-injecting store
//!   and assertion macros. Enable this in `[dev-dependencies]` for integration tests.
//! - **`failpoints`**: Compiles the `fail` crate's injection points into [`MemoryPostStore`].

#![deny(unsafe_code)]

pub mod backend;
pub mod blob;
pub mod error;
pub mod memory;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used, clippy::panic)]
pub mod testutil;
pub mod types;

// Re-export primary types at crate root for convenience
pub use backend::PostStore;
pub use blob::{BlobStore, MemoryBlobStore};
pub use error::{BoxError, ConfigError, StorageError, StorageResult};
pub use memory::MemoryPostStore;
pub use types::{Fingerprint, NewPost, Post, PostContent, PostId, PostSummary, RenderedBody};
