//! Tutor Sandbox - storage gateway for the pipeline
//!
//! Narrow capability interface over the remote sandboxed filesystem:
//! - Idempotent directory creation
//! - File read/write/list
//! - Directory watching with explicit subscription lifecycle
//!
//! The pipeline only ever talks to storage through the
//! [`StorageGateway`] trait, so tests can substitute an in-memory
//! implementation and production uses [`RemoteSandbox`].

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod gateway;
pub mod remote;

// Re-exports for convenience
pub use error::StorageError;
pub use gateway::{
    ChangeEvent, DirEntry, FileOperation, StorageGateway, WatchSubscription,
};
pub use remote::RemoteSandbox;
