//! Storage gateway capability interface
//!
//! Defines the narrow contract the pipeline needs from the sandboxed
//! filesystem:
//! - `make_dir` is idempotent ("already exists" is success)
//! - `read_file` fails with [`StorageError::NotFound`] for absent paths
//! - `write_file` creates or overwrites
//! - `watch_dir` yields [`ChangeEvent`]s until the subscription stops

use crate::error::StorageError;
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

/// Kind of filesystem mutation carried by a change event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    /// A new entry appeared
    Create,
    /// An existing entry's contents changed
    Write,
    /// An entry disappeared
    Remove,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Write => write!(f, "write"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

/// Notification of a filesystem mutation on a watched path
///
/// Transient: consumed once by the watch controller, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Sandbox-relative path the mutation happened on
    pub path: String,
    /// Kind of mutation
    pub operation: FileOperation,
}

impl ChangeEvent {
    /// Create a change event
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<String>, operation: FileOperation) -> Self {
        Self {
            path: path.into(),
            operation,
        }
    }
}

/// Directory listing entry
///
/// Carries the metadata the polling watcher diffs between snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name, relative to the listed directory
    pub name: String,
    /// Entry size in bytes
    pub size: u64,
    /// Last-modified time, unix milliseconds
    pub modified_ms: i64,
}

/// Live subscription to change events on one directory
///
/// Events arrive through [`recv`](Self::recv); [`stop`](Self::stop)
/// tears the subscription down explicitly. Dropping the subscription
/// also stops the producer (its channel closes).
#[derive(Debug)]
pub struct WatchSubscription {
    events: mpsc::Receiver<ChangeEvent>,
    stop: Option<oneshot::Sender<()>>,
}

impl WatchSubscription {
    /// Assemble a subscription from its channel halves
    #[inline]
    #[must_use]
    pub fn new(events: mpsc::Receiver<ChangeEvent>, stop: oneshot::Sender<()>) -> Self {
        Self {
            events,
            stop: Some(stop),
        }
    }

    /// Receive the next change event
    ///
    /// Returns `None` once the producer has stopped and the channel
    /// is drained.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Stop the subscription
    ///
    /// Signals the producer to shut down. Events already queued are
    /// discarded with the receiver.
    pub fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

/// Capability interface over the remote sandbox filesystem
///
/// Every method is a suspension point; the pipeline holds the gateway
/// as `Arc<dyn StorageGateway>` so tests can substitute fakes.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Create a directory, tolerating "already exists"
    async fn make_dir(&self, path: &str) -> Result<(), StorageError>;

    /// Read a file's full contents as text
    ///
    /// # Errors
    /// - `StorageError::NotFound` if the path is absent
    async fn read_file(&self, path: &str) -> Result<String, StorageError>;

    /// Write text to a file, creating or overwriting it
    async fn write_file(&self, path: &str, contents: &str) -> Result<(), StorageError>;

    /// List a directory's entries
    async fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, StorageError>;

    /// Subscribe to change events on a directory
    ///
    /// # Errors
    /// - `StorageError::WatchFailed` if the subscription cannot be
    ///   established; callers treat this as fatal (no trigger
    ///   mechanism exists without it)
    async fn watch_dir(&self, path: &str) -> Result<WatchSubscription, StorageError>;
}
