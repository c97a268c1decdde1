//! Error types for the pipeline
//!
//! The taxonomy follows the operational boundaries:
//! - Queue read failures abort a whole pass (no questions are known)
//! - Artifact write failures cost one question, siblings continue
//! - Setup failures (directories, watch subscription) surface as-is

use tutor_sandbox::StorageError;

/// Pipeline error type
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The queue file could not be read; aborts the pass
    #[error("queue read failed: {0}")]
    QueueRead(#[source] StorageError),

    /// The clearing write of the queue file failed
    #[error("queue clear failed: {0}")]
    QueueClear(#[source] StorageError),

    /// An answer artifact could not be persisted
    #[error("artifact write failed: {0}")]
    ArtifactWrite(#[source] StorageError),

    /// Storage failure outside a specific pass step
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
