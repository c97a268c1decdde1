//! Tutor Agent - event-triggered question-answering pipeline
//!
//! Watches the sandbox input directory for queue updates and, per
//! qualifying change event:
//! - Reads the pending questions
//! - Answers each one through the completion gateway, in file order
//! - Persists each answer as a timestamped explanation artifact
//! - Clears the queue
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tutor_agent::{QueueProcessor, WatchController, paths};
//!
//! # async fn example(
//! #     storage: Arc<dyn tutor_sandbox::StorageGateway>,
//! #     completion: Arc<dyn tutor_completion::CompletionGateway>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let processor = Arc::new(QueueProcessor::new(storage.clone(), completion));
//! let controller = WatchController::new(processor);
//!
//! let subscription = storage.watch_dir(paths::INPUT_DIR).await?;
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
//! controller.run(subscription, shutdown_rx).await;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod config;
pub mod error;
pub mod paths;
pub mod processor;
pub mod watcher;
pub mod writer;

// Re-exports for convenience
pub use config::{Config, ConfigError};
pub use error::AgentError;
pub use processor::{PassId, PassReport, QuestionOutcome, QueueProcessor};
pub use watcher::WatchController;
pub use writer::AnswerWriter;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
