//! Tutor Completion - text-generation gateway for the pipeline
//!
//! Wraps the provider's single-turn chat completion behind the
//! [`CompletionGateway`] trait:
//! - Fixed tutor persona system instruction
//! - The question as the sole user message
//! - First choice's content, trimmed
//!
//! Failures are typed [`CompletionError`]s; the queue processor owns
//! the "no answer available, keep going" policy.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod gateway;
pub mod openai;

// Re-exports for convenience
pub use error::CompletionError;
pub use gateway::CompletionGateway;
pub use openai::{OpenAiGateway, TUTOR_SYSTEM_PROMPT};
