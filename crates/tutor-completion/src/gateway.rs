//! Completion gateway capability interface

use crate::error::CompletionError;
use async_trait::async_trait;

/// Capability interface over the text-completion provider
///
/// Injected into the queue processor as `Arc<dyn CompletionGateway>`
/// so tests substitute scripted fakes for the real provider.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Generate an answer for one question
    ///
    /// # Returns
    /// The generated text, trimmed. An empty string is a valid
    /// provider outcome and means "no answer available"; callers
    /// must never persist it as an answer.
    ///
    /// # Errors
    /// Any provider failure (network, auth, rate limit, malformed
    /// response) as a typed [`CompletionError`].
    async fn complete(&self, question: &str) -> Result<String, CompletionError>;
}
