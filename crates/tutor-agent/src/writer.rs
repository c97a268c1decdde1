//! Answer writer
//!
//! Turns a question and its generated answer into a uniquely named
//! artifact under the output directory and persists it through the
//! storage gateway.

use crate::error::AgentError;
use crate::paths::OUTPUT_DIR;
use std::sync::Arc;
use tutor_sandbox::StorageGateway;

/// Artifact file extension
const EXTENSION: &str = "md";

/// Derive the artifact slug from a question
///
/// Lowercases the question and collapses runs of whitespace into
/// single hyphens; punctuation is preserved.
#[must_use]
pub fn slugify(question: &str) -> String {
    question
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Build the artifact file name for a question
///
/// `<unixMillis>-<slug>.md`. Uniqueness is only probabilistic: two
/// equal-slug questions within the same millisecond collide and the
/// later write overwrites the earlier artifact.
#[must_use]
pub fn artifact_file_name(timestamp_ms: i64, question: &str) -> String {
    format!("{}-{}.{}", timestamp_ms, slugify(question), EXTENSION)
}

/// Persists generated answers as explanation artifacts
pub struct AnswerWriter {
    storage: Arc<dyn StorageGateway>,
    output_dir: String,
}

impl AnswerWriter {
    /// Create a writer targeting the explanations directory
    #[inline]
    #[must_use]
    pub fn new(storage: Arc<dyn StorageGateway>) -> Self {
        Self {
            storage,
            output_dir: OUTPUT_DIR.to_string(),
        }
    }

    /// Persist one answer
    ///
    /// Trims the answer text, builds the timestamped artifact path,
    /// and writes it through the storage gateway.
    ///
    /// # Returns
    /// The artifact path on success.
    ///
    /// # Errors
    /// - `AgentError::ArtifactWrite` if the write fails; the caller
    ///   must treat this as "artifact not created", no retry
    pub async fn save(&self, question: &str, answer: &str) -> Result<String, AgentError> {
        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        let path = format!(
            "{}/{}",
            self.output_dir,
            artifact_file_name(timestamp_ms, question)
        );

        self.storage
            .write_file(&path, answer.trim())
            .await
            .map_err(AgentError::ArtifactWrite)?;

        tracing::info!("explanation saved to {}", path);
        Ok(path)
    }
}
