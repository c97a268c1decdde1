//! Queue processor
//!
//! Drives one pass over the pending-questions queue:
//! - Read the queue file; split, trim, drop empty lines
//! - Answer each question strictly in file order, one at a time
//! - Persist non-empty answers as artifacts
//! - Audit the output directory, then clear the queue
//!
//! An empty queue is a designed no-op: no listing, no clearing
//! write. That invariant is what breaks the self-trigger cycle: the
//! clearing write re-fires the watcher, and the follow-up pass
//! observes an empty queue and stops.

use crate::error::AgentError;
use crate::paths::{OUTPUT_DIR, QUEUE_FILE};
use crate::writer::AnswerWriter;
use std::sync::Arc;
use tutor_completion::{CompletionError, CompletionGateway};
use tutor_sandbox::StorageGateway;
use ulid::Ulid;

/// Unique pass identifier (ULID for sortability in logs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PassId(pub Ulid);

impl PassId {
    /// Generate new pass ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for PassId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of one question within a pass
#[derive(Debug)]
pub enum QuestionOutcome {
    /// Answer generated and persisted
    Answered {
        /// The question text
        question: String,
        /// Path of the persisted artifact
        artifact: String,
    },
    /// No answer available: the provider failed or returned an empty
    /// completion; nothing was persisted
    NoAnswer {
        /// The question text
        question: String,
        /// The provider failure, `None` for an empty completion
        error: Option<CompletionError>,
    },
    /// An answer was generated but the artifact write failed
    WriteFailed {
        /// The question text
        question: String,
        /// The write failure
        error: AgentError,
    },
}

impl QuestionOutcome {
    /// Artifact path, when one was produced
    #[inline]
    #[must_use]
    pub fn artifact(&self) -> Option<&str> {
        match self {
            Self::Answered { artifact, .. } => Some(artifact),
            Self::NoAnswer { .. } | Self::WriteFailed { .. } => None,
        }
    }
}

/// Typed result of one pass
#[derive(Debug)]
pub struct PassReport {
    /// Pass identifier for log correlation
    pub id: PassId,
    /// Per-question outcomes, in file order
    pub outcomes: Vec<QuestionOutcome>,
}

impl PassReport {
    /// Report for a pass that found an empty queue
    #[inline]
    #[must_use]
    pub fn empty(id: PassId) -> Self {
        Self {
            id,
            outcomes: Vec::new(),
        }
    }

    /// Whether the queue was empty at pass start
    #[inline]
    #[must_use]
    pub fn queue_was_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Paths of artifacts produced this pass, in question order
    #[must_use]
    pub fn artifacts(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(QuestionOutcome::artifact)
            .collect()
    }

    /// Number of questions attempted this pass
    #[inline]
    #[must_use]
    pub fn questions_attempted(&self) -> usize {
        self.outcomes.len()
    }
}

/// Reads the queue, answers each question, persists, clears
pub struct QueueProcessor {
    storage: Arc<dyn StorageGateway>,
    completion: Arc<dyn CompletionGateway>,
    writer: AnswerWriter,
}

impl QueueProcessor {
    /// Create a processor with injected gateways
    #[must_use]
    pub fn new(
        storage: Arc<dyn StorageGateway>,
        completion: Arc<dyn CompletionGateway>,
    ) -> Self {
        let writer = AnswerWriter::new(storage.clone());
        Self {
            storage,
            completion,
            writer,
        }
    }

    /// Run one pass over the queue
    ///
    /// # Returns
    /// A [`PassReport`] with per-question outcomes. A failed question
    /// never aborts its siblings.
    ///
    /// # Errors
    /// - `AgentError::QueueRead` if the queue file cannot be read;
    ///   the pass-wide precondition
    /// - `AgentError::QueueClear` if the final clearing write fails
    pub async fn run_pass(&self) -> Result<PassReport, AgentError> {
        let id = PassId::new();

        let raw = self
            .storage
            .read_file(QUEUE_FILE)
            .await
            .map_err(AgentError::QueueRead)?;

        let questions: Vec<&str> = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        if questions.is_empty() {
            tracing::debug!("pass {}: queue empty, nothing to do", id);
            return Ok(PassReport::empty(id));
        }

        tracing::info!("pass {}: processing {} questions", id, questions.len());

        let mut outcomes = Vec::with_capacity(questions.len());
        for question in questions {
            outcomes.push(self.process_question(id, question).await);
        }

        self.audit_output(id).await;

        self.storage
            .write_file(QUEUE_FILE, "")
            .await
            .map_err(AgentError::QueueClear)?;
        tracing::info!("pass {}: queue cleared", id);

        Ok(PassReport { id, outcomes })
    }

    /// Answer one question and persist the result
    async fn process_question(&self, id: PassId, question: &str) -> QuestionOutcome {
        let answer = match self.completion.complete(question).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!("pass {}: completion failed for {:?}: {}", id, question, e);
                return QuestionOutcome::NoAnswer {
                    question: question.to_string(),
                    error: Some(e),
                };
            }
        };

        if answer.trim().is_empty() {
            tracing::warn!("pass {}: no answer available for {:?}", id, question);
            return QuestionOutcome::NoAnswer {
                question: question.to_string(),
                error: None,
            };
        }

        match self.writer.save(question, &answer).await {
            Ok(artifact) => QuestionOutcome::Answered {
                question: question.to_string(),
                artifact,
            },
            Err(e) => {
                tracing::error!("pass {}: artifact write failed for {:?}: {}", id, question, e);
                QuestionOutcome::WriteFailed {
                    question: question.to_string(),
                    error: e,
                }
            }
        }
    }

    /// Enumerate the output directory and fetch every artifact
    ///
    /// Observability only: failures are logged, never propagated.
    async fn audit_output(&self, id: PassId) {
        let entries = match self.storage.list_dir(OUTPUT_DIR).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("pass {}: listing {} failed: {}", id, OUTPUT_DIR, e);
                return;
            }
        };

        tracing::info!("pass {}: {} artifacts in {}", id, entries.len(), OUTPUT_DIR);
        for entry in entries {
            let path = format!("{OUTPUT_DIR}/{}", entry.name);
            match self.storage.read_file(&path).await {
                Ok(contents) => {
                    tracing::debug!("pass {}: {} ({} bytes)", id, path, contents.len());
                }
                Err(e) => {
                    tracing::warn!("pass {}: reading {} failed: {}", id, path, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tutor_test_utils::{FakeCompletion, MemorySandbox};

    fn processor_with(
        sandbox: &Arc<MemorySandbox>,
        completion: FakeCompletion,
    ) -> QueueProcessor {
        QueueProcessor::new(sandbox.clone(), Arc::new(completion))
    }

    #[tokio::test]
    async fn answers_every_question_in_file_order() {
        let sandbox = Arc::new(MemorySandbox::new());
        sandbox
            .write_file(QUEUE_FILE, "A\nB\nC\n")
            .await
            .unwrap();

        let completion = Arc::new(FakeCompletion::new());
        let processor = QueueProcessor::new(sandbox.clone(), completion.clone());

        let report = processor.run_pass().await.unwrap();

        assert_eq!(completion.prompts(), vec!["A", "B", "C"]);
        assert_eq!(report.artifacts().len(), 3);
        assert_eq!(sandbox.file(QUEUE_FILE).unwrap(), "");
    }

    #[tokio::test]
    async fn trims_lines_and_drops_empties() {
        let sandbox = Arc::new(MemorySandbox::new());
        sandbox
            .write_file(QUEUE_FILE, "\n  What is an AI agent?  \n\n\t\nWhy do we have leap years?\n")
            .await
            .unwrap();

        let completion = Arc::new(FakeCompletion::new());
        let processor = QueueProcessor::new(sandbox.clone(), completion.clone());

        let report = processor.run_pass().await.unwrap();

        assert_eq!(
            completion.prompts(),
            vec!["What is an AI agent?", "Why do we have leap years?"]
        );
        assert_eq!(report.questions_attempted(), 2);
    }

    #[tokio::test]
    async fn empty_queue_is_a_designed_no_op() {
        let sandbox = Arc::new(MemorySandbox::new());
        sandbox.write_file(QUEUE_FILE, "").await.unwrap();
        let writes_before = sandbox.writes().len();

        let processor = processor_with(&sandbox, FakeCompletion::new());
        let report = processor.run_pass().await.unwrap();

        assert!(report.queue_was_empty());
        assert!(report.artifacts().is_empty());
        // No clearing write happened, so the self-trigger cycle ends here
        assert_eq!(sandbox.writes().len(), writes_before);
    }

    #[tokio::test]
    async fn missing_queue_aborts_the_pass() {
        let sandbox = Arc::new(MemorySandbox::new());
        let processor = processor_with(&sandbox, FakeCompletion::new());

        let err = processor.run_pass().await.unwrap_err();
        assert!(matches!(err, AgentError::QueueRead(_)));
    }

    #[tokio::test]
    async fn empty_completions_skip_persistence_but_still_clear() {
        let sandbox = Arc::new(MemorySandbox::new());
        sandbox.write_file(QUEUE_FILE, "X\n").await.unwrap();

        let processor = processor_with(&sandbox, FakeCompletion::always_empty());
        let report = processor.run_pass().await.unwrap();

        assert!(report.artifacts().is_empty());
        assert!(matches!(
            report.outcomes[0],
            QuestionOutcome::NoAnswer { error: None, .. }
        ));
        // The queue was non-empty at pass start, so it still clears
        assert_eq!(sandbox.file(QUEUE_FILE).unwrap(), "");
    }

    #[tokio::test]
    async fn provider_failure_never_aborts_siblings() {
        let sandbox = Arc::new(MemorySandbox::new());
        sandbox.write_file(QUEUE_FILE, "A\nB\nC\n").await.unwrap();

        let completion = FakeCompletion::scripted(vec![
            Ok("first answer".to_string()),
            Err(429),
            Ok("third answer".to_string()),
        ]);
        let processor = processor_with(&sandbox, completion);

        let report = processor.run_pass().await.unwrap();

        assert_eq!(report.questions_attempted(), 3);
        assert_eq!(report.artifacts().len(), 2);
        assert!(matches!(
            report.outcomes[1],
            QuestionOutcome::NoAnswer { error: Some(_), .. }
        ));
    }

    #[tokio::test]
    async fn failing_provider_produces_no_artifacts_but_clears() {
        let sandbox = Arc::new(MemorySandbox::new());
        sandbox.write_file(QUEUE_FILE, "X\n").await.unwrap();

        let processor = processor_with(&sandbox, FakeCompletion::always_failing());
        let report = processor.run_pass().await.unwrap();

        assert!(report.artifacts().is_empty());
        assert_eq!(sandbox.file(QUEUE_FILE).unwrap(), "");
    }

    #[tokio::test]
    async fn write_failure_is_distinguishable_from_no_answer() {
        let sandbox = Arc::new(MemorySandbox::new());
        sandbox.write_file(QUEUE_FILE, "X\n").await.unwrap();
        sandbox.fail_writes_under("explanations/");

        let processor = processor_with(&sandbox, FakeCompletion::new());
        let report = processor.run_pass().await.unwrap();

        assert!(matches!(
            report.outcomes[0],
            QuestionOutcome::WriteFailed { .. }
        ));
        assert!(report.artifacts().is_empty());
        assert_eq!(sandbox.file(QUEUE_FILE).unwrap(), "");
    }

    #[tokio::test]
    async fn artifact_timestamps_follow_question_order() {
        let sandbox = Arc::new(MemorySandbox::new());
        sandbox.write_file(QUEUE_FILE, "A\nB\nC\n").await.unwrap();

        let processor = processor_with(&sandbox, FakeCompletion::new());
        let report = processor.run_pass().await.unwrap();

        let stamps: Vec<i64> = report
            .artifacts()
            .iter()
            .map(|path| {
                path.rsplit('/')
                    .next()
                    .unwrap()
                    .split('-')
                    .next()
                    .unwrap()
                    .parse()
                    .unwrap()
            })
            .collect();
        assert_eq!(stamps.len(), 3);
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }
}
