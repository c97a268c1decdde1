//! Watch controller
//!
//! Owns the change-event subscription and the trigger policy:
//! - Filter: queue-file path AND write operation
//! - One-pass-at-a-time gate: a qualifying event during an in-flight
//!   pass defers a single follow-up pass instead of overlapping
//! - Pass failures are logged, never kill the watch loop
//! - Graceful shutdown drains the in-flight pass before stopping the
//!   subscription

use crate::error::AgentError;
use crate::paths::QUEUE_FILE;
use crate::processor::{PassReport, QueueProcessor};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tutor_sandbox::{ChangeEvent, FileOperation, WatchSubscription};

/// Applies the trigger policy and drives the queue processor
pub struct WatchController {
    processor: Arc<QueueProcessor>,
}

impl WatchController {
    /// Create a controller over an injected processor
    #[inline]
    #[must_use]
    pub fn new(processor: Arc<QueueProcessor>) -> Self {
        Self { processor }
    }

    /// Whether an event qualifies as a trigger
    ///
    /// Only a write to the queue file itself counts; artifact
    /// creation and unrelated input-directory churn do not.
    #[inline]
    #[must_use]
    pub fn matches(event: &ChangeEvent) -> bool {
        event.path == QUEUE_FILE && event.operation == FileOperation::Write
    }

    /// Run the trigger loop until shutdown
    ///
    /// Consumes events from `subscription`; on each qualifying event
    /// either spawns a pass or, if one is already in flight, defers a
    /// single follow-up pass. Deferred triggers coalesce: a pass
    /// drains the whole queue, so one follow-up covers any number of
    /// events that arrived during the in-flight pass.
    ///
    /// Returns once `shutdown` fires (or the event source ends) and
    /// the in-flight pass, if any, has been drained.
    pub async fn run(
        &self,
        mut subscription: WatchSubscription,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let (done_tx, mut done_rx) = mpsc::channel::<Result<PassReport, AgentError>>(1);
        let mut in_flight: Option<JoinHandle<()>> = None;
        let mut rerun_pending = false;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
                event = subscription.recv() => {
                    let Some(event) = event else {
                        tracing::warn!("event source ended");
                        break;
                    };
                    if !Self::matches(&event) {
                        tracing::debug!("ignoring {} on {}", event.operation, event.path);
                        continue;
                    }
                    if in_flight.is_some() {
                        // The running pass may already have read the
                        // queue; a follow-up pass picks up whatever
                        // this event enqueued.
                        tracing::debug!("pass in flight, deferring trigger");
                        rerun_pending = true;
                    } else {
                        in_flight = Some(self.spawn_pass(done_tx.clone()));
                    }
                }
                result = done_rx.recv() => {
                    let Some(result) = result else { break };
                    if let Some(handle) = in_flight.take() {
                        let _ = handle.await;
                    }
                    log_pass_result(&result);
                    if rerun_pending {
                        rerun_pending = false;
                        in_flight = Some(self.spawn_pass(done_tx.clone()));
                    }
                }
            }
        }

        if let Some(handle) = in_flight {
            tracing::info!("draining in-flight pass");
            let _ = handle.await;
            if let Some(result) = done_rx.recv().await {
                log_pass_result(&result);
            }
        }
        subscription.stop();
    }

    fn spawn_pass(
        &self,
        done_tx: mpsc::Sender<Result<PassReport, AgentError>>,
    ) -> JoinHandle<()> {
        let processor = self.processor.clone();
        tokio::spawn(async move {
            let result = processor.run_pass().await;
            let _ = done_tx.send(result).await;
        })
    }
}

fn log_pass_result(result: &Result<PassReport, AgentError>) {
    match result {
        Ok(report) if report.queue_was_empty() => {
            tracing::debug!("pass {}: empty queue, no-op", report.id);
        }
        Ok(report) => {
            tracing::info!(
                "pass {}: {} questions, {} artifacts",
                report.id,
                report.questions_attempted(),
                report.artifacts().len()
            );
        }
        Err(e) => {
            // A bad pass must not kill future triggering
            tracing::error!("pass failed: {}", e);
        }
    }
}
