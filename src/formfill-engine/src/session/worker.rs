//! Body of one run.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::consumer::{ConsumeOutcome, EventRouter, consume};
use crate::sequencer::FillSequencer;
use crate::source::EventSource;
use crate::state::{LogEntry, SessionPhase, SessionState};
use crate::typewriter::TypingAnimator;

/// Log message appended when a run ends normally.
pub(crate) const COMPLETED_MESSAGE: &str = "Run completed";

/// How the worker ended.
///
/// `Completed` and `Failed` have already been written to the session state.
/// `Cancelled` is left for whoever cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerExit {
    Completed,
    Failed,
    Cancelled,
}

pub(crate) struct Worker {
    pub source: Arc<dyn EventSource>,
    pub animator: TypingAnimator,
    pub state: SessionState,
    pub instruction: String,
}

impl Worker {
    pub async fn run(self, cancel: CancellationToken) -> WorkerExit {
        let Self {
            source,
            animator,
            state,
            instruction,
        } = self;

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return WorkerExit::Cancelled,
            opened = source.open(&instruction) => opened,
        };
        let stream = match opened {
            Ok(stream) => stream,
            Err(e) => {
                error!(error = %e, source = source.name(), "Failed to open event stream");
                state.finish(SessionPhase::Aborted, LogEntry::error(format!("Error: {e}")));
                return WorkerExit::Failed;
            }
        };
        info!(source = source.name(), "Event stream opened");

        let sink = state.sink();
        let (queue, mut sequencer) = FillSequencer::channel(animator, Arc::clone(&sink));
        let router = EventRouter::new(queue, sink);

        // A transport failure stops the typing too; stop() cancels both.
        let drain_cancel = cancel.child_token();
        let reader = {
            let cancel = cancel.clone();
            let drain_cancel = drain_cancel.clone();
            async move {
                let result = consume(stream, &router, &cancel).await;
                if result.is_err() {
                    drain_cancel.cancel();
                }
                // router dropped here: the queue closes and the drain can finish
                result
            }
        };

        let (read, drained) = tokio::join!(reader, sequencer.drain(&drain_cancel));

        if cancel.is_cancelled() {
            debug!(applied = drained.applied(), "Worker cancelled");
            return WorkerExit::Cancelled;
        }

        match read {
            Ok(ConsumeOutcome::Finished(stats)) => {
                info!(?stats, applied = drained.applied(), "Run completed");
                state.finish(SessionPhase::Completed, LogEntry::info(COMPLETED_MESSAGE));
                WorkerExit::Completed
            }
            Ok(ConsumeOutcome::Cancelled(_)) => WorkerExit::Cancelled,
            Err(e) => {
                error!(error = %e, applied = drained.applied(), "Event stream failed");
                state.finish(SessionPhase::Aborted, LogEntry::error(format!("Error: {e}")));
                WorkerExit::Failed
            }
        }
    }
}
