//! Fill sequencer.
//!
//! One FIFO queue, one drain worker. Requests are animated strictly one after
//! another in the order they were enqueued, however fast they arrive: the
//! next request's animation does not start until the previous one has fully
//! settled. The queue is the backpressure point between the transport, which
//! is read eagerly, and the visual effect, which lags behind.

use std::sync::Arc;

use formfill_protocol::FieldId;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::state::FormSink;
use crate::typewriter::{AnimationOutcome, TypingAnimator};

/// A validated request to type `value` into `field`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillRequest {
    pub field: FieldId,
    pub value: String,
}

/// Producer side of the fill queue.
///
/// Dropping every `FillQueue` closes the queue; the sequencer then finishes
/// once the remaining requests are drained.
#[derive(Debug, Clone)]
pub struct FillQueue {
    tx: mpsc::UnboundedSender<FillRequest>,
}

impl FillQueue {
    /// Append a request. Returns `false` if the sequencer is gone or was cancelled.
    pub fn enqueue_fill(&self, field: FieldId, value: impl Into<String>) -> bool {
        self.tx
            .send(FillRequest {
                field,
                value: value.into(),
            })
            .is_ok()
    }
}

/// How a drain ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The queue was closed and every request was applied.
    Drained { applied: usize },
    /// Cancelled; the in-flight animation stopped and queued requests were discarded.
    Cancelled { applied: usize },
}

impl DrainOutcome {
    pub fn applied(&self) -> usize {
        match self {
            Self::Drained { applied } | Self::Cancelled { applied } => *applied,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Single consumer of the fill queue.
pub struct FillSequencer {
    rx: mpsc::UnboundedReceiver<FillRequest>,
    animator: TypingAnimator,
    sink: Arc<dyn FormSink>,
}

impl std::fmt::Debug for FillSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FillSequencer")
            .field("animator", &self.animator)
            .field("pending", &self.rx.len())
            .finish()
    }
}

impl FillSequencer {
    /// Create a queue and its sequencer.
    pub fn channel(animator: TypingAnimator, sink: Arc<dyn FormSink>) -> (FillQueue, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (FillQueue { tx }, Self { rx, animator, sink })
    }

    /// Number of requests waiting behind the one in flight.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Process requests until the queue is closed and empty, or `cancel` fires.
    ///
    /// Each request marks its field active, which also moves the marker off
    /// the previous field, and animates the value into the sink. The marker
    /// is cleared when the drain ends.
    pub async fn drain(&mut self, cancel: &CancellationToken) -> DrainOutcome {
        let mut applied = 0;

        let outcome = loop {
            if cancel.is_cancelled() {
                break DrainOutcome::Cancelled { applied };
            }

            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                request = self.rx.recv() => Some(request),
            };
            let request = match next {
                None => break DrainOutcome::Cancelled { applied },
                Some(None) => break DrainOutcome::Drained { applied },
                Some(Some(request)) => request,
            };

            debug!(
                field = %request.field,
                pending = self.rx.len(),
                expected = ?self.animator.duration_for(&request.value),
                "Filling field"
            );
            self.sink.set_active(Some(request.field));

            let sink = Arc::clone(&self.sink);
            let field = request.field;
            let outcome = self
                .animator
                .animate(&request.value, cancel, |partial| {
                    trace!(field = %field, partial, "Typing");
                    sink.set_value(field, partial);
                })
                .await;

            match outcome {
                AnimationOutcome::Completed => applied += 1,
                AnimationOutcome::Cancelled => break DrainOutcome::Cancelled { applied },
            }
        };

        if outcome.is_cancelled() {
            // Later enqueues fail instead of piling up behind a dead worker.
            self.rx.close();
            let discarded = std::iter::from_fn(|| self.rx.try_recv().ok()).count();
            debug!(discarded, "Fill queue cancelled");
        }

        self.sink.set_active(None);
        outcome
    }
}
