//! Event stream consumer.
//!
//! Reads raw payloads from an [`EventSource`](crate::source::EventSource)
//! stream, decodes them and routes each event:
//! - `log` goes straight to the run log (logs are not queued behind fills)
//! - `fill` for a known field goes to the fill queue
//! - anything else is dropped with a diagnostic
//!
//! Per-record problems never end the stream. Only a transport error does.

use std::sync::Arc;

use formfill_protocol::{Event, FieldId, decode};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::Result;
use crate::sequencer::FillQueue;
use crate::source::PayloadStream;
use crate::state::{FormSink, LogEntry};

/// Why a record was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Payload failed structural decoding.
    Malformed(String),
    /// The `type` discriminant is not handled.
    UnknownKind(String),
    /// `fill` named a field outside the known set.
    UnknownField(String),
    /// The fill queue no longer accepts requests.
    QueueClosed,
}

/// What the router did with one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Logged,
    Enqueued(FieldId),
    Dropped(DropReason),
}

/// Counters for one consumed stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumeStats {
    pub records: usize,
    pub logs: usize,
    pub fills: usize,
    pub dropped: usize,
}

impl ConsumeStats {
    fn record(&mut self, outcome: &RouteOutcome) {
        self.records += 1;
        match outcome {
            RouteOutcome::Logged => self.logs += 1,
            RouteOutcome::Enqueued(_) => self.fills += 1,
            RouteOutcome::Dropped(_) => self.dropped += 1,
        }
    }
}

/// How consumption ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// End of stream.
    Finished(ConsumeStats),
    /// The token fired; the stream was dropped, closing the connection.
    Cancelled(ConsumeStats),
}

/// Routes decoded events to the log or the fill queue.
pub struct EventRouter {
    queue: FillQueue,
    sink: Arc<dyn FormSink>,
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRouter")
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

impl EventRouter {
    pub fn new(queue: FillQueue, sink: Arc<dyn FormSink>) -> Self {
        Self { queue, sink }
    }

    /// Decode and route one raw payload.
    pub fn route_payload(&self, payload: &str) -> RouteOutcome {
        match decode(payload) {
            Ok(event) => self.route(event),
            Err(e) => {
                warn!(error = %e, payload, "Skipping malformed record");
                self.sink
                    .push_log(LogEntry::warn(format!("Skipped malformed record: {e}")));
                RouteOutcome::Dropped(DropReason::Malformed(e.to_string()))
            }
        }
    }

    /// Route one decoded event.
    pub fn route(&self, event: Event) -> RouteOutcome {
        debug!(kind = event.kind(), "Routing event");
        match event {
            Event::Log { message } => {
                self.sink.push_log(LogEntry::info(message));
                RouteOutcome::Logged
            }
            Event::Fill { field, value } => match field.parse::<FieldId>() {
                Ok(id) => {
                    if self.queue.enqueue_fill(id, value) {
                        RouteOutcome::Enqueued(id)
                    } else {
                        debug!(field = %id, "Fill queue closed, dropping request");
                        RouteOutcome::Dropped(DropReason::QueueClosed)
                    }
                }
                Err(_) => {
                    warn!(field = %field, "UI does not know this field");
                    self.sink.push_log(LogEntry::warn(format!(
                        "Ignored fill for unknown field: {field}"
                    )));
                    RouteOutcome::Dropped(DropReason::UnknownField(field))
                }
            },
            Event::Unknown { kind } => {
                warn!(kind = %kind, "Unknown event type");
                self.sink
                    .push_log(LogEntry::warn(format!("Ignored unknown event type: {kind}")));
                RouteOutcome::Dropped(DropReason::UnknownKind(kind))
            }
        }
    }
}

/// Read `stream` to the end, routing every payload.
///
/// The stream is read eagerly: routing a fill only enqueues it, so the
/// transport is never held back by the animation.
pub async fn consume(
    mut stream: PayloadStream,
    router: &EventRouter,
    cancel: &CancellationToken,
) -> Result<ConsumeOutcome> {
    let mut stats = ConsumeStats::default();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(?stats, "Event stream cancelled");
                return Ok(ConsumeOutcome::Cancelled(stats));
            }
            next = stream.next() => next,
        };

        match next {
            Some(Ok(payload)) => {
                let outcome = router.route_payload(&payload);
                stats.record(&outcome);
            }
            Some(Err(e)) => {
                warn!(error = %e, ?stats, "Event stream failed");
                return Err(e);
            }
            None => {
                debug!(?stats, "Event stream ended");
                return Ok(ConsumeOutcome::Finished(stats));
            }
        }
    }
}
