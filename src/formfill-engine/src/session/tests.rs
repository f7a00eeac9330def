//! Tests for the session controller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use formfill_protocol::FieldId;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::SessionController;
use super::controller::STOPPED_MESSAGE;
use super::worker::COMPLETED_MESSAGE;
use crate::error::{EngineError, Result};
use crate::source::{BulkSource, EventSource, PayloadStream, ReplaySource, SseSource};
use crate::state::{LogLevel, SessionPhase};
use crate::typewriter::TypingAnimator;

// --------------------------------------------------------
// Helpers
// --------------------------------------------------------

/// One step of a scripted stream.
#[derive(Debug, Clone)]
enum Step {
    Payload(&'static str),
    Fail(&'static str),
}

/// Source yielding a fixed script, optionally keeping the stream open after.
#[derive(Debug, Clone)]
struct ScriptedSource {
    steps: Vec<Step>,
    hang: bool,
}

impl ScriptedSource {
    fn new(steps: Vec<Step>) -> Self {
        Self { steps, hang: false }
    }

    fn hanging(steps: Vec<Step>) -> Self {
        Self { steps, hang: true }
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    async fn open(&self, _instruction: &str) -> Result<PayloadStream> {
        let items: Vec<Result<String>> = self
            .steps
            .iter()
            .map(|step| match step {
                Step::Payload(p) => Ok(p.to_string()),
                Step::Fail(msg) => Err(EngineError::stream(*msg)),
            })
            .collect();
        let stream = futures::stream::iter(items);
        if self.hang {
            Ok(Box::pin(stream.chain(futures::stream::pending())))
        } else {
            Ok(Box::pin(stream))
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Source that never connects.
struct RefusingSource;

#[async_trait]
impl EventSource for RefusingSource {
    async fn open(&self, _instruction: &str) -> Result<PayloadStream> {
        Err(EngineError::HttpStatus {
            status: 502,
            body: "bad gateway".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "refusing"
    }
}

fn controller(source: impl EventSource + 'static) -> SessionController {
    SessionController::new(Arc::new(source), TypingAnimator::instant())
}

fn slow_controller(source: impl EventSource + 'static) -> SessionController {
    SessionController::new(Arc::new(source), TypingAnimator::default())
}

const BASIC_RUN: &str = concat!(
    "data: {\"type\":\"log\",\"message\":\"OCR開始\"}\n\n",
    "data: {\"type\":\"fill\",\"field\":\"vendor_name\",\"value\":\"ABC商事\"}\n\n",
);

const THREE_FILLS: &str = concat!(
    "data: {\"type\":\"fill\",\"field\":\"vendor_name\",\"value\":\"さくら部品株式会社\"}\n",
    "data: {\"type\":\"fill\",\"field\":\"invoice_no\",\"value\":\"2025/11/30-7788\"}\n",
    "data: {\"type\":\"fill\",\"field\":\"total\",\"value\":107800}\n",
);

// --------------------------------------------------------
// Normal runs
// --------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_basic_run_completes() {
    let mut session = slow_controller(ReplaySource::new(BASIC_RUN));

    session.run("資料Aを入力して").unwrap();
    assert_eq!(session.phase(), SessionPhase::Running);
    assert_eq!(session.wait().await, SessionPhase::Completed);

    let snapshot = session.snapshot();
    assert_eq!(
        snapshot.messages(),
        vec!["Instruction: 資料Aを入力して", "OCR開始", COMPLETED_MESSAGE]
    );
    assert_eq!(snapshot.value(FieldId::VendorName), "ABC商事");
    assert!(snapshot.active.is_none());
    assert_eq!(snapshot.instruction.as_deref(), Some("資料Aを入力して"));
}

#[tokio::test]
async fn test_unknown_field_mutates_nothing_and_completes() {
    let mut session = controller(ScriptedSource::new(vec![Step::Payload(
        r#"{"type":"fill","field":"bogus","value":"x"}"#,
    )]));

    session.run("x").unwrap();
    assert_eq!(session.wait().await, SessionPhase::Completed);

    let snapshot = session.snapshot();
    assert!(snapshot.fields.iter().all(|f| f.value.is_empty()));
    let warnings: Vec<_> = snapshot
        .logs
        .iter()
        .filter(|l| l.level == LogLevel::Warn)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("bogus"));
}

#[tokio::test]
async fn test_malformed_records_do_not_halt_processing() {
    let mut session = controller(ScriptedSource::new(vec![
        Step::Payload(r#"{"type":"fill","field":"invoice_no","value":"C-INV-00042"}"#),
        Step::Payload("{broken"),
        Step::Payload(r#"{"type":"fill","field":"unknown","value":"1"}"#),
        Step::Payload(r#"{"message":"no type"}"#),
        Step::Payload(r#"{"type":"fill","field":"subtotal","value":250000}"#),
        Step::Payload(r#"{"type":"fill","field":"tax","value":null}"#),
        Step::Payload(r#"{"type":"progress","pct":50}"#),
        Step::Payload(r#"{"type":"fill","field":"total","value":"275000"}"#),
    ]));

    session.run("資料Cを入力して").unwrap();
    assert_eq!(session.wait().await, SessionPhase::Completed);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.value(FieldId::InvoiceNo), "C-INV-00042");
    assert_eq!(snapshot.value(FieldId::Subtotal), "250000");
    assert_eq!(snapshot.value(FieldId::Total), "275000");
    assert_eq!(snapshot.value(FieldId::Tax), "");
    let filled = snapshot.fields.iter().filter(|f| !f.value.is_empty()).count();
    assert_eq!(filled, 3);
    let warnings = snapshot
        .logs
        .iter()
        .filter(|l| l.level == LogLevel::Warn)
        .count();
    assert_eq!(warnings, 5);
}

#[tokio::test]
async fn test_bulk_and_push_transports_are_equivalent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/run"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(THREE_FILLS, "text/event-stream"))
        .mount(&server)
        .await;

    let mut push = controller(SseSource::new(server.uri()));
    push.run("資料Bを入力して").unwrap();
    assert_eq!(push.wait().await, SessionPhase::Completed);

    let mut bulk = controller(BulkSource::new(server.uri()));
    bulk.run("資料Bを入力して").unwrap();
    assert_eq!(bulk.wait().await, SessionPhase::Completed);

    let (push, bulk) = (push.snapshot(), bulk.snapshot());
    assert_eq!(push.fields, bulk.fields);
    assert_eq!(push.messages(), bulk.messages());
    assert_eq!(bulk.value(FieldId::Total), "107800");
    // records on consecutive lines, the last one not followed by a blank line
    assert_eq!(push.value(FieldId::VendorName), "さくら部品株式会社");
    assert_eq!(push.value(FieldId::InvoiceNo), "2025/11/30-7788");
    assert_eq!(push.value(FieldId::Total), "107800");
    assert!(push.logs.iter().all(|l| l.level == LogLevel::Info));
}

#[tokio::test]
async fn test_snapshots_do_not_write_back() {
    let mut session = controller(ReplaySource::new(BASIC_RUN));
    session.run("資料Aを入力して").unwrap();
    session.wait().await;

    let mut copy = session.snapshot();
    copy.fields[0].value = "tampered".to_string();
    copy.active = Some(FieldId::Total);

    let mut rx = session.subscribe();
    assert_eq!(rx.borrow_and_update().value(FieldId::VendorName), "ABC商事");
    assert_eq!(session.snapshot().value(FieldId::VendorName), "ABC商事");
    assert!(session.snapshot().active.is_none());
}

#[tokio::test]
async fn test_run_after_completion_starts_fresh() {
    let mut session = controller(ReplaySource::new(BASIC_RUN));
    session.run("first").unwrap();
    session.wait().await;

    session.run("second").unwrap();
    assert_eq!(session.snapshot().messages(), vec!["Instruction: second"]);
    assert_eq!(session.snapshot().value(FieldId::VendorName), "");
    assert_eq!(session.wait().await, SessionPhase::Completed);
    assert_eq!(session.snapshot().value(FieldId::VendorName), "ABC商事");
}

// --------------------------------------------------------
// Rejected triggers
// --------------------------------------------------------

#[tokio::test]
async fn test_blank_instruction_is_rejected() {
    let mut session = controller(ReplaySource::new(BASIC_RUN));

    for blank in ["", "   ", "\n\t"] {
        assert!(matches!(
            session.run(blank),
            Err(EngineError::EmptyInstruction)
        ));
    }
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert!(session.snapshot().logs.is_empty());
}

#[tokio::test]
async fn test_second_run_while_running_is_rejected() {
    let mut session = controller(ScriptedSource::hanging(vec![]));
    session.run("first").unwrap();
    let before = session.snapshot();

    assert!(matches!(
        session.run("second"),
        Err(EngineError::AlreadyRunning)
    ));
    assert!(matches!(session.reset(), Err(EngineError::AlreadyRunning)));
    assert_eq!(session.snapshot(), before);

    assert!(session.stop().await);
}

// --------------------------------------------------------
// Stop
// --------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_stop_mid_run() {
    let mut session = slow_controller(ReplaySource::new(THREE_FILLS));
    session.run("資料Bを入力して").unwrap();

    // inside the typing of the first value (settle 120ms, 14ms per char)
    tokio::time::sleep(Duration::from_millis(120 + 14 * 4 + 7)).await;
    assert!(session.snapshot().is_active(FieldId::VendorName));

    assert!(session.stop().await);

    let stopped = session.snapshot();
    assert_eq!(stopped.phase, SessionPhase::Aborted);
    assert!(stopped.active.is_none());
    assert_eq!(stopped.messages().last(), Some(&STOPPED_MESSAGE));
    let partial = stopped.value(FieldId::VendorName).to_string();
    assert!(!partial.is_empty());
    assert_ne!(partial, "さくら部品株式会社");
    assert_eq!(stopped.value(FieldId::InvoiceNo), "");
    assert_eq!(stopped.value(FieldId::Total), "");

    // nothing moves afterwards
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(session.snapshot(), stopped);
}

#[tokio::test(start_paused = true)]
async fn test_stop_closes_open_stream() {
    let mut session = controller(ScriptedSource::hanging(vec![
        Step::Payload(r#"{"type":"log","message":"waiting"}"#),
        Step::Payload(r#"{"type":"fill","field":"tax","value":"9800"}"#),
    ]));
    session.run("x").unwrap();

    tokio::time::sleep(Duration::from_secs(60)).await;
    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Running);
    assert_eq!(snapshot.value(FieldId::Tax), "9800");

    assert!(session.stop().await);
    assert_eq!(session.phase(), SessionPhase::Aborted);
    assert_eq!(session.wait().await, SessionPhase::Aborted);
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let mut session = controller(ScriptedSource::hanging(vec![]));

    // idle
    let idle = session.snapshot();
    assert!(!session.stop().await);
    assert_eq!(session.snapshot(), idle);

    // aborted
    session.run("x").unwrap();
    assert!(session.stop().await);
    let aborted = session.snapshot();
    assert!(!session.stop().await);
    assert!(!session.stop().await);
    assert_eq!(session.snapshot(), aborted);
    assert_eq!(
        aborted
            .messages()
            .iter()
            .filter(|m| **m == STOPPED_MESSAGE)
            .count(),
        1
    );
}

#[tokio::test]
async fn test_stop_after_completion_changes_nothing() {
    let mut session = controller(ReplaySource::new(BASIC_RUN));
    session.run("x").unwrap();
    session.wait().await;
    let done = session.snapshot();

    assert!(!session.stop().await);
    assert_eq!(session.snapshot(), done);
}

// --------------------------------------------------------
// Transport failures
// --------------------------------------------------------

#[tokio::test]
async fn test_connect_failure_aborts() {
    let mut session = controller(RefusingSource);
    session.run("x").unwrap();
    assert_eq!(session.wait().await, SessionPhase::Aborted);

    let snapshot = session.snapshot();
    let last = snapshot.logs.last().unwrap();
    assert_eq!(last.level, LogLevel::Error);
    assert!(last.message.starts_with("Error: "));
    assert!(last.message.contains("502"));
}

#[tokio::test]
async fn test_failure_mid_stream_aborts() {
    let mut session = controller(ScriptedSource::new(vec![
        Step::Payload(r#"{"type":"log","message":"reading"}"#),
        Step::Fail("connection reset"),
        Step::Payload(r#"{"type":"fill","field":"total","value":"1"}"#),
    ]));
    session.run("x").unwrap();
    assert_eq!(session.wait().await, SessionPhase::Aborted);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.value(FieldId::Total), "");
    assert!(snapshot.active.is_none());
    assert!(snapshot.messages().contains(&"reading"));
    let last = snapshot.logs.last().unwrap();
    assert_eq!(last.level, LogLevel::Error);
    assert!(last.message.contains("connection reset"));
}

#[tokio::test]
async fn test_http_error_from_server_aborts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/run"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut session = controller(SseSource::new(server.uri()));
    session.run("x").unwrap();
    assert_eq!(session.wait().await, SessionPhase::Aborted);
    assert!(
        session
            .snapshot()
            .messages()
            .last()
            .is_some_and(|m| m.contains("503"))
    );
}

// --------------------------------------------------------
// Reset
// --------------------------------------------------------

#[tokio::test]
async fn test_reset_returns_to_idle() {
    let mut session = controller(ReplaySource::new(BASIC_RUN));
    session.run("x").unwrap();
    session.wait().await;

    session.reset().unwrap();

    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Idle);
    assert!(snapshot.logs.is_empty());
    assert!(snapshot.instruction.is_none());
    assert!(snapshot.fields.iter().all(|f| f.value.is_empty()));
}
