//! Session state exposed to the rendering surface.
//!
//! The session worker and the controller write through [`SessionState`]; the
//! presentation layer subscribes to a `watch` channel of [`SessionSnapshot`]s.
//! Writers never run at the same time: the controller only touches state
//! before spawning a worker and after joining it.

use std::sync::Arc;

use chrono::{DateTime, Local};
use formfill_protocol::FieldId;
use tokio::sync::watch;

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    #[default]
    Info,
    /// A record was skipped; the run goes on.
    Warn,
    /// The run ended because of a failure.
    Error,
}

/// One line of the run log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    /// Wall clock time as shown next to the message.
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Lifecycle of a session.
///
/// `Idle → Running → {Completed, Aborted}`, and back to `Idle` on reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Running,
    Completed,
    Aborted,
}

impl SessionPhase {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Whether the phase is terminal for the current run.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }
}

/// Current value of one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldState {
    pub id: FieldId,
    pub value: String,
}

/// Everything the rendering surface reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    /// Instruction of the current or last run.
    pub instruction: Option<String>,
    /// Append-only for the life of a run, in arrival order.
    pub logs: Vec<LogEntry>,
    /// One entry per known field, in display order.
    pub fields: Vec<FieldState>,
    /// Field currently being typed into, if any.
    pub active: Option<FieldId>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            instruction: None,
            logs: Vec::new(),
            fields: FieldId::ALL
                .into_iter()
                .map(|id| FieldState {
                    id,
                    value: String::new(),
                })
                .collect(),
            active: None,
        }
    }
}

impl SessionSnapshot {
    pub fn value(&self, field: FieldId) -> &str {
        self.fields
            .iter()
            .find(|f| f.id == field)
            .map(|f| f.value.as_str())
            .unwrap_or_default()
    }

    pub fn is_active(&self, field: FieldId) -> bool {
        self.active == Some(field)
    }

    pub fn is_running(&self) -> bool {
        self.phase.is_running()
    }

    /// Log messages without timestamps.
    pub fn messages(&self) -> Vec<&str> {
        self.logs.iter().map(|l| l.message.as_str()).collect()
    }

    fn set_value(&mut self, field: FieldId, value: &str) {
        if let Some(slot) = self.fields.iter_mut().find(|f| f.id == field) {
            slot.value.clear();
            slot.value.push_str(value);
        }
    }
}

/// Write side used by the router and the fill sequencer.
pub trait FormSink: Send + Sync {
    /// Set the displayed value of a field.
    fn set_value(&self, field: FieldId, value: &str);

    /// Move the active marker. `None` clears it.
    fn set_active(&self, field: Option<FieldId>);

    /// Append to the run log.
    fn push_log(&self, entry: LogEntry);
}

/// Shared handle publishing [`SessionSnapshot`]s.
///
/// Read-only outside this crate: field values, the active marker and the log
/// are written through [`SessionState::sink`], which only a running session
/// hands to its router and fill sequencer.
#[derive(Debug, Clone)]
pub struct SessionState {
    tx: Arc<watch::Sender<SessionSnapshot>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    /// Receive every published change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.tx.borrow().phase
    }

    fn update(&self, f: impl FnOnce(&mut SessionSnapshot)) {
        self.tx.send_modify(f);
    }

    /// Clear everything and go back to `Idle`.
    pub(crate) fn reset(&self) {
        self.update(|s| *s = SessionSnapshot::default());
    }

    /// Start a run: fresh fields and log, instruction echoed first.
    pub(crate) fn begin(&self, instruction: &str) {
        self.update(|s| {
            *s = SessionSnapshot::default();
            s.phase = SessionPhase::Running;
            s.instruction = Some(instruction.to_string());
            s.logs.push(LogEntry::info(format!("Instruction: {instruction}")));
        });
    }

    /// Write handle for the router and the fill sequencer of a run.
    pub(crate) fn sink(&self) -> Arc<dyn FormSink> {
        Arc::new(StateSink(self.clone()))
    }

    /// End a run with a final log entry.
    pub(crate) fn finish(&self, phase: SessionPhase, entry: LogEntry) {
        self.update(|s| {
            s.phase = phase;
            s.active = None;
            s.logs.push(entry);
        });
    }
}

/// The only [`FormSink`] writing to a [`SessionState`]. Never leaves the crate.
struct StateSink(SessionState);

impl FormSink for StateSink {
    fn set_value(&self, field: FieldId, value: &str) {
        self.0.update(|s| s.set_value(field, value));
    }

    fn set_active(&self, field: Option<FieldId>) {
        self.0.update(|s| s.active = field);
    }

    fn push_log(&self, entry: LogEntry) {
        self.0.update(|s| s.logs.push(entry));
    }
}
