//! Session controller owning the current run.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::worker::{Worker, WorkerExit};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::source::{EventSource, source_from_config};
use crate::state::{LogEntry, SessionPhase, SessionSnapshot, SessionState};
use crate::typewriter::TypingAnimator;

/// Log message appended when a run is stopped.
pub const STOPPED_MESSAGE: &str = "Stopped";

struct RunHandle {
    cancel: CancellationToken,
    task: JoinHandle<WorkerExit>,
}

/// Top-level state machine for one demo session.
///
/// Only one run exists at a time. While a run is in progress its worker is
/// the only writer of the session state; the controller writes before
/// spawning it and after joining it.
pub struct SessionController {
    source: Arc<dyn EventSource>,
    animator: TypingAnimator,
    state: SessionState,
    current: Option<RunHandle>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("source", &self.source.name())
            .field("animator", &self.animator)
            .field("phase", &self.state.phase())
            .finish()
    }
}

impl SessionController {
    pub fn new(source: Arc<dyn EventSource>, animator: TypingAnimator) -> Self {
        Self {
            source,
            animator,
            state: SessionState::new(),
            current: None,
        }
    }

    /// Network source and animation timing taken from `config`.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            source_from_config(&config.server),
            TypingAnimator::from_config(&config.animation),
        )
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    pub fn is_running(&self) -> bool {
        self.phase().is_running()
    }

    /// Start a run for `instruction`.
    ///
    /// A blank instruction is rejected with [`EngineError::EmptyInstruction`]
    /// and a second run while one is in progress with
    /// [`EngineError::AlreadyRunning`]; neither changes any state. Starting
    /// from `Completed` or `Aborted` resets first.
    pub fn run(&mut self, instruction: &str) -> Result<()> {
        if instruction.trim().is_empty() {
            return Err(EngineError::EmptyInstruction);
        }
        if self.is_running() {
            return Err(EngineError::AlreadyRunning);
        }

        // A finished worker has nothing left to write; let it go.
        if let Some(old) = self.current.take() {
            old.cancel.cancel();
        }

        info!(instruction, source = self.source.name(), "Starting run");
        self.state.begin(instruction);

        let cancel = CancellationToken::new();
        let worker = Worker {
            source: Arc::clone(&self.source),
            animator: self.animator,
            state: self.state.clone(),
            instruction: instruction.to_string(),
        };
        let task = tokio::spawn(worker.run(cancel.clone()));
        self.current = Some(RunHandle { cancel, task });
        Ok(())
    }

    /// Stop the current run.
    ///
    /// Closes the connection, stops the animation in flight, drops queued
    /// fills, clears the active marker and appends a "Stopped" entry.
    /// Returns `false`, changing nothing, when no run is in progress.
    pub async fn stop(&mut self) -> bool {
        let Some(handle) = self.current.take() else {
            return false;
        };
        if !self.is_running() {
            return false;
        }

        handle.cancel.cancel();
        match self.join(handle).await {
            WorkerExit::Cancelled => {
                info!("Run stopped");
                self.state
                    .finish(SessionPhase::Aborted, LogEntry::info(STOPPED_MESSAGE));
                true
            }
            // ended on its own before seeing the token
            WorkerExit::Completed | WorkerExit::Failed => false,
        }
    }

    /// Wait for the current run to end and return the resulting phase.
    pub async fn wait(&mut self) -> SessionPhase {
        if let Some(handle) = self.current.take() {
            self.join(handle).await;
        }
        self.phase()
    }

    /// Go back to `Idle`, clearing fields and log.
    pub fn reset(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(EngineError::AlreadyRunning);
        }
        if let Some(old) = self.current.take() {
            old.cancel.cancel();
        }
        self.state.reset();
        Ok(())
    }

    async fn join(&self, handle: RunHandle) -> WorkerExit {
        match handle.task.await {
            Ok(exit) => exit,
            Err(e) => {
                error!(error = %e, "Session worker did not finish");
                if self.state.phase().is_running() {
                    self.state.finish(
                        SessionPhase::Aborted,
                        LogEntry::error(format!("Error: {e}")),
                    );
                }
                WorkerExit::Failed
            }
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.cancel.cancel();
        }
    }
}
