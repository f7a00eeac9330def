//! Headless run: one instruction, log lines as they arrive, then the form.

use std::future::Future;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use formfill_engine::{
    EngineConfig, LogEntry, LogLevel, ReplaySource, SessionController, SessionPhase,
    SessionSnapshot, TypingAnimator,
};
use tracing::{info, warn};

use crate::cli::RunArgs;

const LABEL_WIDTH: usize = 14;

impl RunArgs {
    pub async fn run(self, config: EngineConfig) -> Result<ExitCode> {
        let mut session = match &self.replay {
            Some(path) => {
                let source = ReplaySource::from_file(path)?;
                info!(path = %path.display(), records = source.len(), "Replaying recorded run");
                if source.is_empty() {
                    warn!(path = %path.display(), "Replay file holds no records");
                }
                SessionController::new(
                    Arc::new(source),
                    TypingAnimator::from_config(&config.animation),
                )
            }
            None => SessionController::from_config(&config),
        };

        let interrupt = async {
            let _ = tokio::signal::ctrl_c().await;
        };
        let phase = run_session(
            &mut session,
            &self.instruction,
            &mut std::io::stdout().lock(),
            interrupt,
        )
        .await?;

        Ok(exit_code(phase))
    }
}

/// `0` when the run completed, `1` otherwise.
pub fn exit_code(phase: SessionPhase) -> ExitCode {
    if phase == SessionPhase::Completed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

/// Drive one run to its end, writing each new log entry to `out`.
///
/// `interrupt` resolving stops the run. The final form is written once the
/// session has left `Running`.
pub async fn run_session<W, F>(
    session: &mut SessionController,
    instruction: &str,
    out: &mut W,
    interrupt: F,
) -> Result<SessionPhase>
where
    W: Write,
    F: Future<Output = ()>,
{
    session.run(instruction)?;
    let mut snapshots = session.subscribe();
    let mut printed = 0;
    let mut interrupt = std::pin::pin!(interrupt);
    let mut interrupted = false;

    loop {
        let snapshot = snapshots.borrow_and_update().clone();
        for entry in snapshot.logs.iter().skip(printed) {
            writeln!(out, "{}", format_entry(entry))?;
        }
        printed = snapshot.logs.len();
        out.flush()?;

        if !snapshot.is_running() {
            break;
        }

        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            () = &mut interrupt, if !interrupted => {
                interrupted = true;
                info!("Interrupted, stopping run");
                session.stop().await;
            }
        }
    }

    let phase = session.wait().await;
    write_form(out, &session.snapshot())?;
    Ok(phase)
}

fn format_entry(entry: &LogEntry) -> String {
    let level = match entry.level {
        LogLevel::Info => "INFO ",
        LogLevel::Warn => "WARN ",
        LogLevel::Error => "ERROR",
    };
    format!("{} {level} {}", entry.time_label(), entry.message)
}

fn write_form<W: Write>(out: &mut W, snapshot: &SessionSnapshot) -> std::io::Result<()> {
    writeln!(out)?;
    for field in &snapshot.fields {
        writeln!(
            out,
            "{:<width$}{}",
            field.id.label(),
            field.value,
            width = LABEL_WIDTH
        )?;
    }
    out.flush()
}
