//! Diagnostic logging setup.
//!
//! The interactive UI owns stdout, so it always logs to a file. Other
//! commands log to stderr unless `--log-file` is given. `RUST_LOG`, when set,
//! replaces the level chosen by the flags.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::LogLevel;

/// Log file used by the interactive UI when `--log-file` is not given.
pub const DEFAULT_LOG_FILE: &str = "formfill.log";

/// Crates whose output follows the chosen level. Everything else stays at `warn`.
const OWN_TARGETS: [&str; 5] = [
    "formfill_cli",
    "formfill_engine",
    "formfill_tui",
    "formfill_demo_server",
    "tower_http",
];

/// Keeps the background log writer alive; logs are flushed when dropped.
pub struct LogGuard {
    _guard: Option<WorkerGuard>,
}

/// Filter directive for `level`, scoped to this workspace's crates.
pub fn filter_directive(level: LogLevel) -> String {
    let level = level.as_filter_str();
    let mut directive = String::from("warn");
    for target in OWN_TARGETS {
        directive.push_str(&format!(",{target}={level}"));
    }
    directive
}

fn env_filter(level: LogLevel) -> EnvFilter {
    match std::env::var("RUST_LOG") {
        Ok(value) if !value.trim().is_empty() => EnvFilter::new(value),
        _ => EnvFilter::new(filter_directive(level)),
    }
}

/// Where diagnostics go for this invocation.
pub fn log_destination(log_file: Option<&Path>, interactive: bool) -> Option<PathBuf> {
    match log_file {
        Some(path) => Some(path.to_path_buf()),
        None if interactive => Some(PathBuf::from(DEFAULT_LOG_FILE)),
        None => None,
    }
}

/// Install the global subscriber.
pub fn init_logging(level: LogLevel, log_file: Option<&Path>, interactive: bool) -> Result<LogGuard> {
    let filter = env_filter(level);

    let Some(path) = log_destination(log_file, interactive) else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(LogGuard { _guard: None });
    };

    let file = File::create(&path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();

    Ok(LogGuard {
        _guard: Some(guard),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_filter_directive_scopes_own_crates() {
        assert_eq!(
            filter_directive(LogLevel::Debug),
            "warn,formfill_cli=debug,formfill_engine=debug,formfill_tui=debug,\
             formfill_demo_server=debug,tower_http=debug"
        );
    }

    #[test]
    fn test_interactive_always_logs_to_a_file() {
        assert_eq!(
            log_destination(None, true),
            Some(PathBuf::from(DEFAULT_LOG_FILE))
        );
        assert_eq!(log_destination(None, false), None);
        assert_eq!(
            log_destination(Some(Path::new("run.log")), false),
            Some(PathBuf::from("run.log"))
        );
    }
}
