//! Command-line argument structures.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use formfill_demo_server::{
    DEFAULT_EVENT_DELAY_MS, DEFAULT_LISTEN_ADDR, DemoServerConfig, StreamMode,
};
use formfill_engine::{EngineConfig, TransportKind, load_config};

/// Log verbosity level for CLI output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Only show errors
    Error,
    /// Show warnings and errors
    Warn,
    /// Show informational messages, warnings, and errors (default)
    #[default]
    Info,
    /// Show debug messages and above
    Debug,
    /// Show all messages including trace-level details
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Watch a scripted invoice get typed into a mock form.
#[derive(Parser, Debug)]
#[command(name = "formfill", version, about)]
pub struct Cli {
    #[clap(flatten)]
    pub config_overrides: ConfigOverrides,

    /// Enable verbose output (debug level)
    #[arg(long = "verbose", short = 'v', global = true)]
    pub verbose: bool,

    /// Enable trace-level logging for debugging
    #[arg(long = "trace", global = true)]
    pub trace: bool,

    /// Write diagnostics to this file instead of stderr.
    /// The interactive UI always logs to a file (default `formfill.log`).
    #[arg(long = "log-file", global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Level from the verbosity flags. `--trace` wins over `--verbose`.
    pub fn log_level(&self) -> LogLevel {
        if self.trace {
            LogLevel::Trace
        } else if self.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Info
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.command.is_none()
    }
}

/// Flags layered over the config file and environment.
#[derive(Args, Debug, Default, Clone)]
pub struct ConfigOverrides {
    /// Config file to read instead of `./formfill.toml`
    #[arg(long = "config", short = 'c', global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base address of the event source
    #[arg(long = "api-url", global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// How events are fetched: push (event stream) or bulk (single response)
    #[arg(long = "transport", global = true, value_name = "KIND")]
    pub transport: Option<TransportKind>,

    /// Delay between two typed characters, in milliseconds
    #[arg(long = "char-delay-ms", global = true, value_name = "MS")]
    pub char_delay_ms: Option<u64>,
}

impl ConfigOverrides {
    /// Load the config file and environment, then apply these flags.
    pub fn load(&self) -> anyhow::Result<EngineConfig> {
        let config = load_config(self.config.as_deref())?;
        Ok(self.apply(config))
    }

    pub fn apply(&self, config: EngineConfig) -> EngineConfig {
        let mut config = config.with_api_url_override(self.api_url.clone());
        if let Some(transport) = self.transport {
            config.server.transport = transport;
        }
        if let Some(ms) = self.char_delay_ms {
            config.animation.char_delay_ms = ms;
        }
        config
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one instruction without the UI and print the log and final form
    Run(RunArgs),
    /// Serve the demo event source
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Instruction sent to the event source
    pub instruction: String,

    /// Replay a recorded `data:` body instead of contacting the event source
    #[arg(long, value_name = "FILE")]
    pub replay: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value = DEFAULT_LISTEN_ADDR, value_name = "ADDR")]
    pub listen: String,

    /// push: one message per event; bulk: the whole body at once
    #[arg(long, default_value_t = StreamMode::Push, value_name = "MODE")]
    pub mode: StreamMode,

    /// Pause between pushed events, in milliseconds
    #[arg(long = "event-delay-ms", default_value_t = DEFAULT_EVENT_DELAY_MS, value_name = "MS")]
    pub event_delay_ms: u64,
}

impl ServeArgs {
    pub fn to_config(&self) -> DemoServerConfig {
        DemoServerConfig {
            listen_addr: self.listen.clone(),
            mode: self.mode,
            event_delay: Duration::from_millis(self.event_delay_ms),
        }
    }
}
