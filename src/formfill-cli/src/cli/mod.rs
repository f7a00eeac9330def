//! CLI argument parsing and command dispatch.

pub mod args;
pub mod handlers;

pub use args::{Cli, Commands, ConfigOverrides, LogLevel, RunArgs, ServeArgs};
pub use handlers::dispatch_command;
