//! Formfill command line.
//!
//! - no subcommand: the interactive form-filling UI
//! - `run`: one headless run, printing the log and the final form
//! - `serve`: the demo event source

pub mod cli;
pub mod logging;
pub mod run_cmd;

pub use cli::{Cli, Commands, dispatch_command};
pub use logging::{LogGuard, init_logging};
