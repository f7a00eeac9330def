//! Formfill CLI - Main entry point.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use formfill_cli::{Cli, dispatch_command, init_logging};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let _log_guard = init_logging(cli.log_level(), cli.log_file.as_deref(), cli.is_interactive())?;

    dispatch_command(cli).await
}
