//! Command execution handlers.

use std::process::ExitCode;

use anyhow::Result;
use formfill_engine::SessionController;
use formfill_tui::TerminalOptions;
use tracing::info;

use super::args::{Cli, Commands, ServeArgs};

/// Dispatch the parsed command line.
pub async fn dispatch_command(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        None => {
            let config = cli.config_overrides.load()?;
            run_tui(SessionController::from_config(&config)).await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Run(run_args)) => {
            let config = cli.config_overrides.load()?;
            run_args.run(config).await
        }
        Some(Commands::Serve(serve_args)) => {
            run_serve(serve_args).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_tui(session: SessionController) -> Result<()> {
    info!(?session, "Starting interactive session");
    let options = TerminalOptions::new().title("formfill");
    formfill_tui::run(session, options).await
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C, shutting down");
    };
    formfill_demo_server::run_with_shutdown(args.to_config(), shutdown).await
}
