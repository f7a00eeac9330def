//! Formfill demo server.
//!
//! A stand-in for the extraction backend. `/run` picks one of three prebuilt
//! invoices from the instruction and streams progress logs followed by one
//! fill per form field. `/health` reports liveness.

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod config;
pub mod documents;
pub mod error;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use config::{DEFAULT_EVENT_DELAY_MS, DEFAULT_LISTEN_ADDR, DemoServerConfig, StreamMode};
pub use documents::{DocumentId, InvoiceDocument, plan_events};
pub use error::{ServerError, ServerResult};

/// Run the server until the process ends.
pub async fn run(config: DemoServerConfig) -> anyhow::Result<()> {
    run_with_shutdown(config, std::future::pending()).await
}

/// Run the server with graceful shutdown support.
pub async fn run_with_shutdown<F>(config: DemoServerConfig, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    serve(listener, config, shutdown).await
}

/// Serve on an already bound listener.
pub async fn serve<F>(listener: TcpListener, config: DemoServerConfig, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    info!(
        addr = %listener.local_addr()?,
        mode = %config.mode,
        event_delay = ?config.event_delay,
        "Starting demo server"
    );

    axum::serve(listener, create_router(config))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Demo server stopped");
    Ok(())
}

/// Create the application router.
pub fn create_router(config: DemoServerConfig) -> Router {
    routes::routes()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(config))
}
