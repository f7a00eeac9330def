//! HTTP routes.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use formfill_protocol::encode_record;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

use crate::config::{DemoServerConfig, StreamMode};
use crate::documents::plan_events;
use crate::error::{ServerError, ServerResult};

pub fn routes() -> Router<Arc<DemoServerConfig>> {
    Router::new()
        .route("/health", get(health))
        .route("/run", get(run))
}

#[derive(Debug, Deserialize)]
struct RunParams {
    user_text: Option<String>,
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn run(
    State(config): State<Arc<DemoServerConfig>>,
    Query(params): Query<RunParams>,
) -> ServerResult<Response> {
    let instruction = params
        .user_text
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ServerError::BadRequest("user_text parameter is required".to_string()))?;

    let events = plan_events(&instruction);
    info!(instruction = %instruction, mode = %config.mode, events = events.len(), "Run requested");

    match config.mode {
        StreamMode::Bulk => bulk_response(&events),
        StreamMode::Push => push_response(&events, config.event_delay),
    }
}

/// Every record in one body.
fn bulk_response(events: &[Value]) -> ServerResult<Response> {
    let body = events
        .iter()
        .map(encode_record)
        .collect::<Result<String, _>>()?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response())
}

/// One message per event, `delay` apart.
fn push_response(events: &[Value], delay: Duration) -> ServerResult<Response> {
    let payloads = events
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()?;

    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(16);
    tokio::spawn(async move {
        for (i, payload) in payloads.into_iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if tx.send(Ok(Event::default().data(payload))).await.is_err() {
                debug!(sent = i, "SSE client disconnected");
                return;
            }
        }
        debug!("SSE stream finished");
    });

    let stream = ReceiverStream::new(rx);
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()).into_response())
}
