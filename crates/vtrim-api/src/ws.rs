//! WebSocket progress streaming.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use vtrim_engine::PipelineSession;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Upgrade to a WebSocket streaming the session's progress events.
pub async fn ws_progress(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    ws: WebSocketUpgrade,
) -> ApiResult<impl IntoResponse> {
    let session = state
        .sessions
        .get(&session_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("No session {}", session_id)))?;

    Ok(ws.on_upgrade(move |socket| forward_progress(socket, session)))
}

/// Forward progress events to the client until either side hangs up.
async fn forward_progress(socket: WebSocket, session: Arc<PipelineSession>) {
    let mut events = session.subscribe();
    let (mut sender, mut receiver) = socket.split();

    debug!(session_id = %session.id(), "Progress WebSocket connected");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(error = %e, "Failed to serialize progress event");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        session_id = %session.id(),
                        skipped,
                        "Progress subscriber lagged; events dropped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // Clients only listen; ignore anything else.
                Some(Err(_)) => break,
            },
        }
    }

    debug!(session_id = %session.id(), "Progress WebSocket disconnected");
}
