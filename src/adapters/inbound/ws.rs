use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitStream, StreamExt},
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::AppState;
use crate::application::{CoordinationService, UpdateOutcome};
use crate::domains::agent::ServerMessage;
use crate::domains::registry::ConnectionId;

/// `GET /ws/agent`
pub async fn agent_ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_agent_socket(socket, state.service))
}

async fn handle_agent_socket(socket: WebSocket, service: Arc<CoordinationService>) {
    let connection = ConnectionId::new();
    let (mut sender, mut receiver) = socket.split();

    // Connecting: the first frame must be a valid agent state.
    service.open(connection).await;
    let Some(first) = next_text(&mut receiver).await else {
        debug!(%connection, "connection closed before sending its initial state");
        service.disconnect(connection).await;
        let _ = sender.send(Message::Close(None)).await;
        return;
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let agent_id = match service.connect(connection, &first, tx).await {
        Ok(agent_id) => agent_id,
        Err(e) => {
            warn!(%connection, "rejected initial agent state: {}", e);
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };
    info!(%connection, %agent_id, "agent connected");

    // Writer: drains pushes until the registry drops the channel on disconnect.
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize push message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => match service.update(connection, &text).await {
                Ok(UpdateOutcome::Applied) => {}
                Ok(UpdateOutcome::IgnoredForeignId { claimed }) => {
                    debug!(%connection, %agent_id, %claimed, "ignored update for foreign agent id");
                }
                Err(e) => {
                    warn!(%connection, %agent_id, "malformed update, closing: {}", e);
                    break;
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(Message::Binary(payload)) => {
                debug!(%connection, %agent_id, bytes = payload.len(), "ignored binary frame");
            }
            // Ping/pong are answered by axum.
            Ok(_) => {}
            Err(e) => {
                warn!(%connection, %agent_id, "socket error: {}", e);
                break;
            }
        }
    }

    service.disconnect(connection).await;
    let _ = send_task.await;
    info!(%connection, %agent_id, "agent disconnected");
}

/// Next text frame, skipping control frames. `None` on close, error or a
/// non-text payload.
async fn next_text(receiver: &mut SplitStream<WebSocket>) -> Option<String> {
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => return Some(text),
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            _ => return None,
        }
    }
    None
}
