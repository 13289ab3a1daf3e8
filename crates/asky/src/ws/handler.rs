//! WebSocket handler for client connections.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};

use crate::api::{ApiError, AppState};

use super::hub::{ChatHub, NewConnection};
use super::types::Frame;

/// Ping interval for keepalive.
const PING_INTERVAL_SECS: u64 = 30;

/// WebSocket upgrade handler.
///
/// GET /api/ws
pub async fn ws_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let connection = state
        .hub
        .connect()
        .await
        .map_err(|e| ApiError::service_unavailable(e.to_string()))?;
    let hub = state.hub.clone();

    Ok(ws.on_upgrade(move |socket| handle_connection(socket, hub, connection)))
}

/// Handle one WebSocket connection for its whole lifetime.
async fn handle_connection(socket: WebSocket, hub: Arc<ChatHub>, connection: NewConnection) {
    let NewConnection {
        id: conn_id,
        frames: mut frame_rx,
    } = connection;

    let (mut sender, mut receiver) = socket.split();

    // Spawn task forwarding broadcast frames to this client.
    let send_task = tokio::spawn(async move {
        let mut ping_interval = tokio::time::interval(Duration::from_secs(PING_INTERVAL_SECS));

        loop {
            tokio::select! {
                frame = frame_rx.recv() => {
                    let Some(frame) = frame else { break };
                    let json = match serde_json::to_string(&frame) {
                        Ok(j) => j,
                        Err(e) => {
                            warn!("failed to serialize frame: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }

                // Periodic protocol-level keepalive.
                _ = ping_interval.tick() => {
                    if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Process incoming messages.
    while let Some(msg_result) = receiver.next().await {
        match msg_result {
            Ok(Message::Text(text)) => match serde_json::from_str::<Frame>(&text) {
                Ok(frame) => {
                    // No validation beyond the envelope: the payload is
                    // passed through untouched and fanned out to everyone,
                    // this client included.
                    hub.publish(frame).await;
                }
                Err(e) => {
                    warn!("unparseable frame from client {}: {}", conn_id, e);
                }
            },
            Ok(Message::Binary(_)) => {
                debug!("binary message from client {}, ignoring", conn_id);
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                debug!("keepalive from client {}", conn_id);
            }
            Ok(Message::Close(_)) => {
                info!("client {} closed the connection", conn_id);
                break;
            }
            Err(e) => {
                warn!("websocket error for client {}: {}", conn_id, e);
                break;
            }
        }
    }

    send_task.abort();
    hub.disconnect(conn_id).await;
    info!("websocket connection closed for client {}", conn_id);
}
