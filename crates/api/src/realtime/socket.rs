//! WebSocket endpoint.
//!
//! Each socket is split in two. A writer task drains the connection's
//! outbound queue into the socket. The reader loop waits for the `join`
//! frame that binds the socket to a member and ignores everything else.
//! When either side finishes, the binding is released.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use domain::models::{ClientEvent, ServerEvent};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::ConnectionHandle;
use crate::app::AppState;
use crate::services::SessionCoordinator;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let sessions = state.sessions.clone();
    let buffer = state.config.realtime.outbound_buffer;
    ws.on_upgrade(move |socket| handle_socket(socket, sessions, buffer))
}

async fn handle_socket(socket: WebSocket, sessions: SessionCoordinator, buffer: usize) {
    let (sink, mut stream) = socket.split();
    let (handle, outbound) = ConnectionHandle::channel(buffer);
    let connection_id = handle.id();

    let mut writer = tokio::spawn(write_events(sink, outbound, connection_id));

    // Held until the connection is bound. Afterwards only the registry owns
    // the sender, so unbinding it closes the writer.
    let mut pending = Some(handle);
    let mut bound_member: Option<Uuid> = None;

    tracing::debug!(connection_id = %connection_id, "WebSocket opened");

    loop {
        tokio::select! {
            _ = &mut writer => break,
            frame = stream.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => {
                        tracing::debug!(connection_id = %connection_id, error = %err, "WebSocket read failed");
                        break;
                    }
                };

                match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(ClientEvent::Join { member_id }) => match (bound_member, pending.take()) {
                        (None, Some(handle)) => match sessions.connect(member_id, handle.clone()).await {
                            Ok(_) => bound_member = Some(member_id),
                            Err(err) => {
                                tracing::warn!(
                                    connection_id = %connection_id,
                                    member_id = %member_id,
                                    error = %err,
                                    "Join rejected"
                                );
                                pending = Some(handle);
                            }
                        },
                        (bound, handle) => {
                            pending = handle;
                            tracing::warn!(
                                connection_id = %connection_id,
                                member_id = %member_id,
                                bound_to = ?bound,
                                "Ignoring join on a bound connection"
                            );
                        }
                    },
                    Ok(ClientEvent::Unknown) => {
                        tracing::debug!(connection_id = %connection_id, "Ignoring unknown event type");
                    }
                    Err(err) => {
                        tracing::debug!(connection_id = %connection_id, error = %err, "Ignoring malformed frame");
                    }
                }
            }
        }
    }

    if let Some(member_id) = bound_member {
        sessions.disconnect(member_id, connection_id).await;
    }
    writer.abort();

    tracing::debug!(connection_id = %connection_id, "WebSocket closed");
}

/// Forwards queued events to the socket. Ends with a close frame once the
/// queue is closed, or as soon as the socket stops accepting writes.
async fn write_events(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Arc<ServerEvent>>,
    connection_id: Uuid,
) {
    while let Some(event) = outbound.recv().await {
        let text = match serde_json::to_string(event.as_ref()) {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(
                    connection_id = %connection_id,
                    event = event.name(),
                    error = %err,
                    "Failed to encode event"
                );
                continue;
            }
        };
        if sink.send(Message::Text(text)).await.is_err() {
            return;
        }
    }
    let _ = sink.send(Message::Close(None)).await;
}
