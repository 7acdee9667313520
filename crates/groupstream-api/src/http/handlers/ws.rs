//! WebSocket handler for the group chat relay.
//!
//! The `/ws/chat` endpoint upgrades an HTTP connection to a WebSocket.
//! Each socket gets a fresh [`ConnectionId`] and an unbounded outbound
//! channel registered with the transport; a single `tokio::select!` loop
//! then multiplexes draining that channel into outgoing frames with
//! parsing incoming text frames as [`ClientEvent`]s.
//!
//! Chat events are dispatched on their own tasks, so a long streamed
//! completion never blocks this socket from relaying frames produced by
//! other members' sessions.
//!
//! Closing the socket removes the connection from its group but does not
//! cancel an in-flight completion it triggered; that stream runs to
//! termination and broadcasts to whoever remains.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use groupstream_types::chat::{ConnectionId, ServerEvent};

use crate::state::AppState;

/// Incoming event from a WebSocket client.
///
/// Clients send JSON-encoded text frames matching one of these variants.
/// Malformed frames are answered with an `error` event and ignored.
#[derive(Debug, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientEvent {
    /// Join a group, leaving any previously joined one.
    JoinGroup { group: String },
    /// Send a chat message to the current group.
    Chat { author: String, text: String },
    /// Keep-alive ping. Server responds with `{"type":"pong"}`.
    Ping,
}

/// Upgrade an HTTP request to a WebSocket connection for the relay.
///
/// This is mounted at `/ws/chat` in the router.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection = ConnectionId::new();
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ServerEvent>();
    state.transport.register(connection, outbound_tx);

    tracing::debug!(%connection, "websocket attached");

    loop {
        tokio::select! {
            // --- Branch 1: drain the outbound channel into the socket ---
            event = outbound_rx.recv() => {
                match event {
                    Some(event) => {
                        match serde_json::to_string(&event) {
                            Ok(json) => {
                                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                                    break;
                                }
                            }
                            Err(err) => {
                                tracing::warn!(%connection, error = %err, "failed to serialize server event");
                            }
                        }
                    }
                    // Transport dropped our sender (connection removed).
                    None => break,
                }
            }

            // --- Branch 2: process frames from the client ---
            frame = ws_receiver.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        process_client_event(&text, connection, &state).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(%connection, error = %err, "websocket receive error");
                        break;
                    }
                    // Binary, ping, pong protocol frames are handled by axum.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.hub.disconnect(connection).await;
    tracing::debug!(%connection, "websocket detached");
}

/// Parse and dispatch a single text frame from the client.
async fn process_client_event(text: &str, connection: ConnectionId, state: &AppState) {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(%connection, raw = %text, error = %err, "ignoring malformed client event");
            state.transport.send_to_connection(
                connection,
                &ServerEvent::Error {
                    message: format!("malformed event: {err}"),
                },
            );
            return;
        }
    };

    match event {
        ClientEvent::JoinGroup { group } => {
            state.hub.join_group(connection, &group).await;
        }
        ClientEvent::Chat { author, text } => {
            // Each chat event runs on its own task so a streamed reply
            // does not stall this socket's loop.
            let hub = state.hub.clone();
            let transport = state.transport.clone();
            tokio::spawn(async move {
                if let Err(err) = hub.chat(connection, &author, &text).await {
                    tracing::warn!(%connection, error = %err, "chat event failed");
                    transport.send_to_connection(
                        connection,
                        &ServerEvent::Error {
                            message: err.to_string(),
                        },
                    );
                }
            });
        }
        ClientEvent::Ping => {
            state
                .transport
                .send_to_connection(connection, &ServerEvent::Pong);
        }
    }
}
