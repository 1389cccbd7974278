// WebSocket handlers and websocket-specific helpers.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::StreamExt;
use tokio::sync::mpsc;

use owo_colors::OwoColorize;

use crate::server::router;
use crate::server::state::AppState;
use relay_shared::{ClientMsg, ServerMsg};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    // Register the session immediately in the pre-join state; the router
    // ignores everything but `join` until the client enters a lobby.
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMsg>();
    let session_id = state.registry.write().await.connect(tx);

    let hello = format!("{} session {}", "[CONNECT]".bold().green(), session_id.bold());
    tracing::info!(%hello);

    loop {
        tokio::select! {
            biased;

            // Outbound payloads queued by the router for this session.
            outbound = rx.recv() => {
                match outbound {
                    Some(sm) => send_ws(&mut socket, &sm).await,
                    // All senders gone means the session was dropped.
                    None => break,
                }
            }

            // Incoming websocket messages from this client.
            inbound = socket.next() => {
                match inbound {
                    Some(Ok(Message::Text(txt))) => {
                        match serde_json::from_str::<ClientMsg>(&txt) {
                            Ok(cm) => router::handle_client_msg(&state, session_id, cm).await,
                            Err(e) => {
                                // Malformed input discards the single message;
                                // the session and its lobby state are untouched.
                                tracing::warn!(session = %session_id, error = %e, "discarding malformed client message");
                                tracing::debug!(raw_in = %txt);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }

    router::handle_disconnect(&state, session_id).await;
    tracing::info!(session = %session_id, "client disconnected");
}

async fn send_ws(socket: &mut WebSocket, msg: &ServerMsg) {
    match serde_json::to_string(msg) {
        Ok(txt) => {
            // A failed send surfaces as a closed socket on the next poll.
            let _ = socket.send(Message::Text(txt)).await;
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize ServerMsg for websocket send");
        }
    }
}
