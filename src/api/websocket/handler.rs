//! WebSocket connection handler

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use log::debug;

use super::state::AppState;
use crate::connection::ConnectionHandle;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one client connection: pump outbound frames from the handle's
/// outbox into the sink, and feed inbound frames to the router in arrival
/// order. Whichever way the connection ends, the close event is dispatched
/// exactly once.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let conn_id = state.next_connection_id();
    let (handle, mut outbox) = ConnectionHandle::new(conn_id);

    let (mut sink, mut stream) = socket.split();

    // Writer task: the only owner of the sink. Ping/pong is handled by the
    // transport layer underneath the stream.
    let writer = tokio::spawn(async move {
        while let Some(json) = outbox.recv().await {
            if sink.send(Message::Text(json)).await.is_err() {
                break; // Peer gone, remaining frames are dropped.
            }
        }
    });

    state.lifecycle.on_open(&handle);

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => state.router.handle_frame(&handle, &text),
            Ok(Message::Close(_)) => break,
            Ok(_) => {} // Binary, ping and pong frames are ignored.
            Err(e) => {
                debug!("Transport error on connection {}: {}", conn_id, e);
                break;
            }
        }
    }

    // Graceful close frame, abrupt drop and transport error all end here.
    state.lifecycle.on_close(&handle);
    writer.abort();
}
