use axum::{
    extract::{ws::Message, ws::WebSocket, Path, State, WebSocketUpgrade},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use sensorcast_broadcast::SubscriberRegistry;
use std::sync::Arc;
use tracing::{debug, info};

use crate::app::AppState;

/// Axum handler: upgrades HTTP to WebSocket at GET /ws/{sensor}.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(sensor): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(stream) = state.stream(&sensor) else {
        return crate::http::unknown_stream(sensor);
    };
    let registry = Arc::clone(&stream.registry);
    let count = stream.handle.sequence();
    ws.on_upgrade(move |socket| run_connection(socket, sensor, registry, count))
}

/// Per-connection loop: forward broadcast messages until either side hangs up.
async fn run_connection(
    socket: WebSocket,
    sensor: String,
    registry: Arc<SubscriberRegistry>,
    count: u64,
) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let mut outbound = registry.connect(&conn_id);
    info!(
        conn_id = %conn_id,
        sensor = %sensor,
        count,
        subscribers = registry.len(),
        "client connected"
    );

    let (mut tx, mut rx) = socket.split();

    loop {
        tokio::select! {
            msg = rx.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if tx.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // inbound text and binary frames are ignored
                    Some(Ok(_)) => {}
                }
            }

            payload = outbound.recv() => {
                match payload {
                    Some(payload) => {
                        if tx.send(Message::Text(payload.into())).await.is_err() {
                            break;
                        }
                    }
                    // registry dropped the sender
                    None => break,
                }
            }
        }
    }

    if !registry.disconnect(&conn_id) {
        debug!(conn_id = %conn_id, "connection already removed");
    }
    info!(conn_id = %conn_id, sensor = %sensor, "client disconnected");
}
