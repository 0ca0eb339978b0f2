//! WebSocket upgrade handler

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{future, SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::game::Room;
use crate::util::ids;
use crate::util::rate_limit::InputRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::peer::{OutboundSink, Peer};
use crate::ws::protocol::{ClientMsg, ServerMsg};
use crate::ws::router::dispatch;

/// Query parameters for WebSocket connection
#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
    /// Room to join; the configured default room when absent
    pub room: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let room_id = query
        .room
        .map(|room| room.trim().to_string())
        .filter(|room| !room.is_empty())
        .unwrap_or_else(|| state.config.default_room_id.clone());

    ws.on_upgrade(move |socket| handle_socket(socket, room_id, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, room_id: String, state: AppState) {
    let player_id = ids::player_id();
    info!(player_id = %player_id, room_id = %room_id, "New WebSocket connection");

    let (ws_sink, ws_stream) = socket.split();
    let sink: OutboundSink = Box::pin(
        ws_sink.with(|text: String| future::ready(Ok::<_, axum::Error>(Message::Text(text)))),
    );
    let peer = Arc::new(Peer::new(player_id.clone(), sink, state.config.write_timeout));

    let room = state
        .rooms
        .join(&room_id, &player_id, peer.clone(), unix_millis());

    // Join confirmation is point-to-point and not fatal if it fails
    let joined = ServerMsg::RoomJoined {
        player_id: player_id.clone(),
        room_id: room_id.clone(),
    };
    if let Err(e) = peer.send(&joined).await {
        warn!(player_id = %player_id, error = %e, "Failed to send room_joined");
    }

    let rate_limiter = InputRateLimiter::new(state.config.input_rate_limit);
    run_session(&room, &player_id, ws_stream, &rate_limiter).await;

    // Cleanup on disconnect
    state.rooms.leave(&room_id, &player_id);
    peer.close().await;

    info!(player_id = %player_id, room_id = %room_id, "WebSocket connection closed");
}

/// Reader loop: WebSocket -> room. Returns on close or first transport error.
async fn run_session(
    room: &Room,
    player_id: &str,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    rate_limiter: &InputRateLimiter,
) {
    while let Some(result) = ws_stream.next().await {
        let msg = match result {
            Ok(Message::Text(text)) => serde_json::from_str::<ClientMsg>(&text),
            Ok(Message::Binary(bytes)) => serde_json::from_slice::<ClientMsg>(&bytes),
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                continue;
            }
            Ok(Message::Close(_)) => {
                info!(player_id = %player_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(player_id = %player_id, error = %e, "WebSocket error");
                break;
            }
        };

        if !rate_limiter.check() {
            warn!(player_id = %player_id, "Rate limited input message");
            continue;
        }

        match msg {
            Ok(client_msg) => {
                debug!(player_id = %player_id, kind = client_msg.kind(), "Inbound message");
                dispatch(room, player_id, client_msg, unix_millis()).await;
            }
            Err(e) => {
                warn!(player_id = %player_id, error = %e, "Failed to parse client message");
            }
        }
    }
}
