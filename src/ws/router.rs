//! Dispatch of decoded client messages to room mutations

use tracing::debug;

use crate::game::geometry::Vec2;
use crate::game::room::{Room, ShotRequest};
use crate::ws::protocol::ClientMsg;

/// Apply one inbound message from `player_id`.
///
/// `now_ms` is the server receive time; it stamps new arrows and aim updates.
pub async fn dispatch(room: &Room, player_id: &str, msg: ClientMsg, now_ms: u64) {
    match msg {
        ClientMsg::ArrowShot {
            start_x,
            start_y,
            angle,
            speed,
            timestamp,
        } => {
            debug!(
                room_id = %room.id(),
                player_id = %player_id,
                client_timestamp = timestamp,
                latency_ms = (now_ms as i64).saturating_sub(timestamp),
                "Arrow shot"
            );
            let shot = ShotRequest {
                origin: Vec2::new(start_x, start_y),
                angle,
                speed,
            };
            room.fire(player_id, shot, now_ms).await;
        }
        ClientMsg::AimUpdate { aim_x, aim_y } => {
            if !room.set_aim(player_id, Vec2::new(aim_x, aim_y), now_ms) {
                debug!(room_id = %room.id(), player_id = %player_id, "Aim update for unknown player");
            }
        }
        ClientMsg::JoinRoom { room_id } => {
            debug!(
                room_id = %room.id(),
                player_id = %player_id,
                requested = ?room_id,
                "join_room ignored; room is fixed at connect time"
            );
        }
        ClientMsg::Unknown => {
            debug!(room_id = %room.id(), player_id = %player_id, "Ignoring unknown message type");
        }
    }
}
