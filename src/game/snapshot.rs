//! Wire encoding of room snapshots and events

use std::collections::HashMap;

use crate::ws::protocol::{ArrowState, PlayerState, ServerMsg};

use super::physics::Launch;
use super::state::{HitEvent, RoomSnapshot};

/// Full `game_state` message for a snapshot
pub fn game_state(snapshot: &RoomSnapshot) -> ServerMsg {
    let arrows: HashMap<String, ArrowState> = snapshot
        .projectiles
        .iter()
        .map(|p| {
            (
                p.id.clone(),
                ArrowState {
                    id: p.id.clone(),
                    x: p.position.x,
                    y: p.position.y,
                    angle: p.launch.angle,
                    speed: p.launch.speed,
                    spawn_time: p.launch.launched_at,
                    owner_id: p.owner_id.clone(),
                },
            )
        })
        .collect();

    let players: HashMap<String, PlayerState> = snapshot
        .participants
        .iter()
        .map(|p| {
            (
                p.id.clone(),
                PlayerState {
                    id: p.id.clone(),
                    x: p.position.x,
                    y: p.position.y,
                    aim_x: p.aim.x,
                    aim_y: p.aim.y,
                    last_update: p.last_update,
                },
            )
        })
        .collect();

    ServerMsg::GameState {
        tick: snapshot.tick,
        server_time: snapshot.taken_at as f64 / 1000.0,
        arrows,
        players,
    }
}

pub fn arrow_spawned(arrow_id: &str, owner_id: &str, launch: &Launch) -> ServerMsg {
    ServerMsg::ArrowSpawned {
        arrow_id: arrow_id.to_string(),
        start_x: launch.origin.x,
        start_y: launch.origin.y,
        angle: launch.angle,
        speed: launch.speed,
        spawn_time: launch.launched_at,
        owner_id: owner_id.to_string(),
    }
}

pub fn hit_detected(hit: &HitEvent) -> ServerMsg {
    ServerMsg::HitDetected {
        arrow_id: hit.arrow_id.clone(),
        body_part: hit.body_part,
        position: hit.position,
    }
}
