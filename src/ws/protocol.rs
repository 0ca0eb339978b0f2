//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::game::combat::BodyPart;
use crate::game::geometry::Vec2;

/// Messages sent from client to server
///
/// Numeric fields decode leniently: a missing, null, or non-numeric value
/// becomes zero instead of rejecting the whole message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Player released an arrow
    ArrowShot {
        #[serde(default, deserialize_with = "lenient_f64")]
        start_x: f64,
        #[serde(default, deserialize_with = "lenient_f64")]
        start_y: f64,
        /// Launch angle in degrees
        #[serde(default, deserialize_with = "lenient_f64")]
        angle: f64,
        #[serde(default, deserialize_with = "lenient_f64")]
        speed: f64,
        /// Client clock at release (informational only)
        #[serde(default, deserialize_with = "lenient_i64")]
        timestamp: i64,
    },

    /// Player moved their aim
    AimUpdate {
        #[serde(default, deserialize_with = "lenient_f64")]
        aim_x: f64,
        #[serde(default, deserialize_with = "lenient_f64")]
        aim_y: f64,
    },

    /// Rooms are assigned at connect time; accepted and ignored
    JoinRoom {
        #[serde(default)]
        room_id: Option<Value>,
    },

    /// Any other `type` value
    #[serde(other)]
    Unknown,
}

impl ClientMsg {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMsg::ArrowShot { .. } => "arrow_shot",
            ClientMsg::AimUpdate { .. } => "aim_update",
            ClientMsg::JoinRoom { .. } => "join_room",
            ClientMsg::Unknown => "unknown",
        }
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or(0.0))
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_i64()
        .or_else(|| value.as_f64().map(|v| v as i64))
        .unwrap_or(0))
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Point-to-point confirmation after the socket is registered
    RoomJoined { player_id: String, room_id: String },

    /// Authoritative launch parameters for a new arrow
    ArrowSpawned {
        arrow_id: String,
        start_x: f64,
        start_y: f64,
        angle: f64,
        speed: f64,
        spawn_time: u64,
        owner_id: String,
    },

    /// Arrow struck the target
    HitDetected {
        arrow_id: String,
        body_part: BodyPart,
        position: Vec2,
    },

    /// Full room snapshot (sent every tick)
    GameState {
        tick: u64,
        /// Server clock in fractional seconds
        server_time: f64,
        arrows: HashMap<String, ArrowState>,
        players: HashMap<String, PlayerState>,
    },
}

/// Arrow state for synchronization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowState {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub speed: f64,
    pub spawn_time: u64,
    pub owner_id: String,
}

/// Player state for synchronization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub aim_x: f64,
    pub aim_y: f64,
    pub last_update: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_arrow_shot() {
        let msg: ClientMsg = serde_json::from_str(
            r#"{"type":"arrow_shot","start_x":25,"start_y":350.5,"angle":-12.5,"speed":500,"timestamp":1700000000000}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMsg::ArrowShot {
                start_x: 25.0,
                start_y: 350.5,
                angle: -12.5,
                speed: 500.0,
                timestamp: 1_700_000_000_000,
            }
        );
    }

    #[test]
    fn missing_and_mistyped_fields_default_to_zero() {
        let msg: ClientMsg = serde_json::from_value(json!({
            "type": "arrow_shot",
            "start_x": "far left",
            "angle": null,
            "speed": true,
            "timestamp": 12.9,
        }))
        .unwrap();
        assert_eq!(
            msg,
            ClientMsg::ArrowShot {
                start_x: 0.0,
                start_y: 0.0,
                angle: 0.0,
                speed: 0.0,
                timestamp: 12,
            }
        );

        let msg: ClientMsg = serde_json::from_value(json!({ "type": "aim_update" })).unwrap();
        assert_eq!(msg, ClientMsg::AimUpdate { aim_x: 0.0, aim_y: 0.0 });
    }

    #[test]
    fn unknown_type_is_a_variant_not_an_error() {
        let msg: ClientMsg =
            serde_json::from_value(json!({ "type": "dance", "style": "tango" })).unwrap();
        assert_eq!(msg, ClientMsg::Unknown);
        assert_eq!(msg.kind(), "unknown");
    }

    #[test]
    fn join_room_ignores_payload() {
        let msg: ClientMsg =
            serde_json::from_value(json!({ "type": "join_room", "room_id": 7, "extra": [1, 2] }))
                .unwrap();
        assert_eq!(msg.kind(), "join_room");
    }

    #[test]
    fn missing_type_is_rejected() {
        assert!(serde_json::from_value::<ClientMsg>(json!({ "aim_x": 1.0 })).is_err());
        assert!(serde_json::from_str::<ClientMsg>("not json").is_err());
    }

    #[test]
    fn hit_detected_wire_shape() {
        let msg = ServerMsg::HitDetected {
            arrow_id: "arrow_1".into(),
            body_part: BodyPart::UpperBody,
            position: Vec2::new(390.0, 366.0),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "type": "hit_detected",
                "arrow_id": "arrow_1",
                "body_part": "upperBody",
                "position": { "x": 390.0, "y": 366.0 },
            })
        );
    }

    #[test]
    fn room_joined_wire_shape() {
        let msg = ServerMsg::RoomJoined {
            player_id: "player_a".into(),
            room_id: "room1".into(),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({ "type": "room_joined", "player_id": "player_a", "room_id": "room1" })
        );
    }
}
