//! Game simulation modules

pub mod combat;
pub mod geometry;
pub mod physics;
pub mod room;
pub mod snapshot;
pub mod state;

pub use combat::{BodyPart, HitZones};
pub use geometry::Vec2;
pub use room::{Room, RoomRegistry, RoomSettings, ShotRequest};
pub use state::RoomState;
