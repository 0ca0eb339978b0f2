//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::RoomRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub rooms: Arc<RoomRegistry>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        // One registry per process; rooms are created on first join
        let rooms = Arc::new(RoomRegistry::new(config.room_settings(), config.reap_idle_rooms));

        Self { config, rooms }
    }
}
