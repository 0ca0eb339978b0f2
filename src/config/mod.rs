//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::game::geometry::Vec2;
use crate::game::room::{RoomSettings, DEFAULT_TICK_INTERVAL};
use crate::game::combat::DEFAULT_TARGET_ANCHOR;
use crate::util::rate_limit::DEFAULT_INPUT_RATE_LIMIT;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,

    /// Simulation cadence for every room
    pub tick_interval: Duration,
    /// Deadline for a single outbound WebSocket write
    pub write_timeout: Duration,
    /// Room used when a client connects without `?room=`
    pub default_room_id: String,
    /// Target position in every room
    pub target_anchor: Vec2,
    /// Remove a room and stop its loop when the last player leaves
    pub reap_idle_rooms: bool,
    /// Max inbound messages per connection per second
    pub input_rate_limit: u32,

    /// Allowed client origins for CORS (`*` allows any)
    pub client_origin: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup (environment, map, ...)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Render provides PORT env var, fall back to SERVER_ADDR or default
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        };

        let tick_ms: u64 = parse_or(&lookup, "TICK_INTERVAL_MS", DEFAULT_TICK_INTERVAL.as_millis() as u64)?;
        if tick_ms == 0 {
            return Err(ConfigError::Invalid("TICK_INTERVAL_MS"));
        }
        let write_timeout_ms: u64 = parse_or(&lookup, "WRITE_TIMEOUT_MS", 3_000)?;
        if write_timeout_ms == 0 {
            return Err(ConfigError::Invalid("WRITE_TIMEOUT_MS"));
        }

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_json: lookup("LOG_FORMAT").is_some_and(|format| format.eq_ignore_ascii_case("json")),

            tick_interval: Duration::from_millis(tick_ms),
            write_timeout: Duration::from_millis(write_timeout_ms),
            default_room_id: lookup("DEFAULT_ROOM_ID")
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| "room1".to_string()),
            target_anchor: Vec2::new(
                parse_or(&lookup, "TARGET_X", DEFAULT_TARGET_ANCHOR.x)?,
                parse_or(&lookup, "TARGET_Y", DEFAULT_TARGET_ANCHOR.y)?,
            ),
            reap_idle_rooms: parse_or(&lookup, "REAP_IDLE_ROOMS", false)?,
            input_rate_limit: parse_or(&lookup, "INPUT_RATE_LIMIT", DEFAULT_INPUT_RATE_LIMIT)?,

            client_origin: lookup("CLIENT_ORIGIN").unwrap_or_else(|| "*".to_string()),
        })
    }

    /// Settings applied to every room created by the registry
    pub fn room_settings(&self) -> RoomSettings {
        RoomSettings {
            tick_interval: self.tick_interval,
            target_anchor: self.target_anchor,
            ..RoomSettings::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_level: "info".to_string(),
            log_json: false,
            tick_interval: DEFAULT_TICK_INTERVAL,
            write_timeout: Duration::from_secs(3),
            default_room_id: "room1".to_string(),
            target_anchor: DEFAULT_TARGET_ANCHOR,
            reap_idle_rooms: false,
            input_rate_limit: DEFAULT_INPUT_RATE_LIMIT,
            client_origin: "*".to_string(),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
