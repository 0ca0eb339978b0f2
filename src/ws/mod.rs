//! WebSocket transport: upgrade, wire protocol, routing and outbound writes

pub mod handler;
pub mod peer;
pub mod protocol;
pub mod router;

pub use handler::ws_handler;
