//! HTTP surface: health, room diagnostics and the WebSocket upgrade routes

pub mod routes;

pub use routes::{build_router, AppError};
