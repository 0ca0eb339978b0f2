//! Arrow Range Server - authoritative multiplayer archery server
//!
//! Players connect over WebSocket, join a room, aim and loose arrows.
//! Each room runs its own fixed-rate simulation: arrows fly on a ballistic
//! arc, hits against the target's body zones are resolved on the server and
//! every participant receives the same state snapshot each tick.

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod util;
pub mod ws;

use tokio::net::TcpListener;
use tracing::info;

use crate::app::AppState;
use crate::config::Config;
use crate::http::build_router;

/// Serve the game on an already bound listener until `shutdown` resolves.
///
/// Every room loop is stopped once the HTTP server has drained.
pub async fn serve<F>(listener: TcpListener, config: Config, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let state = AppState::new(config);
    let rooms = state.rooms.clone();
    let router = build_router(state);

    let addr = listener.local_addr()?;
    info!("Server listening on {}", addr);
    info!("Health check: http://{}/health", addr);
    info!("WebSocket endpoint: ws://{}/game", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    rooms.shutdown();
    info!("All rooms stopped");
    Ok(())
}
