//! Outbound half of a participant's connection

use std::pin::Pin;
use std::time::Duration;

use futures::{Sink, SinkExt};
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::ws::protocol::ServerMsg;

/// Boxed text sink; the WebSocket writer in production, a channel in tests
pub type OutboundSink = Pin<Box<dyn Sink<String, Error = axum::Error> + Send>>;

/// Outbound write errors
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    #[error("Write timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(#[from] axum::Error),

    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Single writer handle for one participant.
///
/// The socket sink is not safe for concurrent writers, so every send goes
/// through the mutex. Waiting for the mutex counts against the write deadline.
pub struct Peer {
    participant_id: String,
    sink: Mutex<OutboundSink>,
    write_timeout: Duration,
}

impl Peer {
    pub fn new(participant_id: impl Into<String>, sink: OutboundSink, write_timeout: Duration) -> Self {
        Self {
            participant_id: participant_id.into(),
            sink: Mutex::new(sink),
            write_timeout,
        }
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    /// Send an already-encoded frame
    pub async fn send_text(&self, text: &str) -> Result<(), PeerError> {
        let write = async {
            let mut sink = self.sink.lock().await;
            sink.send(text.to_owned()).await
        };

        match timeout(self.write_timeout, write).await {
            Ok(result) => result.map_err(PeerError::from),
            Err(_) => Err(PeerError::Timeout(self.write_timeout)),
        }
    }

    /// Encode and send a message to this participant only
    pub async fn send(&self, msg: &ServerMsg) -> Result<(), PeerError> {
        let text = serde_json::to_string(msg)?;
        self.send_text(&text).await
    }

    /// Best-effort close of the underlying sink
    pub async fn close(&self) {
        let mut sink = self.sink.lock().await;
        let _ = timeout(self.write_timeout, sink.close()).await;
    }
}

impl std::fmt::Debug for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("participant_id", &self.participant_id)
            .field("write_timeout", &self.write_timeout)
            .finish()
    }
}
