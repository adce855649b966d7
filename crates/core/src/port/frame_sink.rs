// Frame Sink Port (streaming transport for stream sessions)

use crate::domain::DispatchEvent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One message written to a streaming client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "frame", rename_all = "snake_case")]
pub enum SessionFrame {
    /// First frame of every session
    Connected { session_id: String },
    Event { event: DispatchEvent },
    /// Keep-alive, carries no state
    Heartbeat,
}

/// The client went away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("stream session closed by client")]
pub struct SessionClosed;

/// Transport side of a stream session (one per connected client)
#[async_trait]
pub trait FrameSink: Send + Sync {
    /// Write one frame to the client
    async fn send(&self, frame: SessionFrame) -> Result<(), SessionClosed>;

    /// Resolves once the client has disconnected
    async fn closed(&self);
}
